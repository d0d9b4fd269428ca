//! User repository for JSON storage
//!
//! Manages loading and saving the user directory to users.json.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{User, UserId};

use super::lock_poisoned;
use super::file_io::{read_json, write_json_atomic};

/// Serializable user data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct UserData {
    users: Vec<User>,
}

/// Repository for user persistence
pub struct UserRepository {
    path: PathBuf,
    data: RwLock<HashMap<UserId, User>>,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load users from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: UserData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_poisoned)?;
        data.clear();
        for user in file_data.users {
            data.insert(user.id, user);
        }

        Ok(())
    }

    /// Save users to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;

        let mut users: Vec<_> = data.values().cloned().collect();
        users.sort_by(|a, b| a.user_name.cmp(&b.user_name));

        write_json_atomic(&self.path, &UserData { users })
    }

    /// Get a user by ID
    pub fn get(&self, id: UserId) -> Result<Option<User>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.get(&id).cloned())
    }

    /// Get a user by login name (case-insensitive)
    pub fn get_by_user_name(&self, user_name: &str) -> Result<Option<User>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .values()
            .find(|u| u.user_name.eq_ignore_ascii_case(user_name))
            .cloned())
    }

    /// Get the owner, if one exists
    pub fn get_owner(&self) -> Result<Option<User>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.values().find(|u| u.owner).cloned())
    }

    /// Get all users
    pub fn get_all(&self) -> Result<Vec<User>, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;

        let mut users: Vec<_> = data.values().cloned().collect();
        users.sort_by(|a, b| {
            a.shown_name()
                .to_lowercase()
                .cmp(&b.shown_name().to_lowercase())
        });
        Ok(users)
    }

    /// Insert or update a user
    pub fn upsert(&self, user: User) -> Result<(), TallyError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        data.insert(user.id, user);
        Ok(())
    }

    /// Delete a user
    pub fn delete(&self, id: UserId) -> Result<bool, TallyError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        Ok(data.remove(&id).is_some())
    }

    /// Count users
    pub fn count(&self) -> Result<usize, TallyError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.len())
    }
}
