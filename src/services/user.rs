//! User directory service
//!
//! List, filter and page through users, create and update them with
//! reason-coded validation, and bulk-delete with owner protection.
//! Directory mutations are audited.

use chrono::Utc;

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{User, UserId, UserRole};
use crate::storage::Storage;

/// First listing window; each further page adds [`PAGE_STEP`] rows
pub const FIRST_WINDOW: usize = 100;
/// Rows added per "load more" page
pub const PAGE_STEP: usize = 50;

/// Input for creating or updating a user
#[derive(Debug, Clone)]
pub struct UserInput {
    pub user_name: String,
    pub display_name: String,
    /// Role name; validated against the known roles
    pub role: Option<String>,
    pub enabled: bool,
}

/// Result of a bulk delete
#[derive(Debug, Clone, Default)]
pub struct DeleteAllResult {
    /// How many users were removed
    pub deleted: usize,
    /// True when some of the requested ids were skipped (owner, missing)
    pub some_deletions_failed: bool,
}

/// Service for user directory management
pub struct UserService<'a> {
    storage: &'a Storage,
}

impl<'a> UserService<'a> {
    /// Create a new user service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Get a user by ID
    pub fn get(&self, id: UserId) -> TallyResult<Option<User>> {
        self.storage.users.get(id)
    }

    /// List all users
    pub fn list(&self) -> TallyResult<Vec<User>> {
        self.storage.users.get_all()
    }

    /// List users matching `filter`, truncated to the window for `page`
    ///
    /// The filter is a case-insensitive substring match against display
    /// name, user name and role. The window grows with each page: 100 rows
    /// for page 0, then 50 more per page.
    pub fn list_window(&self, filter: &str, page: usize) -> TallyResult<Vec<User>> {
        let mut users = self.storage.users.get_all()?;

        if !filter.is_empty() {
            let needle = filter.to_lowercase();
            users.retain(|u| {
                u.display_name.to_lowercase().contains(&needle)
                    || u.user_name.to_lowercase().contains(&needle)
                    || u.role.to_string().to_lowercase().contains(&needle)
            });
        }

        users.truncate(FIRST_WINDOW + page * PAGE_STEP);
        Ok(users)
    }

    /// Create a new user
    ///
    /// Reason codes: `user-cant-be-empty`, `role-cant-be-empty`,
    /// `role-does-not-exists`, `user-already-exists`.
    pub fn create(&self, input: UserInput) -> TallyResult<User> {
        let user_name = input.user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(TallyError::Reason("user-cant-be-empty"));
        }

        let role = parse_role(input.role.as_deref())?;

        if self.storage.users.get_by_user_name(&user_name)?.is_some() {
            return Err(TallyError::Reason("user-already-exists"));
        }

        let mut user = User::new(user_name, role);
        user.display_name = input.display_name.trim().to_string();
        user.enabled = input.enabled;

        // The first user becomes the owner
        if self.storage.users.get_owner()?.is_none() {
            user.owner = true;
        }

        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;

        self.storage.log_create(
            EntityType::User,
            user.id.to_string(),
            Some(user.user_name.clone()),
            &user,
        )?;

        Ok(user)
    }

    /// Update an existing user
    ///
    /// The owner's enabled flag cannot be turned off.
    pub fn update(&self, id: UserId, input: UserInput) -> TallyResult<User> {
        let mut user = self
            .storage
            .users
            .get(id)?
            .ok_or_else(|| TallyError::user_not_found(id.to_string()))?;

        let user_name = input.user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(TallyError::Reason("user-cant-be-empty"));
        }

        let role = parse_role(input.role.as_deref())?;

        // A rename must not collide with another user
        if let Some(existing) = self.storage.users.get_by_user_name(&user_name)? {
            if existing.id != id {
                return Err(TallyError::Reason("user-already-exists"));
            }
        }

        let before = user.clone();

        user.user_name = user_name;
        user.display_name = input.display_name.trim().to_string();
        user.role = role;
        user.enabled = if user.owner { true } else { input.enabled };
        user.updated_at = Utc::now();

        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;

        self.storage.log_update(
            EntityType::User,
            user.id.to_string(),
            Some(user.user_name.clone()),
            &before,
            &user,
            None,
        )?;

        Ok(user)
    }

    /// Delete the given users
    ///
    /// The owner is never deleted; a request including the owner (or an
    /// unknown id) reports `some_deletions_failed` instead of failing
    /// outright.
    pub fn delete_all(&self, ids: &[UserId]) -> TallyResult<DeleteAllResult> {
        let mut result = DeleteAllResult::default();

        for &id in ids {
            let Some(user) = self.storage.users.get(id)? else {
                result.some_deletions_failed = true;
                continue;
            };

            if user.owner {
                result.some_deletions_failed = true;
                continue;
            }

            self.storage.users.delete(id)?;
            result.deleted += 1;

            self.storage.log_delete(
                EntityType::User,
                id.to_string(),
                Some(user.user_name.clone()),
                &user,
            )?;
        }

        if result.deleted > 0 {
            self.storage.users.save()?;
        }

        Ok(result)
    }

    /// Count users
    pub fn count(&self) -> TallyResult<usize> {
        self.storage.users.count()
    }
}

/// Parse a role name into a role
///
/// Reason codes: `role-cant-be-empty` for a missing/blank role,
/// `role-does-not-exists` for an unknown one.
fn parse_role(role: Option<&str>) -> TallyResult<UserRole> {
    let role = role.map(str::trim).unwrap_or("");
    if role.is_empty() {
        return Err(TallyError::Reason("role-cant-be-empty"));
    }
    role.parse()
        .map_err(|_| TallyError::Reason("role-does-not-exists"))
}
