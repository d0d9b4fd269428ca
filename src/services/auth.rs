//! Authentication service
//!
//! Bootstrap, password sign-in and opaque session tokens. The password
//! hash and active sessions live in auth.json next to the data directory;
//! user records stay in the user directory.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{hash_password, verify_password};
use crate::error::{TallyError, TallyResult};
use crate::models::{User, UserId};
use crate::storage::file_io::{read_json, write_json_atomic};
use crate::storage::Storage;

use super::user::{UserInput, UserService};

/// How long a session token stays valid
const SESSION_DAYS: i64 = 7;

/// An active session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token handed to the client
    pub token: String,
    /// The signed-in user
    pub user_id: UserId,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Persisted authentication state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AuthData {
    /// Argon2 hash of the server password (None until bootstrapped)
    password_hash: Option<String>,
    /// Active sessions
    #[serde(default)]
    sessions: Vec<Session>,
}

/// Service for bootstrap, sign-in and session management
pub struct AuthService<'a> {
    storage: &'a Storage,
}

impl<'a> AuthService<'a> {
    /// Create a new auth service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn load(&self) -> TallyResult<AuthData> {
        read_json(self.storage.paths().auth_file())
    }

    fn save(&self, data: &AuthData) -> TallyResult<()> {
        write_json_atomic(self.storage.paths().auth_file(), data)
    }

    /// True until a password has been set
    pub fn needs_bootstrap(&self) -> TallyResult<bool> {
        Ok(self.load()?.password_hash.is_none())
    }

    /// Set the server password and create the owner user
    ///
    /// Reason code `already-bootstrapped` when a password already exists.
    pub fn bootstrap(&self, password: &str) -> TallyResult<User> {
        if !self.needs_bootstrap()? {
            return Err(TallyError::Reason("already-bootstrapped"));
        }
        if password.is_empty() {
            return Err(TallyError::Reason("invalid-password"));
        }

        let mut data = self.load()?;
        data.password_hash = Some(hash_password(password)?);
        self.save(&data)?;

        // The owner user may already exist (restored data); otherwise
        // create it.
        if let Some(owner) = self.storage.users.get_owner()? {
            return Ok(owner);
        }
        UserService::new(self.storage).create(UserInput {
            user_name: "admin".to_string(),
            display_name: String::new(),
            role: Some("admin".to_string()),
            enabled: true,
        })
    }

    /// Sign in with the server password, returning a session token
    ///
    /// Reason codes: `not-bootstrapped`, `invalid-password`,
    /// `user-disabled`.
    pub fn sign_in(&self, password: &str) -> TallyResult<Session> {
        let mut data = self.load()?;
        let Some(hash) = data.password_hash.as_deref() else {
            return Err(TallyError::Reason("not-bootstrapped"));
        };

        if !verify_password(password, hash)? {
            return Err(TallyError::Reason("invalid-password"));
        }

        let owner = self
            .storage
            .users
            .get_owner()?
            .ok_or_else(|| TallyError::Auth("No owner user exists".to_string()))?;
        if !owner.enabled {
            return Err(TallyError::Reason("user-disabled"));
        }

        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id: owner.id,
            expires_at: Utc::now() + Duration::days(SESSION_DAYS),
        };

        // Drop expired sessions while we are here
        let now = Utc::now();
        data.sessions.retain(|s| s.expires_at > now);
        data.sessions.push(session.clone());
        self.save(&data)?;

        Ok(session)
    }

    /// Resolve a token to its user
    ///
    /// Reason codes: `unauthorized` for unknown tokens, `token-expired`
    /// for known-but-expired ones.
    pub fn verify(&self, token: &str) -> TallyResult<User> {
        let data = self.load()?;
        let session = data
            .sessions
            .iter()
            .find(|s| s.token == token)
            .ok_or(TallyError::Reason("unauthorized"))?;

        if session.expires_at <= Utc::now() {
            return Err(TallyError::Reason("token-expired"));
        }

        self.storage
            .users
            .get(session.user_id)?
            .ok_or(TallyError::Reason("unauthorized"))
    }

    /// Change the server password, invalidating every session except the
    /// calling one
    pub fn change_password(&self, token: &str, new_password: &str) -> TallyResult<()> {
        self.verify(token)?;
        if new_password.is_empty() {
            return Err(TallyError::Reason("invalid-password"));
        }

        let mut data = self.load()?;
        data.password_hash = Some(hash_password(new_password)?);
        data.sessions.retain(|s| s.token == token);
        self.save(&data)
    }

    /// Drop a session
    pub fn sign_out(&self, token: &str) -> TallyResult<()> {
        let mut data = self.load()?;
        data.sessions.retain(|s| s.token != token);
        self.save(&data)
    }
}
