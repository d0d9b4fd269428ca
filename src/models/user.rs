//! User model
//!
//! Users who can sign in and be granted access to the budget. Exactly one
//! user is the owner; the owner can never be deleted or disabled through
//! the directory operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::UserId;

/// Role assigned to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full administrative access, including the user directory
    Admin,
    /// Regular access to budgets shared with the user
    #[default]
    Basic,
}

impl UserRole {
    /// All known roles
    pub fn all() -> &'static [UserRole] {
        &[UserRole::Admin, UserRole::Basic]
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "Admin"),
            Self::Basic => write!(f, "Basic"),
        }
    }
}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "basic" => Ok(Self::Basic),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Error returned when parsing an unknown role name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

/// A user in the directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// Login name, unique case-insensitively
    pub user_name: String,

    /// Name shown in the directory (falls back to `user_name` when empty)
    #[serde(default)]
    pub display_name: String,

    /// Assigned role
    pub role: UserRole,

    /// Disabled users cannot sign in
    pub enabled: bool,

    /// True for the server owner
    #[serde(default)]
    pub owner: bool,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last modified
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new enabled user
    pub fn new(user_name: impl Into<String>, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            user_name: user_name.into(),
            display_name: String::new(),
            role,
            enabled: true,
            owner: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create the owner user
    pub fn new_owner(user_name: impl Into<String>) -> Self {
        let mut user = Self::new(user_name, UserRole::Admin);
        user.owner = true;
        user
    }

    /// The name to show in listings
    pub fn shown_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.user_name
        } else {
            &self.display_name
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.shown_name(), self.role)
    }
}
