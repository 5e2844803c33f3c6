//! User and role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_signed_in: Option<DateTime<Utc>>,
}

/// Role assigned to a user account.
///
/// All privilege decisions go through the capability methods below;
/// nothing in the system is keyed to a specific identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Worker,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Worker => "worker",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "worker" => Some(UserRole::Worker),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Create stock items, edit their metadata, disable them, and apply
    /// manual quantity corrections.
    pub fn can_manage_stock(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Register and manage user accounts.
    pub fn can_manage_users(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Create, claim, complete and delete packaging orders, and book
    /// warehouse receipts.
    pub fn can_process_orders(&self) -> bool {
        true
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
