//! User domain entity

use chrono::{DateTime, Utc};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::User => "User",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

/// Account that owns cars and reservations. Authentication happens
/// upstream; this service only needs identity and a notification address.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: i32, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
            phone: None,
            role: UserRole::User,
            created_at: Utc::now(),
        }
    }
}
