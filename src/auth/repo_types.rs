use sqlx::FromRow;
use std::{fmt, str::FromStr};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub name: String,
    pub email: String,                // lowercase, institutional domain
    pub password_hash: String,        // Argon2 hash; PublicUser leaves it out
    pub branch: String,
    pub role: String,                 // "student" | "teacher"
    pub is_admin: bool,
    pub created_at: OffsetDateTime,   // creation timestamp
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            _ => Err(()),
        }
    }
}
