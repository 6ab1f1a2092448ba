//! Student profile models
//!
//! Read here only for the dashboard greeting; profile editing goes through
//! the profile collaborator and is not modeled further.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentProfile {
    /// Roll number, assigned by the server at registration.
    pub id: String,
    pub user: UserAccount,
    /// Stream display name, if the student is assigned one.
    #[serde(default)]
    pub stream: Option<String>,
    pub is_approved: bool,
}

impl StudentProfile {
    /// Display name: first + last, falling back to the username.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.user.first_name, self.user.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.user.username.clone()
        } else {
            full.to_string()
        }
    }
}
