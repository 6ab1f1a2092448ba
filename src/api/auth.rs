//! Auth collaborator endpoints: credential issuance and account flows

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ClientResult;
use crate::models::Credential;

use super::{AuthApi, Transport};

/// Login form. The server owns authentication; only presence is checked
/// locally.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration form. The server re-validates everything and owns
/// acceptance (including the password policy).
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub password2: String,
}

/// Password change form (requires an authorized session).
#[derive(Debug, Clone, Serialize, Validate)]
pub struct PasswordChangeForm {
    #[validate(length(min = 1, message = "All fields are required."))]
    pub current_password: String,
    #[validate(length(min = 1, message = "All fields are required."))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "New passwords do not match."))]
    pub confirm_password: String,
}

/// Account echo returned by a successful registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredAccount {
    pub username: String,
    pub email: String,
    /// Stays false until an administrator approves the account.
    pub is_active: bool,
    #[serde(default)]
    pub rollno: Option<String>,
}

pub struct HttpAuthApi {
    transport: Transport,
}

impl HttpAuthApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, form: &LoginForm) -> ClientResult<Credential> {
        self.transport.post("/login/", None, form).await
    }

    async fn register(&self, form: &RegisterForm) -> ClientResult<RegisteredAccount> {
        self.transport.post("/register/", None, form).await
    }

    async fn change_password(
        &self,
        credential: &Credential,
        form: &PasswordChangeForm,
    ) -> ClientResult<Option<String>> {
        self.transport
            .patch_ack("/change-password/", credential, form)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_form_requires_both_fields() {
        let form = LoginForm {
            username: "paul".to_string(),
            password: String::new(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_register_form_rejects_mismatched_passwords() {
        let form = RegisterForm {
            username: "paul".to_string(),
            email: "paul@arrakis.example".to_string(),
            password: "Spice&Sand1".to_string(),
            password2: "Spice&Sand2".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password2"));
    }
}
