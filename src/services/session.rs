//! Session gate: credential lifecycle and account flows

use std::sync::{Arc, PoisonError, RwLock};

use validator::Validate;

use crate::api::auth::{LoginForm, PasswordChangeForm, RegisterForm, RegisteredAccount};
use crate::api::AuthApi;
use crate::error::{ClientError, ClientResult};
use crate::models::Credential;

/// Holds the current access credential.
///
/// Written only by the login/logout transitions; every other component
/// reads a consistent snapshot through [`SessionGate::require_session`].
/// The credential is never renewed here; the refresh flow is out of
/// scope.
pub struct SessionGate {
    api: Arc<dyn AuthApi>,
    credential: RwLock<Option<Credential>>,
}

impl SessionGate {
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        Self {
            api,
            credential: RwLock::new(None),
        }
    }

    /// Current credential snapshot, or the terminal unauthenticated
    /// condition. The caller must translate the error into a redirect to
    /// the login flow and abort the page's other operations.
    pub fn require_session(&self) -> ClientResult<Credential> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ClientError::Unauthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Log in: validate locally, call the auth collaborator, store the
    /// returned token pair.
    pub async fn login(&self, form: &LoginForm) -> ClientResult<Credential> {
        form.validate()?;
        let credential = self.api.login(form).await?;
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
        tracing::info!(username = %form.username, "session opened");
        Ok(credential)
    }

    /// Log out: destroy the stored credential. Callers holding derived
    /// state (the request lifecycle manager) must reset alongside.
    pub fn logout(&self) {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!("session closed");
    }

    /// Thin forwarding to the registration collaborator.
    pub async fn register(&self, form: &RegisterForm) -> ClientResult<RegisteredAccount> {
        form.validate()?;
        self.api.register(form).await
    }

    /// Thin forwarding to the password-change collaborator.
    pub async fn change_password(&self, form: &PasswordChangeForm) -> ClientResult<Option<String>> {
        form.validate()?;
        let credential = self.require_session()?;
        self.api.change_password(&credential, form).await
    }
}

/// Client-side password strength hint shown during registration.
/// The server remains the authority on acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    TooShort,
    Weak,
    Medium,
    Strong,
}

pub fn password_strength(password: &str) -> PasswordStrength {
    if password.len() < 8 {
        return PasswordStrength::TooShort;
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if has_lower && has_upper && has_digit && has_special {
        PasswordStrength::Strong
    } else if (has_lower || has_upper) && has_digit {
        PasswordStrength::Medium
    } else {
        PasswordStrength::Weak
    }
}

#[cfg(test)]
impl SessionGate {
    /// Gate pre-loaded with a fixed credential, for service tests.
    pub(crate) fn stubbed() -> Arc<Self> {
        let gate = SessionGate::new(Arc::new(crate::api::MockAuthApi::new()));
        *gate
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Credential {
            access: "test-access".to_string(),
            refresh: "test-refresh".to_string(),
        });
        Arc::new(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockAuthApi;

    fn form(username: &str, password: &str) -> LoginForm {
        LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_require_session_without_login_is_unauthenticated() {
        let gate = SessionGate::new(Arc::new(MockAuthApi::new()));
        assert!(gate.require_session().unwrap_err().is_unauthenticated());
    }

    #[tokio::test]
    async fn test_login_stores_the_token_pair() {
        let mut api = MockAuthApi::new();
        api.expect_login().times(1).returning(|_| {
            Ok(Credential {
                access: "a".to_string(),
                refresh: "r".to_string(),
            })
        });
        let gate = SessionGate::new(Arc::new(api));

        gate.login(&form("paul", "Spice&Sand1")).await.unwrap();

        let snapshot = gate.require_session().unwrap();
        assert_eq!(snapshot.access, "a");
        assert_eq!(snapshot.refresh, "r");
    }

    #[tokio::test]
    async fn test_blank_login_form_makes_no_network_call() {
        let mut api = MockAuthApi::new();
        api.expect_login().times(0);
        let gate = SessionGate::new(Arc::new(api));

        let err = gate.login(&form("", "")).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_logout_destroys_the_credential() {
        let gate = SessionGate::stubbed();
        assert!(gate.is_authenticated());

        gate.logout();

        assert!(!gate.is_authenticated());
        assert!(gate.require_session().unwrap_err().is_unauthenticated());
    }

    #[test]
    fn test_password_strength_scale() {
        assert_eq!(password_strength("short"), PasswordStrength::TooShort);
        assert_eq!(password_strength("lettersonly"), PasswordStrength::Weak);
        assert_eq!(password_strength("123456789"), PasswordStrength::Weak);
        assert_eq!(password_strength("letters123"), PasswordStrength::Medium);
        assert_eq!(password_strength("Spice&Sand1"), PasswordStrength::Strong);
    }
}
