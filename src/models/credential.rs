//! Session credential: the bearer token pair

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque bearer token pair issued at login.
///
/// Created by the session gate's login transition, read by every
/// authorized call, destroyed on logout. Never renewed by this client
/// (the refresh flow is out of scope). Tokens are opaque: nothing here
/// decodes or inspects them.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub access: String,
    pub refresh: String,
}

// Token bytes stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}
