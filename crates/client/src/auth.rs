//! Login credentials for the remote store.
//!
//! The store hands back a bearer token on `users/authenticate`; that token is
//! attached to every later call. Credentials themselves never leave this
//! process except in the authenticate request body.

use std::fmt;

use serde::Serialize;

/// Username + password pair used once per run to obtain a bearer token.
#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "username")]
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { user: user.into(), password: password.into() }
    }
}

// Keep the password out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
