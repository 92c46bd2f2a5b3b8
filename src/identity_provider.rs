use std::fmt;

use async_trait::async_trait;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Result;
use crate::saml::SAMLAssertion;

/// Directory credentials for a single login attempt.
///
/// Wiped when dropped. This is best effort only: copies made by the HTTP or
/// NTLM layers are outside its reach.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// As typed, e.g. `CORP\jdoe`.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait IdentityProvider {
    /// Logs in and returns the assertion. The credentials are consumed so they
    /// are gone once the login request is over.
    async fn get_saml_assertion(&self, credentials: Credentials) -> Result<SAMLAssertion>;
}
