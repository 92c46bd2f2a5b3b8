use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication failed! (status_code: {status})")]
    Authentication { status: u16 },

    #[error("Request to identity provider failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("NTLM negotiation failed: {0}")]
    Ntlm(String),

    #[error("No SAMLResponse found in identity provider response")]
    AssertionNotFound,

    #[error("SAML assertion is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("SAML assertion is not valid UTF-8: {0}")]
    AssertionEncoding(#[from] std::string::FromUtf8Error),

    #[error("SAML assertion is not valid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Role attribute value is not a role,principal pair: {raw:?}")]
    MalformedRole { raw: String },

    #[error("Cannot tell role and principal apart in {raw:?}")]
    AmbiguousRole { raw: String },

    #[error("No AWS roles found in SAML assertion")]
    NoRolesAvailable,

    #[error("You selected an invalid role index ({input:?}), choose 0 to {}", count.saturating_sub(1))]
    InvalidSelection { input: String, count: usize },

    #[error("AssumeRoleWithSAML failed: {0}")]
    Exchange(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid identity provider entry URL: {0}")]
    InvalidEntryUrl(#[from] url::ParseError),

    #[error("Cannot update {}: {message}", path.display())]
    Profile { path: PathBuf, message: String },
}

impl Error {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Authentication { .. } | Error::Fetch(_) | Error::Ntlm(_) => 1,
            Error::NoRolesAvailable | Error::InvalidSelection { .. } => 2,
            Error::AssertionNotFound
            | Error::Decode(_)
            | Error::AssertionEncoding(_)
            | Error::Xml(_)
            | Error::MalformedRole { .. }
            | Error::AmbiguousRole { .. } => 3,
            Error::Exchange(_) => 4,
            Error::Config(_) | Error::InvalidEntryUrl(_) | Error::Profile { .. } => 5,
        }
    }
}
