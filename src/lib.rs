pub mod adfs;
pub mod aws;
pub mod error;
pub mod http_client;
pub mod identity_provider;
pub mod login;
pub mod ntlm;
pub mod profile;
pub mod saml;
pub mod settings;
pub mod ui;

pub use error::{Error, Result};
