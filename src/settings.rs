use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

pub const SETTINGS_FILE_NAME: &str = ".adfs-saml.toml";

/// Some AD FS servers answer non-browser clients with a login form instead of
/// an NTLM challenge.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible, MSIE 11, Windows NT 6.3; Trident/7.0; rv:11.0) like Gecko";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub idp_entry_url: Option<String>,
    /// Host name of the AD FS server, used when `idp_entry_url` is not set.
    #[serde(default)]
    pub fqdn: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_ssl_verification")]
    pub ssl_verification: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub aws_config_file: Option<PathBuf>,
    #[serde(default)]
    pub aws_credentials_file: Option<PathBuf>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_output_format() -> String {
    "json".to_string()
}

fn default_profile() -> String {
    "saml".to_string()
}

fn default_ssl_verification() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// Layers `~/.adfs-saml.toml`, `./.adfs-saml.toml`, the `explicit` file and
    /// `ADFS_SAML_*` environment variables, later sources winning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let home_path = dirs::home_dir().map(|home| home.join(SETTINGS_FILE_NAME));
        let local_path = PathBuf::from(SETTINGS_FILE_NAME);

        let mut builder = Config::builder();
        for path in home_path.iter().chain(std::iter::once(&local_path)) {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }
        if let Some(path) = explicit {
            log::debug!("settings file: {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let settings = builder
            .add_source(Environment::with_prefix("ADFS_SAML").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// The URL that starts IdP-initiated sign-on for AWS.
    pub fn entry_url(&self) -> Result<Url> {
        if let Some(url) = &self.idp_entry_url {
            return Ok(Url::parse(url)?);
        }

        match &self.fqdn {
            Some(fqdn) => Ok(Url::parse(&format!(
                "https://{}/adfs/ls/IdpInitiatedSignOn.aspx?loginToRp=urn:amazon:webservices",
                fqdn
            ))?),
            None => Err(Error::Config(config::ConfigError::Message(
                "either idp_entry_url or fqdn must be set".to_string(),
            ))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
