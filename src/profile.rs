use std::fs;
use std::path::{Path, PathBuf};

use configparser::ini::Ini;

use crate::aws::TemporaryCredentials;
use crate::error::{Error, Result};

/// Keys outside any section land here, so a real `[default]` profile is
/// written back with its header.
const TOP_LEVEL_SECTION: &str = "__top_level__";

/// Writes one named profile into the AWS CLI `config` and `credentials` files,
/// leaving every other profile alone.
#[derive(Debug, Clone)]
pub struct ProfileWriter {
    pub config_path: PathBuf,
    pub credentials_path: PathBuf,
    pub profile: String,
}

impl ProfileWriter {
    pub fn new(config_path: PathBuf, credentials_path: PathBuf, profile: impl Into<String>) -> Self {
        Self {
            config_path,
            credentials_path,
            profile: profile.into(),
        }
    }

    /// `~/.aws/config` and `~/.aws/credentials`, unless overridden.
    pub fn with_defaults(
        config_path: Option<PathBuf>,
        credentials_path: Option<PathBuf>,
        profile: impl Into<String>,
    ) -> Result<Self> {
        let aws_dir = || {
            dirs::home_dir()
                .map(|home| home.join(".aws"))
                .ok_or_else(|| Error::Profile {
                    path: PathBuf::from("~/.aws"),
                    message: "could not determine home directory".to_string(),
                })
        };

        let config_path = match config_path {
            Some(path) => path,
            None => aws_dir()?.join("config"),
        };
        let credentials_path = match credentials_path {
            Some(path) => path,
            None => aws_dir()?.join("credentials"),
        };

        Ok(Self::new(config_path, credentials_path, profile))
    }

    /// Section name in the config file; the AWS CLI expects `profile <name>`
    /// for everything but `default`.
    pub fn config_section(&self) -> String {
        if self.profile == "default" {
            self.profile.clone()
        } else {
            format!("profile {}", self.profile)
        }
    }

    pub fn write_config(&self, region: &str, output_format: &str) -> Result<()> {
        update_section(
            &self.config_path,
            &self.config_section(),
            &[("output", output_format), ("region", region)],
        )
    }

    pub fn write_credentials(&self, credentials: &TemporaryCredentials) -> Result<()> {
        update_section(
            &self.credentials_path,
            &self.profile,
            &[
                ("aws_access_key_id", credentials.access_key_id.as_str()),
                ("aws_secret_access_key", credentials.secret_access_key.as_str()),
                ("aws_session_token", credentials.session_token.as_str()),
            ],
        )
    }
}

fn update_section(path: &Path, section: &str, entries: &[(&str, &str)]) -> Result<()> {
    let profile_error = |message: String| Error::Profile {
        path: path.to_path_buf(),
        message,
    };

    let mut ini = Ini::new_cs();
    ini.set_default_section(TOP_LEVEL_SECTION);
    // Nested settings such as `s3 =` keep their indented lines.
    ini.set_multiline(true);

    if path.exists() {
        ini.load(path).map_err(profile_error)?;
    } else if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| profile_error(e.to_string()))?;
    }

    for (key, value) in entries {
        ini.set(section, key, Some(value.to_string()));
    }

    ini.write(path).map_err(|e| profile_error(e.to_string()))?;
    log::debug!("updated [{}] in {}", section, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn writer(dir: &Path, profile: &str) -> ProfileWriter {
        ProfileWriter::new(
            dir.join(".aws").join("config"),
            dir.join(".aws").join("credentials"),
            profile,
        )
    }

    fn credentials() -> TemporaryCredentials {
        TemporaryCredentials {
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "secret/key+value".to_string(),
            session_token: "FwoGZXIvYXdzEXAMPLE==".to_string(),
            expiration: Utc::now(),
        }
    }

    fn read(path: &Path) -> Ini {
        let mut ini = Ini::new_cs();
        ini.set_default_section(TOP_LEVEL_SECTION);
        ini.set_multiline(true);
        ini.load(path).unwrap();
        ini
    }

    #[test]
    fn creates_missing_files_and_sections() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path(), "saml");

        writer.write_config("us-east-1", "json").unwrap();
        writer.write_credentials(&credentials()).unwrap();

        let config = read(&writer.config_path);
        assert_eq!(config.get("profile saml", "region").as_deref(), Some("us-east-1"));
        assert_eq!(config.get("profile saml", "output").as_deref(), Some("json"));

        let creds = read(&writer.credentials_path);
        assert_eq!(creds.get("saml", "aws_access_key_id").as_deref(), Some("ASIAEXAMPLE"));
        assert_eq!(
            creds.get("saml", "aws_secret_access_key").as_deref(),
            Some("secret/key+value")
        );
        assert_eq!(
            creds.get("saml", "aws_session_token").as_deref(),
            Some("FwoGZXIvYXdzEXAMPLE==")
        );
    }

    #[test]
    fn other_profiles_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path(), "saml");
        fs::create_dir_all(writer.credentials_path.parent().unwrap()).unwrap();
        fs::write(
            &writer.credentials_path,
            "[default]\naws_access_key_id = AKIADEFAULT\naws_secret_access_key = DefaultSecret\n\n\
             [saml]\naws_access_key_id = OLD\nRegion_Hint = keep\n",
        )
        .unwrap();

        writer.write_credentials(&credentials()).unwrap();

        let text = fs::read_to_string(&writer.credentials_path).unwrap();
        assert!(text.contains("[default]"));

        let creds = read(&writer.credentials_path);
        assert_eq!(creds.get("default", "aws_access_key_id").as_deref(), Some("AKIADEFAULT"));
        assert_eq!(
            creds.get("default", "aws_secret_access_key").as_deref(),
            Some("DefaultSecret")
        );
        assert_eq!(creds.get("saml", "aws_access_key_id").as_deref(), Some("ASIAEXAMPLE"));
        assert_eq!(creds.get("saml", "Region_Hint").as_deref(), Some("keep"));
    }

    #[test]
    fn nested_settings_of_other_profiles_survive() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path(), "saml");
        fs::create_dir_all(writer.config_path.parent().unwrap()).unwrap();
        fs::write(
            &writer.config_path,
            "[profile dev]\nregion = eu-west-1\ns3 =\n  max_concurrent_requests = 20\n  max_queue_size = 10000\n",
        )
        .unwrap();

        writer.write_config("us-east-1", "json").unwrap();

        let text = fs::read_to_string(&writer.config_path).unwrap();
        assert!(!text.contains("\nmax_concurrent_requests"), "{}", text);
        assert!(!text.contains("\nmax_queue_size"), "{}", text);

        let config = read(&writer.config_path);
        assert_eq!(config.get("profile dev", "region").as_deref(), Some("eu-west-1"));
        assert_eq!(config.get("profile dev", "max_concurrent_requests"), None);
        let s3 = config.get("profile dev", "s3").unwrap();
        assert!(s3.contains("max_concurrent_requests = 20"), "{}", s3);
        assert!(s3.contains("max_queue_size = 10000"), "{}", s3);
        assert_eq!(config.get("profile saml", "region").as_deref(), Some("us-east-1"));
    }

    #[test]
    fn default_profile_uses_plain_section_in_config() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(writer(dir.path(), "default").config_section(), "default");
        assert_eq!(writer(dir.path(), "saml").config_section(), "profile saml");
    }
}
