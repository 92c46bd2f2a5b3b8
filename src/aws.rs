use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_sts::config::Region;
use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata};
use chrono::{DateTime, Utc};
use zeroize::ZeroizeOnDrop;

use crate::error::{Error, Result};
use crate::saml::SAMLAssertion;

/// Marks the identity-provider half of a role attribute value.
const PROVIDER_MARKER: &str = "saml-provider";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AwsRole {
    pub role_arn: String,
    pub principal_arn: String,
}

impl AwsRole {
    pub fn new(role_arn: String, principal_arn: String) -> Self {
        Self {
            role_arn,
            principal_arn,
        }
    }

    /// Returns the pair in `(role, principal)` order.
    ///
    /// Identity providers disagree on which ARN comes first, so the ARN naming a
    /// `saml-provider` resource is taken as the principal. A pair where both or
    /// neither ARN names one is rejected.
    pub fn normalized(&self) -> Result<Self> {
        let first_is_provider = self.role_arn.contains(PROVIDER_MARKER);
        let second_is_provider = self.principal_arn.contains(PROVIDER_MARKER);

        match (first_is_provider, second_is_provider) {
            (false, true) => Ok(self.clone()),
            (true, false) => Ok(Self::new(
                self.principal_arn.clone(),
                self.role_arn.clone(),
            )),
            _ => Err(Error::AmbiguousRole {
                raw: format!("{},{}", self.role_arn, self.principal_arn),
            }),
        }
    }
}

impl FromStr for AwsRole {
    type Err = Error;

    /// Splits a raw `first,second` attribute value on its first comma, keeping
    /// the source order.
    fn from_str(raw: &str) -> Result<Self> {
        let malformed = || Error::MalformedRole {
            raw: raw.to_string(),
        };

        let (first, second) = raw.trim().split_once(',').ok_or_else(malformed)?;
        let (first, second) = (first.trim(), second.trim());
        if first.is_empty() || second.is_empty() {
            return Err(malformed());
        }

        Ok(Self::new(first.to_string(), second.to_string()))
    }
}

impl fmt::Display for AwsRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.role_arn, self.principal_arn)
    }
}

/// Puts every pair in `(role, principal)` order, keeping positions.
pub fn normalize_roles(roles: &[AwsRole]) -> Result<Vec<AwsRole>> {
    roles.iter().map(AwsRole::normalized).collect()
}

/// Picks the role to assume.
///
/// A single candidate is returned whatever was requested. With more than one,
/// `requested` must be an in-range, 0-based index.
pub fn select_role<'a>(roles: &'a [AwsRole], requested: Option<&str>) -> Result<&'a AwsRole> {
    match roles {
        [] => Err(Error::NoRolesAvailable),
        [only] => Ok(only),
        _ => {
            let input = requested.unwrap_or_default().trim();
            input
                .parse::<usize>()
                .ok()
                .and_then(|index| roles.get(index))
                .ok_or_else(|| Error::InvalidSelection {
                    input: input.to_string(),
                    count: roles.len(),
                })
        }
    }
}

#[derive(Clone, ZeroizeOnDrop)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    #[zeroize(skip)]
    pub expiration: DateTime<Utc>,
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[async_trait]
pub trait TokenExchanger {
    async fn get_sts_token(
        &self,
        role: &AwsRole,
        assertion: &SAMLAssertion,
    ) -> Result<TemporaryCredentials>;
}

/// Anonymous STS client; the SAML assertion is the only proof of identity.
pub struct AwsClient {
    sts: aws_sdk_sts::Client,
}

impl AwsClient {
    pub async fn new(region: &str, timeout: Duration) -> Self {
        Self::with_endpoint(region, timeout, None).await
    }

    pub async fn with_endpoint(region: &str, timeout: Duration, endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .no_credentials()
            .retry_config(RetryConfig::disabled())
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());

        if let Some(endpoint_url) = endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let config = loader.load().await;
        Self {
            sts: aws_sdk_sts::Client::new(&config),
        }
    }
}

#[async_trait]
impl TokenExchanger for AwsClient {
    async fn get_sts_token(
        &self,
        role: &AwsRole,
        assertion: &SAMLAssertion,
    ) -> Result<TemporaryCredentials> {
        log::debug!("assuming {} via {}", role.role_arn, role.principal_arn);

        let output = self
            .sts
            .assume_role_with_saml()
            .role_arn(&role.role_arn)
            .principal_arn(&role.principal_arn)
            .saml_assertion(assertion.as_base64())
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) => Error::Exchange(format!(
                    "{}: {}",
                    service.code().unwrap_or("Unknown"),
                    service.message().unwrap_or("no message")
                )),
                None => Error::Exchange(DisplayErrorContext(&err).to_string()),
            })?;

        let credentials = output
            .credentials()
            .ok_or_else(|| Error::Exchange("response contained no credentials".to_string()))?;

        let expiration = credentials.expiration();
        let expiration = DateTime::<Utc>::from_timestamp(expiration.secs(), expiration.subsec_nanos())
            .ok_or_else(|| Error::Exchange("credential expiration is out of range".to_string()))?;

        Ok(TemporaryCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration,
        })
    }
}
