use crate::aws::{select_role, AwsRole, TemporaryCredentials, TokenExchanger};
use crate::error::Result;
use crate::identity_provider::{Credentials, IdentityProvider};
use crate::ui::UI;

#[derive(Debug)]
pub struct LoginOutcome {
    pub role: AwsRole,
    pub credentials: TemporaryCredentials,
}

/// Logs in to the identity provider and trades the assertion for temporary AWS
/// credentials.
///
/// The user is asked through `ui` only when the assertion grants more than one
/// role and `role_index` is `None`. The first failure ends the run.
pub async fn login(
    idp: &dyn IdentityProvider,
    exchanger: &dyn TokenExchanger,
    ui: &dyn UI,
    credentials: Credentials,
    role_index: Option<&str>,
) -> Result<LoginOutcome> {
    let assertion = idp.get_saml_assertion(credentials).await?;

    let roles = assertion.extract_roles()?;
    log::debug!("assertion grants {} role(s)", roles.len());

    let prompted = match role_index {
        None if roles.len() > 1 => Some(ui.get_aws_role(&roles)),
        _ => None,
    };
    let role = select_role(&roles, role_index.or(prompted.as_deref()))?.clone();
    log::debug!("selected role: {}", role);

    let credentials = exchanger.get_sts_token(&role, &assertion).await?;

    Ok(LoginOutcome { role, credentials })
}
