use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Response, StatusCode};
use url::Url;

use crate::error::{Error, Result};
use crate::identity_provider::{Credentials, IdentityProvider};
use crate::ntlm::{self, AuthScheme};
use crate::saml::SAMLAssertion;

/// AD FS IdP-initiated sign-on behind Windows integrated authentication.
pub struct Adfs<'a> {
    pub http_client: &'a reqwest::Client,
    pub idp_entry_url: &'a Url,
}

impl<'a> Adfs<'a> {
    /// Fetches the sign-on page, answering an NTLM challenge when the server
    /// asks for one, and returns the HTML body.
    pub async fn fetch(&self, credentials: Credentials) -> Result<String> {
        log::debug!("idp entry url: {}", self.idp_entry_url);

        let response = self
            .http_client
            .get(self.idp_entry_url.clone())
            .send()
            .await?;

        let response = match AuthScheme::offered(response.headers()) {
            Some(scheme) if response.status() == StatusCode::UNAUTHORIZED => {
                self.ntlm_handshake(response, scheme, &credentials).await?
            }
            _ => response,
        };
        drop(credentials);

        let status = response.status();
        log::debug!("sign-on response: {} from {}", status, response.url());

        if status != StatusCode::OK {
            return Err(Error::Authentication {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    async fn ntlm_handshake(
        &self,
        unauthorized: Response,
        scheme: AuthScheme,
        credentials: &Credentials,
    ) -> Result<Response> {
        let url = unauthorized.url().clone();
        log::debug!("{} authentication requested by {}", scheme.as_str(), url);
        // Drain the body so the connection goes back to the pool.
        unauthorized.bytes().await?;

        let challenged = self
            .http_client
            .get(url.clone())
            .header(AUTHORIZATION, scheme.header_value(&ntlm::negotiate_message()?))
            .send()
            .await?;

        let token = match scheme.challenge(challenged.headers()) {
            Some(token) if challenged.status() == StatusCode::UNAUTHORIZED => token.to_string(),
            _ => {
                log::debug!("no {} challenge, status {}", scheme.as_str(), challenged.status());
                return Ok(challenged);
            }
        };
        challenged.bytes().await?;

        let authenticate = ntlm::authenticate_message(&token, credentials)?;
        let response = self
            .http_client
            .get(url)
            .header(AUTHORIZATION, scheme.header_value(&authenticate))
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl<'a> IdentityProvider for Adfs<'a> {
    async fn get_saml_assertion(&self, credentials: Credentials) -> Result<SAMLAssertion> {
        let body = self.fetch(credentials).await?;
        SAMLAssertion::from_html(&body)
    }
}
