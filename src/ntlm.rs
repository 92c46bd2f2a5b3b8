//! NTLM over HTTP: the `Authorization`/`WWW-Authenticate` token exchange.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};
use zeroize::Zeroize;

use crate::error::{Error, Result};
use crate::identity_provider::Credentials;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthScheme {
    Ntlm,
    Negotiate,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Ntlm => "NTLM",
            AuthScheme::Negotiate => "Negotiate",
        }
    }

    /// The scheme to answer a 401 with. `NTLM` is preferred; raw NTLM tokens are
    /// also accepted under `Negotiate` by IIS.
    pub fn offered(headers: &HeaderMap) -> Option<Self> {
        let offered: Vec<AuthScheme> = headers
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .filter_map(|challenge| {
                let scheme = challenge.split_whitespace().next()?;
                if scheme.eq_ignore_ascii_case("NTLM") {
                    Some(AuthScheme::Ntlm)
                } else if scheme.eq_ignore_ascii_case("Negotiate") {
                    Some(AuthScheme::Negotiate)
                } else {
                    None
                }
            })
            .collect();

        offered
            .iter()
            .find(|s| **s == AuthScheme::Ntlm)
            .or_else(|| offered.first())
            .copied()
    }

    /// The base64 token following this scheme in a `WWW-Authenticate` header.
    pub fn challenge<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| {
                let (scheme, token) = value.trim().split_once(' ')?;
                let token = token.trim();
                (scheme.eq_ignore_ascii_case(self.as_str()) && !token.is_empty()).then_some(token)
            })
    }

    pub fn header_value(&self, token: &str) -> String {
        format!("{} {}", self.as_str(), token)
    }
}

/// `DOMAIN\user` becomes `("DOMAIN", "user")`; anything else is sent with an
/// empty domain.
pub fn split_username(username: &str) -> (&str, &str) {
    username.split_once('\\').unwrap_or(("", username))
}

/// Type 1 message, base64 encoded.
pub fn negotiate_message() -> Result<String> {
    let flags = ntlmclient::Flags::NEGOTIATE_UNICODE
        | ntlmclient::Flags::REQUEST_TARGET
        | ntlmclient::Flags::NEGOTIATE_NTLM;

    let message = ntlmclient::Message::Negotiate(ntlmclient::NegotiateMessage {
        flags,
        supplied_domain: String::new(),
        supplied_workstation: String::new(),
        os_version: Default::default(),
    });

    let bytes = message
        .to_bytes()
        .map_err(|_| Error::Ntlm("cannot encode negotiate message".to_string()))?;
    Ok(STANDARD.encode(bytes))
}

/// Type 3 message answering the server's base64 Type 2 `challenge`, base64
/// encoded.
pub fn authenticate_message(challenge: &str, credentials: &Credentials) -> Result<String> {
    let challenge_bytes = STANDARD
        .decode(challenge)
        .map_err(|_| Error::Ntlm("challenge is not valid base64".to_string()))?;

    let challenge = match ntlmclient::Message::try_from(challenge_bytes.as_slice()) {
        Ok(ntlmclient::Message::Challenge(challenge)) => challenge,
        Ok(_) => return Err(Error::Ntlm("server did not send a challenge".to_string())),
        Err(_) => return Err(Error::Ntlm("cannot decode challenge message".to_string())),
    };

    let target_info: Vec<u8> = challenge
        .target_information
        .iter()
        .flat_map(|entry| entry.to_bytes())
        .collect();

    let (domain, user) = split_username(credentials.username());
    let mut ntlm_credentials = ntlmclient::Credentials {
        username: user.to_string(),
        password: credentials.password().to_string(),
        domain: domain.to_string(),
    };

    let response = ntlmclient::respond_challenge_ntlm_v2(
        challenge.challenge,
        &target_info,
        ntlmclient::get_ntlm_time(),
        &ntlm_credentials,
    );

    let flags = ntlmclient::Flags::NEGOTIATE_UNICODE | ntlmclient::Flags::NEGOTIATE_NTLM;
    let message = response.to_message(&ntlm_credentials, "", flags);
    ntlm_credentials.password.zeroize();

    let bytes = message
        .to_bytes()
        .map_err(|_| Error::Ntlm("cannot encode authenticate message".to_string()))?;
    Ok(STANDARD.encode(bytes))
}
