use std::time::Duration;

use crate::error::Result;

const MAX_REDIRECTS: usize = 10;

pub struct HttpOptions<'a> {
    pub user_agent: &'a str,
    pub ssl_verification: bool,
    pub timeout: Duration,
}

/// Client for talking to the identity provider.
///
/// NTLM authenticates the TCP connection, so requests stay on HTTP/1.1 and
/// share one pooled connection per host.
pub fn create_http_client_with_redirects(options: &HttpOptions) -> Result<reqwest::Client> {
    if !options.ssl_verification {
        log::warn!("TLS certificate verification is disabled");
    }

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::custom(|attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else {
                attempt.follow()
            }
        }))
        .user_agent(options.user_agent)
        .danger_accept_invalid_certs(!options.ssl_verification)
        .timeout(options.timeout)
        .cookie_store(true)
        .http1_only()
        .pool_max_idle_per_host(1)
        .build()?;
    Ok(client)
}
