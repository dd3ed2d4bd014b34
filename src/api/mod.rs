pub mod endpoint;
pub mod error;
pub mod response;

pub use error::Error;

use crate::model::{Credentials, FieldMap};
use response::{classify, Outcome, RealtimeResponse};

use std::sync::Mutex;
use std::time::Duration;

/* Wire parameter names are fixed by the remote API. */
const TOKEN_PARAM: &str = "tokenId";
const SERIAL_PARAM: &str = "sn";

const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trailing characters of a secret kept visible in diagnostics.
const REDACT_KEEP: usize = 4;

/// Client for the SolaX Cloud realtime endpoint.
///
/// A fetch sweeps the candidate endpoints sequentially, remembering the last
/// successful one as a sticky preference for the next call. Sticky state is
/// in-memory only; callers serialize `fetch()` invocations per credential
/// pair.
pub struct FetchClient {
    credentials: Credentials,
    candidates: Vec<String>,
    sticky: Mutex<Option<String>>,
    client: reqwest::Client,
}

impl FetchClient {
    pub fn new(credentials: Credentials) -> Result<FetchClient, Error> {
        let candidates = endpoint::candidates(credentials.api_base_url.as_deref());
        FetchClient::with_candidates(credentials, candidates)
    }

    /// Build a client against an explicit candidate list instead of the
    /// built-in endpoint catalog.
    pub fn with_candidates(
        credentials: Credentials,
        candidates: Vec<String>,
    ) -> Result<FetchClient, Error> {
        let client = reqwest::ClientBuilder::new()
            .timeout(ATTEMPT_TIMEOUT)
            .build()
            .or(Err(Error::InternalError))?;

        Ok(FetchClient {
            credentials,
            candidates,
            sticky: Mutex::new(None),
            client,
        })
    }

    /// Endpoint that served the most recent successful fetch, if any.
    pub fn sticky_endpoint(&self) -> Option<String> {
        self.sticky.lock().ok().and_then(|sticky| sticky.clone())
    }

    fn set_sticky(&self, url: Option<&str>) {
        if let Ok(mut sticky) = self.sticky.lock() {
            *sticky = url.map(String::from);
        } else {
            log::trace!("unable to lock sticky endpoint mutex, keeping previous value")
        }
    }

    /// Attempt order for one fetch: sticky endpoint first, then every other
    /// candidate in catalog order. At most one attempt per unique URL.
    fn attempt_order(&self) -> Vec<String> {
        let mut order = Vec::with_capacity(self.candidates.len() + 1);
        if let Some(url) = self.sticky_endpoint() {
            order.push(url);
        }
        for url in &self.candidates {
            if !order.contains(url) {
                order.push(url.clone());
            }
        }
        order
    }

    /// Fetch the realtime field map, sweeping candidates until one succeeds.
    ///
    /// Auth rejections stop the sweep immediately: a wrong credential pair
    /// cannot be fixed by another endpoint. Transient failures fall through
    /// to the next candidate; if every candidate fails, the last transient
    /// failure is returned. Retrying across calls is the scheduler's job.
    pub async fn fetch(&self) -> Result<FieldMap, Error> {
        let mut last_failure: Option<Error> = None;

        for url in self.attempt_order() {
            match self.attempt(&url).await {
                Outcome::Success(result) => {
                    self.set_sticky(Some(&url));
                    return Ok(result);
                }
                Outcome::Auth(message) => {
                    log::error!(
                        "authentication rejected for serial {}: {}",
                        redact(&self.credentials.serial_number),
                        message
                    );
                    return Err(Error::AuthError(message));
                }
                Outcome::Transient(error) => {
                    log::warn!("endpoint {} failed: {:?}", url, error);
                    if self.sticky_endpoint().as_deref() == Some(url.as_str()) {
                        self.set_sticky(None);
                    }
                    last_failure = Some(error);
                }
            }
        }

        let error = last_failure
            .unwrap_or_else(|| Error::ConnectionError("could not connect to the SolaX Cloud API".to_string()));
        log::error!(
            "all endpoints exhausted for serial {}: {:?}",
            redact(&self.credentials.serial_number),
            error
        );
        Err(error)
    }

    /// One bounded-time GET against `url`, classified into an `Outcome`.
    async fn attempt(&self, url: &str) -> Outcome {
        log::debug!(
            "requesting realtime data from {} for serial {}",
            url,
            redact(&self.credentials.serial_number)
        );

        let request = self.client.get(url).query(&[
            (TOKEN_PARAM, self.credentials.token_id.as_str()),
            (SERIAL_PARAM, self.credentials.serial_number.as_str()),
        ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Outcome::Transient(map_transport_err(e)),
        };

        let status = response.status();
        if !status.is_success() {
            return Outcome::Transient(map_status_err(status));
        }

        match response.json::<RealtimeResponse>().await {
            Ok(payload) => classify(payload),
            Err(e) => Outcome::Transient(Error::InvalidResponse(e.to_string())),
        }
    }
}

fn map_transport_err(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::ConnectionError(format!(
            "timeout while communicating with the SolaX Cloud API: {}",
            error
        ))
    } else {
        Error::ConnectionError(error.to_string())
    }
}

/// Map a non-2xx HTTP status to Error.
fn map_status_err(status: http::StatusCode) -> Error {
    match status {
        http::StatusCode::TOO_MANY_REQUESTS => {
            Error::ConnectionError("rate limited by the SolaX Cloud API".to_string())
        }
        _ => Error::ConnectionError(format!("server responded {}", status)),
    }
}

/// Mask a secret for diagnostics, keeping only the trailing characters.
pub fn redact(value: &str) -> String {
    let length = value.chars().count();
    if length <= REDACT_KEEP {
        return "*".repeat(length);
    }
    let suffix: String = value.chars().skip(length - REDACT_KEEP).collect();
    format!("{}{}", "*".repeat(length - REDACT_KEEP), suffix)
}

#[cfg(test)]
mod test {
    use super::{redact, FetchClient};
    use crate::model::Credentials;

    fn credentials() -> Credentials {
        Credentials {
            token_id: "20211222222222222".to_string(),
            serial_number: "SWX12345678".to_string(),
            api_base_url: None,
        }
    }

    #[test]
    fn redact_keeps_trailing_suffix_only() {
        assert_eq!(redact("SWX12345678"), "*******5678");
        assert_eq!(redact("abcd"), "****");
        assert_eq!(redact("ab"), "**");
        assert_eq!(redact(""), "");
    }

    #[test]
    fn attempt_order_without_sticky_matches_candidates() {
        let candidates = vec!["https://a".to_string(), "https://b".to_string()];
        let client = FetchClient::with_candidates(credentials(), candidates.clone()).unwrap();
        assert_eq!(client.attempt_order(), candidates);
    }

    #[test]
    fn attempt_order_puts_sticky_first_without_duplicating_it() {
        let candidates = vec!["https://a".to_string(), "https://b".to_string()];
        let client = FetchClient::with_candidates(credentials(), candidates).unwrap();
        client.set_sticky(Some("https://b"));
        assert_eq!(
            client.attempt_order(),
            vec!["https://b".to_string(), "https://a".to_string()]
        );
    }

    #[test]
    fn clearing_sticky_restores_catalog_order() {
        let candidates = vec!["https://a".to_string(), "https://b".to_string()];
        let client = FetchClient::with_candidates(credentials(), candidates.clone()).unwrap();
        client.set_sticky(Some("https://b"));
        client.set_sticky(None);
        assert_eq!(client.attempt_order(), candidates);
    }
}
