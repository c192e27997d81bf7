//! HTTP transport for source adapters.
//!
//! Adapters talk to the network only through [`Fetch`], so they can be driven by
//! a stub in tests and the aggregator never sees a transport type.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Settings;
use crate::error::{AppError, SourceError};

/// Blocking GET returning the raw body of a 2xx response.
pub trait Fetch {
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        debug!(url, "GET");
        let resp = self.client.get(url).send().map_err(|e| SourceError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().map_err(|e| SourceError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(body.to_vec())
    }
}

/// GET `url` and decode the body as JSON.
pub fn get_json<T: DeserializeOwned>(fetch: &dyn Fetch, url: &str) -> Result<T, SourceError> {
    let body = fetch.get(url)?;
    serde_json::from_slice(&body).map_err(|e| SourceError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}


#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::stub::StubFetch;
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        n: i32,
    }

    #[test]
    fn get_json_decodes_body() {
        let fetch = StubFetch::new().route("/ok", r#"{"n": 7}"#);
        let p: Payload = get_json(&fetch, "https://x/ok").unwrap();
        assert_eq!(p.n, 7);
    }

    #[test]
    fn get_json_reports_decode_errors() {
        let fetch = StubFetch::new().route("/bad", "<html>");
        let err = get_json::<Payload>(&fetch, "https://x/bad").unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn unrouted_urls_fail_like_a_network_error() {
        let fetch = StubFetch::new();
        let err = fetch.get("https://nowhere").unwrap_err();
        assert!(err.is_transient());
    }
}
