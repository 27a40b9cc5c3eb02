//! Transport backends for feed retrieval.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

/// How a feed is requested.
#[derive(Debug, Clone)]
pub enum FetchMethod {
    /// Plain GET of the feed URL.
    Get,
    /// Form POST with credentials, as used by authenticated element feeds.
    ///
    /// The feed URL is the login endpoint; the query URL is sent along with
    /// the credentials and the response body is the query result.
    LoginQuery {
        /// Account identity.
        identity: String,
        /// Account password.
        password: SecretString,
        /// Query to run after logging in.
        query: String,
    },
}

/// Trait for feed transports.
///
/// This trait allows for different retrieval implementations (HTTP, mock for testing).
pub trait Transport {
    /// Retrieves the body of a feed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if the feed cannot be retrieved or the
    /// server answers with a non-success status.
    fn fetch(&self, url: &str, method: &FetchMethod) -> Result<String>;
}

/// Blocking HTTP transport using reqwest.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("satlog/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!("Failed to build HTTP client: {err}");
                reqwest::blocking::Client::new()
            });
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str, method: &FetchMethod) -> Result<String> {
        let fetch_error = |cause: String| Error::Fetch {
            url: url.to_string(),
            cause,
        };

        let request = match method {
            FetchMethod::Get => self.client.get(url),
            FetchMethod::LoginQuery {
                identity,
                password,
                query,
            } => self.client.post(url).form(&[
                ("identity", identity.as_str()),
                ("password", password.expose_secret()),
                ("query", query.as_str()),
            ]),
        };

        let response = request.send().map_err(|e| fetch_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status}")));
        }
        response.text().map_err(|e| fetch_error(e.to_string()))
    }
}
