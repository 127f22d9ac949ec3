//! Configuration for the automation client.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::auth::{AuthScheme, BasicAuth, Credentials, DigestAuth};

/// Configuration for an `AutomationClient`.
///
/// Credentials and the auth scheme are fixed at construction and shared
/// by every request the client makes.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Control-plane base URL (scheme, host, port).
    pub base_url: Url,

    /// Automation group the client operates on.
    pub group_id: String,

    /// API credentials.
    pub credentials: Credentials,

    /// Auth scheme answering for the credentials.
    pub scheme: Arc<dyn AuthScheme>,

    /// Timeout for individual requests.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a config with the default digest scheme and timeout.
    pub fn new(base_url: Url, group_id: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url,
            group_id: group_id.into(),
            credentials,
            scheme: Arc::new(DigestAuth),
            timeout: default_timeout(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Switch to preemptive basic auth.
    #[must_use]
    pub fn with_basic_auth(mut self) -> Self {
        self.scheme = Arc::new(BasicAuth);
        self
    }

    /// Inject a custom auth scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: Arc<dyn AuthScheme>) -> Self {
        self.scheme = scheme;
        self
    }
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}
