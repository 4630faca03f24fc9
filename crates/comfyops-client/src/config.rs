//! Public configuration for the workflow execution client.

use std::time::Duration;

/// Default ComfyUI listen address.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default ComfyUI listen port.
pub const DEFAULT_PORT: u16 = 8188;

/// Configuration for the workflow execution client.
///
/// Use the builder methods to customize the client configuration.
///
/// # Example
///
/// ```
/// use comfyops_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::from_host_port("10.0.0.5", 8188)
///     .with_poll_interval(Duration::from_secs(2))
///     .with_timeout(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base HTTP URL, e.g. `http://127.0.0.1:8188`
    pub(crate) base_url: String,
    /// User agent string for HTTP requests
    pub(crate) user_agent: String,
    /// Timeout for a single HTTP request
    pub(crate) request_timeout: Duration,
    /// Consecutive transient poll failures tolerated before giving up
    pub(crate) max_poll_retries: u32,
    /// Delay between polls
    pub(crate) poll_interval: Duration,
    /// Overall budget for `await_completion`
    pub(crate) timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://{DEFAULT_HOST}:{DEFAULT_PORT}"),
            user_agent: concat!("comfyops/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(30),
            max_poll_retries: 3,
            poll_interval: Duration::from_millis(1500),
            timeout: Duration::from_secs(300),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration targeting `http://{host}:{port}`.
    #[must_use]
    pub fn from_host_port(host: &str, port: u16) -> Self {
        Self::default().with_base_url(format!("http://{host}:{port}"))
    }

    /// Set the base URL. A trailing slash is ignored.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout. Defaults to 30 seconds.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set how many consecutive transient poll failures are tolerated.
    ///
    /// Defaults to 3.
    #[must_use]
    pub const fn with_max_poll_retries(mut self, retries: u32) -> Self {
        self.max_poll_retries = retries;
        self
    }

    /// Set the delay between polls. Defaults to 1.5 seconds.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the completion budget. Defaults to 300 seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}
