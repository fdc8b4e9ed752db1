//! Connection settings for the live update channel.

use reqwest::Url;

use crate::error::ClientError;

/// Fixed server path of the event stream
pub const EVENTS_PATH: &str = "/events";

/// Where and how to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Full URL of the event stream
    pub url: Url,
    /// Whether credentials accompany the request
    pub with_credentials: bool,
    /// Cookie header sent when `with_credentials` is set
    pub credentials_cookie: Option<String>,
}

impl ChannelConfig {
    /// Connect to `url` without credentials
    pub fn new(url: Url) -> Self {
        Self {
            url,
            with_credentials: false,
            credentials_cookie: None,
        }
    }

    /// Connect to the event stream of the server at `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn for_server(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                base.scheme()
            )));
        }
        let url = base
            .join(EVENTS_PATH)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        Ok(Self::new(url))
    }

    /// Send credentials, optionally with an explicit cookie
    pub fn with_credentials(mut self, cookie: Option<String>) -> Self {
        self.with_credentials = true;
        self.credentials_cookie = cookie;
        self
    }

    /// Cookie header value to attach, if any
    pub fn cookie_header(&self) -> Option<&str> {
        if self.with_credentials {
            self.credentials_cookie.as_deref()
        } else {
            None
        }
    }
}
