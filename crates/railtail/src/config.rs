//! Stream configuration.
//!
//! Configuration for the log stream subscriber, including:
//! - Provider credentials and the environment to follow
//! - Query API and subscription endpoints
//! - Backlog, timeout and reconnect settings
//!
//! A file only needs the values it wants to change; secrets usually come from
//! the environment through the CLI. Call [`StreamConfig::validate`] once all
//! sources are applied.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::StreamError;
use crate::subscription::{ReconnectConfig, SubscriptionConfig};

/// Default provider query API.
pub const DEFAULT_API_URL: &str = "https://backboard.railway.app/graphql/v2";
/// Default provider subscription endpoint.
pub const DEFAULT_SUBSCRIPTION_URL: &str = "wss://backboard.railway.app/graphql/internal";

/// Main stream configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StreamConfig {
    /// Provider API token, presented as a bearer token.
    pub api_key: String,
    /// Environment whose logs are followed.
    pub environment_id: String,
    /// Services to scope the subscription to; empty means all.
    pub service_ids: Vec<String>,
    /// Extra provider filter expression.
    pub filter: Option<String>,
    /// GraphQL query endpoint.
    pub api_url: String,
    /// GraphQL subscription (websocket) endpoint.
    pub subscription_url: String,
    /// Historical records requested on each (re)subscribe.
    pub backlog_limit: i64,
    /// How far back the backlog anchor sits, in seconds.
    pub backlog_window_secs: u64,
    /// Bound on dial plus acknowledgement, in seconds.
    pub connect_timeout_secs: u64,
    /// Metadata query timeout, in seconds.
    pub request_timeout_secs: u64,
    /// Batches buffered between the stream and the sink.
    pub sink_capacity: usize,
    /// First delay after a failed connection attempt, in milliseconds.
    pub reconnect_initial_delay_ms: u64,
    /// Cap on the delay between failed connection attempts, in seconds.
    pub reconnect_max_delay_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            environment_id: String::new(),
            service_ids: Vec::new(),
            filter: None,
            api_url: DEFAULT_API_URL.to_string(),
            subscription_url: DEFAULT_SUBSCRIPTION_URL.to_string(),
            backlog_limit: 500,
            backlog_window_secs: 300,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            sink_capacity: 64,
            reconnect_initial_delay_ms: 250,
            reconnect_max_delay_secs: 30,
        }
    }
}

impl fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConfig")
            .field("api_key", &"<redacted>")
            .field("environment_id", &self.environment_id)
            .field("service_ids", &self.service_ids)
            .field("filter", &self.filter)
            .field("api_url", &self.api_url)
            .field("subscription_url", &self.subscription_url)
            .field("backlog_limit", &self.backlog_limit)
            .field("backlog_window_secs", &self.backlog_window_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("sink_capacity", &self.sink_capacity)
            .field("reconnect_initial_delay_ms", &self.reconnect_initial_delay_ms)
            .field("reconnect_max_delay_secs", &self.reconnect_max_delay_secs)
            .finish()
    }
}

impl StreamConfig {
    /// Configuration with defaults for everything but the credentials.
    #[must_use]
    pub fn new(api_key: impl Into<String>, environment_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            environment_id: environment_id.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            StreamError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, StreamError> {
        toml::from_str(content).map_err(|e| StreamError::Config(format!("invalid TOML: {e}")))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.api_key.is_empty() {
            return Err(StreamError::Config("api key must be present".to_string()));
        }

        if self.environment_id.is_empty() {
            return Err(StreamError::Config(
                "environment id must be present".to_string(),
            ));
        }

        if self.service_ids.iter().any(String::is_empty) {
            return Err(StreamError::Config(
                "service ids cannot be empty strings".to_string(),
            ));
        }

        check_url("api_url", &self.api_url, &["http", "https"])?;
        check_url("subscription_url", &self.subscription_url, &["ws", "wss"])?;

        if self.backlog_limit < 0 {
            return Err(StreamError::Config(
                "backlog_limit cannot be negative".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(StreamError::Config(
                "connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(StreamError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.sink_capacity == 0 {
            return Err(StreamError::Config(
                "sink_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Connection establishment bound.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Metadata query timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Backoff applied between failed connection attempts.
    #[must_use]
    pub fn reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(self.reconnect_initial_delay_ms),
            max_delay: Duration::from_secs(self.reconnect_max_delay_secs),
            ..ReconnectConfig::default()
        }
    }

    /// Filter expression sent with the subscription: service scoping
    /// combined with the user filter.
    #[must_use]
    pub fn subscription_filter(&self) -> Option<String> {
        let services = match self.service_ids.as_slice() {
            [] => None,
            [id] => Some(format!("@service:{id}")),
            ids => Some(format!(
                "({})",
                ids.iter()
                    .map(|id| format!("@service:{id}"))
                    .collect::<Vec<_>>()
                    .join(" OR ")
            )),
        };

        let filter = self.filter.as_deref().filter(|f| !f.trim().is_empty());

        match (services, filter) {
            (Some(services), Some(filter)) => Some(format!("{services} AND {filter}")),
            (Some(services), None) => Some(services),
            (None, Some(filter)) => Some(filter.to_string()),
            (None, None) => None,
        }
    }

    /// Subscription request for a (re)subscribe issued at `now`.
    #[must_use]
    pub fn subscription_config(&self, now: DateTime<Utc>) -> SubscriptionConfig {
        let window = i64::try_from(self.backlog_window_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or_else(TimeDelta::zero);

        SubscriptionConfig {
            environment_id: self.environment_id.clone(),
            filter: self.subscription_filter(),
            since: now.checked_sub_signed(window).unwrap_or(now),
            backlog_limit: self.backlog_limit,
        }
    }
}

fn check_url(field: &str, value: &str, schemes: &[&str]) -> Result<(), StreamError> {
    if value.is_empty() {
        return Err(StreamError::Config(format!("{field} cannot be empty")));
    }

    let url = Url::parse(value)
        .map_err(|e| StreamError::Config(format!("{field} is not a valid URL: {e}")))?;

    if !schemes.contains(&url.scheme()) {
        return Err(StreamError::Config(format!(
            "{field} must use one of: {}",
            schemes
                .iter()
                .map(|s| format!("{s}://"))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    Ok(())
}
