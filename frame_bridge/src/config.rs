//! Channel configuration

use crate::error::ConfigError;
use bridge_envelope::DEFAULT_PROTOCOL_TAG;
use bridge_types::{ContextId, Duration, RemoteOrigin};
use serde::{Deserialize, Serialize};

/// Response timeout applied when none is configured
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Everything a channel needs to know about its peer
///
/// Loads from camelCase JSON; missing fields take their defaults:
///
/// ```
/// use frame_bridge::ChannelConfig;
///
/// let config = ChannelConfig::from_json(r#"{"remoteOrigin": "*"}"#).unwrap();
/// assert_eq!(config.timeout_ms, 3000);
/// assert!(config.remote_context.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelConfig {
    /// The sole peer context; `None` leaves the channel unconfigured
    pub remote_context: Option<ContextId>,
    /// Accepted origin, `*` for any, empty for unconfigured
    pub remote_origin: String,
    /// Milliseconds before an unanswered send fails
    pub timeout_ms: u64,
    /// Tag written into and expected in every frame's `type` field
    pub protocol_tag: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            remote_context: None,
            remote_origin: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            protocol_tag: DEFAULT_PROTOCOL_TAG.to_string(),
        }
    }
}

impl ChannelConfig {
    /// Creates a configuration for the given peer
    pub fn new(remote_context: ContextId, remote_origin: impl Into<String>) -> Self {
        Self {
            remote_context: Some(remote_context),
            remote_origin: remote_origin.into(),
            ..Self::default()
        }
    }

    /// Sets the response timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the protocol tag
    pub fn with_protocol_tag(mut self, tag: impl Into<String>) -> Self {
        self.protocol_tag = tag.into();
        self
    }

    /// Parses a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The response timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The accepted origin, or `None` if unconfigured
    pub fn origin(&self) -> Option<RemoteOrigin> {
        RemoteOrigin::parse(&self.remote_origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChannelConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(3000));
        assert_eq!(config.protocol_tag, DEFAULT_PROTOCOL_TAG);
        assert!(config.origin().is_none());
    }

    #[test]
    fn test_builder() {
        let peer = ContextId::new();
        let config = ChannelConfig::new(peer, "https://a.example")
            .with_timeout_ms(500)
            .with_protocol_tag("custom");

        assert_eq!(config.remote_context, Some(peer));
        assert_eq!(
            config.origin(),
            Some(RemoteOrigin::Exact("https://a.example".to_string()))
        );
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.protocol_tag, "custom");
    }

    #[test]
    fn test_from_json_full() {
        let peer = ContextId::new();
        let json = format!(
            r#"{{"remoteContext":"{}","remoteOrigin":"*","timeoutMs":250,"protocolTag":"x"}}"#,
            peer.as_uuid()
        );
        let config = ChannelConfig::from_json(&json).unwrap();

        assert_eq!(config.remote_context, Some(peer));
        assert_eq!(config.origin(), Some(RemoteOrigin::Any));
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.protocol_tag, "x");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(ChannelConfig::from_json("{").is_err());
        assert!(ChannelConfig::from_json(r#"{"timeoutMs":"soon"}"#).is_err());
    }

    #[test]
    fn test_json_roundtrip_uses_camel_case() {
        let config = ChannelConfig::new(ContextId::new(), "*");
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("remoteOrigin").is_some());
        assert!(json.get("timeoutMs").is_some());
    }
}
