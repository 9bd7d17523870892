use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use url::Url;

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.the-odds-api.com/v4";
pub const DEFAULT_PORT: u16 = 4000;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("No upstream API key configured (set upstream.api_key or ODDS_API_KEY)")]
    MissingApiKey,

    #[error("Invalid upstream base URL {0}: {1}")]
    InvalidBaseUrl(String, String),

    #[error("Upstream base URL must use http or https, got {0}")]
    UnsupportedScheme(String),
}

/// Gateway configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for proxied API requests
    #[serde(default)]
    pub listener: Listener,
    /// Optional listener for health and readiness probes
    #[serde(default)]
    pub admin_listener: Option<Listener>,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl Config {
    /// Applies values taken from the process environment on top of the file config.
    /// An override that is `None` leaves the configured value in place.
    pub fn apply_overrides(&mut self, port: Option<u16>, api_key: Option<String>) {
        if let Some(port) = port {
            self.listener.port = port;
        }
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.upstream.api_key = Some(ApiKey::new(key));
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        if let Some(admin) = &self.admin_listener {
            admin.validate()?;
        }
        self.upstream.validate()
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// The odds provider the gateway forwards to
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    /// Versioned API root; route paths are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Credential injected into every upstream call
    #[serde(default)]
    pub api_key: Option<ApiKey>,
    /// When set, upstream error statuses are passed to the caller instead of 500
    #[serde(default)]
    pub propagate_status: bool,
}

fn default_base_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            base_url: default_base_url(),
            api_key: None,
            propagate_status: false,
        }
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.parsed_base_url()?;
        self.api_key()?;
        Ok(())
    }

    pub fn parsed_base_url(&self) -> Result<Url, ValidationError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ValidationError::InvalidBaseUrl(self.base_url.clone(), e.to_string()))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ValidationError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn api_key(&self) -> Result<&ApiKey, ValidationError> {
        self.api_key
            .as_ref()
            .filter(|k| !k.expose().is_empty())
            .ok_or(ValidationError::MissingApiKey)
    }
}

/// The provider credential. Its `Debug` output never contains the key.
#[derive(Clone, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        ApiKey(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
listener:
    host: "127.0.0.1"
    port: 8080
admin_listener:
    host: "127.0.0.1"
    port: 8081
upstream:
    base_url: "http://odds.internal/v4"
    api_key: "secret-key"
    propagate_status: true
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.admin_listener.as_ref().unwrap().port, 8081);
        assert_eq!(config.upstream.api_key().unwrap().expose(), "secret-key");
        assert!(config.upstream.propagate_status);
        assert_eq!(
            config.upstream.parsed_base_url().unwrap().as_str(),
            "http://odds.internal/v4"
        );
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.listener, Listener::default());
        assert_eq!(config.listener.port, DEFAULT_PORT);
        assert_eq!(config.admin_listener, None);
        assert_eq!(config.upstream.base_url, DEFAULT_UPSTREAM_URL);
        assert!(!config.upstream.propagate_status);

        // No credential anywhere is a startup error
        assert_eq!(config.validate(), Err(ValidationError::MissingApiKey));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(Some(9000), Some("from-env".into()));
        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.upstream.api_key().unwrap().expose(), "from-env");
        assert!(config.validate().is_ok());

        // Absent or empty overrides keep configured values
        config.apply_overrides(None, Some(String::new()));
        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.upstream.api_key().unwrap().expose(), "from-env");
    }

    #[test]
    fn test_validation_errors() {
        let mut base_config = Config::default();
        base_config.upstream.api_key = Some(ApiKey::new("k"));

        let mut config = base_config.clone();
        config.listener.port = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));

        let mut config = base_config.clone();
        config.admin_listener = Some(Listener {
            host: "127.0.0.1".into(),
            port: 0,
        });
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));

        let mut config = base_config.clone();
        config.upstream.base_url = "not a url".into();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBaseUrl(_, _))
        ));

        let mut config = base_config.clone();
        config.upstream.base_url = "ftp://odds.internal/v4".into();
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnsupportedScheme("ftp".into()))
        );

        let mut config = base_config;
        config.upstream.api_key = Some(ApiKey::new(""));
        assert_eq!(config.validate(), Err(ValidationError::MissingApiKey));
    }

    #[test]
    fn test_api_key_is_redacted() {
        let mut config = Config::default();
        config.upstream.api_key = Some(ApiKey::new("super-secret"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
