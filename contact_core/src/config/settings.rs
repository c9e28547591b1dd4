use crate::retry::{BackoffStrategy, RetryPolicy};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub submission: SubmissionConfig,
    pub business: BusinessConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

/// Credentials and endpoint for the email relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub private_key: Option<String>,
    pub api_url: String,
    pub timeout_seconds: u64,
    pub allow_test_route: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub cooldown_seconds: u64,
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
    pub retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub max_sessions: usize,
}

/// Fixed business identity added to every relayed message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub recipient_name: String,
    pub recipient_email: String,
    pub business_name: String,
    pub business_phone: String,
    pub business_email: String,
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_seconds: 45,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
            private_key: None,
            api_url: "https://api.emailjs.com".to_string(),
            timeout_seconds: 10,
            allow_test_route: false,
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 60,
            max_attempts: 3,
            backoff: BackoffStrategy::Exponential,
            retry_delay_ms: 500,
            max_retry_delay_ms: 4000,
            max_sessions: 10_000,
        }
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            recipient_name: "Josh Cagle".to_string(),
            recipient_email: "Caglejosh4@gmail.com".to_string(),
            business_name: "Cagle's Landscaping & Restoration".to_string(),
            business_phone: "(520) 358-2221".to_string(),
            business_email: "Caglejosh4@gmail.com".to_string(),
            utc_offset_minutes: -360,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

const PLACEHOLDER_VALUES: [&str; 5] = ["changeme", "change-me", "placeholder", "todo", "xxx"];

fn is_placeholder(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();

    value.is_empty()
        || value.starts_with("your_")
        || value.starts_with("your-")
        || (value.starts_with('<') && value.ends_with('>'))
        || PLACEHOLDER_VALUES.contains(&value.as_str())
}

impl RelayConfig {
    pub fn new(
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            template_id: template_id.into(),
            public_key: public_key.into(),
            ..Self::default()
        }
    }

    /// Names of the required settings that are empty or still hold a template value.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if is_placeholder(&self.service_id) {
            missing.push("relay.service_id");
        }
        if is_placeholder(&self.template_id) {
            missing.push("relay.template_id");
        }
        if is_placeholder(&self.public_key) {
            missing.push("relay.public_key");
        }

        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_settings().is_empty()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.relay.api_url.is_empty() {
            return Err(ConfigError::Message(
                "Relay API URL cannot be empty".to_string(),
            ));
        }

        if self.relay.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Relay timeout must be greater than 0".to_string(),
            ));
        }

        if self.submission.max_attempts == 0 {
            return Err(ConfigError::Message(
                "Submission max attempts must be greater than 0".to_string(),
            ));
        }

        let dispatch_budget = self.dispatch_budget();
        if Duration::from_secs(self.server.request_timeout_seconds) <= dispatch_budget {
            return Err(ConfigError::Message(format!(
                "Server request timeout ({}s) must exceed the worst-case dispatch time ({}ms): \
                 submission.max_attempts x relay.timeout_seconds plus retry delays",
                self.server.request_timeout_seconds,
                dispatch_budget.as_millis()
            )));
        }

        if self.submission.max_sessions == 0 {
            return Err(ConfigError::Message(
                "Submission max sessions must be greater than 0".to_string(),
            ));
        }

        if self.business.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Message(
                "Business UTC offset must be less than 24 hours".to_string(),
            ));
        }

        let missing = self.relay.missing_settings();
        if !missing.is_empty() {
            tracing::warn!(
                missing = ?missing,
                "Relay configuration is incomplete, contact submissions will fail until it is set"
            );
        }

        Ok(())
    }

    /// Upper bound on one submission's relay work, every attempt timing out.
    pub fn dispatch_budget(&self) -> Duration {
        RetryPolicy::from_config(&self.submission)
            .worst_case_duration(Duration::from_secs(self.relay.timeout_seconds))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.submission.max_attempts, 3);
        assert_eq!(config.relay.api_url, "https://api.emailjs.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.server.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.submission.max_attempts = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.submission.max_sessions = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.business.utc_offset_minutes = 24 * 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout_must_cover_every_attempt() {
        let mut config = AppConfig::default();
        assert_eq!(config.dispatch_budget(), Duration::from_millis(31_500));
        assert!(Duration::from_secs(config.server.request_timeout_seconds) > config.dispatch_budget());

        config.server.request_timeout_seconds = 30;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request timeout"));

        config.submission.max_attempts = 2;
        assert_eq!(config.dispatch_budget(), Duration::from_millis(20_500));
        assert!(config.validate().is_ok());

        config = AppConfig::default();
        config.relay.timeout_seconds = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_relay_settings_are_reported_by_name() {
        let config = RelayConfig::default();
        assert_eq!(
            config.missing_settings(),
            vec!["relay.service_id", "relay.template_id", "relay.public_key"]
        );

        let config = RelayConfig::new("service_abc", "your_template_id", "pk_123");
        assert_eq!(config.missing_settings(), vec!["relay.template_id"]);

        let config = RelayConfig::new("service_abc", "template_abc", "pk_123");
        assert!(config.is_complete());
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("   "));
        assert!(is_placeholder("your_service_id"));
        assert!(is_placeholder("<public key>"));
        assert!(is_placeholder("CHANGEME"));
        assert!(!is_placeholder("service_8xk2"));
    }

    #[test]
    fn test_bind_address() {
        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[relay]
service_id = "service_test"
template_id = "template_test"
public_key = "public_test"

[submission]
cooldown_seconds = 120
backoff = "fixed"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).expect("Should load configuration file");

        assert_eq!(config.relay.service_id, "service_test");
        assert!(config.relay.is_complete());
        assert_eq!(config.submission.cooldown_seconds, 120);
        assert_eq!(config.submission.backoff, BackoffStrategy::Fixed);
        assert_eq!(config.submission.max_attempts, 3);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from(Path::new("does-not-exist.toml"))
            .expect("Should load default configuration");

        assert_eq!(config.submission.cooldown_seconds, 60);
        assert_eq!(config.business.business_name, "Cagle's Landscaping & Restoration");
    }
}
