//! Configuration management

use relayctl_core::hetzner::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use relayctl_core::messaging::DEFAULT_TWILIO_URL;
use relayctl_core::{Error, HetznerConfig, Result, TwilioConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hetzner Cloud API access
    pub hetzner: HetznerSettings,

    /// Twilio WhatsApp account
    pub twilio: TwilioSettings,

    /// Sender numbers allowed to issue commands; empty admits everyone
    #[serde(default)]
    pub allowed_phone_numbers: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct HetznerSettings {
    pub api_token: String,
    #[serde(default = "default_hetzner_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub whatsapp_number: String,
    #[serde(default = "default_twilio_url")]
    pub api_url: String,
}

fn default_hetzner_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_twilio_url() -> String {
    DEFAULT_TWILIO_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl fmt::Debug for HetznerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HetznerSettings")
            .field("api_token", &"***")
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for TwilioSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioSettings")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"***")
            .field("whatsapp_number", &self.whatsapp_number)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from file or environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = if let Some(p) = path {
            Self::load_from_file(p)?
        } else {
            Self::load_from_env()?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from configuration file
    fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Load from environment variables
    fn load_from_env() -> Result<Self> {
        Self::from_lookup(&|name: &str| std::env::var(name).ok())
    }

    /// Build configuration from a variable lookup; blank values count as unset
    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let timeout_secs = match var("HETZNER_TIMEOUT_SECS") {
            Some(v) => v.trim().parse().map_err(|_| {
                Error::ConfigError(format!("Invalid HETZNER_TIMEOUT_SECS: {}", v))
            })?,
            None => default_timeout_secs(),
        };

        let hetzner = HetznerSettings {
            api_token: require_secret(lookup, "HETZNER_API_TOKEN")?,
            api_url: var("HETZNER_API_URL").unwrap_or_else(default_hetzner_url),
            timeout_secs,
        };

        let twilio = TwilioSettings {
            account_sid: require_secret(lookup, "TWILIO_ACCOUNT_SID")?,
            auth_token: require_secret(lookup, "TWILIO_AUTH_TOKEN")?,
            whatsapp_number: require_secret(lookup, "TWILIO_WHATSAPP_NUMBER")?,
            api_url: var("TWILIO_API_URL").unwrap_or_else(default_twilio_url),
        };

        let allowed_phone_numbers = var("ALLOWED_PHONE_NUMBERS")
            .map(|s| parse_list(&s))
            .unwrap_or_default();

        Ok(Config {
            hetzner,
            twilio,
            allowed_phone_numbers,
        })
    }

    /// Reject empty credentials
    fn validate(&self) -> Result<()> {
        let required = [
            ("hetzner.api_token", &self.hetzner.api_token),
            ("twilio.account_sid", &self.twilio.account_sid),
            ("twilio.auth_token", &self.twilio.auth_token),
            ("twilio.whatsapp_number", &self.twilio.whatsapp_number),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::ConfigError(format!("{} must not be empty", key)));
            }
        }

        if self.hetzner.timeout_secs == 0 {
            return Err(Error::ConfigError(
                "hetzner.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn hetzner_config(&self) -> HetznerConfig {
        HetznerConfig::new(&self.hetzner.api_token)
            .with_base_url(&self.hetzner.api_url)
            .with_timeout(Duration::from_secs(self.hetzner.timeout_secs))
    }

    pub fn twilio_config(&self) -> TwilioConfig {
        TwilioConfig::new(
            &self.twilio.account_sid,
            &self.twilio.auth_token,
            &self.twilio.whatsapp_number,
        )
        .with_api_base(&self.twilio.api_url)
    }

    /// Whether a sender may issue commands
    ///
    /// The `whatsapp:` channel prefix is ignored when comparing.
    pub fn is_allowed(&self, from: &str) -> bool {
        if self.allowed_phone_numbers.is_empty() {
            return true;
        }

        let number = strip_channel(from);
        self.allowed_phone_numbers
            .iter()
            .any(|allowed| strip_channel(allowed) == number)
    }
}

fn strip_channel(address: &str) -> &str {
    let address = address.trim();
    address.strip_prefix("whatsapp:").unwrap_or(address)
}

/// Split a comma-separated list, dropping blanks
fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn require_secret(lookup: &dyn Fn(&str) -> Option<String>, var_name: &str) -> Result<String> {
    get_secret(lookup, var_name)
        .ok_or_else(|| Error::ConfigError(format!("{} not configured", var_name)))
}

/// Get secret from a variable or the file it names
///
/// Supports both direct environment variables and file-based secrets (Docker/Kubernetes pattern).
/// If `VAR_NAME` is unset or blank, tries `VAR_NAME_FILE` which should point to a file containing the secret.
fn get_secret(lookup: &dyn Fn(&str) -> Option<String>, var_name: &str) -> Option<String> {
    if let Some(value) = lookup(var_name).filter(|v| !v.trim().is_empty()) {
        return Some(value);
    }

    // Docker secrets / Kubernetes
    let path = lookup(&format!("{}_FILE", var_name))?;
    match std::fs::read_to_string(&path) {
        Ok(contents) => Some(contents.trim().to_string()).filter(|v| !v.is_empty()),
        Err(e) => {
            warn!(var = var_name, path = %path, error = %e, "Failed to read secret file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
allowed_phone_numbers = ["+15551234567", "whatsapp:+15557654321"]

[hetzner]
api_token = "hz-token"

[twilio]
account_sid = "AC123"
auth_token = "secret"
whatsapp_number = "+15550000000"
"#;

    #[test]
    fn test_from_toml_applies_defaults() {
        let config = Config::from_toml(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.hetzner.api_url, DEFAULT_API_URL);
        assert_eq!(config.hetzner.timeout_secs, 10);
        assert_eq!(config.twilio.api_url, DEFAULT_TWILIO_URL);
        assert_eq!(config.allowed_phone_numbers.len(), 2);
    }

    #[test]
    fn test_validate_rejects_empty_credentials() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.twilio.auth_token = "  ".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("twilio.auth_token"));
    }

    #[test]
    fn test_missing_section_fails_to_parse() {
        let err = Config::from_toml("[hetzner]\napi_token = \"x\"\n").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_allow_list() {
        let config = Config::from_toml(SAMPLE).unwrap();

        assert!(config.is_allowed("whatsapp:+15551234567"));
        assert!(config.is_allowed("+15557654321"));
        assert!(!config.is_allowed("whatsapp:+15559999999"));

        let open = Config {
            allowed_phone_numbers: Vec::new(),
            ..config
        };
        assert!(open.is_allowed("whatsapp:+15559999999"));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" +1555, ,+1666 ,"),
            vec!["+1555".to_string(), "+1666".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("hz-token"));
        assert!(!rendered.contains("secret"));
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(vars: &HashMap<String, String>) -> Result<Config> {
        Config::from_lookup(&|name: &str| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("HETZNER_API_TOKEN", "hz-token"),
        ("TWILIO_ACCOUNT_SID", "AC123"),
        ("TWILIO_AUTH_TOKEN", "secret"),
        ("TWILIO_WHATSAPP_NUMBER", "+15550000000"),
    ];

    #[test]
    fn test_env_applies_defaults() {
        let config = load(&env(&REQUIRED)).unwrap();
        config.validate().unwrap();

        assert_eq!(config.hetzner.api_token, "hz-token");
        assert_eq!(config.hetzner.api_url, DEFAULT_API_URL);
        assert_eq!(config.hetzner.timeout_secs, 10);
        assert_eq!(config.twilio.api_url, DEFAULT_TWILIO_URL);
        assert!(config.allowed_phone_numbers.is_empty());
    }

    #[test]
    fn test_env_overrides_and_allowed_numbers() {
        let mut vars = env(&REQUIRED);
        vars.extend(env(&[
            ("HETZNER_TIMEOUT_SECS", " 30 "),
            ("HETZNER_API_URL", "http://127.0.0.1:9000/v1"),
            ("ALLOWED_PHONE_NUMBERS", "+15551234567, whatsapp:+15557654321,"),
        ]));

        let config = load(&vars).unwrap();
        assert_eq!(config.hetzner.timeout_secs, 30);
        assert_eq!(config.hetzner.api_url, "http://127.0.0.1:9000/v1");
        assert_eq!(config.allowed_phone_numbers.len(), 2);
        assert!(config.is_allowed("whatsapp:+15557654321"));
        assert!(!config.is_allowed("whatsapp:+15559999999"));
    }

    #[test]
    fn test_env_invalid_timeout_is_config_error() {
        let mut vars = env(&REQUIRED);
        vars.insert("HETZNER_TIMEOUT_SECS".to_string(), "ten".to_string());

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
        assert!(err.to_string().contains("HETZNER_TIMEOUT_SECS"));
    }

    #[test]
    fn test_require_secret_rejects_missing_and_blank() {
        let mut vars = env(&REQUIRED);
        vars.insert("TWILIO_AUTH_TOKEN".to_string(), "   ".to_string());

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
        assert!(err.to_string().contains("TWILIO_AUTH_TOKEN not configured"));

        vars.remove("TWILIO_AUTH_TOKEN");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_secret_read_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hetzner_token");
        std::fs::write(&path, "file-token\n").unwrap();

        let mut vars = env(&REQUIRED);
        vars.remove("HETZNER_API_TOKEN");
        vars.insert(
            "HETZNER_API_TOKEN_FILE".to_string(),
            path.to_string_lossy().to_string(),
        );

        let config = load(&vars).unwrap();
        assert_eq!(config.hetzner.api_token, "file-token");
    }

    #[test]
    fn test_blank_secret_falls_back_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auth_token");
        std::fs::write(&path, "from-file").unwrap();

        let vars = env(&[
            ("FOO", ""),
            ("FOO_FILE", path.to_str().unwrap()),
        ]);
        let lookup = |name: &str| vars.get(name).cloned();

        assert_eq!(get_secret(&lookup, "FOO").as_deref(), Some("from-file"));
    }

    #[test]
    fn test_unreadable_or_empty_secret_file() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty");
        std::fs::write(&empty, "  \n").unwrap();
        let missing = dir.path().join("missing");

        let vars = env(&[
            ("EMPTY_FILE", empty.to_str().unwrap()),
            ("MISSING_FILE", missing.to_str().unwrap()),
        ]);
        let lookup = |name: &str| vars.get(name).cloned();

        assert!(get_secret(&lookup, "EMPTY").is_none());
        assert!(get_secret(&lookup, "MISSING").is_none());
        assert!(get_secret(&lookup, "UNSET").is_none());
    }
}
