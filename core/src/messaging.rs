//! Outbound messaging over Twilio's WhatsApp API

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::{Error, Result};

/// Default Twilio REST endpoint
pub const DEFAULT_TWILIO_URL: &str = "https://api.twilio.com";

const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Messaging transport trait
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `body` to the destination address
    async fn send(&self, to: &str, body: &str) -> Result<()>;

    /// Transport name
    fn name(&self) -> &str;
}

/// Ensure an address carries the `whatsapp:` channel prefix
pub fn whatsapp_address(address: &str) -> String {
    let address = address.trim();
    if address.starts_with(WHATSAPP_PREFIX) {
        address.to_string()
    } else {
        format!("{}{}", WHATSAPP_PREFIX, address)
    }
}

/// Mask a phone number for safe logging
///
/// Keeps only the last four characters.
///
/// # Examples
///
/// ```
/// use relayctl_core::mask_address;
///
/// assert_eq!(mask_address("whatsapp:+15551234567"), "***4567");
/// assert_eq!(mask_address("123"), "***");
/// ```
pub fn mask_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 4 {
        "***".to_string()
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("***{}", tail)
    }
}

/// Twilio account settings
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// WhatsApp sender number, with or without the `whatsapp:` prefix
    pub from_number: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl TwilioConfig {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            api_base: DEFAULT_TWILIO_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"***")
            .field("from_number", &mask_address(&self.from_number))
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// WhatsApp sender backed by the Twilio Messages API
#[derive(Debug, Clone)]
pub struct TwilioWhatsApp {
    client: Client,
    account_sid: String,
    auth_token: String,
    from: String,
    messages_url: String,
}

impl TwilioWhatsApp {
    /// Create a sender; fails if any credential is missing
    pub fn new(config: TwilioConfig) -> Result<Self> {
        let required = [
            ("Twilio account SID", &config.account_sid),
            ("Twilio auth token", &config.auth_token),
            ("Twilio WhatsApp number", &config.from_number),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(Error::ConfigError(format!("{} not configured", label)));
            }
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_base.trim_end_matches('/'),
            config.account_sid.trim()
        );

        Ok(Self {
            client,
            account_sid: config.account_sid.trim().to_string(),
            auth_token: config.auth_token.trim().to_string(),
            from: whatsapp_address(&config.from_number),
            messages_url,
        })
    }
}

#[async_trait]
impl MessageSender for TwilioWhatsApp {
    #[instrument(skip(self, to, body), fields(to = %mask_address(to)))]
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        let to = whatsapp_address(to);

        debug!(body_bytes = body.len(), "Sending WhatsApp message");

        let params = [("From", self.from.as_str()), ("To", to.as_str()), ("Body", body)];

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Twilio HTTP request failed");
                Error::HttpError(format!("Twilio request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            error!(
                status = %status,
                error_body = %error_body,
                "Twilio returned error status"
            );
            return Err(Error::NotificationError(format!(
                "Twilio error: {} - {}",
                status, error_body
            )));
        }

        info!("WhatsApp message sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "twilio-whatsapp"
    }
}
