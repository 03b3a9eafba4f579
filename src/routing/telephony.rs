//! Outbound telephony: send a short message to a phone number.

use async_trait::async_trait;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::config::TelephonyConfig;
use crate::routing::envelope::DeliveryError;

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9][0-9]{1,14}$").expect("static pattern"));

/// Whether `candidate` looks like an E.164 phone number.
pub fn is_valid_phone(candidate: &str) -> bool {
    PHONE.is_match(candidate)
}

/// Capability to send a text message.
#[async_trait]
pub trait Telephony: Send + Sync {
    async fn send_message(&self, to: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Twilio REST messaging client.
pub struct TwilioClient {
    http: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioClient {
    /// Create a client. The auth token is passed in, never read from config.
    pub fn new(config: &TelephonyConfig, auth_token: String) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeliveryError::Telephony(e.to_string()))?;

        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_base_url.trim_end_matches('/'),
            config.account_sid
        );

        Ok(Self {
            http,
            messages_url,
            account_sid: config.account_sid.clone(),
            auth_token,
            from_number: config.from_number.clone(),
        })
    }

    /// Endpoint messages are posted to.
    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }
}

#[async_trait]
impl Telephony for TwilioClient {
    async fn send_message(&self, to: &str, text: &str) -> Result<(), DeliveryError> {
        if !is_valid_phone(to) {
            return Err(DeliveryError::InvalidDestination(to.to_string()));
        }

        let response = self
            .http
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", text)])
            .send()
            .await
            .map_err(|e| DeliveryError::Telephony(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Telephony(format!("HTTP {}: {}", status, body)));
        }

        tracing::info!(to = %to, "Sent SMS");
        Ok(())
    }
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("messages_url", &self.messages_url)
            .field("from_number", &self.from_number)
            .finish_non_exhaustive()
    }
}
