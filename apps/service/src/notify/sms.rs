use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::NotificationGateway;
use crate::config::Notifications;
use crate::error::NotifyError;

const MAX_MESSAGE_LENGTH: usize = 1600;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// SMS delivery through a Twilio-compatible REST API
pub struct SmsGateway {
    client: reqwest::Client,
    settings: Notifications,
}

impl SmsGateway {
    pub fn new(settings: Notifications) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, settings })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.account_sid
        )
    }

    /// Recipients are stored as bare national numbers; the configured country
    /// code is prepended unless one is already present
    fn normalize_recipient(&self, recipient: &str) -> Result<String, NotifyError> {
        let trimmed = recipient.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(NotifyError::InvalidRecipient(recipient.to_string()));
        }

        if trimmed.starts_with('+') {
            Ok(trimmed.to_string())
        } else {
            Ok(format!("{}{}", self.settings.country_code, digits))
        }
    }
}

fn check_message(message: &str) -> Result<&str, NotifyError> {
    let message = message.trim();
    let len = message.chars().count();
    if len == 0 || len > MAX_MESSAGE_LENGTH {
        return Err(NotifyError::InvalidMessage { len, max: MAX_MESSAGE_LENGTH });
    }
    Ok(message)
}

#[async_trait]
impl NotificationGateway for SmsGateway {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotifyError> {
        let to = self.normalize_recipient(recipient)?;
        let body = check_message(message)?;

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.settings.account_sid, Some(&self.settings.auth_token))
            .form(&[("From", self.settings.from_phone.as_str()), ("To", to.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        debug!(to = %to, "SMS accepted by gateway with status {}", status.as_u16());
        Ok(())
    }
}
