/// Delivery of user notifications
pub mod sms;

pub use sms::SmsGateway;

use async_trait::async_trait;
use tracing::info;

use crate::error::NotifyError;

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Request delivery of `message` to `recipient`
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotifyError>;
}

/// Stand-in used when no gateway is configured: the message is only logged
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGateway;

#[async_trait]
impl NotificationGateway for DisabledGateway {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotifyError> {
        info!(recipient, "Notification gateway disabled, dropping message: {}", message);
        Err(NotifyError::NotConfigured)
    }
}
