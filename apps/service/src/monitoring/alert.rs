use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::Check;
use crate::notify::NotificationGateway;

/// Sends state-change alerts to a check's owner, best effort
pub struct AlertDispatcher {
    gateway: Arc<dyn NotificationGateway>,
}

impl AlertDispatcher {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self { gateway }
    }

    /// Never fails: delivery problems are logged and dropped
    pub async fn dispatch(&self, check: &Check) {
        let message = format_alert(check);
        match self.gateway.send(&check.user_phone, &message).await {
            Ok(()) => debug!("Alerted owner of check {} that it is {}", check.id, check.state),
            Err(e) => warn!("Could not alert owner of check {}: {}", check.id, e),
        }
    }
}

/// Body of the state-change alert, e.g.
/// `Alert: Your check for GET https://example.com/ is currently down!`
pub fn format_alert(check: &Check) -> String {
    format!(
        "Alert: Your check for {} {} is currently {}!",
        check.method,
        check.target(),
        check.state
    )
}
