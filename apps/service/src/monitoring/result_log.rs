use std::sync::Arc;

use tracing::{debug, warn};

use crate::logstore::LogStore;
use crate::models::LogRecord;

/// Appends one JSON line per completed probe to the check's own log
pub struct ResultLogger {
    store: Arc<dyn LogStore>,
}

impl ResultLogger {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Fire-and-forget: failures are logged, never returned
    pub async fn record(&self, record: &LogRecord) {
        let line = match record.to_line() {
            Ok(line) => line,
            Err(e) => {
                warn!("Could not serialize log record for check {}: {}", record.check.id, e);
                return;
            }
        };

        match self.store.append(&record.check.id, &line).await {
            Ok(()) => debug!("Logged probe result for check {}", record.check.id),
            Err(e) => warn!("Failed to append probe result for check {}: {}", record.check.id, e),
        }
    }
}
