use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::logstore::LogStore;

/// Counts from one rotation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationSummary {
    pub rotated: usize,
    pub failed: usize,
}

/// Compresses every active log into a dated archive and starts it afresh
pub struct LogRotator {
    store: Arc<dyn LogStore>,
}

impl LogRotator {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Rotate all unrotated logs once. One failing log does not stop the rest.
    pub async fn run_once(&self) -> RotationSummary {
        let mut summary = RotationSummary::default();

        let names = match self.store.list_unrotated().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Could not list logs to rotate: {}", e);
                return summary;
            }
        };
        if names.is_empty() {
            debug!("No logs to rotate");
            return summary;
        }

        for name in names {
            match self.store.rotate(&name).await {
                Ok(Some(archive)) => {
                    debug!("Rotated log {} into {}", name, archive);
                    summary.rotated += 1;
                }
                // Emptied by someone else since listing.
                Ok(None) => {}
                Err(e) => {
                    warn!("Failed to rotate log {}: {}", name, e);
                    summary.failed += 1;
                }
            }
        }

        info!("Log rotation completed: {} rotated, {} failed", summary.rotated, summary.failed);
        summary
    }
}
