use std::sync::Arc;

use tracing::{debug, info, warn};

use super::alert::AlertDispatcher;
use super::evaluator::{self, Evaluation};
use super::prober::Prober;
use super::result_log::ResultLogger;
use crate::models::{Check, LogRecord};
use crate::storage::{Collection, Storage};
use crate::validation::validate_check;

/// Runs one check end to end: probe, evaluate, persist, log, alert.
///
/// Every failure stays inside the pipeline; nothing is returned to the
/// scheduler but what happened.
pub struct CheckPipeline {
    storage: Arc<dyn Storage>,
    prober: Arc<dyn Prober>,
    logger: ResultLogger,
    dispatcher: AlertDispatcher,
}

impl CheckPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        prober: Arc<dyn Prober>,
        logger: ResultLogger,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self { storage, prober, logger, dispatcher }
    }

    /// Load, validate and run the check stored under `id`.
    ///
    /// `None` means the record could not be read or was malformed and was
    /// skipped without probing.
    pub async fn process(&self, id: &str) -> Option<Evaluation> {
        let raw = match self.storage.read(Collection::Checks, id).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not read check {}: {}", id, e);
                return None;
            }
        };

        let check = match validate_check(&raw) {
            Ok(check) => check,
            Err(e) => {
                debug!("Skipping malformed check {}: {}", id, e);
                return None;
            }
        };

        Some(self.run(check).await)
    }

    /// Probe an already validated check and act on the outcome
    pub async fn run(&self, mut check: Check) -> Evaluation {
        let outcome = self.prober.probe(&check).await;
        let evaluation = evaluator::apply(&mut check, &outcome, chrono::Utc::now().timestamp_millis());

        // The next sweep re-reads whatever is stored, so a failed write is not retried.
        match serde_json::to_value(&check) {
            Ok(record) => {
                if let Err(e) = self.storage.update(Collection::Checks, &check.id, &record).await {
                    warn!("Failed to persist check {}: {}", check.id, e);
                }
            }
            Err(e) => warn!("Failed to serialize check {}: {}", check.id, e),
        }

        let alert = evaluation.alert;
        let record = LogRecord {
            check,
            outcome,
            state: evaluation.state,
            alert,
            time: evaluation.checked_at,
        };
        self.logger.record(&record).await;

        if alert {
            info!("Check {} is now {}", record.check.id, record.state);
            self.dispatcher.dispatch(&record.check).await;
        } else {
            debug!("Check {} is {}, no alert warranted", record.check.id, record.state);
        }

        evaluation
    }
}
