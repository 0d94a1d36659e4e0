use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, debug, info, info_span, warn};

use super::pipeline::CheckPipeline;
use super::rotator::LogRotator;
use crate::config::Monitor;
use crate::storage::{Collection, Storage};

/// Monitoring scheduler - drives the check sweep and the log rotation timers
pub struct MonitoringScheduler {
    storage: Arc<dyn Storage>,
    pipeline: Arc<CheckPipeline>,
    rotator: Arc<LogRotator>,
    limiter: Option<Arc<Semaphore>>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    sweep_interval: Duration,
    rotation_interval: Duration,
}

/// Marks a check as queued or running until dropped
struct InFlight {
    ids: Arc<Mutex<HashSet<String>>>,
    id: String,
}

impl InFlight {
    /// `None` when the check already has a pipeline that has not finished
    fn claim(ids: &Arc<Mutex<HashSet<String>>>, id: &str) -> Option<Self> {
        let mut set = ids.lock().unwrap_or_else(PoisonError::into_inner);
        set.insert(id.to_string()).then(|| Self { ids: Arc::clone(ids), id: id.to_string() })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.id);
    }
}

/// Handles of the two timer loops
pub struct SchedulerHandle {
    sweep: JoinHandle<()>,
    rotation: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop both timers. Pipelines already in flight run to completion.
    pub fn shutdown(self) {
        self.sweep.abort();
        self.rotation.abort();
    }
}

impl MonitoringScheduler {
    /// Create a new monitoring scheduler
    pub fn new(
        settings: &Monitor,
        storage: Arc<dyn Storage>,
        pipeline: Arc<CheckPipeline>,
        rotator: Arc<LogRotator>,
    ) -> Self {
        Self {
            storage,
            pipeline,
            rotator,
            limiter: settings.concurrency_limit().map(|n| Arc::new(Semaphore::new(n))),
            in_flight: Arc::default(),
            sweep_interval: settings.sweep_interval(),
            rotation_interval: settings.rotation_interval(),
        }
    }

    /// Start both timers. Each fires immediately and then on its interval.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        info!(
            "Background workers are running (sweep every {:?}, rotation every {:?})",
            self.sweep_interval, self.rotation_interval
        );

        let sweeper = Arc::clone(&self);
        let sweep = tokio::spawn(async move {
            let mut timer = interval(sweeper.sweep_interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                // Pipelines are detached; a slow one simply overlaps the next sweep.
                drop(sweeper.sweep().await);
            }
        });

        let rotation = tokio::spawn(async move {
            let mut timer = interval(self.rotation_interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                self.rotator.run_once().await;
            }
        });

        SchedulerHandle { sweep, rotation }
    }

    /// List every check and spawn one independent pipeline per id.
    ///
    /// A check whose pipeline from an earlier sweep is still queued or running
    /// is skipped, so slow sweeps never stack up work for the same check.
    /// Returns without waiting for the pipelines; the handles are only useful
    /// to callers that want to observe completion.
    pub async fn sweep(&self) -> Vec<JoinHandle<()>> {
        let ids = match self.storage.list(Collection::Checks).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Could not list checks: {}", e);
                return Vec::new();
            }
        };
        if ids.is_empty() {
            debug!("Could not find any checks to process");
            return Vec::new();
        }
        let total = ids.len();

        let handles: Vec<_> = ids
            .into_iter()
            .filter_map(|id| {
                let claim = InFlight::claim(&self.in_flight, &id)?;
                let pipeline = Arc::clone(&self.pipeline);
                let limiter = self.limiter.clone();
                let span = info_span!("check", id = %id);
                Some(tokio::spawn(
                    async move {
                        let _claim = claim;
                        let _permit = match limiter {
                            Some(limiter) => match limiter.acquire_owned().await {
                                Ok(permit) => Some(permit),
                                Err(_) => return,
                            },
                            None => None,
                        };
                        pipeline.process(&id).await;
                    }
                    .instrument(span),
                ))
            })
            .collect();

        if handles.len() < total {
            debug!("Skipped {} checks still running from an earlier sweep", total - handles.len());
        }
        debug!("Sweeping {} checks", handles.len());
        handles
    }
}
