//! Wiring of the engine to its on-disk collaborators.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::logstore::{FileLogStore, LogStore};
use crate::monitoring::{
    AlertDispatcher, CheckPipeline, HttpProber, LogRotator, MonitoringScheduler, ResultLogger,
    SchedulerHandle,
};
use crate::notify::{DisabledGateway, NotificationGateway, SmsGateway};
use crate::storage::{FileStore, Storage};

/// The assembled background service, ready to start
pub struct Service {
    scheduler: Arc<MonitoringScheduler>,
}

impl Service {
    pub fn from_config(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
            format!("creating data dir {}", config.storage.data_dir.display())
        })?;
        std::fs::create_dir_all(&config.storage.log_dir)
            .with_context(|| format!("creating log dir {}", config.storage.log_dir.display()))?;

        let storage: Arc<dyn Storage> = Arc::new(FileStore::new(&config.storage.data_dir));
        let logs: Arc<dyn LogStore> = Arc::new(FileLogStore::new(&config.storage.log_dir));

        let gateway: Arc<dyn NotificationGateway> = match &config.notifications {
            Some(settings) => Arc::new(SmsGateway::new(settings.clone()).context("building SMS gateway")?),
            None => {
                warn!("No [notifications] section configured, alerts will only be logged");
                Arc::new(DisabledGateway)
            }
        };

        let prober = Arc::new(HttpProber::new(&config.monitor.user_agent).context("building HTTP client")?);
        let pipeline = Arc::new(CheckPipeline::new(
            Arc::clone(&storage),
            prober,
            ResultLogger::new(Arc::clone(&logs)),
            AlertDispatcher::new(gateway),
        ));

        let scheduler = MonitoringScheduler::new(
            &config.monitor,
            storage,
            pipeline,
            Arc::new(LogRotator::new(logs)),
        );

        Ok(Self { scheduler: Arc::new(scheduler) })
    }

    pub fn start(&self) -> SchedulerHandle {
        info!("Starting monitoring service");
        Arc::clone(&self.scheduler).start()
    }
}
