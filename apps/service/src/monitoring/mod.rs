/// Monitoring engine module - probes checks and acts on the results
///
/// This module is responsible for:
/// - Probing HTTP/HTTPS endpoints under a hard deadline
/// - Classifying outcomes and deciding when to alert
/// - Persisting state, logging results and rotating logs
/// - Scheduling sweeps over every stored check
pub mod alert;
pub mod evaluator;
pub mod pipeline;
pub mod prober;
pub mod result_log;
pub mod rotator;
pub mod scheduler;


pub use alert::AlertDispatcher;
pub use evaluator::Evaluation;
pub use pipeline::CheckPipeline;
pub use prober::{HttpProber, OutcomeSlot, Prober};
pub use result_log::ResultLogger;
pub use rotator::{LogRotator, RotationSummary};
pub use scheduler::{MonitoringScheduler, SchedulerHandle};
