//! Records handled by the monitoring engine.

pub mod check;
pub mod record;

pub use check::{CHECK_ID_LENGTH, Check, CheckState, HttpMethod, Protocol};
pub use record::{ErrorKind, LogRecord, Outcome, ProbeError};
