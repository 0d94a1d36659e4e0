//! Shared tracing setup for the upwatch binaries.

mod tracing;

pub use crate::tracing::{LogFormat, LogSettings, init};
