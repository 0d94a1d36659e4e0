//! Background HTTP/HTTPS endpoint monitoring.
//!
//! Every sweep probes each stored check once, records whether it is up or
//! down, appends the result to the check's log and texts the owner when the
//! state flips. A second, slower timer compresses the logs.

pub mod config;
pub mod error;
mod locks;
pub mod logstore;
pub mod models;
pub mod monitoring;
pub mod notify;
pub mod service;
pub mod storage;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use service::Service;
