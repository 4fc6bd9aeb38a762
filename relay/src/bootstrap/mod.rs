//! Process startup: logging, metrics recorder and the owner-account bootstrap.

pub mod logging;
pub mod metrics;
pub mod owner;
