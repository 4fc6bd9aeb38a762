//! Request handlers for the relay port (catch-all proxy) and the control port
//! (session status, forced re-login, metrics).

pub mod metrics;
pub mod proxy;
pub mod session;
