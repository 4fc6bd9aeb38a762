//! Auto-login relay and bootstrap utilities for an n8n deployment behind PostgreSQL.

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod cookies;
pub mod db;
pub mod error;
pub mod relay;
pub mod retry;
pub mod state;

pub use error::{RelayError, Result};
