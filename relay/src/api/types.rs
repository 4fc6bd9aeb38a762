use crate::state::{CachedSession, SessionSource};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SessionRes {
    pub cached: bool,
    pub source: Option<SessionSource>,
    /// Names only; values are credentials.
    pub cookie_names: Vec<String>,
    pub established_at: Option<DateTime<Utc>>,
}

impl SessionRes {
    pub fn from_snapshot(snapshot: Option<&CachedSession>) -> Self {
        match snapshot {
            Some(s) => Self {
                cached: true,
                source: Some(s.source),
                cookie_names: s.cookies.names(),
                established_at: Some(s.established_at),
            },
            None => Self {
                cached: false,
                source: None,
                cookie_names: Vec::new(),
                established_at: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusRes {
    pub upstream: String,
    pub session: SessionRes,
}
