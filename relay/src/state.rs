use crate::cookies::{CookieChanges, CookieSet};
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Who produced the cached cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSource {
    /// The relay's own `POST /rest/login`.
    Login,
    /// An already-authenticated caller.
    Caller,
}

#[derive(Debug, Clone)]
pub struct CachedSession {
    pub cookies: CookieSet,
    pub source: SessionSource,
    pub established_at: DateTime<Utc>,
}

/// 세션 쿠키 캐시 (Thread-Safe)
///
/// Reads are lock-free snapshots. Writers swap a whole new `CachedSession`, so a reader
/// never sees a half-updated set. `login_lock` serializes logins so a cold cache under
/// concurrent traffic produces a single upstream POST.
#[derive(Default)]
pub struct SessionCache {
    current: ArcSwapOption<CachedSession>,
    login_lock: Mutex<()>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<Arc<CachedSession>> {
        self.current.load_full()
    }

    /// Cookies of a session the relay logged in for itself, if one is cached.
    pub fn login_cookies(&self) -> Option<CookieSet> {
        self.snapshot()
            .filter(|s| s.source == SessionSource::Login && !s.cookies.is_empty())
            .map(|s| s.cookies.clone())
    }

    /// Replaces the cached session.
    pub fn store(&self, cookies: CookieSet, source: SessionSource) {
        self.current.store(Some(Arc::new(CachedSession {
            cookies,
            source,
            established_at: Utc::now(),
        })));
    }

    /// Folds `cookies` into the cached set, newer values winning.
    pub fn merge(&self, cookies: &CookieSet, source: SessionSource) {
        self.apply(&CookieChanges::from(cookies.clone()), source);
    }

    /// Applies cookie updates that belong to a session of `source`.
    ///
    /// A session of the same source is extended (and dropped once nothing is left in it).
    /// Caller cookies replace a session of the other source, so a caller's values are
    /// never relabelled as the relay's login. Login sessions start only in `store`.
    pub fn apply(&self, changes: &CookieChanges, source: SessionSource) {
        if changes.is_empty() {
            return;
        }
        self.current.rcu(|current| match current {
            Some(existing) if existing.source == source => {
                let cookies = changes.apply_to(&existing.cookies);
                (!cookies.is_empty()).then(|| {
                    Arc::new(CachedSession {
                        cookies,
                        source,
                        established_at: existing.established_at,
                    })
                })
            }
            _ if source == SessionSource::Login || changes.set.is_empty() => current.clone(),
            _ => Some(Arc::new(CachedSession {
                cookies: changes.set.clone(),
                source,
                established_at: Utc::now(),
            })),
        });
    }

    pub fn invalidate(&self) {
        self.current.store(None);
    }

    pub(crate) fn login_lock(&self) -> &Mutex<()> {
        &self.login_lock
    }
}
