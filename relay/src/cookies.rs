//! Cookie handling for the relay.
//!
//! `CookieSet` is the name → value view used for auth checks, merging and the outbound
//! `Cookie` header. `Set-Cookie` values from upstream are kept as parsed cookies so they
//! can be re-emitted with their original attributes.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use http::header::{HeaderMap, HeaderValue, SET_COOKIE};
use serde::Serialize;
use std::collections::BTreeMap;

/// Name fragments that mark a cookie as a probable session cookie.
const SESSION_MARKERS: [&str; 2] = ["auth", "session"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CookieSet(BTreeMap<String, String>);

impl CookieSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cookies sent by a caller in its `Cookie` header(s).
    pub fn from_request_headers(headers: &HeaderMap) -> Self {
        CookieJar::from_headers(headers)
            .iter()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect()
    }

    /// Name/value pairs of every parseable `Set-Cookie` in a response, minus removals.
    pub fn from_set_cookie_headers(headers: &HeaderMap) -> Self {
        CookieChanges::from_set_cookies(&parse_set_cookies(headers)).set
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copies `other` into `self`; `other` wins on a name collision.
    pub fn extend_from(&mut self, other: &CookieSet) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    /// `base ∪ overlay`, with `overlay` taking precedence.
    pub fn merged(base: &CookieSet, overlay: &CookieSet) -> CookieSet {
        let mut out = base.clone();
        out.extend_from(overlay);
        out
    }

    /// True if any cookie name contains "auth", "session" or the platform name,
    /// compared case-insensitively.
    pub fn has_session_marker(&self, platform_name: &str) -> bool {
        self.0.keys().any(|name| is_session_name(name, platform_name))
    }

    /// True if `self` carries every session cookie of `session`, with the same values.
    pub fn shares_session(&self, session: &CookieSet, platform_name: &str) -> bool {
        let mut session_cookies = session
            .iter()
            .filter(|(name, _)| is_session_name(name, platform_name))
            .peekable();
        session_cookies.peek().is_some()
            && session_cookies.all(|(name, value)| self.get(name) == Some(value))
    }

    /// `a=1; b=2`, or `None` for an empty set.
    pub fn to_header_value(&self) -> Option<HeaderValue> {
        if self.is_empty() {
            return None;
        }
        let joined = self
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }
}

fn is_session_name(name: &str, platform_name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    let platform = platform_name.to_ascii_lowercase();
    SESSION_MARKERS.iter().any(|m| name.contains(m))
        || (!platform.is_empty() && name.contains(&platform))
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CookieSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = CookieSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// What a batch of `Set-Cookie` values does to a stored cookie set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieChanges {
    pub set: CookieSet,
    /// Names the upstream cleared (empty value, `Max-Age=0` or an expiry in the past).
    pub removed: Vec<String>,
}

impl CookieChanges {
    pub fn from_set_cookies(cookies: &[Cookie<'static>]) -> Self {
        let mut changes = Self::default();
        for cookie in cookies {
            if is_removal(cookie) {
                changes.set.remove(cookie.name());
                changes.removed.push(cookie.name().to_string());
            } else {
                changes.removed.retain(|n| n != cookie.name());
                changes.set.insert(cookie.name(), cookie.value());
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.removed.is_empty()
    }

    /// True if a cleared cookie looks like a session cookie, i.e. the upstream logged out.
    pub fn removes_session(&self, platform_name: &str) -> bool {
        self.removed.iter().any(|name| is_session_name(name, platform_name))
    }

    /// `base` with these changes applied.
    pub fn apply_to(&self, base: &CookieSet) -> CookieSet {
        let mut out = CookieSet::merged(base, &self.set);
        for name in &self.removed {
            out.remove(name);
        }
        out
    }
}

impl From<CookieSet> for CookieChanges {
    fn from(set: CookieSet) -> Self {
        Self {
            set,
            removed: Vec::new(),
        }
    }
}

/// True for a `Set-Cookie` that deletes the cookie instead of storing a value.
pub fn is_removal(cookie: &Cookie<'_>) -> bool {
    if cookie.value().is_empty() {
        return true;
    }
    if let Some(max_age) = cookie.max_age() {
        if max_age.is_zero() || max_age.is_negative() {
            return true;
        }
    }
    cookie
        .expires_datetime()
        .is_some_and(|at| at.unix_timestamp() <= chrono::Utc::now().timestamp())
}

/// Every `Set-Cookie` header that parses; malformed ones are skipped.
pub fn parse_set_cookies(headers: &HeaderMap) -> Vec<Cookie<'static>> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|raw| match Cookie::parse(raw.to_string()) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!("Ignoring malformed Set-Cookie from upstream: {}", e);
                None
            }
        })
        .collect()
}

/// Prepares an upstream cookie for the caller's browser: `SameSite=Lax` and no `Domain`,
/// so it host-matches the relay. Path, expiry, `Secure` and `HttpOnly` are kept.
pub fn rewrite_for_client(mut cookie: Cookie<'static>) -> Cookie<'static> {
    cookie.unset_domain();
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// A cached session cookie handed to a browser the relay logged in for.
pub fn session_cookie_for_client(name: &str, value: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name.to_string(), value.to_string());
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie
}
