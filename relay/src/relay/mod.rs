//! The auto-login relay.
//!
//! Every inbound request goes through `Relay::relay`:
//! auth check → (caller session | relay login) → forward → rewrite response.
//! Only the session cache outlives a request.

pub mod headers;

use crate::auth::Credentials;
use crate::config::RelayConfig;
use crate::constants::{endpoint, timeout};
use crate::cookies::{self, CookieChanges, CookieSet};
use crate::error::{RelayError, Result};
use crate::retry::{self, RetryPolicy};
use crate::state::{SessionCache, SessionSource};
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::Cookie;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use http::{Method, StatusCode};
use std::time::Duration;

/// A caller request, already split into parts by the HTTP layer.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// What the upstream answered, after header filtering. `set_cookies` holds the
/// upstream `Set-Cookie` values as sent, before they are rewritten for the caller.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub set_cookies: Vec<Cookie<'static>>,
    pub body: Bytes,
}

/// How a caller's session was settled before forwarding.
#[derive(Debug, Clone, PartialEq)]
enum Authentication {
    /// Caller cookies passed `/rest/me`; forwarded verbatim.
    Caller,
    /// Caller already holds the relay's cached login session; forwarded verbatim.
    SharedLogin,
    /// Relay login cookies merged over the caller's.
    Relay(CookieSet),
    /// Login failed; caller cookies only, upstream decides.
    Anonymous,
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Responded,
    BadGateway,
    Internal,
}

impl Outcome {
    fn label(self) -> &'static str {
        match self {
            Outcome::Responded => "responded",
            Outcome::BadGateway => "error_502",
            Outcome::Internal => "error_500",
        }
    }
}

pub struct Relay {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    platform_name: String,
    cache: SessionCache,
}

impl Relay {
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(timeout::FORWARD_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.upstream.base_url().trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
            platform_name: config.platform_name.clone(),
            cache: SessionCache::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// `{base}{path}[?query]`, with exactly one slash between base and path.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = self.base_url.clone();
        if !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(path);
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(q);
        }
        url
    }

    /// One `GET /healthz`.
    pub async fn check_health(&self) -> Result<bool> {
        let resp = self
            .client
            .get(self.target_url(endpoint::HEALTH, None))
            .timeout(Duration::from_secs(timeout::HEALTH_SECS))
            .send()
            .await?;
        Ok(resp.status() == StatusCode::OK)
    }

    pub async fn wait_for_upstream(&self, policy: RetryPolicy) -> Result<u32> {
        retry::wait_until(policy, "n8n", || self.check_health()).await
    }

    /// Cheap name check first; only a plausible session costs a `/rest/me` round trip.
    pub async fn is_authenticated(&self, cookies: &CookieSet) -> bool {
        if !cookies.has_session_marker(&self.platform_name) {
            metrics::counter!("relay_auth_checks_total", "result" => "no_marker").increment(1);
            return false;
        }
        let Some(cookie_header) = cookies.to_header_value() else {
            return false;
        };

        let authenticated = match self
            .client
            .get(self.target_url(endpoint::WHOAMI, None))
            .header(COOKIE, cookie_header)
            .timeout(Duration::from_secs(timeout::WHOAMI_SECS))
            .send()
            .await
        {
            Ok(resp) => resp.status() == StatusCode::OK,
            Err(e) => {
                tracing::warn!("Auth check against {} failed: {}", endpoint::WHOAMI, e);
                false
            }
        };

        let result = if authenticated { "authenticated" } else { "rejected" };
        metrics::counter!("relay_auth_checks_total", "result" => result).increment(1);
        authenticated
    }

    /// Cached login cookies, logging in first if there are none.
    pub async fn login(&self) -> Result<CookieSet> {
        if let Some(cookies) = self.cache.login_cookies() {
            return Ok(cookies);
        }
        let _guard = self.cache.login_lock().lock().await;
        // another request may have logged in while we waited
        if let Some(cookies) = self.cache.login_cookies() {
            return Ok(cookies);
        }
        self.login_upstream().await
    }

    /// Logs in even if a session is cached, replacing it on success.
    pub async fn force_login(&self) -> Result<CookieSet> {
        let _guard = self.cache.login_lock().lock().await;
        self.login_upstream().await
    }

    async fn login_upstream(&self) -> Result<CookieSet> {
        tracing::info!(email = %self.credentials.email, "Attempting auto-login");

        let resp = match self
            .client
            .post(self.target_url(endpoint::LOGIN, None))
            .json(&self.credentials)
            .timeout(Duration::from_secs(timeout::LOGIN_SECS))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                metrics::counter!("relay_logins_total", "outcome" => "error").increment(1);
                return Err(e.into());
            }
        };

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!("Login failed with status {}: {}", status, body);
            metrics::counter!("relay_logins_total", "outcome" => "rejected").increment(1);
            return Err(RelayError::AuthFailure(status));
        }

        let cookies = CookieSet::from_set_cookie_headers(resp.headers());
        if cookies.is_empty() {
            tracing::warn!("Login returned 200 but set no cookies");
        }
        self.cache.store(cookies.clone(), SessionSource::Login);
        metrics::counter!("relay_logins_total", "outcome" => "success").increment(1);
        tracing::info!(cookies = ?cookies.names(), "Successfully logged in");

        Ok(cookies)
    }

    /// Sends one request upstream with `session` as its only `Cookie` header.
    pub async fn forward(&self, req: ForwardRequest, session: &CookieSet) -> Result<UpstreamResponse> {
        let url = self.target_url(&req.path, req.query.as_deref());

        let mut outbound = headers::outbound(&req.headers);
        if let Some(value) = session.to_header_value() {
            outbound.insert(COOKIE, value);
        }

        let mut builder = self.client.request(req.method, url).headers(outbound);
        if !req.body.is_empty() {
            builder = builder.body(req.body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let set_cookies = cookies::parse_set_cookies(resp.headers());
        let headers = headers::inbound(resp.headers());
        let body = resp.bytes().await?;

        Ok(UpstreamResponse {
            status,
            headers,
            set_cookies,
            body,
        })
    }

    async fn authenticate(&self, caller: &CookieSet) -> Authentication {
        if self.is_authenticated(caller).await {
            let shared = self
                .cache
                .login_cookies()
                .is_some_and(|login| caller.shares_session(&login, &self.platform_name));
            if shared {
                return Authentication::SharedLogin;
            }
            self.cache.merge(caller, SessionSource::Caller);
            return Authentication::Caller;
        }
        match self.login().await {
            Ok(login) => Authentication::Relay(login),
            Err(e) => {
                tracing::warn!("Auto-login failed, forwarding caller cookies only: {}", e);
                Authentication::Anonymous
            }
        }
    }

    /// Full per-request pipeline. Never fails: errors become 502/500 responses.
    pub async fn relay(&self, req: ForwardRequest) -> Response {
        let method = req.method.clone();
        let path = req.path.clone();
        let caller = CookieSet::from_request_headers(&req.headers);

        let auth = self.authenticate(&caller).await;
        let cookies = match &auth {
            Authentication::Relay(login) => CookieSet::merged(&caller, login),
            Authentication::Caller | Authentication::SharedLogin | Authentication::Anonymous => {
                caller
            }
        };

        let (response, outcome) = match self.forward(req, &cookies).await {
            Ok(upstream) => match self.respond(upstream, &auth, &path) {
                Ok(response) => (response, Outcome::Responded),
                Err(e) => {
                    tracing::error!("Failed to build response for {} {}: {}", method, path, e);
                    (e.into_response(), Outcome::Internal)
                }
            },
            Err(e) => {
                tracing::error!("Error proxying {} {}: {}", method, path, e);
                let outcome = match e.status_code() {
                    StatusCode::BAD_GATEWAY => Outcome::BadGateway,
                    _ => Outcome::Internal,
                };
                (e.into_response(), outcome)
            }
        };

        metrics::counter!("relay_requests_total", "outcome" => outcome.label()).increment(1);
        response
    }

    fn respond(&self, upstream: UpstreamResponse, auth: &Authentication, path: &str) -> Result<Response> {
        let UpstreamResponse {
            status,
            headers,
            set_cookies,
            body,
        } = upstream;

        // a 401 from the login form is about the submitted credentials, not our session
        let session_rejected = status == StatusCode::UNAUTHORIZED && path != endpoint::LOGIN;
        let changes = CookieChanges::from_set_cookies(&set_cookies);
        let handed_session = match auth {
            Authentication::Relay(_) | Authentication::SharedLogin if session_rejected => {
                tracing::info!("Upstream rejected the cached login session; it will be renewed");
                self.cache.invalidate();
                None
            }
            Authentication::Relay(_) | Authentication::SharedLogin
                if changes.removes_session(&self.platform_name) =>
            {
                tracing::info!("Upstream ended the cached login session; it will be renewed");
                self.cache.invalidate();
                None
            }
            Authentication::Relay(login) => {
                self.cache.apply(&changes, SessionSource::Login);
                Some(login)
            }
            Authentication::SharedLogin => {
                self.cache.apply(&changes, SessionSource::Login);
                None
            }
            Authentication::Caller => {
                self.cache.apply(&changes, SessionSource::Caller);
                None
            }
            Authentication::Anonymous => None,
        };

        let mut response = Response::builder().status(status).body(Body::from(body))?;
        let out = response.headers_mut();
        out.extend(headers);

        for cookie in &set_cookies {
            append_cookie(out, cookies::rewrite_for_client(cookie.clone()))?;
        }

        // hand the relay's session to the browser so later requests carry it
        if let Some(login) = handed_session {
            for (name, value) in login.iter() {
                if set_cookies.iter().any(|c| c.name() == name) {
                    continue;
                }
                append_cookie(out, cookies::session_cookie_for_client(name, value))?;
            }
        }

        Ok(response)
    }
}

fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'static>) -> Result<()> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| RelayError::Internal(format!("invalid Set-Cookie {}: {}", cookie.name(), e)))?;
    headers.append(SET_COOKIE, value);
    Ok(())
}
