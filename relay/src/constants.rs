/// Upstream n8n endpoints
pub mod endpoint {
    pub const LOGIN: &str = "/rest/login";
    pub const WHOAMI: &str = "/rest/me";
    pub const HEALTH: &str = "/healthz";
}

/// Network Configuration
pub mod network {
    pub const LISTEN_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PROXY_PORT: u16 = 8080;
    pub const DEFAULT_CONTROL_PORT: u16 = 8081;
    /// Largest request body the relay buffers (workflow imports can be large)
    pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;
}

/// Timeouts (seconds)
pub mod timeout {
    pub const HEALTH_SECS: u64 = 5;
    pub const WHOAMI_SECS: u64 = 5;
    pub const LOGIN_SECS: u64 = 10;
    pub const FORWARD_SECS: u64 = 30;
    pub const DB_CONNECT_SECS: u64 = 5;
}

/// Startup wait presets (attempts, delay seconds)
pub mod wait {
    pub const UPSTREAM_ATTEMPTS: u32 = 30;
    pub const UPSTREAM_DELAY_SECS: u64 = 2;
    pub const POSTGRES_ATTEMPTS: u32 = 30;
    pub const POSTGRES_DELAY_SECS: u64 = 2;
    pub const SCHEMA_ATTEMPTS: u32 = 40;
    pub const SCHEMA_DELAY_SECS: u64 = 3;
    pub const ROLE_TABLE_ATTEMPTS: u32 = 30;
    pub const ROLE_TABLE_DELAY_SECS: u64 = 2;
}

/// Header filtering applied while relaying
pub mod headers {
    use http::header::{self, HeaderName};

    /// Dropped from the caller's request before it goes upstream.
    /// `Cookie` is replaced by the merged session set.
    pub const STRIPPED_REQUEST: [HeaderName; 4] = [
        header::HOST,
        header::CONNECTION,
        header::CONTENT_LENGTH,
        header::COOKIE,
    ];

    /// Dropped from the upstream response. `Set-Cookie` is re-emitted after rewriting.
    pub const STRIPPED_RESPONSE: [HeaderName; 5] = [
        header::CONTENT_ENCODING,
        header::TRANSFER_ENCODING,
        header::CONTENT_LENGTH,
        header::CONNECTION,
        header::SET_COOKIE,
    ];
}

/// Owner account defaults
pub mod owner {
    /// n8n hashes with 10 bcrypt rounds
    pub const BCRYPT_COST: u32 = 10;
    pub const ROLE_SLUG: &str = "global:owner";
    pub const ROLE_NAME: &str = "owner";
}
