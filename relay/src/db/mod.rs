use crate::config::DatabaseConfig;
use crate::constants;
use crate::error::{RelayError, Result};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPoolOptions};
use sqlx::{Connection, Pool, Postgres};
use std::time::Duration;

pub type DbPool = Pool<Postgres>;

pub mod schema;
pub mod users;

pub fn connect_options(cfg: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .database(&cfg.database)
        .username(&cfg.user)
        .password(&cfg.password)
}

/// Opens a single connection, runs `SELECT 1` and closes it. Used as the readiness check.
pub async fn ping(cfg: &DatabaseConfig) -> Result<bool> {
    let options = connect_options(cfg);
    let mut conn = tokio::time::timeout(
        Duration::from_secs(constants::timeout::DB_CONNECT_SECS),
        PgConnection::connect_with(&options),
    )
    .await
    .map_err(|_| RelayError::Timeout {
        what: format!("PostgreSQL connect to {}:{}", cfg.host, cfg.port),
        secs: constants::timeout::DB_CONNECT_SECS,
    })??;

    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&mut conn).await?;
    conn.close().await?;
    Ok(one == 1)
}

pub async fn connect(cfg: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(constants::timeout::DB_CONNECT_SECS))
        .connect_with(connect_options(cfg))
        .await
}
