use crate::auth;
use crate::config::{DatabaseConfig, OwnerConfig};
use crate::constants;
use crate::db::schema::{self, NewUser, UserTable};
use crate::db::{self, users, DbPool};
use crate::error::Result;
use crate::retry::{self, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerOutcome {
    Created { id: String },
    AlreadyExists { id: String },
}

pub async fn wait_for_postgres(cfg: &DatabaseConfig, policy: RetryPolicy) -> Result<u32> {
    tracing::info!("Waiting for PostgreSQL database at {}:{}...", cfg.host, cfg.port);
    retry::wait_until(policy, "PostgreSQL", || db::ping(cfg)).await
}

/// Waits until n8n's migrations have created `table`.
pub async fn wait_for_table(pool: &DbPool, table: &str, policy: RetryPolicy) -> Result<u32> {
    let label = format!("table {:?}", table);
    retry::wait_until(policy, &label, || schema::table_exists(pool, table)).await
}

async fn owner_role_available(pool: &DbPool) -> bool {
    if let Err(e) = wait_for_table(pool, "role", RetryPolicy::role_table()).await {
        tracing::warn!("{}", e);
        return false;
    }
    match schema::role_exists(pool, constants::owner::ROLE_NAME).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("Owner role lookup failed: {}", e);
            false
        }
    }
}

/// 초기 관리자 계정 생성 (없으면)
///
/// Idempotent: an existing user with the owner email is left untouched.
pub async fn ensure_owner(pool: &DbPool, owner: &OwnerConfig) -> Result<OwnerOutcome> {
    let email = &owner.credentials.email;

    if let Some(id) = users::find_user_id(pool, email).await? {
        tracing::info!("User {} already exists (id {}), skipping creation", email, id);
        return Ok(OwnerOutcome::AlreadyExists { id });
    }

    let columns = schema::table_columns(pool, "user").await?;
    let mut table = UserTable::resolve(&columns)?;
    tracing::debug!(?table, "Resolved user table layout");

    if table.needs_role_table() && !owner_role_available(pool).await {
        tracing::warn!("⚠️ Owner role not found, creating the owner without a role");
        table = table.without_role();
    }

    let user = NewUser {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.clone(),
        password_hash: auth::hash_password(&owner.credentials.password)?,
        first_name: owner.first_name.clone(),
        last_name: owner.last_name.clone(),
    };
    let plan = table.insert_plan(&user);

    tracing::info!("Creating owner account for {}...", email);
    users::insert_user(pool, &plan).await?;

    // with no id column the database assigned one
    let id = match table.id {
        Some(_) => user.id,
        None => users::find_user_id(pool, email).await?.unwrap_or_default(),
    };
    tracing::info!("👤 Created owner account {} (id {})", email, id);

    Ok(OwnerOutcome::Created { id })
}
