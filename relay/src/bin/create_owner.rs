//! Creates the n8n owner account directly in PostgreSQL, once n8n has migrated its schema.

use n8n_relay::bootstrap::{self, owner::OwnerOutcome};
use n8n_relay::config::ConfigLoader;
use n8n_relay::db;
use n8n_relay::retry::RetryPolicy;

async fn run(loader: &ConfigLoader) -> Result<(), Box<dyn std::error::Error>> {
    let db_config = loader.database()?;
    let owner = loader.owner();

    tracing::info!(
        "Database: {}:{}/{}",
        db_config.host,
        db_config.port,
        db_config.database
    );
    tracing::info!(
        "Owner: {} {} ({})",
        owner.first_name,
        owner.last_name,
        owner.credentials.email
    );

    bootstrap::owner::wait_for_postgres(&db_config, RetryPolicy::postgres()).await?;
    let pool = db::connect(&db_config).await?;

    if let Err(e) = bootstrap::owner::wait_for_table(&pool, "user", RetryPolicy::schema()).await {
        tracing::warn!("{}; attempting to create the owner anyway", e);
    }

    let outcome = bootstrap::owner::ensure_owner(&pool, &owner).await;
    pool.close().await;

    match outcome? {
        OwnerOutcome::Created { id } => {
            tracing::info!("✅ Owner account created: {} (id {})", owner.credentials.email, id)
        }
        OwnerOutcome::AlreadyExists { .. } => {
            tracing::info!("Owner account already present, nothing to do")
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let loader = ConfigLoader::from_env();
    let _log_guard = bootstrap::logging::init_logging(loader.log_dir().as_deref());

    if let Err(e) = run(&loader).await {
        tracing::error!("❌ Failed to create owner account: {}", e);
        std::process::exit(1);
    }
}
