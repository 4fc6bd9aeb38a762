use n8n_relay::api;
use n8n_relay::bootstrap;
use n8n_relay::config::ConfigLoader;
use n8n_relay::constants::network;
use n8n_relay::relay::Relay;
use n8n_relay::retry::RetryPolicy;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 설정 및 로깅 초기화
    let loader = ConfigLoader::from_env();
    let _log_guard = bootstrap::logging::init_logging(loader.log_dir().as_deref());
    let config = loader.relay()?;

    tracing::info!("Starting auto-login relay for n8n at {}", config.upstream.base_url());
    tracing::info!("Auto-login email: {}", config.credentials.email);

    let metrics = match bootstrap::metrics::init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Metrics recorder unavailable: {}", e);
            None
        }
    };

    let relay = Arc::new(Relay::new(&config)?);

    // 2. 업스트림 준비 대기 (실패해도 계속 진행)
    if let Err(e) = relay.wait_for_upstream(RetryPolicy::upstream_health()).await {
        tracing::warn!("n8n may not be ready yet, continuing anyway: {}", e);
    }

    // 3. 초기 로그인
    if let Err(e) = relay.login().await {
        tracing::warn!("Initial login failed, will retry on first request: {}", e);
    }

    // 4. Control Plane
    if let Some(port) = config.control_port {
        let app = api::control_router(relay.clone(), metrics);
        let listener = TcpListener::bind((network::LISTEN_HOST, port)).await?;
        tracing::info!("🎮 Control Plane (API) running on port {}", port);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Control plane stopped: {}", e);
            }
        });
    }

    // 5. Relay (bind 실패만 치명적)
    let listener = TcpListener::bind((network::LISTEN_HOST, config.proxy_port)).await?;
    tracing::info!("🚀 Relay running on port {}", config.proxy_port);
    axum::serve(listener, api::relay_router(relay)).await?;

    Ok(())
}
