use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vitalscan_observability::init();

    let config = vitalscan_api::config::ApiConfig::from_env();
    tracing::info!(
        bind = %config.bind,
        queue = %config.queue,
        data_dir = %config.data_dir.display(),
        bridge_cmd = %config.bridge.command.display(),
        bridge_timeout_secs = config.bridge.timeout.as_secs(),
        sim_delay_ms = config.simulator_delay.as_millis() as u64,
        "starting vitalscan api"
    );

    let services = Arc::new(vitalscan_api::app::services::build_services(&config)?);
    let app = vitalscan_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
