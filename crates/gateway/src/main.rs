use anyhow::Result;
use channel::{DEFAULT_FRAME_SHAPE, FRAME_CHANNEL_PATH};
use common::{Environment, setup_logging};
use gateway::config::GatewayConfig;
use gateway::producer::ChannelFrameProducer;
use gateway::routes::{AppState, router};
use gateway::supervisor::{Mode, Supervisor};
use gateway::viewer::StreamViewer;
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> Result<()> {
    let environment = Environment::from_env();
    setup_logging(environment);

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        worker = %config.worker_bin.display(),
        "Gateway starting"
    );

    let supervisor = Arc::new(Mutex::new(Supervisor::new(
        config.worker_bin.clone(),
        config.worker_term_timeout,
    )));

    let interval = config.stream_interval();
    let viewer = Arc::new(StreamViewer::new(
        || Box::new(ChannelFrameProducer::new(FRAME_CHANNEL_PATH, DEFAULT_FRAME_SHAPE)),
        interval,
    ));

    let state = AppState {
        supervisor: Arc::clone(&supervisor),
        viewer,
        stream_interval: interval,
    };

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("Listening on {}", config.listen_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    // Tear the worker down before exiting so the camera and frame channel
    // are released.
    let result = tokio::task::spawn_blocking(move || {
        supervisor
            .lock()
            .map_err(|_| anyhow::anyhow!("supervisor lock poisoned"))?
            .set_mode(Mode::Standby)
    })
    .await?;

    if let Err(e) = result {
        tracing::warn!("Worker teardown on shutdown failed: {e}");
    }

    Ok(())
}
