use anyhow::{Context, Result};
use pose_alert::api::{create_routes, AppState};
use pose_alert::config::AppConfig;
use pose_alert::services::{PoseEstimationService, PoseEstimator};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::interval;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    info!(
        environment = %config.environment,
        consecutive_frames_threshold = config.detection.consecutive_frames_threshold,
        alert_duration_secs = config.detection.alert_duration_secs,
        "Starting pose alert service"
    );
    if config.is_development() {
        info!("Detection config: {:?}", config.detection);
    }

    let estimator: Option<Arc<dyn PoseEstimator>> = match PoseEstimationService::new(&config.model) {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            warn!(
                "Pose estimation model unavailable, image endpoints will return 503: {:#}",
                e
            );
            None
        }
    };

    let state = Arc::new(AppState::new(
        config.detection.clone(),
        config.model.clone(),
        config.limits.clone(),
        estimator,
    ));
    spawn_session_sweeper(state.clone());
    let app = create_routes(state);

    let address = config.server_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Pose alert server starting on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drop sessions whose clients went away without deleting them
fn spawn_session_sweeper(state: Arc<AppState>) {
    let period = Duration::from_secs((state.limits.session_idle_ttl_secs / 2).clamp(1, 60));
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            state.sessions.evict_idle().await;
        }
    });
}
