use anyhow::Context;
use queuedesk_api::{app, worker, AppState};
use queuedesk_core::QueueEstimator;
use queuedesk_store::{app_config::Config, EventNotifier, InMemoryBookingRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "queuedesk_api=debug,queuedesk_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Queuedesk API on port {}", config.server.port);

    let estimator = QueueEstimator::new(config.estimator).context("Invalid estimator config")?;

    let app_state = AppState {
        bookings: Arc::new(InMemoryBookingRepository::new()),
        notifier: Arc::new(EventNotifier::new(256)),
        estimator: Arc::new(estimator),
    };

    if config.scheduler.enabled {
        tokio::spawn(worker::start_reminder_worker(
            app_state.clone(),
            Duration::from_secs(config.scheduler.reminder_poll_seconds),
        ));
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
