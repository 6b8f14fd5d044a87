use merx_api::{app, worker, AppState};
use merx_cart::Reclaimer;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merx_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = merx_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Merx API on port {}", config.server.port);

    let db = merx_store::DbClient::new(&config.database)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Background expiry sweep shares the pool and the locking discipline
    // with the request path.
    let reclaimer = Arc::new(Reclaimer::new(db.clone()));
    tokio::spawn(worker::start_reclaim_worker(
        reclaimer,
        config.worker.sweep_interval_seconds,
    ));

    let app_state = AppState::new(db);
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
