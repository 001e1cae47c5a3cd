use dotenvy::dotenv;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use leadserver::api_router::configure_api_routes;
use leadserver::config::AppConfig;
use leadserver::shared::state::AppState;
use leadserver::shared::utils::{create_conn, run_migrations};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::other(format!("config error: {e}")));
        }
    };

    let pool = match create_conn(&config.database.url, config.database.max_connections) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to create database pool: {}", e);
            return Err(std::io::Error::other(format!("database error: {e}")));
        }
    };

    if let Err(e) = run_migrations(&pool) {
        error!("Failed to run migrations: {}", e);
        return Err(std::io::Error::other(format!("migration error: {e}")));
    }
    info!("Database migrations applied");

    let state = Arc::new(AppState {
        conn: pool,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = configure_api_routes().layer(cors).with_state(state);

    let host = config
        .server
        .host
        .parse()
        .unwrap_or_else(|_| [127, 0, 0, 1].into());
    let addr = SocketAddr::new(host, config.server.port);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
