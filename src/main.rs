use std::time::Duration;

use dotenvy::dotenv;
use statusphere::config::Config;
use statusphere::server;
use statusphere::state::AppState;
use statusphere::store::Store;
use statusphere::ExpiredDeletion;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SESSION_CLEANUP_PERIOD: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    let dotenv_loaded = dotenv().is_ok();

    let config = Config::from_env()?;

    let level = if config.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if !dotenv_loaded {
        info!("no .env file found, using environment variables");
    }

    let store = Store::connect(&config.database_url()).await?;
    store.migrate().await?;

    let sessions = store.sessions();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_PERIOD);
        loop {
            interval.tick().await;
            if let Err(err) = sessions.delete_expired().await {
                warn!(error = %err, "failed to delete expired sessions");
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;
    let app = server::router(AppState::new(config, store)?)?;
    info!(%addr, "starting server");

    server::serve(listener, app, server::shutdown_signal(), server::SHUTDOWN_GRACE).await?;
    Ok(())
}
