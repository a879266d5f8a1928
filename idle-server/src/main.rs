//! Idle RPG HTTP server.
//!
//! Configuration comes from the environment (or a `.env` file):
//!
//! ```bash
//! PORT=3001 TOKEN_SECRET=<hex> cargo run -p idle-server
//! ```

use idle_server::{app, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.socket_addr();
    tracing::debug!(?config, "loaded configuration");

    let state = AppState::new(config)?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
