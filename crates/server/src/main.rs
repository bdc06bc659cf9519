//! Smart Search Server binary
//!
//! Loads configuration from `.env`, an optional `server.*` file and
//! `SMART_SEARCH__*` environment variables, then serves until shutdown.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    server::start_server(config).await?;
    Ok(())
}
