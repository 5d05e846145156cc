//! fraudlens server binary
//!
//! Reads `.env`, then the `server` config file and `FRAUDLENS_SERVER__*`
//! environment variables, and serves the search API.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::load()?;
    server::start_server(config).await?;

    Ok(())
}
