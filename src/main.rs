use anyhow::Context;
use tracing_subscriber::EnvFilter;

use lantern::app;
use lantern::config::Config;
use lantern::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let router = app::router().context("Invalid route table")?;
    let server = Server::new(cfg, router)?;

    server.run().await?;

    tracing::info!("Server stopped");
    Ok(())
}
