use std::sync::Arc;

use anyhow::{Context, Result};
use twmap_core::Config;
use twmap_ui::Dashboard;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize core
    twmap_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    if !config.forecast.is_configured() {
        tracing::warn!("No CWA API key configured; set CWA_API_KEY or edit config.toml");
    }

    let dashboard = Arc::new(Dashboard::from_config(&config)?);
    let addr = config.server.socket_addr().context("Invalid server address")?;

    tracing::info!("twmap started");
    println!("台灣氣溫分布圖: http://{}", addr);

    twmap_ui::serve(dashboard, addr).await
}
