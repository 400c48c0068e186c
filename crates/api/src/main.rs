//! SmartSession - Main Entry Point

use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    init_logging(&settings.logging)?;

    info!("=== SmartSession v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Look-away threshold {}ms, confusion threshold {}ms, journal capacity {}",
        settings.proctor.look_away_threshold_ms,
        settings.proctor.confusion_threshold_ms,
        settings.proctor.journal_capacity
    );

    run_server(settings).await?;

    Ok(())
}
