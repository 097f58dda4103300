use std::sync::Arc;

use dmrelay_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), dmrelay_core::Error> {
    dmrelay_core::logging::init("dmrelay")?;

    let cfg = Arc::new(Config::load()?);

    dmrelay_discord::router::run(cfg)
        .await
        .map_err(|e| dmrelay_core::Error::External(format!("discord relay failed: {e:#}")))?;

    Ok(())
}
