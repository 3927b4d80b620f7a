use anyhow::{Error, Result};
use tokio::sync::watch;
use tracing::{error, info};
use user_event_relay::{config::Config, logging::init_tracing, worker};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::load()?;
    init_tracing(config.log_format)?;

    info!(
        app_version = env!("CARGO_PKG_VERSION"),
        source_exchange = %config.source_exchange,
        target_exchange = %config.target_exchange,
        "Starting user event relay"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        worker::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = worker::run(config, shutdown_rx).await {
        error!(error = %e, "Relay stopped with a fatal error");
        return Err(e.into());
    }

    Ok(())
}
