use std::sync::Arc;

use anyhow::{Context, Result};
use lib_sense::{ClientEndpoint, WsTransport};
use tokio::signal;

mod relay_logic;
use relay_logic::{config, logger, printer::LinePrinter, transforms::TransformKind};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config();
    logger::setup_logging(config.log_dir(), config.log_level())?;

    let endpoint_config = config.endpoint();
    endpoint_config
        .validate()
        .with_context(|| format!("Refusing to start with url '{}'", config.url()))?;
    let transform: TransformKind = config.transform().parse()?;

    log::info!(
        "Relaying {} with transform {:?}, demand {} per batch",
        endpoint_config.address,
        transform,
        config.demand()
    );

    let endpoint = ClientEndpoint::open_with(endpoint_config, WsTransport, transform).await;
    let printer = Arc::new(LinePrinter::stdout(config.demand()));
    endpoint.subscribe(printer.clone());

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut term_signal) => {
                        term_signal.recv().await;
                        log::info!("SIGTERM received, initiating shutdown.");
                    }
                    Err(e) => {
                        log::warn!("Cannot listen for SIGTERM: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                // On non-unix platforms, just wait forever.
                std::future::pending::<()>().await;
            }
        } => {}
    }

    endpoint.shutdown().await;

    log::info!("Shutdown complete after {} messages.", printer.received());
    Ok(())
}
