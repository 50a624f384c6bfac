use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use cdp_proxy::config::{Config, LOG_FILE};
use cdp_proxy::{acceptor, Error, PairRegistry};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(e) => {
            // clap's own error already renders usage/help; just surface it.
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let listener = match TcpListener::bind(("0.0.0.0", config.cdp_port)).await {
        Ok(listener) => listener,
        Err(source) => {
            let err = Error::Listen {
                port: config.cdp_port,
                source,
            };
            tracing::error!(error = %err, "failed to bind CDP listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(port = config.cdp_port, browser_port = config.browser_port, "cdp-proxy listening");

    let config = Arc::new(config);
    let registry = Arc::new(PairRegistry::new());

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept connection");
                continue;
            }
        };

        let config = config.clone();
        let registry = registry.clone();
        tokio::spawn(async move {
            acceptor::accept(stream, peer, config, registry).await;
        });
    }
}

/// `--log` writes verbose logs to a truncated `server.log`; otherwise all
/// tracing output is discarded. Either way stdout stays clean for the
/// terminal the proxy is launched from.
fn init_logging(config: &Config) -> std::io::Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if config.log {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(LOG_FILE)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init();
    }
    Ok(())
}
