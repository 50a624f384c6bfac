//! Acceptor: bootstraps one DevTools session from an already-accepted TCP
//! connection.
//!
//! Dialing upstream mirrors the `connect_async` pattern used elsewhere in
//! this codebase's lineage to reach a browser; the difference here is we
//! first have to *be* the server.

use std::sync::Arc;

use http::Uri;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};

use crate::config::Config;
use crate::conn::FramedConnection;
use crate::error::{Error, Result};
use crate::pair::{ConnectionPair, Side};
use crate::registry::PairRegistry;
use crate::transmitter;

/// Handle one incoming TCP connection end to end: upgrade, dial upstream,
/// register, run both transmitter loops, tear down.
pub async fn accept(stream: TcpStream, peer: std::net::SocketAddr, config: Arc<Config>, registry: Arc<PairRegistry>) {
    match run(stream, config, registry).await {
        Ok(()) => {}
        Err(e) => {
            tracing::warn!(peer = %peer, error = %e, "session ended with error");
        }
    }
}

async fn run(stream: TcpStream, config: Arc<Config>, registry: Arc<PairRegistry>) -> Result<()> {
    let mut captured_path = String::new();
    let callback = |req: &Request, resp: Response| {
        captured_path = req.uri().path().to_string();
        Ok(resp)
    };
    let devtools_ws = tokio_tungstenite::accept_hdr_async(stream, callback)
        .await
        .map_err(Error::Upgrade)?;
    let path = captured_path;

    if registry.contains(&path) {
        tracing::warn!(path = %path, "rejecting duplicate session");
        return Err(Error::DuplicateSession(path));
    }

    let upstream_url = upstream_url(&config, &path)?;
    let (web_ws, _) = tokio_tungstenite::connect_async(upstream_url.as_str())
        .await
        .map_err(|source| Error::Dial {
            url: upstream_url,
            source,
        })?;

    let devtools_conn = FramedConnection::start("devtools", devtools_ws);
    let web_conn = FramedConnection::start("web", web_ws);
    let pair = Arc::new(ConnectionPair::new(path.clone(), devtools_conn.clone(), web_conn.clone()));

    if !registry.try_register(path.clone(), pair.clone()) {
        tracing::warn!(path = %path, "lost registration race, closing duplicate session");
        pair.close();
        return Err(Error::DuplicateSession(path));
    }

    tracing::info!(path = %path, "session established");

    let mut devtools_to_web = tokio::spawn(transmitter::run(pair.clone(), Side::DevTools, config.clone()));
    let mut web_to_devtools = tokio::spawn(transmitter::run(pair.clone(), Side::Web, config));

    // Whichever direction finishes (or panics) first closes the pair
    // immediately, so the other direction's blocked `source.read()` is
    // cancelled by its own socket tearing down instead of the session
    // hanging until both tasks exit on their own.
    tokio::select! {
        res = &mut devtools_to_web => {
            if let Err(e) = res {
                tracing::error!(path = %path, error = %e, "devtools->web transmitter task failed");
            }
            pair.close();
            let _ = web_to_devtools.await;
        }
        res = &mut web_to_devtools => {
            if let Err(e) = res {
                tracing::error!(path = %path, error = %e, "web->devtools transmitter task failed");
            }
            pair.close();
            let _ = devtools_to_web.await;
        }
    }

    registry.unregister(&path);
    pair.close();
    tracing::info!(path = %path, "session ended");
    Ok(())
}

fn upstream_url(config: &Config, path: &str) -> Result<String> {
    let url = format!("{}{}", config.upstream_base(), path);
    url.parse::<Uri>()
        .map_err(|e| Error::Config(format!("invalid upstream path {:?}: {}", path, e)))?;
    Ok(url)
}
