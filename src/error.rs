//! Error types for the proxy.
//!
//! One enum, not one-per-module: every fallible operation in this crate
//! ultimately bottoms out in a socket, a parse, or a startup check, and the
//! call sites that matter (the acceptor, `main`) want a single type to match
//! on.

use thiserror::Error;

/// Result type for proxy operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad CLI input, an unopenable log file, or any other startup-time
    /// misconfiguration. Always fatal.
    #[error("configuration error: {0}")]
    Config(String),

    /// The CDP listener could not bind its port.
    #[error("failed to bind listener on port {port}: {source}")]
    Listen {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The incoming WebSocket handshake with the DevTools client failed.
    #[error("WebSocket upgrade failed: {0}")]
    Upgrade(#[source] tokio_tungstenite::tungstenite::Error),

    /// Dialing the upstream browser debug endpoint failed.
    #[error("failed to dial upstream {url}: {source}")]
    Dial {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// A second DevTools client tried to attach to a target that already has
    /// an active session.
    #[error("target {0} already has an active session")]
    DuplicateSession(String),

    /// A Framed Connection was used after it closed. Covers both "closed
    /// deliberately" and "the underlying socket failed" — the reader/writer
    /// tasks in `conn` already log the distinguishing detail at `debug`
    /// before collapsing into this variant.
    #[error("connection closed")]
    Closed,
}
