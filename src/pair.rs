//! Connection Pair: the two Framed Connections that make up one debug
//! session.

use std::sync::Arc;

use crate::conn::FramedConnection;

/// Which side of a pair a connection is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    DevTools,
    Web,
}

/// One active debug session: a DevTools-facing connection tethered to the
/// matching upstream browser connection, both bound to the same target
/// path.
pub struct ConnectionPair {
    pub target_path: String,
    pub devtools: Arc<FramedConnection>,
    pub web: Arc<FramedConnection>,
}

impl ConnectionPair {
    pub fn new(target_path: String, devtools: Arc<FramedConnection>, web: Arc<FramedConnection>) -> Self {
        Self {
            target_path,
            devtools,
            web,
        }
    }

    /// The connection frames flow *into* for a given direction.
    pub fn source(&self, side: Side) -> &Arc<FramedConnection> {
        match side {
            Side::DevTools => &self.devtools,
            Side::Web => &self.web,
        }
    }

    /// The connection frames flow *out to* for a given direction.
    pub fn destination(&self, side: Side) -> &Arc<FramedConnection> {
        match side {
            Side::DevTools => &self.web,
            Side::Web => &self.devtools,
        }
    }

    /// Close both sides. Idempotent, safe to call from either transmitter
    /// loop once it observes an error.
    pub fn close(&self) {
        self.devtools.close();
        self.web.close();
    }
}
