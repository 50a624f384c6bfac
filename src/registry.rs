//! Pair Registry: enforces at most one active session per target path.
//!
//! A `DashMap` rather than a `Mutex<HashMap>` for the same reason the CDP
//! client in this codebase's lineage keeps its pending-request table in a
//! `DashMap`: the map is touched from many independent tasks (one acceptor
//! per incoming connection, one teardown per finishing session) and none of
//! them need to hold a lock across an `.await`.

use std::sync::Arc;

use dashmap::DashMap;

use crate::pair::ConnectionPair;

/// Process-wide `target path -> active pair` mapping.
#[derive(Default)]
pub struct PairRegistry {
    pairs: DashMap<String, Arc<ConnectionPair>>,
}

impl PairRegistry {
    pub fn new() -> Self {
        Self {
            pairs: DashMap::new(),
        }
    }

    /// Insert `pair` under `path` iff no pair is currently registered there.
    /// Returns `true` on success. `DashMap::entry` makes the check-then-set
    /// atomic, which is what makes this linearizable under concurrent
    /// acceptors racing on the same path.
    pub fn try_register(&self, path: String, pair: Arc<ConnectionPair>) -> bool {
        match self.pairs.entry(path) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(pair);
                true
            }
        }
    }

    /// Remove the entry for `path`, if present. A no-op if absent (e.g. the
    /// session never made it past registration).
    pub fn unregister(&self, path: &str) {
        self.pairs.remove(path);
    }

    /// Whether a pair is currently registered for `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.pairs.contains_key(path)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::FramedConnection;
    use futures_util::stream;
    use tokio_tungstenite::tungstenite::Error as WsError;

    fn dummy_pair(path: &str) -> Arc<ConnectionPair> {
        // Pairs with no real sockets are fine here: these tests only
        // exercise registry bookkeeping, never I/O.
        let empty: Vec<std::result::Result<tokio_tungstenite::tungstenite::Message, WsError>> = vec![];
        let devtools = FramedConnection::start_from_halves(
            "devtools",
            Box::new(futures_util::sink::drain().sink_map_err(|_: std::convert::Infallible| unreachable!())),
            Box::new(stream::iter(empty)),
        );
        let empty2: Vec<std::result::Result<tokio_tungstenite::tungstenite::Message, WsError>> = vec![];
        let web = FramedConnection::start_from_halves(
            "web",
            Box::new(futures_util::sink::drain().sink_map_err(|_: std::convert::Infallible| unreachable!())),
            Box::new(stream::iter(empty2)),
        );
        Arc::new(ConnectionPair::new(path.to_string(), devtools, web))
    }

    #[tokio::test]
    async fn register_then_duplicate_fails() {
        let registry = PairRegistry::new();
        let pair = dummy_pair("/p/1");
        assert!(registry.try_register("/p/1".to_string(), pair.clone()));
        assert!(!registry.try_register("/p/1".to_string(), dummy_pair("/p/1")));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unregister_allows_reregistration() {
        let registry = PairRegistry::new();
        let pair = dummy_pair("/p/2");
        assert!(registry.try_register("/p/2".to_string(), pair));
        registry.unregister("/p/2");
        assert!(!registry.contains("/p/2"));
        assert!(registry.try_register("/p/2".to_string(), dummy_pair("/p/2")));
    }

    #[tokio::test]
    async fn distinct_paths_do_not_interfere() {
        let registry = PairRegistry::new();
        assert!(registry.try_register("/a".to_string(), dummy_pair("/a")));
        assert!(registry.try_register("/b".to_string(), dummy_pair("/b")));
        assert_eq!(registry.len(), 2);
    }
}
