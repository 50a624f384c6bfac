//! Transmitter loop: moves frames from one side of a pair to the other,
//! running each one through the direction's handler first.

use std::sync::Arc;

use crate::config::Config;
use crate::handlers::{devtools_to_web, web_to_devtools};
use crate::pair::{ConnectionPair, Side};

/// Forward frames `source -> destination` until either side errors. Closes
/// both connections of `pair` before returning, so running both directions
/// concurrently and joining them is enough to tear a session down cleanly.
pub async fn run(pair: Arc<ConnectionPair>, side: Side, config: Arc<Config>) {
    let source = pair.source(side).clone();
    let destination = pair.destination(side).clone();

    loop {
        let frame = match source.read().await {
            Ok(frame) => frame,
            Err(_) => break,
        };

        let outcome = match side {
            Side::DevTools => devtools_to_web(frame, &config),
            Side::Web => web_to_devtools(frame, &config, &source).await,
        };

        if let Some(frame) = outcome.frame {
            if destination.write(frame).await.is_err() {
                break;
            }
        }
    }

    pair.close();
}
