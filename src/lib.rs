//! Reverse CDP proxy: sits between DevTools and a browser's remote-debug
//! endpoint, neutralizing page-injected anti-debugging traps while leaving
//! the user's own breakpoints alone.

pub mod acceptor;
pub mod config;
pub mod conn;
pub mod error;
pub mod handlers;
pub mod pair;
pub mod registry;
pub mod transmitter;

pub use config::Config;
pub use error::{Error, Result};
pub use registry::PairRegistry;
