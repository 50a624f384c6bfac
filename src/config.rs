//! Startup configuration.
//!
//! Read once in `main`, wrapped in `Arc`, and handed to every task that
//! needs it. Nothing here is re-read or mutated once the proxy is running.

use clap::Parser;

/// Function name the proxy treats as the user's intentional breakpoint
/// sentinel (see the Web -> DevTools handler).
pub const DEFAULT_DEBUGGER_NAME: &str = "lovedebug";

/// Port the proxy listens on for incoming DevTools connections.
pub const DEFAULT_CDP_PORT: u16 = 9221;

/// Port of the upstream browser's remote-debugging endpoint.
pub const DEFAULT_BROWSER_PORT: u16 = 9222;

/// Attribution string appended to the cosmetic Overlay rewrite.
pub const AUTHOR: &str = "lovedebug";

/// Path the log file is (re)created at when `--log` is set.
pub const LOG_FILE: &str = "server.log";

#[derive(Debug, Clone, Parser)]
#[command(name = "cdp-proxy", about = "Reverse CDP proxy that hides DevTools from anti-debug traps")]
pub struct Config {
    /// Function name treated as the user's own breakpoint sentinel, as
    /// opposed to a page-injected anti-debug trap.
    #[arg(long, env = "DEBUGGER_NAME", default_value = DEFAULT_DEBUGGER_NAME)]
    pub debugger_name: String,

    /// Port the proxy listens on for DevTools connections.
    #[arg(long, env = "CDP_PORT", default_value_t = DEFAULT_CDP_PORT)]
    pub cdp_port: u16,

    /// Port of the upstream browser's remote-debugging endpoint.
    #[arg(long, env = "BROWSER_PORT", default_value_t = DEFAULT_BROWSER_PORT)]
    pub browser_port: u16,

    /// Write verbose logs to `server.log` instead of discarding them.
    #[arg(long, env = "LOG")]
    pub log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debugger_name: DEFAULT_DEBUGGER_NAME.to_string(),
            cdp_port: DEFAULT_CDP_PORT,
            browser_port: DEFAULT_BROWSER_PORT,
            log: false,
        }
    }
}

impl Config {
    /// Base URL the proxy dials to reach the upstream browser, sans the
    /// client-supplied target path.
    pub fn upstream_base(&self) -> String {
        format!("ws://localhost:{}/devtools/page", self.browser_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.debugger_name, "lovedebug");
        assert_eq!(cfg.cdp_port, 9221);
        assert_eq!(cfg.browser_port, 9222);
        assert!(!cfg.log);
    }

    #[test]
    fn upstream_base_uses_browser_port() {
        let cfg = Config {
            browser_port: 9333,
            ..Config::default()
        };
        assert_eq!(cfg.upstream_base(), "ws://localhost:9333/devtools/page");
    }
}
