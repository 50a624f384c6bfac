//! Message Handlers: the per-direction frame transforms the transmitter
//! loop consults for every frame.
//!
//! Both handlers favor a substring check over a full parse, the same
//! "don't pay for structure you don't need" instinct the CDP client in this
//! codebase's lineage applies when it only deserializes the `method`/`id`
//! envelope before dispatching on it.

use std::sync::Arc;

use serde::Deserialize;

use crate::config::{Config, AUTHOR};
use crate::conn::FramedConnection;

const OVERLAY_METHOD: &str = "Overlay.setPausedInDebuggerMessage";
const PAUSED_LITERAL: &str = "Paused in debugger";
const INJECTED_ID_MARKER: &str = "\"id\":0";

const STEP_OUT_COMMAND: &str = r#"{"id":0,"method":"Debugger.stepOut","params":{}}"#;
const RESUME_COMMAND: &str = r#"{"id":0,"method":"Debugger.resume","params":{"terminateOnResume":false}}"#;

/// Outcome of running a frame through a handler.
pub struct HandlerOutcome {
    /// The frame to write to the destination, if any.
    pub frame: Option<String>,
}

impl HandlerOutcome {
    fn forward(frame: String) -> Self {
        Self { frame: Some(frame) }
    }

    fn drop_frame() -> Self {
        Self { frame: None }
    }
}

/// DevTools -> Web: cosmetic rewrite of the "paused in debugger" overlay
/// text, otherwise pass everything through untouched.
pub fn devtools_to_web(frame: String, _config: &Config) -> HandlerOutcome {
    if !frame.contains(OVERLAY_METHOD) {
        return HandlerOutcome::forward(frame);
    }
    match frame.find(PAUSED_LITERAL) {
        Some(idx) => {
            let mut rewritten = String::with_capacity(frame.len() + AUTHOR.len() + 12);
            rewritten.push_str(&frame[..idx]);
            rewritten.push_str(&format!("Paused in debugger - Surprise {}", AUTHOR));
            rewritten.push_str(&frame[idx + PAUSED_LITERAL.len()..]);
            HandlerOutcome::forward(rewritten)
        }
        None => HandlerOutcome::forward(frame),
    }
}

#[derive(Debug, Deserialize)]
struct PausedFrame {
    method: String,
    params: Option<PausedParams>,
}

// CDP's own field names are camelCase; `rename_all` keeps our Rust structs
// snake_case without a rename attribute per field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PausedParams {
    reason: String,
    #[serde(default)]
    hit_breakpoints: Vec<String>,
    #[serde(default)]
    call_frames: Vec<CallFrame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallFrame {
    function_name: String,
}

impl PausedParams {
    fn is_js_debugger(&self) -> bool {
        self.reason == "other" && self.hit_breakpoints.is_empty()
    }

    fn is_my_debugger(&self, debugger_name: &str) -> bool {
        self.is_js_debugger()
            && self
                .call_frames
                .first()
                .map(|f| f.function_name == debugger_name)
                .unwrap_or(false)
    }
}

/// Web -> DevTools: drop injected-command echoes, intercept Debugger.paused
/// according to the paused-handling rule, forward everything else.
///
/// `web` is the same connection the frame was just read from; injected
/// replies are written back onto it.
pub async fn web_to_devtools(frame: String, config: &Config, web: &Arc<FramedConnection>) -> HandlerOutcome {
    if frame.contains(INJECTED_ID_MARKER) {
        return HandlerOutcome::drop_frame();
    }

    let Ok(parsed) = serde_json::from_str::<PausedFrame>(&frame) else {
        return HandlerOutcome::forward(frame);
    };
    if parsed.method != "Debugger.paused" {
        return HandlerOutcome::forward(frame);
    }
    let Some(params) = parsed.params else {
        return HandlerOutcome::forward(frame);
    };

    if !params.is_js_debugger() {
        return HandlerOutcome::forward(frame);
    }

    let injected = if params.is_my_debugger(&config.debugger_name) {
        STEP_OUT_COMMAND
    } else {
        RESUME_COMMAND
    };

    match web.write(injected.to_string()).await {
        Ok(()) => HandlerOutcome::drop_frame(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to inject command, forwarding paused frame instead");
            HandlerOutcome::forward(frame)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use tokio_tungstenite::tungstenite::{Error as WsError, Message};

    fn empty_conn() -> Arc<FramedConnection> {
        let empty: Vec<std::result::Result<Message, WsError>> = vec![];
        FramedConnection::start_from_halves(
            "web",
            Box::new(futures_util::sink::drain().sink_map_err(|_: std::convert::Infallible| unreachable!())),
            Box::new(stream::iter(empty)),
        )
    }

    #[test]
    fn overlay_rewrite_replaces_first_occurrence_only() {
        let cfg = Config::default();
        let frame = format!(
            r#"{{"method":"{}","params":{{"message":"Paused in debugger and Paused in debugger again"}}}}"#,
            OVERLAY_METHOD
        );
        let out = devtools_to_web(frame, &cfg);
        let rewritten = out.frame.unwrap();
        assert!(rewritten.contains("Paused in debugger - Surprise lovedebug and Paused in debugger again"));
    }

    #[test]
    fn non_overlay_frames_pass_through_unchanged() {
        let cfg = Config::default();
        let frame = r#"{"method":"Page.navigate","params":{}}"#.to_string();
        let out = devtools_to_web(frame.clone(), &cfg);
        assert_eq!(out.frame.unwrap(), frame);
    }

    #[tokio::test]
    async fn id_zero_substring_is_always_dropped() {
        let cfg = Config::default();
        let web = empty_conn();
        let frame = r#"{"id":0,"result":{}}"#.to_string();
        let out = web_to_devtools(frame, &cfg, &web).await;
        assert!(out.frame.is_none());
    }

    #[tokio::test]
    async fn id_zero_inside_a_string_field_is_still_dropped() {
        let cfg = Config::default();
        let web = empty_conn();
        let frame = r#"{"method":"Network.loadingFinished","params":{"note":"contains \"id\":0 inline"}}"#.to_string();
        let out = web_to_devtools(frame, &cfg, &web).await;
        assert!(out.frame.is_none());
    }

    #[tokio::test]
    async fn trap_pause_is_dropped_and_resume_is_injected() {
        let cfg = Config::default();
        let web = empty_conn();
        let frame = r#"{"method":"Debugger.paused","params":{"reason":"other","hitBreakpoints":[],"callFrames":[{"functionName":"trap_xyz"}]}}"#.to_string();
        let out = web_to_devtools(frame, &cfg, &web).await;
        assert!(out.frame.is_none());
        let injected = web.read().await.unwrap();
        assert_eq!(injected, RESUME_COMMAND);
    }

    #[tokio::test]
    async fn sentinel_pause_is_dropped_and_step_out_is_injected() {
        let cfg = Config::default();
        let web = empty_conn();
        let frame = r#"{"method":"Debugger.paused","params":{"reason":"other","hitBreakpoints":[],"callFrames":[{"functionName":"lovedebug"},{"functionName":"userCode"}]}}"#.to_string();
        let out = web_to_devtools(frame, &cfg, &web).await;
        assert!(out.frame.is_none());
        let injected = web.read().await.unwrap();
        assert_eq!(injected, STEP_OUT_COMMAND);
    }

    #[tokio::test]
    async fn real_breakpoint_passes_through_untouched() {
        let cfg = Config::default();
        let web = empty_conn();
        let frame = r#"{"method":"Debugger.paused","params":{"reason":"other","hitBreakpoints":["bp1"],"callFrames":[{"functionName":"foo"}]}}"#.to_string();
        let out = web_to_devtools(frame.clone(), &cfg, &web).await;
        assert_eq!(out.frame.unwrap(), frame);
    }

    #[tokio::test]
    async fn non_other_reason_is_forwarded_byte_identically() {
        let cfg = Config::default();
        let web = empty_conn();
        let frame = r#"{"method":"Debugger.paused","params":{"reason":"ambiguous","hitBreakpoints":[],"callFrames":[{"functionName":"foo"}]}}"#.to_string();
        let out = web_to_devtools(frame.clone(), &cfg, &web).await;
        assert_eq!(out.frame.unwrap(), frame);
    }

    #[tokio::test]
    async fn unparseable_frames_are_forwarded() {
        let cfg = Config::default();
        let web = empty_conn();
        let frame = "not json at all".to_string();
        let out = web_to_devtools(frame.clone(), &cfg, &web).await;
        assert_eq!(out.frame.unwrap(), frame);
    }
}
