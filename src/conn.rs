//! Framed Connection: a single-producer/single-consumer façade over one
//! WebSocket.
//!
//! Grounded on the same shape the CDP client in this codebase's lineage used
//! to talk to a browser: split the socket once, hand each half to its own
//! perpetual task, and let everyone else talk to the connection only through
//! channels. The wrinkle here is that *both* directions can write to either
//! side (the handlers inject replies), so, unlike a plain request/response
//! client, nothing outside the writer task is ever allowed to touch the sink.

use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, watch, Mutex};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::WebSocketStream;

use crate::error::{Error, Result};

/// How many frames may sit in the outbound queue before `write` blocks the
/// caller. Sized generously for CDP's chattiness rather than tuned to a byte
/// budget; a slow peer's backpressure is meant to propagate to its own
/// socket, not to grow this queue without bound.
const OUTBOUND_CAPACITY: usize = 4096;
const INBOUND_CAPACITY: usize = 4096;

type BoxedSink = Box<dyn Sink<Message, Error = WsError> + Unpin + Send>;
type BoxedStream = Box<dyn Stream<Item = std::result::Result<Message, WsError>> + Unpin + Send>;

/// One side of a [`crate::pair::ConnectionPair`] — either "devtools" or
/// "web". Owns its socket exclusively; upper layers only ever call
/// `read`/`write`/`close`.
pub struct FramedConnection {
    /// Diagnostic label only; never affects behavior.
    pub name: &'static str,
    outbound_tx: mpsc::Sender<Message>,
    inbound_rx: Mutex<mpsc::Receiver<Message>>,
    /// `true` once closed. A `watch` channel rather than a bare `AtomicBool`
    /// so the reader and writer tasks can wait on it without risking a
    /// missed wakeup if `close()` races their next loop iteration.
    closed: watch::Sender<bool>,
}

impl FramedConnection {
    /// Split `ws` and spawn its reader and writer tasks. Returns the
    /// connection ready for `read`/`write`; the tasks run until either
    /// direction errors or `close()` is called.
    pub fn start<S>(name: &'static str, ws: WebSocketStream<S>) -> Arc<Self>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, stream) = ws.split();
        Self::start_from_halves(name, Box::new(sink), Box::new(stream))
    }

    pub(crate) fn start_from_halves(name: &'static str, mut sink: BoxedSink, mut stream: BoxedStream) -> Arc<Self> {
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel::<Message>(INBOUND_CAPACITY);
        let (closed_tx, mut closed_rx) = watch::channel(false);

        let conn = Arc::new(Self {
            name,
            outbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            closed: closed_tx,
        });

        // Reader task: socket -> inbound channel.
        let reader_conn = conn.clone();
        let mut reader_closed_rx = closed_rx.clone();
        tokio::spawn(async move {
            loop {
                if *reader_closed_rx.borrow() {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = reader_closed_rx.changed() => break,
                    next = stream.next() => {
                        match next {
                            Some(Ok(Message::Text(text))) => {
                                if inbound_tx.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::debug!(side = reader_conn.name, "peer closed connection");
                                break;
                            }
                            Some(Ok(_)) => {
                                // Binary/ping/pong frames: CDP only speaks text. Ignore.
                                continue;
                            }
                            Some(Err(e)) => {
                                tracing::debug!(side = reader_conn.name, error = %e, "read error");
                                break;
                            }
                        }
                    }
                }
            }
            reader_conn.close();
        });

        // Writer task: outbound channel -> socket.
        let writer_conn = conn.clone();
        tokio::spawn(async move {
            loop {
                if *closed_rx.borrow() {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = closed_rx.changed() => break,
                    msg = outbound_rx.recv() => {
                        match msg {
                            Some(m) => {
                                if sink.send(m).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                }
            }
            let _ = sink.close().await;
            writer_conn.close();
        });

        conn
    }

    /// Enqueue `frame` for transmission. Fails with [`Error::Closed`] if the
    /// connection has already closed.
    pub async fn write(&self, frame: String) -> Result<()> {
        if *self.closed.borrow() {
            return Err(Error::Closed);
        }
        self.outbound_tx
            .send(Message::Text(frame))
            .await
            .map_err(|_| Error::Closed)
    }

    /// Deliver the next received frame, or [`Error::Closed`] once the
    /// connection has closed and its backlog is drained.
    pub async fn read(&self) -> Result<String> {
        let mut rx = self.inbound_rx.lock().await;
        match rx.recv().await {
            Some(Message::Text(text)) => Ok(text),
            Some(_) | None => Err(Error::Closed),
        }
    }

    /// Idempotent. Marks the connection closed; the reader and writer tasks
    /// observe this on their next poll and tear down the socket themselves.
    pub fn close(&self) {
        let _ = self.closed.send_if_modified(|was_closed| {
            if *was_closed {
                false
            } else {
                *was_closed = true;
                true
            }
        });
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}
