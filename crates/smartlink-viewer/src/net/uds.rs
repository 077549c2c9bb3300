use crate::net::Incoming;
use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use futures_util::{SinkExt, StreamExt};
use smartlink_core::{Msg, MAX_FRAME_LEN, PROTOCOL_VERSION};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;
use tokio_util::bytes::Bytes;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

const RETRY_MIN: Duration = Duration::from_millis(500);
const RETRY_MAX: Duration = Duration::from_secs(10);

/// Stops the reader thread at its next reconnect attempt.
#[derive(Debug, Clone)]
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
}

impl ReaderHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

pub fn spawn_reader(sock_path: String, tx: Sender<Incoming>) -> ReaderHandle {
    let handle = ReaderHandle {
        stop: Arc::new(AtomicBool::new(false)),
    };
    let thread_handle = handle.clone();
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(Incoming::error(sock_path, format!("tokio runtime: {e}")));
                return;
            }
        };
        rt.block_on(reconnect_loop(sock_path, tx, thread_handle));
    });
    handle
}

async fn reconnect_loop(sock_path: String, tx: Sender<Incoming>, handle: ReaderHandle) {
    let mut backoff = RETRY_MIN;
    while !handle.stopped() {
        match run(&sock_path, &tx, &handle).await {
            Ok(()) => backoff = RETRY_MIN,
            Err(e) => {
                tracing::warn!(endpoint = %sock_path, error = %format!("{e:#}"), "feed connection failed");
                let _ = tx.send(Incoming::error(sock_path.clone(), format!("{e:#}")));
                backoff = (backoff * 2).min(RETRY_MAX);
            }
        }
        let _ = tx.send(Incoming::disconnected(sock_path.clone()));
        if handle.stopped() {
            break;
        }
        tokio::time::sleep(backoff).await;
    }
}

async fn run(sock_path: &str, tx: &Sender<Incoming>, handle: &ReaderHandle) -> Result<()> {
    let stream = UnixStream::connect(sock_path)
        .await
        .with_context(|| format!("connect UDS {sock_path}"))?;

    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec();
    let mut framed = Framed::new(stream, codec);
    tracing::info!(endpoint = %sock_path, "connected to feed");
    let _ = tx.send(Incoming::connected(sock_path.to_string()));

    let hello = Msg::Hello {
        version: PROTOCOL_VERSION.into(),
    };
    framed.send(Bytes::from(serde_json::to_vec(&hello)?)).await?;
    framed
        .send(Bytes::from(serde_json::to_vec(&Msg::RequestSnapshot)?))
        .await?;

    while let Some(frame) = framed.next().await {
        if handle.stopped() {
            break;
        }
        let bytes = frame.context("read frame")?;
        match serde_json::from_slice::<Msg>(&bytes) {
            Ok(Msg::Ping) => {
                framed.send(Bytes::from(serde_json::to_vec(&Msg::Pong)?)).await?;
            }
            Ok(m) => {
                if tx.send(Incoming::from_msg(sock_path.to_string(), m)).is_err() {
                    // The app is gone.
                    handle.stop();
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Incoming::error(
                    sock_path.to_string(),
                    format!("decode error: {e}"),
                ));
            }
        }
    }
    Ok(())
}
