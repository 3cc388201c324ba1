//! Cancellable producer of streamed text fragments.
//!
//! A spawned task reads the response body, decodes SSE chunks and forwards
//! text deltas over a bounded channel. The consumer (the content panel) can
//! cancel at any time, from the stream itself or through a `CancelHandle`
//! held by whoever owns the view; dropping the stream cancels as well.

use std::pin::{Pin, pin};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::error::GuideError;
use crate::sse::{SseDecoder, SseEvent, parse_delta};

/// Fragments buffered ahead of a slow consumer.
pub const FRAGMENT_CHANNEL_CAPACITY: usize = 64;

type FragmentItem = Result<String, GuideError>;

#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

#[derive(Debug)]
pub struct FragmentStream {
    rx: mpsc::Receiver<FragmentItem>,
    cancel: CancelHandle,
}

impl FragmentStream {
    /// Spawns the producer task over an SSE response body.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S, E>(body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(produce(body, tx, cancel_rx));

        Self {
            rx,
            cancel: CancelHandle {
                tx: Arc::new(cancel_tx),
            },
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Stops the producer. No fragment is delivered after this returns.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.rx.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Next fragment; `None` once the stream finished or was cancelled.
    pub async fn next_fragment(&mut self) -> Option<FragmentItem> {
        if self.is_cancelled() {
            return None;
        }
        let item = self.rx.recv().await;
        if self.is_cancelled() {
            return None;
        }
        item
    }

    /// Concatenates every fragment. Fails with `Cancelled` if cancelled first.
    pub async fn collect_text(mut self) -> Result<String, GuideError> {
        let mut out = String::new();
        while let Some(item) = self.next_fragment().await {
            out.push_str(&item?);
        }
        if self.is_cancelled() {
            return Err(GuideError::Cancelled);
        }
        Ok(out)
    }
}

impl Stream for FragmentStream {
    type Item = FragmentItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.is_cancelled() {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl Drop for FragmentStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn produce<S, E>(body: S, tx: mpsc::Sender<FragmentItem>, mut cancel_rx: watch::Receiver<bool>)
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let mut body = pin!(body);
    let mut decoder = SseDecoder::new();

    loop {
        if *cancel_rx.borrow() {
            debug!("fragment stream cancelled");
            return;
        }

        let chunk = tokio::select! {
            biased;
            changed = cancel_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                continue;
            }
            chunk = body.next() => chunk,
        };

        let (events, ended) = match chunk {
            Some(Ok(bytes)) => (decoder.push(&bytes), false),
            Some(Err(e)) => {
                warn!("fragment stream transport error: {e}");
                deliver(&tx, &mut cancel_rx, Err(GuideError::Transport(e.to_string()))).await;
                return;
            }
            None => (decoder.finish(), true),
        };

        for event in events {
            let data = match event {
                SseEvent::Done => {
                    debug!("fragment stream finished");
                    return;
                }
                SseEvent::Data(data) => data,
            };
            match parse_delta(&data) {
                Ok(Some(text)) => {
                    if !deliver(&tx, &mut cancel_rx, Ok(text)).await {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    deliver(&tx, &mut cancel_rx, Err(e)).await;
                    return;
                }
            }
        }

        if ended {
            debug!("fragment stream body ended without [DONE]");
            return;
        }
    }
}

/// Sends one item unless cancelled first. Returns `false` when the consumer is gone.
async fn deliver(tx: &mpsc::Sender<FragmentItem>, cancel_rx: &mut watch::Receiver<bool>, item: FragmentItem) -> bool {
    if *cancel_rx.borrow() {
        return false;
    }
    tokio::select! {
        biased;
        _ = cancel_rx.changed() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}
