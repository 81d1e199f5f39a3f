//! Progress event sinks.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::BrookError;
use crate::types::ProgressEvent;

/// Delivers progress events to the client.
///
/// An `Err` means the client is gone; the runner stops consuming and returns
/// [`BrookError::Canceled`].
#[async_trait]
pub trait SseEmitter: Send + Sync {
    async fn emit(&self, event: ProgressEvent) -> Result<(), BrookError>;
}

/// Emitter backed by a bounded channel. Dropping the receiver cancels the turn.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelEmitter {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Create an emitter and the receiving half.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl SseEmitter for ChannelEmitter {
    async fn emit(&self, event: ProgressEvent) -> Result<(), BrookError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| BrookError::Canceled("client disconnected".into()))
    }
}

/// Callback invoked for each progress event.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emitter that hands every event to a callback and never fails.
#[derive(Clone)]
pub struct CallbackEmitter {
    sink: ProgressSink,
}

impl CallbackEmitter {
    pub fn new(sink: ProgressSink) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl SseEmitter for CallbackEmitter {
    async fn emit(&self, event: ProgressEvent) -> Result<(), BrookError> {
        (self.sink)(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn channel_emitter_reports_disconnect_as_cancel() {
        let (emitter, rx) = ChannelEmitter::channel(4);
        emitter
            .emit(ProgressEvent::Delta { delta: "a".into() })
            .await
            .unwrap();
        drop(rx);
        let err = emitter
            .emit(ProgressEvent::Delta { delta: "b".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, BrookError::Canceled(_)));
    }

    #[tokio::test]
    async fn callback_emitter_forwards_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let emitter = CallbackEmitter::new(Arc::new(move |event| {
            sink_seen.lock().unwrap().push(event);
        }));
        emitter.emit(ProgressEvent::error("boom")).await.unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[ProgressEvent::error("boom")]);
    }
}
