use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};

use crate::types::AnalysisResult;

/// Receives short, user-facing progress messages.
pub trait StatusSink: Send + Sync {
    fn push(&self, message: &str);
}

/// Receives published results. Publication is one-shot per run.
pub trait ResultSink: Send + Sync {
    fn publish(&self, result: Arc<AnalysisResult>);

    fn clear(&self);
}

/// A status message stamped with the time it was pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl StatusEvent {
    /// The message, prefixed with `[HH:MM:SS]` (UTC) when `with_time` is set.
    pub fn render(&self, with_time: bool) -> String {
        if with_time {
            format!("[{}] {}", self.at.format("%H:%M:%S"), self.message)
        } else {
            self.message.clone()
        }
    }
}

/// Forwards status messages to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelStatusSink {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelStatusSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelStatusSink {
    fn push(&self, message: &str) {
        let event = StatusEvent {
            at: Utc::now(),
            message: message.to_string(),
        };
        // A dropped receiver only means nobody is watching any more
        if self.tx.send(event).is_err() {
            tracing::debug!("Status receiver gone, dropping: {}", message);
        }
    }
}

/// Writes status messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn push(&self, message: &str) {
        tracing::info!(status = message);
    }
}

/// Holds the latest published result.
///
/// Consumers take cheap snapshots or subscribe to changes; they never
/// mutate the result itself.
#[derive(Debug)]
pub struct ResultStore {
    tx: watch::Sender<Option<Arc<AnalysisResult>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn snapshot(&self) -> Option<Arc<AnalysisResult>> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<AnalysisResult>>> {
        self.tx.subscribe()
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for ResultStore {
    fn publish(&self, result: Arc<AnalysisResult>) {
        self.tx.send_replace(Some(result));
    }

    fn clear(&self) {
        self.tx.send_replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[test]
    fn test_result_store_publish_and_clear() {
        let store = ResultStore::new();
        assert!(store.snapshot().is_none());

        let mut rx = store.subscribe();
        store.publish(Arc::new(AnalysisResult::empty()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            rx.borrow_and_update().as_deref(),
            Some(&AnalysisResult::empty())
        );

        store.clear();
        assert!(store.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_channel_status_sink_preserves_order() {
        let (sink, mut rx) = ChannelStatusSink::new();
        sink.push("first");
        sink.push("second");
        assert_eq!(rx.recv().await.unwrap().message, "first");
        assert_eq!(rx.recv().await.unwrap().message, "second");
    }

    #[test]
    fn test_status_event_render() {
        let event = StatusEvent {
            at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            message: "Building UML...".to_string(),
        };
        assert_eq!(event.render(false), "Building UML...");
        assert_eq!(event.render(true), "[14:05:07] Building UML...");
    }

    #[test]
    fn test_log_status_sink_writes_to_log() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer_buffer = Arc::clone(&buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || SharedBuffer(Arc::clone(&writer_buffer)))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            LogStatusSink.push("Downloading sources...");
        });

        let logged = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("INFO"));
        assert!(logged.contains("Downloading sources..."));
    }

    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_channel_status_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelStatusSink::new();
        drop(rx);
        sink.push("nobody listens");
    }
}
