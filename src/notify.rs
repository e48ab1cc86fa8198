use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Delivery backend; the OS notifier is an external collaborator behind this.
pub trait NotificationSink: Send + 'static {
    fn deliver(&mut self, notification: &Notification);
}

/// Default sink: writes notifications to the log.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&mut self, notification: &Notification) {
        info!("[notification] {}: {}", notification.title, notification.message);
    }
}

/// Fire-and-forget notification delivery off the UI loop.
///
/// A bounded queue feeds one background task that drains into the sink, so a
/// slow notifier can never block a state transition. No acknowledgment and no
/// retry; when the queue is full the notification is dropped.
pub struct NotificationService {
    tx: mpsc::Sender<Notification>,
    worker: JoinHandle<()>,
}

impl NotificationService {
    pub fn spawn(mut sink: impl NotificationSink, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Notification>(capacity);
        let worker = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                sink.deliver(&notification);
            }
        });
        Self { tx, worker }
    }

    pub fn send(&self, title: &str, message: &str) {
        let notification = Notification {
            title: title.to_string(),
            message: message.to_string(),
        };
        if self.tx.try_send(notification).is_err() {
            warn!("Notification queue full, dropping '{}'", title);
        }
    }

    /// Close the queue and wait for everything already queued to go out.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}
