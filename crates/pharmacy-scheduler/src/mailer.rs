use pharmacy_core::notify::{Notification, NotificationSink, NotifyError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Queues notifications for a delivery task without blocking the caller.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.tx
            .send(notification.clone())
            .map_err(|_| NotifyError::Closed)
    }
}

/// Drain the queue until every sender is gone.
///
/// Mail transport is not wired in; messages are written to the log.
pub fn spawn_delivery(mut rx: mpsc::UnboundedReceiver<Notification>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut delivered = 0;
        while let Some(notification) = rx.recv().await {
            info!(
                recipient = %notification.recipient,
                subject = %notification.subject,
                "Delivering notification"
            );
            delivered += 1;
        }
        info!(delivered, "Notification delivery stopped");
        delivered
    })
}
