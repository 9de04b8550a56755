//! Producer side for the transport layer.

use tokio::sync::mpsc;

use super::event::TransferEvent;

const EVENT_BUFFER: usize = 64;

/// Cloneable sender the transport uses to report progress.
/// Every method returns `false` once the controller has stopped listening.
#[derive(Clone, Debug)]
pub struct TransferEvents {
    tx: mpsc::Sender<TransferEvent>,
}

/// Create a producer handle and the stream the controller consumes.
pub fn transfer_channel() -> (TransferEvents, mpsc::Receiver<TransferEvent>) {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    (TransferEvents { tx }, rx)
}

impl TransferEvents {
    pub async fn metadata(&self, total_bytes: u64) -> bool {
        self.send(TransferEvent::Metadata { total_bytes }).await
    }

    pub async fn progress(&self, fraction: f64) -> bool {
        self.send(TransferEvent::Progress { fraction }).await
    }

    pub async fn completed(&self, files: Vec<String>, decompressed_bytes: u64) -> bool {
        self.send(TransferEvent::Completed {
            files,
            decompressed_bytes,
        })
        .await
    }

    pub async fn failed(&self, message: impl Into<String>) -> bool {
        self.send(TransferEvent::Failed {
            message: message.into(),
        })
        .await
    }

    async fn send(&self, event: TransferEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_order() {
        let (events, mut rx) = transfer_channel();

        assert!(events.metadata(10).await);
        assert!(events.progress(0.5).await);
        assert!(events.failed("lost peer").await);

        assert_eq!(rx.recv().await, Some(TransferEvent::Metadata { total_bytes: 10 }));
        assert_eq!(rx.recv().await, Some(TransferEvent::Progress { fraction: 0.5 }));
        assert_eq!(
            rx.recv().await,
            Some(TransferEvent::Failed {
                message: "lost peer".into()
            })
        );
    }

    #[tokio::test]
    async fn send_after_controller_exit_reports_false() {
        let (events, rx) = transfer_channel();
        drop(rx);

        assert!(!events.completed(vec![], 0).await);
    }
}
