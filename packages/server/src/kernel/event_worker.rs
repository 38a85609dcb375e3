//! Single worker applying inbound chat events.
//!
//! ```text
//! POST /events ─► EventQueue::enqueue ─► mpsc (bounded) ─► EventWorker::run
//!                                                             └─► handle_event (one at a time)
//! ```
//!
//! Events are applied strictly in the order they were enqueued; a handler
//! error is logged and the worker moves on to the next event. On shutdown the
//! queue is closed and every event already accepted is still applied.

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domains::submissions::{handle_event, ChatEvent};
use crate::kernel::ServerDeps;

/// Default queue depth before `enqueue` starts waiting.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Producer side of the event queue. Cheap to clone.
#[derive(Clone)]
pub struct EventQueue {
    sender: mpsc::Sender<ChatEvent>,
}

impl EventQueue {
    pub async fn enqueue(&self, event: ChatEvent) -> Result<()> {
        self.sender
            .send(event)
            .await
            .map_err(|_| anyhow!("event worker has stopped"))
    }

    /// Events waiting for the worker.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

pub struct EventWorker {
    receiver: mpsc::Receiver<ChatEvent>,
    deps: ServerDeps,
}

/// Create a connected queue/worker pair.
pub fn event_channel(capacity: usize, deps: ServerDeps) -> (EventQueue, EventWorker) {
    let (sender, receiver) = mpsc::channel(capacity);
    (EventQueue { sender }, EventWorker { receiver, deps })
}

impl EventWorker {
    /// Apply events until shutdown is requested or every producer is gone.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("event worker started");

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.receiver.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.apply(event).await;
        }

        self.receiver.close();
        let mut drained = 0usize;
        while let Some(event) = self.receiver.recv().await {
            self.apply(event).await;
            drained += 1;
        }

        info!(drained, "event worker stopped");
    }

    async fn apply(&self, event: ChatEvent) {
        let kind = event.kind();
        debug!(kind, "applying event");
        if let Err(e) = handle_event(event, &self.deps).await {
            error!(kind, error = %format!("{:#}", e), "event handling failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::submissions::{IncomingMedia, MessageCreated, MessageDeleted};
    use crate::kernel::test_dependencies::TEST_CHANNEL;
    use crate::kernel::TestDependencies;

    fn submission_message(message_id: i64) -> ChatEvent {
        ChatEvent::MessageCreated(MessageCreated {
            message_id,
            channel_id: 7,
            channel_name: TEST_CHANNEL.to_string(),
            author_id: 501,
            author_display_name: "Ada".to_string(),
            content: None,
            attachments: vec![IncomingMedia {
                attachment_id: message_id * 10,
                filename: "a.jpg".to_string(),
                content_type: Some("image/jpeg".to_string()),
                url: format!("https://cdn.example/{}/a.jpg", message_id),
            }],
        })
    }

    #[tokio::test]
    async fn stops_when_all_producers_are_dropped() {
        let deps = TestDependencies::new().into_server_deps();
        let (queue, worker) = event_channel(4, deps);

        queue
            .enqueue(ChatEvent::MessageDeleted(MessageDeleted { message_id: 1 }))
            .await
            .unwrap();
        drop(queue);

        worker.run(CancellationToken::new()).await;
    }

    #[tokio::test]
    async fn enqueue_fails_once_the_worker_is_gone() {
        let deps = TestDependencies::new().into_server_deps();
        let (queue, worker) = event_channel(4, deps);

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        worker.run(shutdown).await;

        let result = queue
            .enqueue(ChatEvent::MessageDeleted(MessageDeleted { message_id: 1 }))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn accepted_events_are_applied_after_shutdown() {
        let test = TestDependencies::new();
        let (queue, worker) = event_channel(4, test.into_server_deps());

        queue.enqueue(submission_message(1)).await.unwrap();
        queue.enqueue(submission_message(2)).await.unwrap();
        assert_eq!(queue.pending(), 2);

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        worker.run(shutdown).await;

        assert_eq!(queue.pending(), 0);
        let origins: Vec<i64> = test
            .repository
            .submissions()
            .iter()
            .map(|s| s.origin_message_id)
            .collect();
        assert_eq!(origins, vec![1, 2]);
    }
}
