use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

use super::Notice;
use crate::kernel::BaseChatPlatform;

/// Sends notices to a submission's thread.
///
/// `notify` never fails: a lost status message must not change the outcome
/// of the operation that produced it.
#[derive(Clone)]
pub struct Notifier {
    chat: Arc<dyn BaseChatPlatform>,
}

impl Notifier {
    pub fn new(chat: Arc<dyn BaseChatPlatform>) -> Self {
        Self { chat }
    }

    pub async fn notify(&self, thread_id: i64, notice: Notice) {
        if let Err(e) = self.chat.send_message(thread_id, &notice.to_string()).await {
            warn!(thread_id, notice = ?notice, error = %e, "Failed to send notice");
        }
    }

    /// Send a notice whose message id the caller needs (the approval prompt).
    pub async fn post(&self, thread_id: i64, notice: Notice) -> Result<i64> {
        self.chat.send_message(thread_id, &notice.to_string()).await
    }
}
