use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::error::{IntentbotError, Result};

use super::{Conversation, ConversationLoop};

enum Command {
    Send {
        text: String,
        reply: oneshot::Sender<Result<String>>,
    },
    Snapshot {
        reply: oneshot::Sender<Conversation>,
    },
    Reset,
}

/// Owns a conversation on a background task and serializes messages to it.
///
/// Messages are processed one at a time in submission order. The worker
/// stops once every clone of the handle is dropped.
#[derive(Clone)]
pub struct ConversationHandle {
    tx: mpsc::Sender<Command>,
}

impl ConversationHandle {
    /// Spawn the worker task. Must be called inside a tokio runtime.
    pub fn spawn(agent: Arc<ConversationLoop>, conversation: Conversation, api_key: String) -> Self {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(run(agent, conversation, api_key, rx));
        Self { tx }
    }

    /// Queue a message and return a channel that yields its result.
    pub async fn submit(&self, text: impl Into<String>) -> Result<oneshot::Receiver<Result<String>>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Send {
                text: text.into(),
                reply,
            })
            .await
            .map_err(|_| worker_stopped())?;
        Ok(rx)
    }

    /// Queue a message and wait for the final text.
    pub async fn send(&self, text: impl Into<String>) -> Result<String> {
        let rx = self.submit(text).await?;
        rx.await.map_err(|_| worker_stopped())?
    }

    /// Copy of the conversation after all previously queued messages.
    pub async fn snapshot(&self) -> Result<Conversation> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| worker_stopped())?;
        rx.await.map_err(|_| worker_stopped())
    }

    /// Clear the conversation back to its system turn.
    pub async fn reset(&self) -> Result<()> {
        self.tx
            .send(Command::Reset)
            .await
            .map_err(|_| worker_stopped())
    }
}

async fn run(
    agent: Arc<ConversationLoop>,
    mut conversation: Conversation,
    api_key: String,
    mut rx: mpsc::Receiver<Command>,
) {
    info!("Conversation worker started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Send { text, reply } => {
                let result = agent
                    .send_user_message(&mut conversation, &text, &api_key)
                    .await;
                if reply.send(result).is_err() {
                    debug!("Caller dropped the reply channel");
                }
            }
            Command::Snapshot { reply } => {
                reply.send(conversation.clone()).ok();
            }
            Command::Reset => conversation.reset(),
        }
    }

    info!("Conversation worker stopped");
}

fn worker_stopped() -> IntentbotError {
    IntentbotError::Other("conversation worker stopped".to_string())
}
