//! client_messages tool implementation.
//!
//! The host registers itself as a client at start-up; this drains whatever
//! the worker broadcast to it since the last call.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};

use easycal_core::WorkerMessage;

use super::json_result;

/// The host's own client connection.
pub struct Inbox {
    pub client_id: String,
    receiver: Mutex<mpsc::UnboundedReceiver<WorkerMessage>>,
}

impl Inbox {
    pub fn new(client_id: String, receiver: mpsc::UnboundedReceiver<WorkerMessage>) -> Self {
        Self { client_id, receiver: Mutex::new(receiver) }
    }

    /// Everything received so far, oldest first.
    pub async fn drain(&self) -> Vec<WorkerMessage> {
        let mut receiver = self.receiver.lock().await;
        let mut messages = Vec::new();
        while let Ok(message) = receiver.try_recv() {
            messages.push(message);
        }
        messages
    }
}

/// Output from the client_messages tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientMessagesOutput {
    pub client_id: String,
    pub messages: Vec<WorkerMessage>,
}

pub async fn messages_impl(inbox: &Inbox) -> Result<CallToolResult, McpError> {
    let messages = inbox.drain().await;
    json_result(&ClientMessagesOutput { client_id: inbox.client_id.clone(), messages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_worker, output};

    #[tokio::test]
    async fn test_drain_after_sync() {
        let worker = active_worker().await;
        let (client, receiver) = worker.clients().connect("http://localhost:8080/").await;
        let inbox = Inbox::new(client.id, receiver);

        worker.handle_sync("sync-user-data").await;
        worker.handle_sync("check-expiry-daily").await;

        let out: ClientMessagesOutput = output(&messages_impl(&inbox).await.unwrap());
        assert_eq!(out.messages.len(), 2);
        assert!(matches!(out.messages[0], WorkerMessage::SyncUserData { .. }));
        assert!(matches!(out.messages[1], WorkerMessage::CheckExpiry { .. }));

        let out: ClientMessagesOutput = output(&messages_impl(&inbox).await.unwrap());
        assert!(out.messages.is_empty());
    }
}
