//! Ping handler for health checks

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Debug, Serialize, Deserialize)]
struct PingRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PongResponse {
    service: String,
    message: String,
    timestamp: String,
}

/// Handle ping messages
pub async fn handle_ping(client: Client, mut subscriber: Subscriber) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received ping message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                error!("Ping message without reply subject");
                continue;
            }
        };

        let request: PingRequest = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(_) => PingRequest { message: None },
        };

        let response = PongResponse {
            service: "ecoroute-worker".to_string(),
            message: request.message.unwrap_or_else(|| "pong".to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        if let Ok(payload) = serde_json::to_vec(&response) {
            let _ = client.publish(reply, payload.into()).await;
        }
    }

    Ok(())
}
