//! Route optimization message handler

use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::services::geocoding::Geocoder;
use crate::services::planner::{self, PlannerSettings};
use crate::services::routing::RoutingProvider;
use crate::types::{ErrorResponse, OptimizeRequest, Request, SuccessResponse};

/// Handle route.optimize messages
///
/// Computes the unoptimized and optimized itineraries for a set of stops
/// between a fixed origin and destination.
pub async fn handle_optimize(
    client: Client,
    mut subscriber: Subscriber,
    geocoder: Arc<dyn Geocoder>,
    provider: Arc<dyn RoutingProvider>,
    settings: Arc<PlannerSettings>,
) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received route.optimize message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                error!("route.optimize message without reply subject");
                continue;
            }
        };

        let request: Request<OptimizeRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse route.optimize request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let now = chrono::Local::now().naive_local();
        match planner::plan(
            &request.payload,
            geocoder.as_ref(),
            provider.as_ref(),
            &settings,
            now,
        )
        .await
        {
            Ok(response) => {
                info!(
                    "Optimized route with {} stop(s): {} variant(s), {:.1}% distance saved",
                    request.payload.stops.len(),
                    response.optimized.len(),
                    response.savings.distance_percent
                );
                let success = SuccessResponse::new(request.id, response);
                let _ = client.publish(reply, serde_json::to_vec(&success)?.into()).await;
            }
            Err(e) => {
                error!("Rejected route.optimize request: {}", e);
                let error = ErrorResponse::new(request.id, "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            }
        }
    }

    Ok(())
}
