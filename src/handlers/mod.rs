//! NATS message handlers

pub mod ping;
pub mod route;

use std::sync::Arc;

use anyhow::Result;
use async_nats::Client;
use tokio::select;
use tracing::{error, info};

use crate::config::Config;
use crate::services::geocoding::{create_geocoder, Geocoder};
use crate::services::planner::PlannerSettings;
use crate::services::routing::{create_routing_provider, RoutingProvider};

/// Start all message handlers
pub async fn start_handlers(client: Client, config: &Config) -> Result<()> {
    info!("Starting message handlers...");

    // Create shared geocoder
    let geocoder: Arc<dyn Geocoder> = Arc::from(create_geocoder());
    info!("Geocoder initialized: {}", geocoder.name());

    // Create routing provider
    let provider: Arc<dyn RoutingProvider> =
        Arc::from(create_routing_provider(config.valhalla_url.as_deref()));
    info!("Routing provider initialized: {}", provider.name());

    let settings = Arc::new(PlannerSettings {
        max_stops: config.max_stops,
        service_time_minutes: config.service_time_minutes,
        fallback_coordinates: config.fallback_coordinates,
    });

    // Subscribe to all subjects
    let ping_sub = client.subscribe("ecoroute.ping").await?;
    let route_optimize_sub = client.subscribe("ecoroute.route.optimize").await?;

    info!("Subscribed to NATS subjects");

    // Clone for each handler
    let client_ping = client.clone();
    let client_route_optimize = client.clone();

    // Spawn handlers
    let ping_handle = tokio::spawn(async move {
        ping::handle_ping(client_ping, ping_sub).await
    });

    let route_optimize_handle = tokio::spawn(async move {
        route::handle_optimize(
            client_route_optimize,
            route_optimize_sub,
            geocoder,
            provider,
            settings,
        )
        .await
    });

    info!("All handlers started, waiting for messages...");

    // Wait for any handler to finish (which means an error occurred)
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = route_optimize_handle => {
            error!("Route optimize handler finished: {:?}", result);
        }
    }

    Ok(())
}
