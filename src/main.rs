//! Vehicle Locator - Headless Host
//!
//! Runs the locator without a UI: looks up the configured vehicle and shares
//! a fixed position until interrupted.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use vehicle_locator_lib::{
    commands,
    config::Config,
    location::StaticLocationSource,
    logging,
    sync::ApiClient,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let _log_guard = logging::init(&config.log_dir);
    info!("Vehicle Locator starting against {}", config.api_base_url);

    let vehicle_id = config
        .vehicle_id
        .clone()
        .context("LOCATOR_VEHICLE_ID is not set")?;

    let api = ApiClient::new(config.api_base_url.clone(), config.request_timeout);
    let location = StaticLocationSource::new(config.fixed_position);
    if config.fixed_position.is_none() {
        warn!("No LOCATOR_LATITUDE/LOCATOR_LONGITUDE set, reports will fail until a fix exists");
    }

    let app_state = AppState::new(Arc::new(api), Arc::new(location), config.session());

    commands::set_vehicle_id(&app_state, vehicle_id).await?;
    match commands::fetch_vehicle_data(&app_state).await {
        Ok(record) => info!("Vehicle: {:?}", record),
        Err(e) => warn!("Vehicle lookup failed: {}", e),
    }

    commands::set_sharing(&app_state, true).await?;
    info!(
        "Sharing location every {}s, press Ctrl-C to stop",
        config.report_interval.as_secs()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    commands::set_sharing(&app_state, false).await?;
    let snapshot = commands::get_snapshot(&app_state);
    info!(
        "Stopped: {} reports sent, {} failed",
        snapshot.reports_sent, snapshot.reports_failed
    );

    Ok(())
}
