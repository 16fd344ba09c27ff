//! Commands Module
//!
//! User intents exposed to the presentation layer. Each command updates the
//! shared screen state; the UI renders [`get_snapshot`].

use tracing::{debug, info, warn};

use crate::error::{ErrorContext, TrackerError};
use crate::state::TrackerState;
use crate::sync::{VehicleId, VehicleRecord};
use crate::AppState;

/// Current screen state
pub fn get_snapshot(state: &AppState) -> TrackerState {
    state.state.snapshot()
}

/// Update the entered vehicle identifier.
///
/// While sharing, a different identifier ends the running session and starts
/// one for the new vehicle. An empty identifier ends sharing.
pub async fn set_vehicle_id(state: &AppState, vehicle_id: String) -> Result<(), TrackerError> {
    state.state.update(|s| s.vehicle_id = vehicle_id.clone());

    let mut session = state.session.lock().await;
    let Some(current) = session.vehicle_id().cloned() else {
        return Ok(());
    };

    match VehicleId::parse(&vehicle_id) {
        Ok(next) if next == current => Ok(()),
        Ok(next) => {
            info!("Vehicle changed from {} to {} while sharing", current, next);
            session.start(next.as_str()).await.map(|_| ())
        }
        Err(e) => {
            session.stop().await;
            state.state.set_error(e.user_message(ErrorContext::UpdateLocation));
            Err(e)
        }
    }
}

/// Fetch the record for the entered vehicle identifier.
///
/// A failed fetch clears any previously displayed record.
pub async fn fetch_vehicle_data(state: &AppState) -> Result<VehicleRecord, TrackerError> {
    let raw = state.state.snapshot().vehicle_id;
    let vehicle_id = match VehicleId::parse(&raw) {
        Ok(id) => id,
        Err(e) => {
            state.state.set_error(e.user_message(ErrorContext::FetchVehicle));
            return Err(e);
        }
    };

    debug!("Fetching vehicle data for {}", vehicle_id);

    match state.reporter.fetch_record(&vehicle_id).await {
        Ok(record) => {
            let shown = record.clone();
            state.state.update(|s| {
                s.vehicle = Some(shown);
                s.error = None;
            });
            Ok(record)
        }
        Err(e) => {
            warn!("Vehicle fetch for {} failed: {}", vehicle_id, e);
            let message = e.user_message(ErrorContext::FetchVehicle);
            state.state.update(|s| {
                s.vehicle = None;
                s.error = Some(message);
            });
            Err(e)
        }
    }
}

/// Turn location sharing on or off for the entered vehicle
pub async fn set_sharing(state: &AppState, enabled: bool) -> Result<(), TrackerError> {
    let mut session = state.session.lock().await;

    if !enabled {
        session.stop().await;
        return Ok(());
    }
    if session.is_active() {
        return Ok(());
    }

    let raw = state.state.snapshot().vehicle_id;
    match session.start(&raw).await {
        Ok(handle) => {
            debug!("Sharing enabled for {}", handle.vehicle_id());
            Ok(())
        }
        Err(e) => {
            state.state.set_error(e.user_message(ErrorContext::UpdateLocation));
            Err(e)
        }
    }
}
