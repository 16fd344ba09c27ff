//! Screen State Module
//!
//! The controller and commands are the only writers; everything else reads
//! cloned snapshots.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::location::Position;
use crate::sync::VehicleRecord;

/// Snapshot of everything a screen displays
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    /// Identifier text as entered
    pub vehicle_id: String,
    pub vehicle: Option<VehicleRecord>,
    pub sharing: bool,
    /// Last position acquired by a report cycle
    pub location: Option<Position>,
    pub error: Option<String>,
    pub last_reported_at: Option<chrono::DateTime<chrono::Utc>>,
    pub reports_sent: u64,
    /// Cycles that ended in any error: permission, location or send
    pub reports_failed: u64,
}

/// Shared, mutex-guarded screen state
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<TrackerState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone the current state
    pub fn snapshot(&self) -> TrackerState {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn update<T>(&self, f: impl FnOnce(&mut TrackerState) -> T) -> T {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    pub(crate) fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|s| s.error = Some(message));
    }
}
