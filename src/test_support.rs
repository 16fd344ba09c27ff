//! In-memory location source and reporter for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::location::{LocationSource, PermissionStatus, Position, Precision, ReportedPosition};
use crate::sync::{Reporter, VehicleId, VehicleRecord};

/// Location source that counts reads and can be switched off
pub struct FakeLocation {
    pub fix: Mutex<Option<Position>>,
    pub permission: Mutex<PermissionStatus>,
    pub permission_checks: AtomicUsize,
    pub reads: AtomicUsize,
}

impl FakeLocation {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            fix: Mutex::new(Some(Position::new(latitude, longitude))),
            permission: Mutex::new(PermissionStatus::Granted),
            permission_checks: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn deny(&self) {
        *self.permission.lock().unwrap() = PermissionStatus::Denied;
    }

    pub fn grant(&self) {
        *self.permission.lock().unwrap() = PermissionStatus::Granted;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSource for FakeLocation {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission_checks.fetch_add(1, Ordering::SeqCst);
        *self.permission.lock().unwrap()
    }

    async fn current_position(&self, _precision: Precision) -> Result<Position, TrackerError> {
        if !self.permission.lock().unwrap().is_granted() {
            return Err(TrackerError::PermissionDenied);
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        let fix = *self.fix.lock().unwrap();
        fix.ok_or_else(|| TrackerError::LocationUnavailable("no signal".into()))
    }
}

/// Reporter that records every call
#[derive(Default)]
pub struct FakeReporter {
    pub sends: Mutex<Vec<(String, ReportedPosition)>>,
    pub fetches: AtomicUsize,
    pub record: Mutex<Option<VehicleRecord>>,
    /// Number of upcoming sends that fail
    pub failing_sends: AtomicUsize,
    pub send_delay: Mutex<Duration>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: VehicleRecord) -> Self {
        let reporter = Self::default();
        *reporter.record.lock().unwrap() = Some(record);
        reporter
    }

    pub fn fail_next_sends(&self, count: usize) {
        self.failing_sends.store(count, Ordering::SeqCst);
    }

    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = delay;
    }

    pub fn sends(&self) -> Vec<(String, ReportedPosition)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Total network calls of any kind
    pub fn network_calls(&self) -> usize {
        self.send_count() + self.fetch_count()
    }
}

#[async_trait]
impl Reporter for FakeReporter {
    async fn fetch_record(&self, id: &VehicleId) -> Result<VehicleRecord, TrackerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.record.lock().unwrap().clone().ok_or_else(|| TrackerError::NotFound {
            id: id.to_string(),
            status: 404,
        })
    }

    async fn send_position(
        &self,
        id: &VehicleId,
        position: ReportedPosition,
    ) -> Result<(), TrackerError> {
        self.sends.lock().unwrap().push((id.to_string(), position));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.send_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failing = self
            .failing_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(TrackerError::Network("connection reset".into()));
        }
        Ok(())
    }
}

pub fn sample_record() -> VehicleRecord {
    VehicleRecord {
        vehicle_type: Some("Van".into()),
        make: Some("Ford".into()),
        model: Some("Transit".into()),
        year: Some("2020".into()),
        vin: Some("1FTBW3XM5LKA12345".into()),
        license_plate: Some("7ABC123".into()),
    }
}
