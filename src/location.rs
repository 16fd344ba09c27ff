//! Location Module
//!
//! Acquires the device position for a report cycle. Platform shells plug
//! in their own [`LocationSource`]; [`StaticLocationSource`] serves a fixed
//! fix for headless runs and emulators.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TrackerError;

/// A single position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Value reported to the backend for a tracked vehicle.
///
/// `Cleared` tells the backend tracking has stopped. It is distinct from
/// every real coordinate pair, including (0, 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportedPosition {
    At(Position),
    Cleared,
}

impl ReportedPosition {
    pub fn is_cleared(&self) -> bool {
        matches!(self, ReportedPosition::Cleared)
    }
}

impl From<Position> for ReportedPosition {
    fn from(position: Position) -> Self {
        ReportedPosition::At(position)
    }
}

/// Requested fix precision, lowest to best-for-navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    Lowest,
    Low,
    Balanced,
    #[default]
    High,
    Highest,
    BestForNavigation,
}

impl std::str::FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "lowest" => Ok(Precision::Lowest),
            "low" => Ok(Precision::Low),
            "balanced" => Ok(Precision::Balanced),
            "high" => Ok(Precision::High),
            "highest" => Ok(Precision::Highest),
            "best_for_navigation" => Ok(Precision::BestForNavigation),
            other => Err(format!("unknown precision: {}", other)),
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precision::Lowest => write!(f, "lowest"),
            Precision::Low => write!(f, "low"),
            Precision::Balanced => write!(f, "balanced"),
            Precision::High => write!(f, "high"),
            Precision::Highest => write!(f, "highest"),
            Precision::BestForNavigation => write!(f, "best_for_navigation"),
        }
    }
}

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Source of device position fixes.
///
/// `request_permission` never fails: a denial, or a platform error while
/// asking, is reported as [`PermissionStatus::Denied`].
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Ask for (or re-check) foreground location permission
    async fn request_permission(&self) -> PermissionStatus;

    /// Read the current position.
    ///
    /// Fails with `PermissionDenied` when permission is not granted and with
    /// `LocationUnavailable` when the platform cannot produce a fix.
    async fn current_position(&self, precision: Precision) -> Result<Position, TrackerError>;
}

/// Location source serving a configured fix
pub struct StaticLocationSource {
    fix: Mutex<Option<Position>>,
    permission: Mutex<PermissionStatus>,
}

impl StaticLocationSource {
    pub fn new(fix: Option<Position>) -> Self {
        Self {
            fix: Mutex::new(fix),
            permission: Mutex::new(PermissionStatus::Granted),
        }
    }

    /// Replace the served fix; `None` makes the source unavailable
    pub fn set_fix(&self, fix: Option<Position>) {
        *self.fix.lock().unwrap_or_else(|e| e.into_inner()) = fix;
    }

    pub fn set_permission(&self, status: PermissionStatus) {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    fn permission(&self) -> PermissionStatus {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission()
    }

    async fn current_position(&self, precision: Precision) -> Result<Position, TrackerError> {
        if !self.permission().is_granted() {
            return Err(TrackerError::PermissionDenied);
        }

        let fix = *self.fix.lock().unwrap_or_else(|e| e.into_inner());
        debug!("Static fix requested at {} precision: {:?}", precision, fix);

        fix.ok_or_else(|| TrackerError::LocationUnavailable("no fix configured".into()))
    }
}
