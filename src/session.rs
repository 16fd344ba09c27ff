//! Session Module
//!
//! Owns the lifecycle of location sharing for one vehicle.
//!
//! A session runs one report cycle immediately on [`SessionController::start`]
//! and then one per period from a timer task. Cycles never overlap: the timer
//! awaits each cycle before waiting for the next tick, and ticks missed while
//! a cycle is in flight are skipped. [`SessionController::stop`] cancels the
//! timer, lets an in-flight cycle finish with its result discarded, then sends
//! the cleared sentinel as the last report of the session.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{ErrorContext, TrackerError};
use crate::location::{LocationSource, Position, Precision, ReportedPosition};
use crate::state::SharedState;
use crate::sync::{Reporter, VehicleId};

/// Default report period
pub const DEFAULT_REPORT_PERIOD: Duration = Duration::from_secs(60);

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub period: Duration,
    pub precision: Precision,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_REPORT_PERIOD,
            precision: Precision::default(),
        }
    }
}

/// Result of a single report cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Sent(Position),
    Failed(TrackerError),
    /// The session was cancelled while the cycle ran
    Discarded,
}

/// One acquire-position-then-send pass for a vehicle
#[derive(Clone)]
pub struct ReportCycle {
    vehicle_id: VehicleId,
    location: Arc<dyn LocationSource>,
    reporter: Arc<dyn Reporter>,
    state: SharedState,
    precision: Precision,
}

impl ReportCycle {
    /// Run the cycle. Nothing is sent and nothing is written to the state
    /// once `cancel` has fired.
    pub async fn run(&self, cancel: &CancellationToken) -> CycleOutcome {
        let permission = self.location.request_permission().await;
        if cancel.is_cancelled() {
            return CycleOutcome::Discarded;
        }
        if !permission.is_granted() {
            return self.fail(TrackerError::PermissionDenied);
        }

        let position = match self.location.current_position(self.precision).await {
            Ok(position) => position,
            Err(_) if cancel.is_cancelled() => return CycleOutcome::Discarded,
            Err(e) => return self.fail(e),
        };
        if cancel.is_cancelled() {
            return CycleOutcome::Discarded;
        }
        self.state.update(|s| s.location = Some(position));

        let result = self.reporter.send_position(&self.vehicle_id, position.into()).await;
        if cancel.is_cancelled() {
            debug!("Discarding report result for {} after stop", self.vehicle_id);
            return CycleOutcome::Discarded;
        }

        match result {
            Ok(()) => {
                debug!("Reported {} for {}", position, self.vehicle_id);
                self.state.update(|s| {
                    s.reports_sent += 1;
                    s.last_reported_at = Some(chrono::Utc::now());
                });
                CycleOutcome::Sent(position)
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&self, err: TrackerError) -> CycleOutcome {
        warn!("Report cycle for {} failed: {}", self.vehicle_id, err);
        let message = err.user_message(ErrorContext::UpdateLocation);
        self.state.update(|s| {
            s.reports_failed += 1;
            s.error = Some(message);
        });
        CycleOutcome::Failed(err)
    }
}

/// Read-only view of a running session.
///
/// Sessions are ended only through [`SessionController::stop`], which
/// cancels the timer and sends the cleared report. The handle observes that
/// cancellation; it cannot trigger it.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    vehicle_id: VehicleId,
    token: CancellationToken,
}

impl SessionHandle {
    pub fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    /// False once the session has been stopped or its controller dropped
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Resolves when the session ends
    pub async fn ended(&self) {
        self.token.cancelled().await
    }
}

struct ActiveSession {
    vehicle_id: VehicleId,
    token: CancellationToken,
    timer: JoinHandle<()>,
}

/// Starts and stops location sharing. At most one session at a time.
pub struct SessionController {
    location: Arc<dyn LocationSource>,
    reporter: Arc<dyn Reporter>,
    state: SharedState,
    config: SessionConfig,
    active: Option<ActiveSession>,
}

impl SessionController {
    pub fn new(
        location: Arc<dyn LocationSource>,
        reporter: Arc<dyn Reporter>,
        state: SharedState,
        config: SessionConfig,
    ) -> Self {
        Self {
            location,
            reporter,
            state,
            config,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Vehicle currently being reported, if any
    pub fn vehicle_id(&self) -> Option<&VehicleId> {
        self.active.as_ref().map(|a| &a.vehicle_id)
    }

    /// Start sharing for `vehicle_id`.
    ///
    /// Fails with `InvalidInput` on an empty identifier, leaving any running
    /// session untouched. Otherwise a running session is stopped first, the
    /// first cycle runs before this returns, and the timer is armed for the
    /// next one. A failed first cycle does not fail the start.
    pub async fn start(&mut self, vehicle_id: &str) -> Result<SessionHandle, TrackerError> {
        let vehicle_id = VehicleId::parse(vehicle_id)?;

        self.stop().await;

        info!("Sharing location for vehicle {}", vehicle_id);
        let token = CancellationToken::new();
        let cycle = ReportCycle {
            vehicle_id: vehicle_id.clone(),
            location: Arc::clone(&self.location),
            reporter: Arc::clone(&self.reporter),
            state: self.state.clone(),
            precision: self.config.precision,
        };
        self.state.update(|s| s.sharing = true);

        cycle.run(&token).await;

        let timer = tokio::spawn(run_timer(cycle, self.config.period, token.clone()));
        self.active = Some(ActiveSession {
            vehicle_id: vehicle_id.clone(),
            token: token.clone(),
            timer,
        });

        Ok(SessionHandle { vehicle_id, token })
    }

    /// Stop sharing and send the cleared sentinel. No-op when idle.
    pub async fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.token.cancel();
        if let Err(e) = active.timer.await {
            if e.is_panic() {
                error!("Report timer for {} panicked", active.vehicle_id);
            }
        }
        self.state.update(|s| s.sharing = false);

        match self.reporter.send_position(&active.vehicle_id, ReportedPosition::Cleared).await {
            Ok(()) => info!("Stopped sharing location for vehicle {}", active.vehicle_id),
            Err(e) => {
                warn!("Failed to clear location for {}: {}", active.vehicle_id, e);
                self.state.set_error(e.user_message(ErrorContext::UpdateLocation));
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("Controller dropped, cancelling session for {}", active.vehicle_id);
            active.token.cancel();
            self.state.update(|s| s.sharing = false);
        }
    }
}

async fn run_timer(cycle: ReportCycle, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let started = Instant::now();
        if let CycleOutcome::Sent(position) = cycle.run(&token).await {
            debug!("Scheduled report {} for {}", position, cycle.vehicle_id);
        }

        // Ticks that came due while the cycle was in flight are dropped
        if started.elapsed() >= period {
            debug!("Report cycle for {} overran its period, skipping tick", cycle.vehicle_id);
            ticker.reset();
        }
    }

    debug!("Report timer for {} stopped", cycle.vehicle_id);
}
