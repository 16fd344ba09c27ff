//! Vehicle Locator Library
//!
//! Vehicle lookup and periodic location sharing for a single screen.

pub mod commands;
pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod session;
pub mod state;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use location::LocationSource;
use session::{SessionConfig, SessionController};
use state::SharedState;
use sync::Reporter;

/// Application state shared across commands
pub struct AppState {
    pub state: SharedState,
    pub reporter: Arc<dyn Reporter>,
    pub session: tokio::sync::Mutex<SessionController>,
}

impl AppState {
    pub fn new(
        reporter: Arc<dyn Reporter>,
        location: Arc<dyn LocationSource>,
        config: SessionConfig,
    ) -> Self {
        let state = SharedState::new();
        let session = SessionController::new(location, Arc::clone(&reporter), state.clone(), config);

        Self {
            state,
            reporter,
            session: tokio::sync::Mutex::new(session),
        }
    }
}
