//! Error Module
//!
//! Recoverable failures surfaced to the user. None of these are fatal.

/// Tracker errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Vehicle {id} not found (status {status})")]
    NotFound { id: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),
}

impl TrackerError {
    /// Rejection for an empty vehicle identifier
    pub fn empty_vehicle_id() -> Self {
        TrackerError::InvalidInput("vehicle ID is empty".into())
    }

    /// Message shown to the user for this error.
    ///
    /// `context` names the operation that failed, for errors that don't
    /// carry one themselves.
    pub fn user_message(&self, context: ErrorContext) -> String {
        match self {
            TrackerError::InvalidInput(_) => "Please enter a vehicle ID.".to_string(),
            TrackerError::PermissionDenied => "Location permission denied".to_string(),
            TrackerError::LocationUnavailable(reason) => {
                format!("Error getting location: {}", reason)
            }
            TrackerError::NotFound { status, .. } => {
                format!("{}: Error: {}", context.prefix(), status)
            }
            TrackerError::Network(reason) => format!("{}: {}", context.prefix(), reason),
        }
    }
}

/// Operation an error is reported against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    FetchVehicle,
    UpdateLocation,
}

impl ErrorContext {
    fn prefix(self) -> &'static str {
        match self {
            ErrorContext::FetchVehicle => "Error fetching vehicle info",
            ErrorContext::UpdateLocation => "Error updating location",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_screen_wording() {
        assert_eq!(
            TrackerError::empty_vehicle_id().user_message(ErrorContext::FetchVehicle),
            "Please enter a vehicle ID."
        );
        assert_eq!(
            TrackerError::PermissionDenied.user_message(ErrorContext::UpdateLocation),
            "Location permission denied"
        );
        let not_found = TrackerError::NotFound { id: "V1".into(), status: 404 };
        assert_eq!(
            not_found.user_message(ErrorContext::FetchVehicle),
            "Error fetching vehicle info: Error: 404"
        );
    }

    #[test]
    fn network_message_uses_context() {
        let err = TrackerError::Network("connection refused".into());
        assert_eq!(
            err.user_message(ErrorContext::UpdateLocation),
            "Error updating location: connection refused"
        );
    }
}
