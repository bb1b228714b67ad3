//! Charging status state machine for Chargelog
//!
//! This module defines the per-session charging status and the transitions
//! a user action is allowed to make.

use crate::error::{ChargelogError, Result};
use serde::{Deserialize, Serialize};

/// Charging status for one session instance
///
/// Only `Charging` permits the timer to advance; only `NotStarted` permits
/// starting. `Finished` and `Cancelled` are terminal for the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChargingStatus {
    /// No session has been started yet
    #[default]
    NotStarted,

    /// A session is in progress and the timer may run
    Charging,

    /// The session was stopped normally
    Finished,

    /// The session was aborted by the user
    Cancelled,
}

impl ChargingStatus {
    /// Whether a new session may be started from this status
    pub fn can_start(self) -> bool {
        matches!(self, ChargingStatus::NotStarted)
    }

    /// Whether the timer is allowed to advance in this status
    pub fn permits_timer(self) -> bool {
        matches!(self, ChargingStatus::Charging)
    }

    /// Whether this status ends the session instance
    pub fn is_terminal(self) -> bool {
        matches!(self, ChargingStatus::Finished | ChargingStatus::Cancelled)
    }

    /// Transition for a user starting a charge
    pub fn started(self) -> Result<Self> {
        match self {
            ChargingStatus::NotStarted => Ok(ChargingStatus::Charging),
            other => Err(ChargelogError::session(format!(
                "Cannot start charging from {:?}",
                other
            ))),
        }
    }

    /// Transition for a user stopping a charge normally
    pub fn finished(self) -> Result<Self> {
        match self {
            ChargingStatus::Charging => Ok(ChargingStatus::Finished),
            other => Err(ChargelogError::session(format!(
                "Cannot stop charging from {:?}",
                other
            ))),
        }
    }

    /// Transition for a user aborting a charge
    pub fn cancelled(self) -> Result<Self> {
        match self {
            ChargingStatus::Charging => Ok(ChargingStatus::Cancelled),
            other => Err(ChargelogError::session(format!(
                "Cannot cancel charging from {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ChargingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChargingStatus::NotStarted => "not_started",
            ChargingStatus::Charging => "charging",
            ChargingStatus::Finished => "finished",
            ChargingStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_only_from_not_started() {
        assert_eq!(
            ChargingStatus::NotStarted.started().unwrap(),
            ChargingStatus::Charging
        );
        assert!(ChargingStatus::Charging.started().is_err());
        assert!(ChargingStatus::Finished.started().is_err());
        assert!(ChargingStatus::Cancelled.started().is_err());
    }

    #[test]
    fn stop_and_cancel_only_from_charging() {
        assert_eq!(
            ChargingStatus::Charging.finished().unwrap(),
            ChargingStatus::Finished
        );
        assert_eq!(
            ChargingStatus::Charging.cancelled().unwrap(),
            ChargingStatus::Cancelled
        );
        assert!(ChargingStatus::NotStarted.finished().is_err());
        assert!(ChargingStatus::Finished.cancelled().is_err());
    }

    #[test]
    fn timer_gating() {
        assert!(ChargingStatus::Charging.permits_timer());
        assert!(!ChargingStatus::NotStarted.permits_timer());
        assert!(!ChargingStatus::Finished.permits_timer());
        assert!(!ChargingStatus::Cancelled.permits_timer());
    }
}
