//! Registration handles and lifecycle states.

use std::fmt;

slotmap::new_key_type! {
    /// One window's update registration. Replacing a registration yields a
    /// new id; the old one reads as cancelled from then on.
    pub struct RegistrationId;
}

/// Lifecycle of an update registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationState {
    /// Missing an interval or a callback.
    Idle,
    /// Waiting for its deadline.
    Armed,
    /// Its callback is running.
    Firing,
    /// Replaced, or its window was destroyed.
    Cancelled,
}

impl RegistrationState {
    pub const fn as_str(self) -> &'static str {
        match self {
            RegistrationState::Idle => "idle",
            RegistrationState::Armed => "armed",
            RegistrationState::Firing => "firing",
            RegistrationState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
