//! Update scheduler: per-window periodic callbacks on a monotonic clock.

pub mod clock;
pub mod registration;
pub mod update;

pub use clock::{Clock, ManualClock, SystemClock};
pub use registration::{RegistrationId, RegistrationState};
pub use update::{Firing, UpdateScheduler, MAX_UPDATE_INTERVAL};
