//! Per-window update registrations on a drift-free deadline grid.
//!
//! Deadlines live in a min-heap keyed by instant. Heap entries are never
//! removed eagerly: cancelling or replacing a registration just drops it from
//! the slotmap, and stale entries are skipped when they surface.
//!
//! A registration fires at `start + k * interval`. After a firing the next
//! deadline is the previous one plus the interval. If that is already past,
//! the backlog collapses into a single firing at the latest grid point not
//! after now, so a slow callback never causes a burst and never shifts the
//! grid.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use slotmap::SlotMap;

use super::registration::{RegistrationId, RegistrationState};
use crate::dom::WidgetId;
use crate::host::value::Callback;
use crate::logging::targets;

/// Longest interval a registration accepts.
pub const MAX_UPDATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

struct Registration {
    window: WidgetId,
    interval: Option<Duration>,
    callback: Option<Callback>,
    deadline: Option<Instant>,
    state: RegistrationState,
}

impl Registration {
    fn armable(&self) -> Option<Duration> {
        match (self.interval, &self.callback) {
            (Some(interval), Some(_)) if !interval.is_zero() => Some(interval),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DeadlineEntry {
    id: RegistrationId,
    deadline: Instant,
}

impl PartialEq for DeadlineEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline
    }
}

impl Eq for DeadlineEntry {}

impl PartialOrd for DeadlineEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeadlineEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other.deadline.cmp(&self.deadline)
    }
}

/// A registration whose callback is being invoked. Hand it back to
/// [`UpdateScheduler::finish`] once the callback returns.
#[derive(Debug, Clone)]
pub struct Firing {
    pub id: RegistrationId,
    pub window: WidgetId,
    pub callback: Callback,
    /// The grid point this firing stands for.
    pub deadline: Instant,
}

/// Owns every update registration, at most one per window.
#[derive(Default)]
pub struct UpdateScheduler {
    registrations: SlotMap<RegistrationId, Registration>,
    by_window: HashMap<WidgetId, RegistrationId>,
    queue: BinaryHeap<DeadlineEntry>,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `window`'s registration with one using `interval`. A missing
    /// `callback` carries over the previous registration's callback.
    pub fn set_interval(
        &mut self,
        window: WidgetId,
        interval: Duration,
        callback: Option<Callback>,
        now: Instant,
    ) -> RegistrationId {
        let callback = callback.or_else(|| self.current(window).and_then(|r| r.callback.clone()));
        self.replace(window, Some(interval), callback, now)
    }

    /// Replace `window`'s registration with one calling `callback`. The
    /// previous interval carries over, or `fallback` if there was none.
    pub fn set_callback(
        &mut self,
        window: WidgetId,
        callback: Callback,
        fallback: Option<Duration>,
        now: Instant,
    ) -> RegistrationId {
        let interval = self.current(window).and_then(|r| r.interval).or(fallback);
        self.replace(window, interval, Some(callback), now)
    }

    fn current(&self, window: WidgetId) -> Option<&Registration> {
        self.by_window.get(&window).and_then(|&id| self.registrations.get(id))
    }

    fn replace(
        &mut self,
        window: WidgetId,
        interval: Option<Duration>,
        callback: Option<Callback>,
        now: Instant,
    ) -> RegistrationId {
        self.cancel_window(window);

        let mut registration = Registration {
            window,
            interval,
            callback,
            deadline: None,
            state: RegistrationState::Idle,
        };
        if let Some(interval) = registration.armable() {
            match now.checked_add(interval) {
                Some(deadline) => {
                    registration.deadline = Some(deadline);
                    registration.state = RegistrationState::Armed;
                }
                None => {
                    tracing::warn!(target: targets::SCHEDULER, ?window, ?interval, "deadline out of range; left idle");
                }
            }
        }
        let deadline = registration.deadline;
        let state = registration.state;

        let id = self.registrations.insert(registration);
        self.by_window.insert(window, id);
        if let Some(deadline) = deadline {
            self.queue.push(DeadlineEntry { id, deadline });
        }
        tracing::debug!(target: targets::SCHEDULER, ?window, ?id, ?interval, %state, "registration replaced");
        id
    }

    /// Cancel one registration. Returns false if it was already gone.
    pub fn cancel(&mut self, id: RegistrationId) -> bool {
        let Some(registration) = self.registrations.remove(id) else {
            return false;
        };
        if self.by_window.get(&registration.window) == Some(&id) {
            self.by_window.remove(&registration.window);
        }
        tracing::debug!(target: targets::SCHEDULER, ?id, window = ?registration.window, "registration cancelled");
        true
    }

    /// Cancel whatever registration `window` has.
    pub fn cancel_window(&mut self, window: WidgetId) -> bool {
        match self.by_window.get(&window).copied() {
            Some(id) => self.cancel(id),
            None => false,
        }
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.registrations.clear();
        self.by_window.clear();
        self.queue.clear();
    }

    pub fn state(&self, id: RegistrationId) -> RegistrationState {
        self.registrations
            .get(id)
            .map_or(RegistrationState::Cancelled, |r| r.state)
    }

    pub fn registration_for(&self, window: WidgetId) -> Option<RegistrationId> {
        self.by_window.get(&window).copied()
    }

    pub fn interval_of(&self, window: WidgetId) -> Option<Duration> {
        self.current(window).and_then(|r| r.interval)
    }

    pub fn deadline_of(&self, id: RegistrationId) -> Option<Instant> {
        self.registrations.get(id).and_then(|r| r.deadline)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    fn is_live(&self, entry: &DeadlineEntry) -> bool {
        self.registrations.get(entry.id).is_some_and(|r| {
            r.state == RegistrationState::Armed && r.deadline == Some(entry.deadline)
        })
    }

    /// Earliest armed deadline. Discards stale heap entries on the way.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(entry) = self.queue.peek() {
            if self.is_live(entry) {
                return Some(entry.deadline);
            }
            self.queue.pop();
        }
        None
    }

    /// Take the earliest registration due at `now` and mark it firing.
    pub fn begin_next_due(&mut self, now: Instant) -> Option<Firing> {
        let deadline = self.next_deadline()?;
        if deadline > now {
            return None;
        }
        let entry = self.queue.pop()?;
        let registration = self.registrations.get_mut(entry.id)?;
        let interval = registration.armable()?;
        let callback = registration.callback.clone()?;

        let (deadline, skipped) = latest_grid_point(entry.deadline, interval, now);
        if skipped > 0 {
            tracing::debug!(target: targets::SCHEDULER, id = ?entry.id, skipped, "coalesced missed deadlines");
        }
        registration.deadline = Some(deadline);
        registration.state = RegistrationState::Firing;
        tracing::trace!(target: targets::SCHEDULER, id = ?entry.id, window = ?registration.window, "firing");

        Some(Firing { id: entry.id, window: registration.window, callback, deadline })
    }

    /// Re-arm after a firing, whatever the callback's outcome. Does nothing
    /// if the registration was cancelled or replaced meanwhile.
    pub fn finish(&mut self, firing: &Firing, now: Instant) {
        let Some(registration) = self.registrations.get_mut(firing.id) else {
            return;
        };
        if registration.state != RegistrationState::Firing {
            return;
        }
        let Some(interval) = registration.armable() else {
            registration.state = RegistrationState::Idle;
            registration.deadline = None;
            return;
        };

        let Some(mut next) = firing.deadline.checked_add(interval) else {
            tracing::warn!(target: targets::SCHEDULER, id = ?firing.id, ?interval, "deadline out of range; left idle");
            registration.state = RegistrationState::Idle;
            registration.deadline = None;
            return;
        };
        if next <= now {
            let (grid, skipped) = latest_grid_point(firing.deadline, interval, now);
            tracing::debug!(target: targets::SCHEDULER, id = ?firing.id, skipped, "callback overran its interval");
            next = grid;
        }
        registration.deadline = Some(next);
        registration.state = RegistrationState::Armed;
        self.queue.push(DeadlineEntry { id: firing.id, deadline: next });
    }
}

/// The latest `anchor + k * interval` not after `now`, and `k`.
fn latest_grid_point(anchor: Instant, interval: Duration, now: Instant) -> (Instant, u128) {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let step = interval.as_nanos().max(1);
    let steps = now.saturating_duration_since(anchor).as_nanos() / step;
    // Never past `now`.
    let offset_nanos = steps * step;
    let offset = Duration::new(
        u64::try_from(offset_nanos / NANOS_PER_SEC).unwrap_or(u64::MAX),
        (offset_nanos % NANOS_PER_SEC) as u32,
    );
    (anchor.checked_add(offset).unwrap_or(now), steps)
}
