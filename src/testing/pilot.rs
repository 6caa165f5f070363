//! Pilot: drive a [`ScriptHost`] on simulated time.
//!
//! The `Pilot` owns a host wired to a [`ManualClock`] and a
//! [`RecordingDiagnostics`]. Scripts load synchronously on the calling
//! thread, and [`Pilot::advance`] walks the clock through every update
//! deadline in order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app::AppConfig;
use crate::dom::{SharedTree, SnapshotReader, TreeSnapshot};
use crate::error::LoadError;
use crate::host::{Diagnostic, Diagnostics, JsonFetcher, RecordingDiagnostics, Script, ScriptHost};
use crate::scheduler::{Clock, ManualClock};

use super::snapshot::snapshot_to_string;

/// A headless host on simulated time.
///
/// # Examples
///
/// ```ignore
/// use std::time::Duration;
/// use swaydgets::host::{FnScript, ScriptHost};
/// use swaydgets::testing::Pilot;
///
/// let mut pilot = Pilot::new();
/// pilot.load(FnScript::new("main", |host: &mut ScriptHost| {
///     let window = host.create_window("clock", 200, 40)?;
///     host.show(window)?;
///     Ok(())
/// })).unwrap();
/// pilot.advance(Duration::from_secs(1));
/// ```
pub struct Pilot {
    host: ScriptHost,
    clock: ManualClock,
    diagnostics: Arc<RecordingDiagnostics>,
    started: Instant,
}

impl Pilot {
    /// A pilot with the default config.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// A pilot whose tree and host follow `config`. Warnings from the
    /// config's style block are recorded like any other.
    pub fn with_config(config: AppConfig) -> Self {
        let clock = ManualClock::new();
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let (tree, warnings) = config.build_tree();
        for warning in warnings {
            diagnostics.report(Diagnostic::StyleWarning { widget: None, warning });
        }
        let host = ScriptHost::new(SharedTree::new(tree), Arc::new(clock.clone()), diagnostics.clone())
            .with_options(config.host_options());
        let started = clock.now();
        Self { host, clock, diagnostics, started }
    }

    /// Serve `fetch_json` from `fetcher` instead of the network.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn JsonFetcher>) -> Self {
        self.host = self.host.with_fetcher(fetcher);
        self
    }

    // ── Scripts ──────────────────────────────────────────────────────

    /// Run a script's top-level body.
    pub fn load(&mut self, mut script: impl Script) -> Result<(), LoadError> {
        self.host.load(&mut script)
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Move simulated time forward by `duration`, firing every deadline
    /// on the way in order. Callbacks may advance the clock themselves to
    /// simulate slow work. Returns the number of callbacks that ran.
    pub fn advance(&mut self, duration: Duration) -> usize {
        let target = self.clock.now() + duration;
        let mut fired = 0;
        loop {
            fired += self.host.fire_due();
            match self.host.next_deadline() {
                Some(deadline) if deadline <= target => self.clock.set(deadline),
                _ => break,
            }
        }
        self.clock.set(target);
        fired
    }

    /// Simulated time since the pilot was created.
    pub fn elapsed(&self) -> Duration {
        self.clock.now() - self.started
    }

    // ── Query ────────────────────────────────────────────────────────

    pub fn host(&self) -> &ScriptHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut ScriptHost {
        &mut self.host
    }

    /// A handle on the simulated clock, for callbacks that model slow work.
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    pub fn diagnostics(&self) -> &RecordingDiagnostics {
        &self.diagnostics
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<TreeSnapshot> {
        self.host.snapshot()
    }

    /// The latest published snapshot as an outline.
    pub fn snapshot_text(&self) -> String {
        snapshot_to_string(&self.snapshot())
    }

    pub fn reader(&self) -> SnapshotReader {
        self.host.tree().reader()
    }
}

impl Default for Pilot {
    fn default() -> Self {
        Self::new()
    }
}
