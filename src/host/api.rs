//! The binding layer between scripts and the widget tree.
//!
//! [`ScriptHost`] owns the scheduler and a writer handle to the shared tree.
//! Every binding call validates its arguments, then mutates the tree through
//! [`SharedTree::mutate`]. Dynamic callers go through [`ScriptHost::call_global`]
//! and [`ScriptHost::call_method`]; Rust scripts call the typed methods
//! directly. Both paths share the same checks.
//!
//! The host is `!Send` (callbacks are `Rc`) and stays on the thread that
//! created it.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::diagnostics::{Diagnostic, Diagnostics};
use super::fetch::{HttpFetcher, JsonFetcher};
use super::script::Script;
use super::value::{Args, Callback, Value, WidgetHandle};
use crate::dom::{Orientation, SharedTree, TreeSnapshot, WidgetId, WidgetKind};
use crate::error::{CallbackError, HostError, HostResult, LoadError, ScriptError};
use crate::geometry::{Edge, MAX_PX};
use crate::logging::targets;
use crate::scheduler::{Clock, Firing, UpdateScheduler, MAX_UPDATE_INTERVAL};

const WINDOW_METHODS: &[&str] = &[
    "set_margin",
    "add_box",
    "add_label",
    "set_css",
    "show",
    "set_update_interval",
    "on_update",
    "close",
];
const BOX_METHODS: &[&str] = &["add_box", "add_label", "set_css", "set_margin"];
const LABEL_METHODS: &[&str] = &["set_text", "set_css", "set_margin"];

/// Method names a handle of `kind` answers to.
pub fn methods_of(kind: WidgetKind) -> &'static [&'static str] {
    match kind {
        WidgetKind::Window => WINDOW_METHODS,
        WidgetKind::Container => BOX_METHODS,
        WidgetKind::Label => LABEL_METHODS,
    }
}

/// Tunables for update intervals and fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostOptions {
    /// Shorter requested intervals are raised to this.
    pub min_update_interval: Duration,
    /// Interval used by `on_update` on a window that never set one.
    pub default_update_interval: Option<Duration>,
    /// Upper bound on one `fetch_json` request.
    pub fetch_timeout: Duration,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            min_update_interval: Duration::from_millis(50),
            default_update_interval: None,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// The callback in progress. If it closes its own window, the removed
/// widgets are remembered so later calls on them become no-ops.
struct ActiveFiring {
    window: WidgetId,
    closed: HashSet<WidgetId>,
}

/// Runs scripts and their callbacks against the shared widget tree.
pub struct ScriptHost {
    tree: SharedTree,
    scheduler: UpdateScheduler,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn Diagnostics>,
    fetcher: Arc<dyn JsonFetcher>,
    options: HostOptions,
    firing: Option<ActiveFiring>,
    /// Windows created by the load in progress.
    loading: Option<Vec<WidgetId>>,
}

impl ScriptHost {
    pub fn new(tree: SharedTree, clock: Arc<dyn Clock>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            tree,
            scheduler: UpdateScheduler::new(),
            clock,
            diagnostics,
            fetcher: Arc::new(HttpFetcher),
            options: HostOptions::default(),
            firing: None,
            loading: None,
        }
    }

    pub fn with_options(mut self, options: HostOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the source `fetch_json` reads from.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn JsonFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn tree(&self) -> &SharedTree {
        &self.tree
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    pub fn options(&self) -> HostOptions {
        self.options
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<TreeSnapshot> {
        self.tree.latest()
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Handle for a live widget.
    pub fn handle(&self, id: WidgetId) -> Option<WidgetHandle> {
        self.tree.read(|t| t.kind(id)).map(|kind| WidgetHandle::new(id, kind))
    }

    // -----------------------------------------------------------------------
    // Dynamic dispatch
    // -----------------------------------------------------------------------

    /// Call a global function by name.
    pub fn call_global(&mut self, name: &str, args: &[Value]) -> HostResult<Value> {
        let a = Args::new(name, args);
        match name {
            "log" => {
                self.log(args);
                Ok(Value::Nil)
            }
            "create_window" => {
                a.expect_count(3, 3)?;
                let window = self.create_window(a.string(0)?, a.integer(1)?, a.integer(2)?)?;
                Ok(window.into())
            }
            "fetch_json" => {
                a.expect_count(1, 1)?;
                self.fetch_json(&a.string(0)?)
            }
            _ => Err(HostError::invalid_argument(name, "no such global function")),
        }
    }

    /// Call a method on a widget handle.
    pub fn call_method(&mut self, receiver: WidgetHandle, name: &str, args: &[Value]) -> HostResult<Value> {
        let kind = receiver.kind();
        if !methods_of(kind).contains(&name) {
            return Err(HostError::invalid_argument(name, format!("a {kind} has no method '{name}'")));
        }
        let a = Args::new(name, args);
        match name {
            "set_margin" => {
                a.expect_count(2, 2)?;
                self.set_margin(receiver, &a.string(0)?, a.integer(1)?)?;
                Ok(Value::Nil)
            }
            "add_box" => {
                a.expect_count(1, 2)?;
                let spacing = if args.len() > 1 { a.integer(1)? } else { 0 };
                Ok(self.add_box(receiver, &a.string(0)?, spacing)?.into())
            }
            "add_label" => {
                a.expect_count(2, 2)?;
                Ok(self.add_label(receiver, a.string(0)?, a.integer(1)?)?.into())
            }
            "set_css" => {
                a.expect_count(1, 1)?;
                self.set_css(receiver, a.string(0)?)?;
                Ok(Value::Nil)
            }
            "set_text" => {
                a.expect_count(1, 1)?;
                self.set_text(receiver, a.string(0)?)?;
                Ok(Value::Nil)
            }
            "show" => {
                a.expect_count(0, 0)?;
                self.show(receiver)?;
                Ok(Value::Nil)
            }
            "set_update_interval" => {
                a.expect_count(1, 2)?;
                self.set_update_interval(receiver, a.number(0)?, a.optional_callback(1)?)?;
                Ok(Value::Nil)
            }
            "on_update" => {
                a.expect_count(1, 1)?;
                self.on_update(receiver, a.callback(0)?)?;
                Ok(Value::Nil)
            }
            "close" => {
                a.expect_count(0, 0)?;
                self.close(receiver)?;
                Ok(Value::Nil)
            }
            _ => Err(HostError::invalid_argument(name, format!("a {kind} has no method '{name}'"))),
        }
    }

    // -----------------------------------------------------------------------
    // Typed bindings
    // -----------------------------------------------------------------------

    /// Report the values joined by tabs as script output.
    pub fn log(&self, parts: &[Value]) {
        let message = parts.iter().map(Value::to_string).collect::<Vec<_>>().join("\t");
        self.diagnostics.report(Diagnostic::ScriptLog { message });
    }

    /// GET `url` and convert the JSON body into script values: objects
    /// become tables, arrays lists. Blocks until the document arrives or
    /// the fetch timeout passes.
    pub fn fetch_json(&self, url: &str) -> HostResult<Value> {
        let json = self.fetcher.fetch_json(url, self.options.fetch_timeout)?;
        Ok(Value::from(json))
    }

    pub fn create_window(&mut self, title: impl Into<String>, width: i64, height: i64) -> HostResult<WidgetHandle> {
        let width = positive_px("create_window", "width", width)?;
        let height = positive_px("create_window", "height", height)?;
        let title = title.into();
        let id = self.tree.mutate(|t| t.create_window(title.clone(), width, height))?;
        if let Some(created) = self.loading.as_mut() {
            created.push(id);
        }
        tracing::info!(target: targets::HOST, ?id, %title, width, height, "window created");
        Ok(WidgetHandle::new(id, WidgetKind::Window))
    }

    pub fn add_box(&mut self, parent: WidgetHandle, orientation: &str, spacing: i64) -> HostResult<WidgetHandle> {
        let orientation = Orientation::from_str(orientation).map_err(|()| {
            HostError::invalid_argument("add_box", format!("unknown orientation '{orientation}'"))
        })?;
        let spacing = non_negative_px("add_box", "spacing", spacing)?;
        let id = self.tree.mutate(|t| t.add_container(parent.id(), orientation, spacing))?;
        Ok(WidgetHandle::new(id, WidgetKind::Container))
    }

    pub fn add_label(&mut self, parent: WidgetHandle, text: impl Into<String>, size: i64) -> HostResult<WidgetHandle> {
        let size = positive_px("add_label", "size", size)?;
        let text = text.into();
        let id = self.tree.mutate(|t| t.add_label(parent.id(), text, size))?;
        Ok(WidgetHandle::new(id, WidgetKind::Label))
    }

    /// Attach a style block. Problems in the text are reported, never returned.
    pub fn set_css(&mut self, widget: WidgetHandle, source: impl Into<String>) -> HostResult<()> {
        let source = source.into();
        let result = self.tree.mutate(|t| t.set_css(widget.id(), source));
        let warnings = self.tolerate_closed(result)?;
        for warning in warnings {
            self.diagnostics.report(Diagnostic::StyleWarning { widget: Some(widget.id()), warning });
        }
        Ok(())
    }

    pub fn set_text(&mut self, label: WidgetHandle, text: impl Into<String>) -> HostResult<()> {
        let text = text.into();
        let result = self.tree.mutate(|t| t.set_text(label.id(), text));
        self.tolerate_closed(result)
    }

    pub fn set_margin(&mut self, widget: WidgetHandle, edge: &str, px: i64) -> HostResult<()> {
        let edge = Edge::from_str(edge)
            .map_err(|()| HostError::invalid_argument("set_margin", format!("unknown edge '{edge}'")))?;
        let px = non_negative_px("set_margin", "margin", px)?;
        let result = self.tree.mutate(|t| t.set_margin(widget.id(), edge, px));
        self.tolerate_closed(result)
    }

    pub fn show(&mut self, window: WidgetHandle) -> HostResult<()> {
        let result = self.tree.mutate(|t| t.show(window.id()));
        self.tolerate_closed(result)
    }

    /// Arm (or re-arm) the window's updates every `seconds`. Without a
    /// callback, the one registered earlier is kept.
    pub fn set_update_interval(
        &mut self,
        window: WidgetHandle,
        seconds: f64,
        callback: Option<Callback>,
    ) -> HostResult<()> {
        if !(seconds > 0.0) {
            return Err(HostError::invalid_argument(
                "set_update_interval",
                format!("interval must be positive, got {seconds}"),
            ));
        }
        let requested = Duration::try_from_secs_f64(seconds)
            .ok()
            .filter(|d| *d <= MAX_UPDATE_INTERVAL)
            .ok_or_else(|| {
                HostError::invalid_argument(
                    "set_update_interval",
                    format!("interval must be at most {}s, got {seconds}", MAX_UPDATE_INTERVAL.as_secs()),
                )
            })?;
        let interval = self.clamp_interval(requested);

        let result = self.tree.mutate(|t| t.set_update_interval(window.id(), Some(interval)));
        self.tolerate_closed(result)?;
        if !self.is_live(window.id()) {
            return Ok(());
        }
        let now = self.clock.now();
        self.scheduler.set_interval(window.id(), interval, callback, now);
        Ok(())
    }

    /// Register the window's update callback.
    pub fn on_update(&mut self, window: WidgetHandle, callback: Callback) -> HostResult<()> {
        let result = self.expect_window(window, "on_update");
        let Some(id) = self.tolerate_closed(result.map(Some))? else {
            return Ok(());
        };
        let fallback = self.options.default_update_interval.map(|d| self.clamp_interval(d));
        let now = self.clock.now();
        self.scheduler.set_callback(id, callback, fallback, now);
        let interval = self.scheduler.interval_of(id);
        self.tree.mutate(|t| t.set_update_interval(id, interval))?;
        Ok(())
    }

    /// Cancel the window's updates and destroy it with its subtree.
    pub fn close(&mut self, window: WidgetHandle) -> HostResult<()> {
        let result = self.expect_window(window, "close");
        let Some(id) = self.tolerate_closed(result.map(Some))? else {
            return Ok(());
        };
        self.scheduler.cancel_window(id);
        let removed = self.tree.mutate(|t| t.destroy_window(id))?;
        tracing::info!(target: targets::HOST, ?id, widgets = removed.len(), "window closed");
        self.note_closed(id, removed);
        Ok(())
    }

    /// Close every window and drop every registration.
    pub fn close_all(&mut self) {
        let _batch = self.tree.batch();
        for id in self.tree.read(|t| t.windows().to_vec()) {
            self.scheduler.cancel_window(id);
            match self.tree.mutate(|t| t.destroy_window(id)) {
                Ok(removed) => self.note_closed(id, removed),
                Err(err) => tracing::debug!(target: targets::HOST, ?id, %err, "window already gone"),
            }
        }
        self.scheduler.clear();
    }

    fn note_closed(&mut self, window: WidgetId, removed: Vec<WidgetId>) {
        if let Some(firing) = self.firing.as_mut().filter(|f| f.window == window) {
            firing.closed.extend(removed);
        }
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Run a script's top-level body once.
    ///
    /// Publication is deferred until the body returns. If it fails, every
    /// window it created is closed again before anything is published.
    pub fn load(&mut self, script: &mut dyn Script) -> Result<(), LoadError> {
        let name = script.name().to_string();
        if self.loading.is_some() {
            return Err(self.load_failed(name, ScriptError::runtime("cannot load a script from inside a load")));
        }

        let batch = self.tree.batch();
        self.loading = Some(Vec::new());
        tracing::info!(target: targets::HOST, script = %name, "loading script");
        let result = script.run(self);
        let created = self.loading.take().unwrap_or_default();

        match result {
            Ok(()) => {
                drop(batch);
                tracing::info!(target: targets::HOST, script = %name, windows = created.len(), "script loaded");
                Ok(())
            }
            Err(source) => {
                for id in created {
                    self.scheduler.cancel_window(id);
                    if !self.is_live(id) {
                        continue;
                    }
                    if let Err(err) = self.tree.mutate(|t| t.destroy_window(id)) {
                        tracing::warn!(target: targets::HOST, script = %name, ?id, %err, "failed to roll back window");
                    }
                }
                drop(batch);
                Err(self.load_failed(name, source))
            }
        }
    }

    fn load_failed(&self, script: String, source: ScriptError) -> LoadError {
        let err = LoadError { script, source };
        self.diagnostics.report(Diagnostic::LoadFailed(err.clone()));
        err
    }

    /// Fire every registration due now. Each firing is one publication
    /// batch. Returns how many callbacks ran.
    pub fn fire_due(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some(firing) = self.scheduler.begin_next_due(now) {
            fired += 1;
            let batch = self.tree.batch();
            self.firing = Some(ActiveFiring { window: firing.window, closed: HashSet::new() });
            let result = firing.callback.call(self);
            let closed = self.firing.take().map(|f| f.closed).unwrap_or_default();
            drop(batch);

            if let Err(source) = result {
                self.callback_failed(&firing, &closed, source);
            }
            self.scheduler.finish(&firing, self.clock.now());
        }
        fired
    }

    /// Earliest pending update deadline.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    fn callback_failed(&self, firing: &Firing, closed: &HashSet<WidgetId>, source: ScriptError) {
        let stale = match &source {
            ScriptError::Host(HostError::UnknownWidget(id)) => closed.contains(id),
            ScriptError::Host(HostError::InvalidParent { parent, .. }) => closed.contains(parent),
            _ => false,
        };
        if stale {
            tracing::debug!(target: targets::SCHEDULER, window = ?firing.window, "callback touched its closed window");
            return;
        }
        self.diagnostics.report(Diagnostic::CallbackFailed(CallbackError {
            window: firing.window,
            registration: firing.id,
            source,
        }));
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn is_live(&self, id: WidgetId) -> bool {
        self.tree.read(|t| t.contains(id))
    }

    fn expect_window(&self, handle: WidgetHandle, call: &str) -> HostResult<WidgetId> {
        match self.tree.read(|t| t.kind(handle.id())) {
            None => Err(HostError::UnknownWidget(handle.id())),
            Some(WidgetKind::Window) => Ok(handle.id()),
            Some(kind) => Err(HostError::invalid_argument(call, format!("expected a window, got a {kind}"))),
        }
    }

    fn clamp_interval(&self, requested: Duration) -> Duration {
        if requested < self.options.min_update_interval {
            tracing::debug!(
                target: targets::HOST,
                ?requested,
                min = ?self.options.min_update_interval,
                "update interval raised to minimum"
            );
            self.options.min_update_interval
        } else {
            requested
        }
    }

    /// While a callback runs after closing its own window, touching that
    /// window's removed widgets is a no-op.
    fn tolerate_closed<T: Default>(&self, result: HostResult<T>) -> HostResult<T> {
        match result {
            Err(HostError::UnknownWidget(id)) if self.firing.as_ref().is_some_and(|f| f.closed.contains(&id)) => {
                tracing::debug!(target: targets::HOST, ?id, "ignoring call on closed window");
                Ok(T::default())
            }
            other => other,
        }
    }
}

fn positive_px(call: &str, what: &str, value: i64) -> HostResult<u32> {
    if value <= 0 {
        return Err(HostError::invalid_argument(call, format!("{what} must be positive, got {value}")));
    }
    bounded_px(call, what, value)
}

fn non_negative_px(call: &str, what: &str, value: i64) -> HostResult<u32> {
    if value < 0 {
        return Err(HostError::invalid_argument(call, format!("{what} must not be negative, got {value}")));
    }
    bounded_px(call, what, value)
}

fn bounded_px(call: &str, what: &str, value: i64) -> HostResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|px| *px <= MAX_PX)
        .ok_or_else(|| HostError::invalid_argument(call, format!("{what} must be at most {MAX_PX}, got {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::WidgetTree;
    use crate::host::diagnostics::RecordingDiagnostics;
    use crate::host::script::FnScript;
    use crate::scheduler::ManualClock;
    use pretty_assertions::assert_eq;

    fn host() -> (ScriptHost, ManualClock, Arc<RecordingDiagnostics>) {
        let clock = ManualClock::new();
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let host = ScriptHost::new(SharedTree::new(WidgetTree::new()), Arc::new(clock.clone()), diagnostics.clone());
        (host, clock, diagnostics)
    }

    #[test]
    fn create_window_validates_size() {
        let (mut host, ..) = host();
        assert_eq!(
            host.create_window("w", 0, 10),
            Err(HostError::invalid_argument("create_window", "width must be positive, got 0"))
        );
        assert!(host.create_window("w", 10, -1).is_err());
        assert!(host.create_window("w", 10, 10).is_ok());
    }

    #[test]
    fn dynamic_calls_build_a_tree() {
        let (mut host, ..) = host();
        let window = host
            .call_global("create_window", &["Hello".into(), Value::Number(200.0), 100.into()])
            .unwrap()
            .as_widget()
            .unwrap();
        let col = host
            .call_method(window, "add_box", &["vertical".into(), 5.into()])
            .unwrap()
            .as_widget()
            .unwrap();
        let label = host
            .call_method(col, "add_label", &["hi".into(), 18.into()])
            .unwrap()
            .as_widget()
            .unwrap();
        host.call_method(label, "set_text", &["there".into()]).unwrap();

        let snapshot = host.snapshot();
        assert_eq!(snapshot.label_texts(window.id()), vec!["there"]);
        assert_eq!(snapshot.node(col.id()).unwrap().parent, Some(window.id()));
    }

    #[test]
    fn methods_are_checked_per_kind() {
        let (mut host, ..) = host();
        let window = host.create_window("w", 10, 10).unwrap();
        let label = host.add_label(window, "x", 10).unwrap();
        assert_eq!(
            host.call_method(label, "show", &[]),
            Err(HostError::invalid_argument("show", "a label has no method 'show'"))
        );
        assert!(host.call_method(window, "set_text", &["x".into()]).is_err());
        assert!(host.call_global("print", &[]).is_err());
    }

    #[test]
    fn bad_arguments_are_reported() {
        let (mut host, ..) = host();
        let window = host.create_window("w", 10, 10).unwrap();
        assert_eq!(
            host.add_box(window, "diagonal", 0),
            Err(HostError::invalid_argument("add_box", "unknown orientation 'diagonal'"))
        );
        assert_eq!(
            host.set_margin(window, "middle", 3),
            Err(HostError::invalid_argument("set_margin", "unknown edge 'middle'"))
        );
        assert!(host.set_margin(window, "top", -1).is_err());
        assert!(host.set_update_interval(window, 0.0, None).is_err());
        assert!(host.set_update_interval(window, f64::NAN, None).is_err());
        assert!(host.call_method(window, "on_update", &[1.into()]).is_err());
    }

    #[test]
    fn window_takes_a_single_child() {
        let (mut host, ..) = host();
        let window = host.create_window("w", 10, 10).unwrap();
        host.add_box(window, "vertical", 0).unwrap();
        assert!(matches!(
            host.add_label(window, "x", 10),
            Err(HostError::InvalidParent { .. })
        ));
    }

    #[test]
    fn log_joins_with_tabs() {
        let (host, _, diagnostics) = host();
        host.log(&["a".into(), 1.into(), Value::Nil]);
        assert_eq!(diagnostics.logs(), vec!["a\t1\tnil"]);
    }

    #[test]
    fn style_warnings_go_to_diagnostics() {
        let (mut host, _, diagnostics) = host();
        let window = host.create_window("w", 10, 10).unwrap();
        host.set_css(window, "box { color: ; }").unwrap();
        assert!(!diagnostics.style_warnings().is_empty());
    }

    #[test]
    fn interval_is_clamped_to_minimum() {
        let (mut host, ..) = host();
        let window = host.create_window("w", 10, 10).unwrap();
        host.set_update_interval(window, 0.001, Some(Callback::new(|_| Ok(())))).unwrap();
        assert_eq!(host.scheduler().interval_of(window.id()), Some(Duration::from_millis(50)));
    }

    #[test]
    fn on_update_uses_default_interval() {
        let (host, ..) = host();
        let mut host = host.with_options(HostOptions {
            default_update_interval: Some(Duration::from_secs(2)),
            ..HostOptions::default()
        });
        let window = host.create_window("w", 10, 10).unwrap();
        host.on_update(window, Callback::new(|_| Ok(()))).unwrap();
        assert_eq!(host.scheduler().interval_of(window.id()), Some(Duration::from_secs(2)));
        let snapshot = host.snapshot();
        let data = &snapshot.node(window.id()).unwrap().body;
        assert!(matches!(data, crate::dom::WidgetBody::Window(w) if w.update_interval == Some(Duration::from_secs(2))));
    }

    #[test]
    fn on_update_without_interval_stays_idle() {
        let (mut host, ..) = host();
        let window = host.create_window("w", 10, 10).unwrap();
        host.on_update(window, Callback::new(|_| Ok(()))).unwrap();
        assert_eq!(host.next_deadline(), None);
    }

    #[test]
    fn close_cancels_and_destroys() {
        let (mut host, ..) = host();
        let window = host.create_window("w", 10, 10).unwrap();
        host.set_update_interval(window, 1.0, Some(Callback::new(|_| Ok(())))).unwrap();
        host.close(window).unwrap();
        assert!(host.snapshot().is_empty());
        assert!(host.scheduler().is_empty());
        assert_eq!(host.close(window), Err(HostError::UnknownWidget(window.id())));
    }

    #[test]
    fn stale_handles_fail_outside_callbacks() {
        let (mut host, ..) = host();
        let window = host.create_window("w", 10, 10).unwrap();
        let label = host.add_label(window, "x", 10).unwrap();
        host.close(window).unwrap();
        assert_eq!(host.set_text(label, "y"), Err(HostError::UnknownWidget(label.id())));
    }

    #[test]
    fn callback_closing_its_window_swallows_later_calls() {
        let (mut host, clock, diagnostics) = host();
        let window = host.create_window("w", 10, 10).unwrap();
        let label = host.add_label(window, "x", 10).unwrap();
        host.set_update_interval(
            window,
            1.0,
            Some(Callback::new(move |host| {
                host.close(window)?;
                host.set_text(label, "after close")?;
                host.add_label(window, "more", 10)?;
                Ok(())
            })),
        )
        .unwrap();

        clock.advance(Duration::from_secs(1));
        assert_eq!(host.fire_due(), 1);
        assert!(diagnostics.callback_failures().is_empty());
        assert!(host.snapshot().is_empty());
        assert_eq!(host.next_deadline(), None);
    }

    #[test]
    fn stale_handle_into_another_window_is_reported() {
        let (mut host, clock, diagnostics) = host();
        let other = host.create_window("other", 10, 10).unwrap();
        let label = host.add_label(other, "x", 10).unwrap();
        host.close(other).unwrap();

        let window = host.create_window("w", 10, 10).unwrap();
        host.set_update_interval(
            window,
            1.0,
            Some(Callback::new(move |host| {
                host.close(window)?;
                host.set_text(label, "stale")?;
                Ok(())
            })),
        )
        .unwrap();

        clock.advance(Duration::from_secs(1));
        assert_eq!(host.fire_due(), 1);
        let failures = diagnostics.callback_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].source, ScriptError::Host(HostError::UnknownWidget(label.id())));
    }

    #[test]
    fn oversized_pixels_are_rejected() {
        let (mut host, ..) = host();
        assert_eq!(
            host.create_window("w", i64::from(MAX_PX) + 1, 10),
            Err(HostError::invalid_argument(
                "create_window",
                format!("width must be at most {MAX_PX}, got {}", i64::from(MAX_PX) + 1)
            ))
        );
        let window = host.create_window("w", 200, 100).unwrap();
        let col = host.add_box(window, "vertical", 0).unwrap();
        assert!(host.add_label(col, "Hello", 1_000_000_000).is_err());
        assert!(host.set_margin(col, "left", i64::from(u32::MAX)).is_err());
        assert!(host.add_box(col, "horizontal", i64::MAX).is_err());

        let label = host.add_label(col, "Hello", i64::from(MAX_PX)).unwrap();
        host.set_margin(label, "left", i64::from(MAX_PX)).unwrap();
        assert!(host.snapshot().node(label.id()).is_some());
    }

    #[test]
    fn oversized_interval_is_rejected() {
        let (mut host, ..) = host();
        let window = host.create_window("w", 10, 10).unwrap();
        let callback = Callback::new(|_| Ok(()));
        assert!(host.set_update_interval(window, 1e19, Some(callback.clone())).is_err());
        assert!(host.set_update_interval(window, f64::INFINITY, Some(callback.clone())).is_err());
        assert!(host.scheduler().is_empty());

        let max = MAX_UPDATE_INTERVAL.as_secs_f64();
        host.set_update_interval(window, max, Some(callback)).unwrap();
        assert_eq!(host.scheduler().interval_of(window.id()), Some(MAX_UPDATE_INTERVAL));
    }

    struct CannedFetcher;

    impl JsonFetcher for CannedFetcher {
        fn fetch_json(&self, url: &str, _timeout: Duration) -> Result<serde_json::Value, crate::error::FetchError> {
            match url {
                "http://weather.local/now" => Ok(serde_json::json!({"temp": 7, "city": "Bergen"})),
                _ => Err(crate::error::FetchError::Status { url: url.to_string(), status: 404 }),
            }
        }
    }

    #[test]
    fn fetch_json_returns_tables() {
        let (host, ..) = host();
        let mut host = host.with_fetcher(Arc::new(CannedFetcher));
        let weather = host.call_global("fetch_json", &["http://weather.local/now".into()]).unwrap();
        assert_eq!(weather.get("temp"), Some(&Value::Integer(7)));
        assert_eq!(weather.get("city"), Some(&Value::from("Bergen")));

        let err = host.call_global("fetch_json", &["http://weather.local/missing".into()]).unwrap_err();
        assert_eq!(err.to_string(), "HTTP error 404 from http://weather.local/missing");
        assert!(host.call_global("fetch_json", &[]).is_err());
    }

    #[test]
    fn failed_fetch_fails_the_load() {
        let (host, _, diagnostics) = host();
        let mut host = host.with_fetcher(Arc::new(CannedFetcher));
        let mut script = FnScript::new("weather", |host: &mut ScriptHost| {
            let window = host.create_window("w", 10, 10)?;
            let data = host.fetch_json("http://weather.local/missing")?;
            host.add_label(window, data.to_string(), 10)?;
            Ok(())
        });
        assert!(host.load(&mut script).is_err());
        assert!(host.snapshot().is_empty());
        assert_eq!(diagnostics.load_failures().len(), 1);
    }

    #[test]
    fn nested_load_is_rejected() {
        let (mut host, _, diagnostics) = host();
        let mut outer = FnScript::new("outer", |host: &mut ScriptHost| {
            let mut inner = FnScript::new("inner", |_: &mut ScriptHost| Ok(()));
            host.load(&mut inner).map_err(|err| ScriptError::runtime(err.to_string()))
        });
        let err = host.load(&mut outer).unwrap_err();
        assert_eq!(err.script, "outer");
        assert_eq!(diagnostics.load_failures().len(), 2);
    }

    #[test]
    fn load_publishes_once() {
        let (mut host, ..) = host();
        let reader = host.tree().reader();
        let before = reader.revision();
        let mut script = FnScript::new("main", |host: &mut ScriptHost| {
            let window = host.create_window("w", 10, 10)?;
            host.add_label(window, "x", 10)?;
            host.show(window)?;
            Ok(())
        });
        host.load(&mut script).unwrap();
        let snapshot = reader.latest();
        assert!(snapshot.revision > before);
        assert_eq!(snapshot.len(), 2);
    }
}
