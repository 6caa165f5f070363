//! App: configuration and the script thread.
//!
//! [`App::start`] builds the widget tree from an [`AppConfig`], spawns a
//! dedicated thread running a current-thread tokio runtime, and creates the
//! [`ScriptHost`] there. The thread serializes script loads, window closes,
//! and update firings. Renderers read published snapshots through
//! [`App::snapshots`].

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Deserializer};
use tokio::sync::{mpsc, oneshot};

use crate::css::parser::StyleParseWarning;
use crate::dom::{Layer, SharedTree, SnapshotReader, WidgetId, WidgetTree, WindowPlacement};
use crate::error::{HostError, HostResult, LoadError};
use crate::geometry::Edge;
use crate::host::{Diagnostic, Diagnostics, HostOptions, Script, ScriptHost, TracingDiagnostics};
use crate::logging::targets;
use crate::scheduler::{SystemClock, MAX_UPDATE_INTERVAL};

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Invalid configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

/// Configuration for the host.
///
/// Durations are written in seconds in TOML:
///
/// ```toml
/// thread_name = "widgets"
/// min_update_interval = 0.1
/// default_update_interval = 1
/// window_layer = "overlay"
/// default_anchor = ["bottom", "right"]
/// user_css = "label { color: #eeeeee; }"
/// fetch_timeout = 5
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Name of the script thread.
    pub thread_name: String,
    /// Shorter update intervals are raised to this.
    #[serde(deserialize_with = "seconds")]
    pub min_update_interval: Duration,
    /// Interval for `on_update` on a window that never set one.
    #[serde(deserialize_with = "optional_seconds")]
    pub default_update_interval: Option<Duration>,
    /// Layer new windows are placed on.
    pub window_layer: Layer,
    /// Edges new windows are anchored to.
    pub default_anchor: Vec<Edge>,
    /// Style block applied outside every window's own blocks.
    pub user_css: Option<String>,
    /// Upper bound on one `fetch_json` request.
    #[serde(deserialize_with = "seconds")]
    pub fetch_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        let placement = WindowPlacement::default();
        Self {
            thread_name: "swaydgets-script".to_string(),
            min_update_interval: HostOptions::default().min_update_interval,
            default_update_interval: None,
            window_layer: placement.layer,
            default_anchor: placement.anchors,
            user_css: None,
            fetch_timeout: HostOptions::default().fetch_timeout,
        }
    }
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

fn optional_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
    Option::<f64>::deserialize(deserializer)?
        .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
        .transpose()
}

fn check_interval(field: &'static str, interval: Duration) -> Result<(), ConfigError> {
    if interval.is_zero() {
        return Err(ConfigError::Invalid { field, message: "must be positive".into() });
    }
    if interval > MAX_UPDATE_INTERVAL {
        return Err(ConfigError::Invalid {
            field,
            message: format!("must be at most {}s", MAX_UPDATE_INTERVAL.as_secs()),
        });
    }
    Ok(())
}

impl AppConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_min_update_interval(mut self, interval: Duration) -> Self {
        self.min_update_interval = interval;
        self
    }

    pub fn with_default_update_interval(mut self, interval: Option<Duration>) -> Self {
        self.default_update_interval = interval;
        self
    }

    pub fn with_window_layer(mut self, layer: Layer) -> Self {
        self.window_layer = layer;
        self
    }

    pub fn with_default_anchor(mut self, anchors: impl IntoIterator<Item = Edge>) -> Self {
        self.default_anchor = anchors.into_iter().collect();
        self
    }

    pub fn with_user_css(mut self, css: impl Into<String>) -> Self {
        self.user_css = Some(css.into());
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_name.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "thread_name", message: "must not be empty".into() });
        }
        check_interval("min_update_interval", self.min_update_interval)?;
        if let Some(interval) = self.default_update_interval {
            check_interval("default_update_interval", interval)?;
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid { field: "fetch_timeout", message: "must be positive".into() });
        }
        Ok(())
    }

    pub fn placement(&self) -> WindowPlacement {
        let mut anchors = self.default_anchor.clone();
        anchors.sort();
        anchors.dedup();
        WindowPlacement { layer: self.window_layer, anchors }
    }

    pub fn host_options(&self) -> HostOptions {
        HostOptions {
            min_update_interval: self.min_update_interval,
            default_update_interval: self.default_update_interval,
            fetch_timeout: self.fetch_timeout,
        }
    }

    /// An empty tree with this config's placement and host style block.
    pub fn build_tree(&self) -> (WidgetTree, Vec<StyleParseWarning>) {
        let mut tree = WidgetTree::new();
        tree.set_window_placement(self.placement());
        let warnings = match &self.user_css {
            Some(css) => tree.set_host_css(css),
            None => Vec::new(),
        };
        (tree, warnings)
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Failure talking to the script thread.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to start the script thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("the script thread has stopped")]
    Stopped,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Host(#[from] HostError),
}

enum Command {
    Load {
        script: Box<dyn Script + Send>,
        reply: oneshot::Sender<Result<(), LoadError>>,
    },
    CloseWindow {
        window: WidgetId,
        reply: oneshot::Sender<HostResult<()>>,
    },
    Shutdown,
}

/// A running host session.
///
/// Owns the script thread. Dropping the app shuts the thread down and closes
/// every window.
pub struct App {
    config: AppConfig,
    commands: mpsc::UnboundedSender<Command>,
    reader: SnapshotReader,
    thread: Option<thread::JoinHandle<()>>,
}

impl App {
    /// Validate `config` and start the script thread.
    pub fn start(config: AppConfig) -> Result<Self, AppError> {
        config.validate()?;
        let (tree, warnings) = config.build_tree();
        for warning in warnings {
            TracingDiagnostics.report(Diagnostic::StyleWarning { widget: None, warning });
        }

        let shared = SharedTree::new(tree);
        let reader = shared.reader();
        let (commands, receiver) = mpsc::unbounded_channel();
        let options = config.host_options();
        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run_session(shared, options, receiver))
            .map_err(AppError::Spawn)?;
        tracing::info!(target: targets::APP, thread = %config.thread_name, "script thread started");

        Ok(Self { config, commands, reader, thread: Some(thread) })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run a script's top-level body on the script thread and wait for it.
    ///
    /// Blocks the caller; do not call from inside an async runtime.
    pub fn load<S>(&self, script: S) -> Result<(), AppError>
    where
        S: Script + Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Load { script: Box::new(script), reply })
            .map_err(|_| AppError::Stopped)?;
        response.blocking_recv().map_err(|_| AppError::Stopped)??;
        Ok(())
    }

    /// Close a window from outside any script.
    pub fn close_window(&self, window: WidgetId) -> Result<(), AppError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::CloseWindow { window, reply })
            .map_err(|_| AppError::Stopped)?;
        response.blocking_recv().map_err(|_| AppError::Stopped)??;
        Ok(())
    }

    /// A reader over published snapshots.
    pub fn snapshots(&self) -> SnapshotReader {
        self.reader.clone()
    }

    /// Stop the script thread, closing every window.
    pub fn shutdown(mut self) -> Result<(), AppError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), AppError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        // The thread may already be gone; joining tells us either way.
        let _ = self.commands.send(Command::Shutdown);
        thread.join().map_err(|_| AppError::Stopped)
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(target: targets::APP, %err, "script thread did not stop cleanly");
        }
    }
}

fn run_session(tree: SharedTree, options: HostOptions, mut commands: mpsc::UnboundedReceiver<Command>) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(target: targets::APP, %err, "failed to build the script runtime");
            return;
        }
    };

    let mut host = ScriptHost::new(tree, Arc::new(SystemClock), Arc::new(TracingDiagnostics)).with_options(options);
    runtime.block_on(async {
        loop {
            let deadline = host.next_deadline();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Load { mut script, reply }) => {
                        let _ = reply.send(host.load(script.as_mut()));
                    }
                    Some(Command::CloseWindow { window, reply }) => {
                        let result = match host.handle(window) {
                            Some(handle) => host.close(handle),
                            None => Err(HostError::UnknownWidget(window)),
                        };
                        let _ = reply.send(result);
                    }
                    Some(Command::Shutdown) | None => break,
                },
                () = sleep_until(deadline) => {
                    let fired = host.fire_due();
                    tracing::trace!(target: targets::APP, fired, "update tick");
                }
            }
        }
    });

    host.close_all();
    tracing::info!(target: targets::APP, "script thread stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FnScript;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.thread_name, "swaydgets-script");
        assert_eq!(config.min_update_interval, Duration::from_millis(50));
        assert_eq!(config.default_update_interval, None);
        assert_eq!(config.window_layer, Layer::Background);
        assert_eq!(config.default_anchor, vec![Edge::Top, Edge::Left]);
    }

    #[test]
    fn builder_chain() {
        let config = AppConfig::new()
            .with_thread_name("widgets")
            .with_window_layer(Layer::Overlay)
            .with_default_anchor([Edge::Bottom, Edge::Right, Edge::Bottom])
            .with_user_css("label { color: red; }");
        assert_eq!(config.thread_name, "widgets");
        assert_eq!(config.placement().anchors, vec![Edge::Bottom, Edge::Right]);
        assert_eq!(config.user_css.as_deref(), Some("label { color: red; }"));
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            min_update_interval = 0.25
            default_update_interval = 1
            window_layer = "top"
            default_anchor = ["top", "right"]
            "#,
        )
        .unwrap();
        assert_eq!(config.min_update_interval, Duration::from_millis(250));
        assert_eq!(config.default_update_interval, Some(Duration::from_secs(1)));
        assert_eq!(config.window_layer, Layer::Top);
        assert_eq!(config.default_anchor, vec![Edge::Top, Edge::Right]);
        assert_eq!(config.thread_name, "swaydgets-script");
    }

    #[test]
    fn toml_errors() {
        assert!(matches!(AppConfig::from_toml_str("fps = 60"), Err(ConfigError::Parse(_))));
        assert!(matches!(AppConfig::from_toml_str("window_layer = \"sky\""), Err(ConfigError::Parse(_))));
        assert!(matches!(AppConfig::from_toml_str("min_update_interval = -1"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            AppConfig::from_toml_str("min_update_interval = 0"),
            Err(ConfigError::Invalid { field: "min_update_interval", .. })
        ));
        assert!(matches!(
            AppConfig::from_toml_str("default_update_interval = 100000"),
            Err(ConfigError::Invalid { field: "default_update_interval", .. })
        ));
        assert!(matches!(
            AppConfig::from_toml_str("fetch_timeout = 0"),
            Err(ConfigError::Invalid { field: "fetch_timeout", .. })
        ));
        assert!(matches!(AppConfig::from_toml_str("min_update_interval = 1e30"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn fetch_timeout_reaches_host_options() {
        let config = AppConfig::from_toml_str("fetch_timeout = 2.5").unwrap();
        assert_eq!(config.host_options().fetch_timeout, Duration::from_millis(2500));
        assert_eq!(AppConfig::default().fetch_timeout, Duration::from_secs(10));
    }

    #[test]
    fn build_tree_applies_user_css() {
        let config = AppConfig::new().with_user_css("label { color: red; }").with_window_layer(Layer::Overlay);
        let (mut tree, warnings) = config.build_tree();
        assert!(warnings.is_empty());
        let window = tree.create_window("w", 10, 10).unwrap();
        let label = tree.add_label(window, "x", 10).unwrap();
        let color = tree.resolved_style(label).unwrap().color("color").map(|c| c.to_string());
        assert_eq!(color.as_deref(), Some("#ff0000"));
        assert_eq!(tree.get(window).unwrap().as_window().unwrap().layer, Layer::Overlay);
    }

    #[test]
    fn app_runs_scripts_on_its_thread() {
        let app = App::start(AppConfig::default()).unwrap();
        let reader = app.snapshots();
        app.load(FnScript::new("main", |host: &mut ScriptHost| {
            let window = host.create_window("w", 100, 50)?;
            host.add_label(window, "hello", 12)?;
            host.show(window)?;
            Ok(())
        }))
        .unwrap();

        let snapshot = reader.latest();
        assert_eq!(snapshot.windows.len(), 1);
        let window = snapshot.windows[0];
        assert_eq!(snapshot.label_texts(window), vec!["hello"]);

        app.close_window(window).unwrap();
        assert!(reader.latest().is_empty());
        assert!(matches!(app.close_window(window), Err(AppError::Host(HostError::UnknownWidget(_)))));
        app.shutdown().unwrap();
    }

    #[test]
    fn failed_load_comes_back_as_error() {
        let app = App::start(AppConfig::default()).unwrap();
        let err = app
            .load(FnScript::new("bad", |host: &mut ScriptHost| {
                host.create_window("w", 0, 0)?;
                Ok(())
            }))
            .unwrap_err();
        assert!(matches!(err, AppError::Load(LoadError { ref script, .. }) if script == "bad"));
        assert!(app.snapshots().latest().is_empty());
    }
}
