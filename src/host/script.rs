//! Scripts: a named top-level body run once by [`ScriptHost::load`].

use super::api::ScriptHost;
use crate::error::ScriptError;

/// A unit of script code. `run` is the top-level body; anything meant to run
/// later is registered through the host as a callback.
pub trait Script {
    fn name(&self) -> &str;

    fn run(&mut self, host: &mut ScriptHost) -> Result<(), ScriptError>;
}

/// A script whose body is a Rust closure.
pub struct FnScript<F> {
    name: String,
    body: F,
}

impl<F> FnScript<F>
where
    F: FnMut(&mut ScriptHost) -> Result<(), ScriptError>,
{
    pub fn new(name: impl Into<String>, body: F) -> Self {
        Self { name: name.into(), body }
    }
}

impl<F> Script for FnScript<F>
where
    F: FnMut(&mut ScriptHost) -> Result<(), ScriptError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, host: &mut ScriptHost) -> Result<(), ScriptError> {
        (self.body)(host)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dom::{SharedTree, WidgetTree};
    use crate::error::HostError;
    use crate::host::diagnostics::RecordingDiagnostics;
    use crate::host::value::Callback;
    use crate::scheduler::ManualClock;

    fn host() -> (ScriptHost, Arc<RecordingDiagnostics>) {
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let host = ScriptHost::new(
            SharedTree::new(WidgetTree::new()),
            Arc::new(ManualClock::new()),
            diagnostics.clone(),
        );
        (host, diagnostics)
    }

    #[test]
    fn body_runs_exactly_once() {
        let (mut host, _) = host();
        let mut runs = 0;
        let mut script = FnScript::new("count", |_: &mut ScriptHost| {
            runs += 1;
            Ok(())
        });
        host.load(&mut script).unwrap();
        drop(script);
        assert_eq!(runs, 1);
    }

    #[test]
    fn failed_load_rolls_back_windows_and_registrations() {
        let (mut host, diagnostics) = host();
        let reader = host.tree().reader();
        let mut script = FnScript::new("broken", |host: &mut ScriptHost| {
            let window = host.create_window("w", 10, 10)?;
            host.add_label(window, "x", 10)?;
            host.set_update_interval(window, 1.0, Some(Callback::new(|_| Ok(()))))?;
            host.show(window)?;
            host.add_label(window, "second child", 10)?;
            Ok(())
        });

        let err = host.load(&mut script).unwrap_err();
        assert_eq!(err.script, "broken");
        assert!(matches!(err.source, ScriptError::Host(HostError::InvalidParent { .. })));
        assert!(reader.latest().is_empty());
        assert!(host.scheduler().is_empty());
        assert_eq!(diagnostics.load_failures(), vec![err]);
    }

    #[test]
    fn runtime_errors_fail_the_load() {
        let (mut host, _) = host();
        let mut script = FnScript::new("raise", |host: &mut ScriptHost| {
            host.create_window("w", 10, 10)?;
            Err(ScriptError::runtime("attempt to index a nil value"))
        });
        let err = host.load(&mut script).unwrap_err();
        assert_eq!(err.to_string(), "failed to load script 'raise': attempt to index a nil value");
        assert!(host.snapshot().is_empty());
    }

    #[test]
    fn failed_load_keeps_earlier_windows() {
        let (mut host, _) = host();
        let mut good = FnScript::new("good", |host: &mut ScriptHost| {
            host.create_window("kept", 10, 10)?;
            Ok(())
        });
        host.load(&mut good).unwrap();
        let mut bad = FnScript::new("bad", |host: &mut ScriptHost| {
            host.create_window("dropped", 10, 10)?;
            Err(ScriptError::runtime("boom"))
        });
        assert!(host.load(&mut bad).is_err());
        assert_eq!(host.snapshot().windows.len(), 1);
    }
}
