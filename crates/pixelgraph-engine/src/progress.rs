//! Progress reporting bridge.
//!
//! The executor reports per-tile completion through an external, stateful
//! progress object. The bridge owns the scope bracketing: it opens the
//! external object's scope on entry and guarantees the matching close on
//! exit - success, failure, or cancellation - via `Drop`. If the external
//! object is already active when the call starts (the caller is composing
//! operations inside a running progress scope), the bridge only forwards
//! values and the label, so nested operations share one visible bar and a
//! redundant start/end pair is never emitted.

/// External progress object driven by the executor.
///
/// Implementations are stateful: `start` transitions Idle to Active,
/// `end` back to Idle. `set_value` receives monotonically non-decreasing
/// fractions in [0, 1], ending at exactly 1.0 on successful completion.
pub trait ProgressSink {
    /// Whether a progress scope is currently open.
    fn is_active(&self) -> bool;

    /// Opens a scope with a descriptive label.
    fn start(&mut self, message: &str);

    /// Updates the label of an already-open scope.
    fn set_message(&mut self, message: &str);

    /// Reports fractional completion of the running operation.
    fn set_value(&mut self, fraction: f64);

    /// Closes the scope.
    fn end(&mut self);
}

/// Scope guard adapting tile stepping to a [`ProgressSink`].
pub(crate) struct ProgressBridge<'a> {
    sink: &'a mut dyn ProgressSink,
    owns_scope: bool,
}

impl<'a> ProgressBridge<'a> {
    /// Enters the progress scope, reusing an active one when present.
    pub(crate) fn begin(sink: &'a mut dyn ProgressSink, label: &str) -> Self {
        let owns_scope = !sink.is_active();
        if owns_scope {
            sink.start(label);
        } else if !label.is_empty() {
            sink.set_message(label);
        }
        Self { sink, owns_scope }
    }

    /// Forwards one tile-completion fraction.
    pub(crate) fn set_value(&mut self, fraction: f64) {
        self.sink.set_value(fraction);
    }
}

impl Drop for ProgressBridge<'_> {
    fn drop(&mut self) {
        if self.owns_scope {
            self.sink.end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        active: bool,
        starts: u32,
        ends: u32,
        messages: Vec<String>,
        values: Vec<f64>,
    }

    impl ProgressSink for Recorder {
        fn is_active(&self) -> bool {
            self.active
        }
        fn start(&mut self, message: &str) {
            self.active = true;
            self.starts += 1;
            self.messages.push(message.to_owned());
        }
        fn set_message(&mut self, message: &str) {
            self.messages.push(message.to_owned());
        }
        fn set_value(&mut self, fraction: f64) {
            self.values.push(fraction);
        }
        fn end(&mut self) {
            self.active = false;
            self.ends += 1;
        }
    }

    #[test]
    fn test_idle_entry_brackets_scope() {
        let mut rec = Recorder::default();
        {
            let mut bridge = ProgressBridge::begin(&mut rec, "Blur");
            bridge.set_value(0.5);
            bridge.set_value(1.0);
        }
        assert_eq!(rec.starts, 1);
        assert_eq!(rec.ends, 1);
        assert!(!rec.active);
        assert_eq!(rec.values, vec![0.5, 1.0]);
    }

    #[test]
    fn test_active_entry_reuses_scope() {
        let mut rec = Recorder::default();
        rec.start("Outer");
        {
            let mut bridge = ProgressBridge::begin(&mut rec, "Inner");
            bridge.set_value(1.0);
        }
        // only the outer scope's start; no extra end
        assert_eq!(rec.starts, 1);
        assert_eq!(rec.ends, 0);
        assert!(rec.active);
        assert_eq!(rec.messages, vec!["Outer".to_owned(), "Inner".to_owned()]);
    }

    #[test]
    fn test_scope_closed_on_early_drop() {
        let mut rec = Recorder::default();
        {
            let _bridge = ProgressBridge::begin(&mut rec, "Doomed");
            // dropped without reaching 1.0, as on failure
        }
        assert_eq!(rec.ends, 1);
        assert!(!rec.active);
    }
}
