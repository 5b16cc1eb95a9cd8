use parking_lot::Mutex;
use thiserror::Error;

use crate::attributes::SharedString;

/// Configuration-level problems surfaced during view compilation.
///
/// These are recoverable: the offending (reader, view) pairing is dropped
/// and compilation continues for every other pairing.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ViewError {
    /// Two registrations resolved to the same output name on one reader.
    #[error("duplicate view name registered: `{name}` on reader `{reader}`")]
    DuplicateName {
        /// The conflicting output name.
        name: SharedString,
        /// The reader whose namespace the conflict occurred in.
        reader: SharedString,
    },
}

/// Where the compiler reports recoverable configuration problems.
///
/// Compilation happens deep inside instrument creation and has no
/// caller-visible error return, so problems are reported through a sink
/// injected at compiler construction rather than through a global hook.
pub trait DiagnosticsSink: Send + Sync {
    /// Reports one configuration problem.
    fn report(&self, error: ViewError);
}

/// The default sink: logs each reported problem.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn report(&self, error: ViewError) {
        tracing::error!(error = %error, "view configuration error");
    }
}

/// A sink that retains every reported problem, for tests and debugging.
#[derive(Debug, Default)]
pub struct CapturingSink {
    errors: Mutex<Vec<ViewError>>,
}

impl CapturingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        CapturingSink::default()
    }

    /// Returns the reported errors, clearing the sink.
    pub fn drain(&self) -> Vec<ViewError> {
        std::mem::take(&mut *self.errors.lock())
    }
}

impl DiagnosticsSink for CapturingSink {
    fn report(&self, error: ViewError) {
        self.errors.lock().push(error);
    }
}
