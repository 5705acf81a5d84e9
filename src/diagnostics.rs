//! Shared message formatting and log helpers.
//!
//! Every user-facing error goes through `error_message` so the binary prints a
//! uniform prefix; warnings go through `log::warn!` so `RUST_LOG` can silence
//! them.

use serde::Serialize;
use std::fmt;

const PREFIX: &str = "optbench";

pub fn error_message(msg: impl fmt::Display) -> String {
    format!("{}: {}", PREFIX, msg)
}

pub fn warn(msg: impl fmt::Display) {
    log::warn!("{}", msg);
}

pub fn info(msg: impl fmt::Display) {
    log::info!("{}", msg);
}

/// Category of a per-run diagnostic kept for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Trace file absent or a key required by the mode absent.
    Missing,
    /// Reported primal/dual/reference disagree beyond tolerance.
    Inconsistent,
    /// Result reported after the time limit.
    TimeLimitExceeded,
    /// Reference row lacks the value the mode compares against.
    NoReference,
    /// Output present in the candidate set but not in the reference set.
    ExtraFile,
    /// Field disagreement in an output comparison.
    FieldMismatch,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::Missing => "missing",
            DiagnosticKind::Inconsistent => "inconsistent",
            DiagnosticKind::TimeLimitExceeded => "time limit exceeded",
            DiagnosticKind::NoReference => "no reference",
            DiagnosticKind::ExtraFile => "extra file",
            DiagnosticKind::FieldMismatch => "field mismatch",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub dataset: String,
    pub path: String,
    pub label: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        dataset: &str,
        path: &str,
        label: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            dataset: dataset.to_string(),
            path: path.to_string(),
            label: label.to_string(),
            message: message.into(),
        }
    }

    /// Emit at warn level.
    pub fn log(&self) {
        warn(self);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} on {}/{}: {}",
            self.kind, self.label, self.dataset, self.path, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let d = Diagnostic::new(DiagnosticKind::Missing, "knapsack", "a/b.txt", "greedy", "no file");
        assert_eq!(d.to_string(), "[missing] greedy on knapsack/a/b.txt: no file");
    }

    #[test]
    fn error_message_is_prefixed() {
        assert_eq!(error_message("boom"), "optbench: boom");
    }
}
