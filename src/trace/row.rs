use crate::metrics::Checkpoint;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStatus {
    Ok,
    /// No trace file for this (instance, label).
    Missing,
    /// Present but unusable; fatal for the batch.
    Malformed,
}

/// Parsed trace for one (instance, label). Values are in minimization
/// orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunTrace {
    pub status: TraceStatus,
    pub primal: Vec<Checkpoint>,
    pub dual: Vec<Checkpoint>,
    /// Opaque `Algorithm` object, passed through to summary rows.
    pub algorithm: Map<String, Value>,
    /// Reason attached to `Missing` or `Malformed`.
    pub reason: Option<String>,
}

impl RunTrace {
    pub fn ok(primal: Vec<Checkpoint>, dual: Vec<Checkpoint>) -> Self {
        Self {
            status: TraceStatus::Ok,
            primal,
            dual,
            algorithm: Map::new(),
            reason: None,
        }
    }

    pub fn missing(reason: impl Into<String>) -> Self {
        Self {
            status: TraceStatus::Missing,
            primal: Vec::new(),
            dual: Vec::new(),
            algorithm: Map::new(),
            reason: Some(reason.into()),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            status: TraceStatus::Malformed,
            reason: Some(reason.into()),
            ..Self::missing("")
        }
    }

    pub fn with_algorithm(mut self, algorithm: Map<String, Value>) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn final_primal(&self) -> Option<Checkpoint> {
        self.primal.last().copied()
    }

    pub fn final_dual(&self) -> Option<Checkpoint> {
        self.dual.last().copied()
    }
}
