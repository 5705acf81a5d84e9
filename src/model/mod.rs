//! Aggregation model: evaluate every (instance, label) trace into curves and
//! scalars, then fold them into per-label profiles and a summary table.
//!
//! Evaluation is pure and per instance; the fold is sequential and runs in
//! instance order so rows and diagnostics are reproducible.

pub mod accumulate;
pub mod batch;
pub mod evaluate;
pub mod profile;
pub mod summary;

pub use accumulate::{Accumulator, BenchmarkReport, InstanceCurves, LabelProfile};
pub use batch::{TraceSource, run_batch};
pub use evaluate::{Contribution, InstanceOutcome, LabelOutcome, RunOutcome, Scalars, TrackCurves, evaluate_instance};
pub use profile::{CountProfile, MeanProfile};
pub use summary::{SummaryBuilder, SummaryTable};

use crate::error::BenchError;
use crate::metrics::{DEFAULT_RESOLUTION, GapClosure, TimeGrid};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Benchmark flavour; decides which trace keys are required and which curves
/// and columns are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Time to proven optimality; solved-by-time counts.
    Exact,
    /// Final primal against the best-known solution.
    #[value(name = "heuristicshort")]
    HeuristicShort,
    /// Final bound against the best-known bound.
    Bound,
    /// Primal track against the best-known solution over time.
    #[value(name = "heuristiclong")]
    HeuristicLong,
    /// Primal track against dual track over time.
    #[value(name = "primaldual")]
    PrimalDual,
}

impl Mode {
    pub fn has_gap(self) -> bool {
        !matches!(self, Mode::Exact)
    }

    /// Modes producing curves over time per instance.
    pub fn is_long(self) -> bool {
        matches!(self, Mode::HeuristicLong | Mode::PrimalDual)
    }

    pub fn verifies_consistency(self) -> bool {
        matches!(self, Mode::Exact)
    }

    pub fn gap_closure(self) -> GapClosure {
        match self {
            Mode::PrimalDual => GapClosure::Absorbing,
            _ => GapClosure::Open,
        }
    }

    /// Per-label scalar columns, in output order.
    pub fn value_columns(self) -> &'static [&'static str] {
        match self {
            Mode::Exact => &[summary::VALUE, summary::TIME],
            Mode::HeuristicShort | Mode::Bound => &[summary::VALUE, summary::GAP, summary::TIME],
            Mode::HeuristicLong | Mode::PrimalDual => &[
                summary::VALUE,
                summary::GAP,
                summary::TIME,
                summary::AVERAGE_GAP,
            ],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Exact => "exact",
            Mode::HeuristicShort => "heuristicshort",
            Mode::Bound => "bound",
            Mode::HeuristicLong => "heuristiclong",
            Mode::PrimalDual => "primaldual",
        };
        f.write_str(s)
    }
}

/// Fixed parameters of one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalContext {
    pub mode: Mode,
    pub grid: TimeGrid,
    /// Unit axis for gap profiles, same resolution as `grid`.
    pub gap_axis: TimeGrid,
}

impl EvalContext {
    pub fn new(mode: Mode, time_limit: f64, resolution: usize) -> Result<Self, BenchError> {
        Ok(Self {
            mode,
            grid: TimeGrid::new(time_limit, resolution)?,
            gap_axis: TimeGrid::unit(resolution)?,
        })
    }

    pub fn with_default_resolution(mode: Mode, time_limit: f64) -> Result<Self, BenchError> {
        Self::new(mode, time_limit, DEFAULT_RESOLUTION)
    }

    pub fn time_limit(&self) -> f64 {
        self.grid.time_limit()
    }
}
