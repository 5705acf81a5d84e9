//! The fold: per-label accumulators threaded through the instance set.

use crate::diagnostics::{self, Diagnostic};
use crate::error::BenchError;
use crate::metrics::{Curve, TimeGrid};
use crate::model::evaluate::{InstanceOutcome, TrackCurves};
use crate::model::profile::{CountProfile, MeanProfile};
use crate::model::summary::{self, Row, SummaryBuilder, SummaryTable, column};
use crate::model::{EvalContext, Mode};
use serde::Serialize;
use serde_json::Value;

/// Finalized per-label statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelProfile {
    pub label: String,
    /// Instances solved (or feasible, or bounded) by each grid time.
    pub solved: Option<Vec<u64>>,
    /// Instances with gap `<= g` for each `g` on the unit axis.
    pub gap_profile: Option<Vec<u64>>,
    /// Mean gap across instances at each grid time.
    pub mean_gap_curve: Option<Curve>,
    pub mean_time: f64,
    /// Mean final gap as a fraction.
    pub mean_gap: Option<f64>,
    pub mean_average_gap: Option<f64>,
    pub solved_count: usize,
}

/// Per-instance curves kept for the long modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceCurves {
    pub dataset: String,
    pub path: String,
    /// Best known solution value in raw orientation, if any.
    pub best_known_solution: Option<f64>,
    pub labels: Vec<(String, Option<TrackCurves>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub mode: Mode,
    pub time_limit: f64,
    pub resolution: usize,
    pub instance_count: usize,
    pub labels: Vec<String>,
    pub times: Vec<f64>,
    pub gap_axis: Option<Vec<f64>>,
    pub profiles: Vec<LabelProfile>,
    pub summary: SummaryTable,
    pub instances: Vec<InstanceCurves>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BenchmarkReport {
    pub fn profile(&self, label: &str) -> Option<&LabelProfile> {
        self.profiles.iter().find(|p| p.label == label)
    }

    pub fn missing(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == diagnostics::DiagnosticKind::Missing)
    }
}

#[derive(Debug, Clone)]
struct LabelAccumulator {
    label: String,
    solved: CountProfile,
    gap_profile: CountProfile,
    mean_gap: MeanProfile,
    total_time: f64,
    total_gap: f64,
    total_average_gap: f64,
    solved_count: usize,
}

impl LabelAccumulator {
    fn new(label: &str, grid: &TimeGrid, gap_axis: &TimeGrid) -> Self {
        Self {
            label: label.to_string(),
            solved: CountProfile::new(grid.len()),
            gap_profile: CountProfile::new(gap_axis.len()),
            mean_gap: MeanProfile::new(grid.len()),
            total_time: 0.0,
            total_gap: 0.0,
            total_average_gap: 0.0,
            solved_count: 0,
        }
    }
}

/// Running state of one aggregation pass.
///
/// `instance_count` is fixed up front and is the denominator of every mean;
/// missing and failed runs occupy their slot at penalty values.
#[derive(Debug, Clone)]
pub struct Accumulator {
    ctx: EvalContext,
    instance_count: usize,
    folded: usize,
    labels: Vec<LabelAccumulator>,
    summary: SummaryBuilder,
    instances: Vec<InstanceCurves>,
    diagnostics: Vec<Diagnostic>,
}

impl Accumulator {
    pub fn new(ctx: &EvalContext, labels: &[String], instance_count: usize) -> Result<Self, BenchError> {
        if instance_count == 0 {
            return Err(BenchError::EmptyInstanceSet);
        }
        Ok(Self {
            ctx: *ctx,
            instance_count,
            folded: 0,
            labels: labels
                .iter()
                .map(|l| LabelAccumulator::new(l, &ctx.grid, &ctx.gap_axis))
                .collect(),
            summary: SummaryBuilder::new(ctx.mode, labels),
            instances: Vec::new(),
            diagnostics: Vec::new(),
        })
    }

    /// Fold one instance in. Must be called in instance order.
    ///
    /// The outcome must carry one entry per label, in the order given to
    /// `new`; anything else is rejected before any total is touched.
    pub fn fold(mut self, instance: InstanceOutcome) -> Result<Self, BenchError> {
        let found: Vec<&str> = instance.labels.iter().map(|o| o.label.as_str()).collect();
        let expected: Vec<&str> = self.labels.iter().map(|a| a.label.as_str()).collect();
        if found != expected {
            return Err(BenchError::LabelMismatch {
                instance: instance.row.id(),
                expected: expected.into_iter().map(str::to_string).collect(),
                found: found.into_iter().map(str::to_string).collect(),
            });
        }

        diagnostics::info(instance.row.id());
        let mode = self.ctx.mode;
        let all_ones = Curve::filled(self.ctx.grid.len(), 1.0);

        for (acc, outcome) in self.labels.iter_mut().zip(&instance.labels) {
            for d in &outcome.diagnostics {
                d.log();
            }

            acc.total_time += outcome.contribution.time;
            acc.total_gap += outcome.contribution.gap;
            acc.total_average_gap += outcome.contribution.average_gap;
            if outcome.outcome == crate::model::RunOutcome::Solved {
                acc.solved_count += 1;
            }

            if let Some(curve) = &outcome.solved {
                acc.solved.add_indicator(curve);
            }
            if let Some(curve) = &outcome.gap_profile {
                acc.gap_profile.add_indicator(curve);
            }
            if mode.is_long() {
                let gaps = outcome.tracks.as_ref().map(|t| &t.gap).unwrap_or(&all_ones);
                acc.mean_gap.add(gaps);
            }
        }

        self.summary.push(&instance);
        for outcome in &instance.labels {
            self.diagnostics.extend(outcome.diagnostics.iter().cloned());
        }
        if mode.is_long() {
            let sense = instance.row.sense;
            self.instances.push(InstanceCurves {
                dataset: instance.row.dataset.clone(),
                path: instance.row.path.clone(),
                best_known_solution: instance.row.best_known_solution.map(|v| sense.restore(v)),
                labels: instance
                    .labels
                    .into_iter()
                    .map(|o| (o.label, o.tracks))
                    .collect(),
            });
        }
        self.folded += 1;
        Ok(self)
    }

    /// Divide once and assemble the report.
    pub fn finish(self) -> Result<BenchmarkReport, BenchError> {
        if self.folded != self.instance_count {
            return Err(BenchError::InstanceCountMismatch {
                expected: self.instance_count,
                folded: self.folded,
            });
        }
        let mode = self.ctx.mode;
        let n = self.instance_count as f64;

        let mut aggregate = Row::new();
        let mut profiles = Vec::with_capacity(self.labels.len());
        for acc in self.labels {
            let mean_time = acc.total_time / n;
            let mean_gap = mode.has_gap().then(|| acc.total_gap / n);
            let mean_average_gap = mode.is_long().then(|| acc.total_average_gap / n);

            aggregate.insert(column(&acc.label, summary::TIME), Value::from(mean_time));
            if let Some(g) = mean_gap {
                aggregate.insert(column(&acc.label, summary::GAP), Value::from(100.0 * g));
            }
            if let Some(g) = mean_average_gap {
                aggregate.insert(column(&acc.label, summary::AVERAGE_GAP), Value::from(g));
            }

            profiles.push(LabelProfile {
                solved: (!mode.is_long()).then(|| acc.solved.into_counts()),
                gap_profile: matches!(mode, Mode::HeuristicShort | Mode::Bound)
                    .then(|| acc.gap_profile.into_counts()),
                mean_gap_curve: mode.is_long().then(|| acc.mean_gap.finalize()),
                label: acc.label,
                mean_time,
                mean_gap,
                mean_average_gap,
                solved_count: acc.solved_count,
            });
        }

        Ok(BenchmarkReport {
            mode,
            time_limit: self.ctx.grid.time_limit(),
            resolution: self.ctx.grid.resolution(),
            instance_count: self.instance_count,
            labels: profiles.iter().map(|p| p.label.clone()).collect(),
            times: self.ctx.grid.times(),
            gap_axis: mode.has_gap().then(|| self.ctx.gap_axis.times()),
            profiles,
            summary: self.summary.finish(aggregate),
            instances: self.instances,
            diagnostics: self.diagnostics,
        })
    }
}
