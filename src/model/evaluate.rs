//! Per-instance evaluation: one trace per label into curves and scalars.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::BenchError;
use crate::metrics::curve::{constant_curve, gap_over_time, gap_profile_curve, solved_curve, value_curve};
use crate::metrics::{Checkpoint, Curve, check_consistency, gap};
use crate::model::{EvalContext, Mode};
use crate::reference::ReferenceRow;
use crate::trace::{RunTrace, TraceStatus};

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Solved,
    Failed,
    Missing,
}

/// Values shown in the per-instance summary row (raw objective orientation).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Scalars {
    pub value: Option<f64>,
    pub time: Option<f64>,
    pub gap: Option<f64>,
    pub average_gap: Option<f64>,
}

/// What this run adds to the per-label totals; failures carry penalties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contribution {
    pub time: f64,
    pub gap: f64,
    pub average_gap: f64,
}

impl Contribution {
    pub fn penalty(time_limit: f64) -> Self {
        Self {
            time: time_limit,
            gap: 1.0,
            average_gap: 1.0,
        }
    }
}

/// Per-instance tracks for the long modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackCurves {
    pub primal: Curve,
    pub dual: Curve,
    pub gap: Curve,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelOutcome {
    pub label: String,
    pub outcome: RunOutcome,
    pub scalars: Scalars,
    pub contribution: Contribution,
    /// Solved-by-time indicator (count modes), all zero on failure.
    pub solved: Option<Curve>,
    /// Gap-profile indicator (short gap modes).
    pub gap_profile: Option<Curve>,
    /// Long modes only; `None` for a missing run.
    pub tracks: Option<TrackCurves>,
    pub algorithm: Map<String, Value>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOutcome {
    /// Position in the filtered instance set.
    pub index: usize,
    pub row: ReferenceRow,
    pub labels: Vec<LabelOutcome>,
}

/// Evaluate one instance. `traces` holds one trace per label, in label order.
///
/// A malformed trace aborts the batch; everything else (missing traces,
/// failed verification, late results) is folded in as a failed run.
pub fn evaluate_instance(
    ctx: &EvalContext,
    index: usize,
    row: &ReferenceRow,
    traces: &[(String, RunTrace)],
) -> Result<InstanceOutcome, BenchError> {
    let labels = traces
        .iter()
        .map(|(label, trace)| evaluate_label(ctx, row, label, trace))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InstanceOutcome {
        index,
        row: row.clone(),
        labels,
    })
}

fn evaluate_label(
    ctx: &EvalContext,
    row: &ReferenceRow,
    label: &str,
    trace: &RunTrace,
) -> Result<LabelOutcome, BenchError> {
    let eval = LabelEval::new(ctx, row, label, trace);
    match trace.status {
        TraceStatus::Malformed => {
            return Err(BenchError::MalformedTrace {
                dataset: row.dataset.clone(),
                path: row.path.clone(),
                label: label.to_string(),
                reason: trace.reason.clone().unwrap_or_default(),
            });
        }
        TraceStatus::Missing => {
            let reason = trace.reason.clone().unwrap_or_else(|| "no trace".to_string());
            return Ok(eval.missing(reason));
        }
        TraceStatus::Ok => {}
    }

    Ok(match ctx.mode {
        Mode::Exact => eval.exact(),
        Mode::HeuristicShort => eval.short(trace.final_primal(), "Solution", row.best_known_solution),
        Mode::Bound => eval.short(trace.final_dual(), "Bound", row.best_known_bound),
        Mode::HeuristicLong | Mode::PrimalDual => eval.long(),
    })
}

struct LabelEval<'a> {
    ctx: &'a EvalContext,
    row: &'a ReferenceRow,
    label: &'a str,
    trace: &'a RunTrace,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> LabelEval<'a> {
    fn new(ctx: &'a EvalContext, row: &'a ReferenceRow, label: &'a str, trace: &'a RunTrace) -> Self {
        Self {
            ctx,
            row,
            label,
            trace,
            diagnostics: Vec::new(),
        }
    }

    fn diagnose(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(
            kind,
            &self.row.dataset,
            &self.row.path,
            self.label,
            message,
        ));
    }

    fn time_limit(&self) -> f64 {
        self.ctx.time_limit()
    }

    fn restore(&self, value: f64) -> f64 {
        self.row.sense.restore(value)
    }

    /// Curves a failed or missing run contributes in count modes.
    fn zero_indicators(&self) -> (Option<Curve>, Option<Curve>) {
        match self.ctx.mode {
            Mode::Exact => (Some(solved_curve(&self.ctx.grid, None)), None),
            Mode::HeuristicShort | Mode::Bound => (
                Some(solved_curve(&self.ctx.grid, None)),
                Some(gap_profile_curve(&self.ctx.gap_axis, None)),
            ),
            Mode::HeuristicLong | Mode::PrimalDual => (None, None),
        }
    }

    fn finish(
        self,
        outcome: RunOutcome,
        scalars: Scalars,
        contribution: Contribution,
        solved: Option<Curve>,
        gap_profile: Option<Curve>,
        tracks: Option<TrackCurves>,
    ) -> LabelOutcome {
        LabelOutcome {
            label: self.label.to_string(),
            outcome,
            scalars,
            contribution,
            solved,
            gap_profile,
            tracks,
            algorithm: self.trace.algorithm.clone(),
            diagnostics: self.diagnostics,
        }
    }

    fn missing(mut self, reason: String) -> LabelOutcome {
        self.diagnose(DiagnosticKind::Missing, reason);
        let (solved, gap_profile) = self.zero_indicators();
        let penalty = Contribution::penalty(self.time_limit());
        self.finish(
            RunOutcome::Missing,
            Scalars::default(),
            penalty,
            solved,
            gap_profile,
            None,
        )
    }

    fn failed(self) -> LabelOutcome {
        let (solved, gap_profile) = self.zero_indicators();
        let penalty = Contribution::penalty(self.time_limit());
        self.finish(RunOutcome::Failed, Scalars::default(), penalty, solved, gap_profile, None)
    }

    fn exact(mut self) -> LabelOutcome {
        let (Some(primal), Some(dual)) = (self.trace.final_primal(), self.trace.final_dual()) else {
            let reason = if self.trace.primal.is_empty() {
                "no 'Solution' in trace"
            } else {
                "no 'Bound' in trace"
            };
            return self.missing(reason.to_string());
        };

        if primal.time > self.time_limit() {
            self.diagnose(
                DiagnosticKind::TimeLimitExceeded,
                format!("solved at {} > {}", primal.time, self.time_limit()),
            );
            return self.failed();
        }

        if self.ctx.mode.verifies_consistency() {
            if let Err(inconsistency) = check_consistency(
                &self.row.dataset,
                &self.row.path,
                primal,
                dual,
                self.row.best_known_bound,
            ) {
                self.diagnose(DiagnosticKind::Inconsistent, inconsistency.to_string());
                return self.failed();
            }
        }

        let scalars = Scalars {
            value: Some(self.restore(primal.value)),
            time: Some(primal.time),
            ..Scalars::default()
        };
        let contribution = Contribution {
            time: primal.time,
            gap: 0.0,
            average_gap: 0.0,
        };
        let solved = solved_curve(&self.ctx.grid, Some(primal.time));
        self.finish(RunOutcome::Solved, scalars, contribution, Some(solved), None, None)
    }

    /// Single final checkpoint compared with a reference value.
    fn short(mut self, last: Option<Checkpoint>, key: &str, reference: Option<f64>) -> LabelOutcome {
        let Some(last) = last else {
            return self.missing(format!("no '{}' in trace", key));
        };
        if last.time > self.time_limit() {
            self.diagnose(
                DiagnosticKind::TimeLimitExceeded,
                format!("'{}' reported at {} > {}", key, last.time, self.time_limit()),
            );
            return self.failed();
        }
        let Some(reference) = reference else {
            self.diagnose(DiagnosticKind::NoReference, format!("no reference value for '{}'", key));
            return self.failed();
        };

        let g = gap(last.value, reference);
        let scalars = Scalars {
            value: Some(self.restore(last.value)),
            time: Some(last.time),
            gap: Some(g),
            average_gap: None,
        };
        let contribution = Contribution {
            time: last.time,
            gap: g,
            average_gap: g,
        };
        let solved = solved_curve(&self.ctx.grid, Some(last.time));
        let profile = gap_profile_curve(&self.ctx.gap_axis, Some(g));
        self.finish(RunOutcome::Solved, scalars, contribution, Some(solved), Some(profile), None)
    }

    fn long(mut self) -> LabelOutcome {
        if self.trace.primal.is_empty() {
            return self.missing("no 'Solution' revisions in trace".to_string());
        }
        let grid = self.ctx.grid;

        let mut primal = value_curve(&grid, &self.trace.primal);
        let mut dual = match self.ctx.mode {
            Mode::PrimalDual => {
                if self.trace.dual.is_empty() {
                    return self.missing("no 'Bound' revisions in trace".to_string());
                }
                value_curve(&grid, &self.trace.dual)
            }
            _ => {
                if self.row.best_known_solution.is_none() {
                    self.diagnose(DiagnosticKind::NoReference, "no best known solution value");
                }
                constant_curve(&grid, self.row.best_known_solution)
            }
        };
        let gaps = gap_over_time(&mut primal, &mut dual, self.ctx.mode.gap_closure());

        let last = self
            .trace
            .primal
            .iter()
            .rfind(|c| c.time <= grid.time_limit())
            .copied();
        let final_gap = gaps.last().unwrap_or(1.0);
        let average_gap = gaps.mean(1.0);

        let (outcome, contribution) = match last {
            Some(c) => (
                RunOutcome::Solved,
                Contribution {
                    time: c.time,
                    gap: final_gap,
                    average_gap,
                },
            ),
            None => {
                self.diagnose(
                    DiagnosticKind::TimeLimitExceeded,
                    format!("no solution within {}", grid.time_limit()),
                );
                (RunOutcome::Failed, Contribution::penalty(grid.time_limit()))
            }
        };
        let scalars = Scalars {
            value: last.map(|c| self.restore(c.value)),
            time: last.map(|c| c.time),
            gap: Some(final_gap),
            average_gap: Some(average_gap),
        };

        let sense = self.row.sense;
        let tracks = TrackCurves {
            primal: primal.map_defined(|v| sense.restore(v)),
            dual: dual.map_defined(|v| sense.restore(v)),
            gap: gaps,
        };
        self.finish(outcome, scalars, contribution, None, None, Some(tracks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{BEST_KNOWN_BOUND, BEST_KNOWN_SOLUTION, DATASET, OBJECTIVE_SENSE, PATH};

    fn row(bks: &str, bkb: &str, sense: &str) -> ReferenceRow {
        ReferenceRow::from_fields(vec![
            (DATASET.to_string(), "set".to_string()),
            (PATH.to_string(), "inst".to_string()),
            (BEST_KNOWN_SOLUTION.to_string(), bks.to_string()),
            (BEST_KNOWN_BOUND.to_string(), bkb.to_string()),
            (OBJECTIVE_SENSE.to_string(), sense.to_string()),
        ])
        .unwrap()
    }

    fn one(ctx: &EvalContext, row: &ReferenceRow, trace: RunTrace) -> LabelOutcome {
        evaluate_instance(ctx, 0, row, &[("algo".to_string(), trace)])
            .unwrap()
            .labels
            .remove(0)
    }

    #[test]
    fn exact_run_solved_at_half_time() {
        let ctx = EvalContext::new(Mode::Exact, 3600.0, 1000).unwrap();
        let trace = RunTrace::ok(vec![Checkpoint::new(6.0, 1800.0)], vec![Checkpoint::new(6.0, 1800.0)]);
        let out = one(&ctx, &row("6", "6", "min"), trace);
        assert_eq!(out.outcome, RunOutcome::Solved);
        assert_eq!(out.contribution.time, 1800.0);
        let solved = out.solved.unwrap();
        assert_eq!(solved.get(499), Some(0.0));
        assert_eq!(solved.get(500), Some(1.0));
    }

    #[test]
    fn exact_run_disagreeing_with_bound_fails() {
        let ctx = EvalContext::new(Mode::Exact, 3600.0, 1000).unwrap();
        let trace = RunTrace::ok(vec![Checkpoint::new(5.0, 10.0)], vec![Checkpoint::new(5.0, 10.0)]);
        let out = one(&ctx, &row("6", "6", "min"), trace);
        assert_eq!(out.outcome, RunOutcome::Failed);
        assert_eq!(out.contribution.time, 3600.0);
        assert!(out.solved.unwrap().samples().iter().all(|s| *s == Some(0.0)));
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::Inconsistent);
        assert_eq!(out.scalars, Scalars::default());
    }

    #[test]
    fn missing_trace_is_penalized() {
        let ctx = EvalContext::new(Mode::HeuristicShort, 60.0, 100).unwrap();
        let out = one(&ctx, &row("10", "", "min"), RunTrace::missing("no output file"));
        assert_eq!(out.outcome, RunOutcome::Missing);
        assert_eq!(out.contribution, Contribution::penalty(60.0));
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::Missing);
        assert!(out.gap_profile.unwrap().samples().iter().all(|s| *s == Some(0.0)));
    }

    #[test]
    fn exact_run_without_bound_key_is_missing() {
        let ctx = EvalContext::new(Mode::Exact, 120.0, 100).unwrap();
        let record = serde_json::json!({ "Solution": { "Value": 6, "Time": 30 } });
        let trace = crate::trace::parse_trace(&record, crate::reference::Sense::Min);
        assert_eq!(trace.status, TraceStatus::Ok);

        let out = one(&ctx, &row("6", "6", "min"), trace);
        assert_eq!(out.outcome, RunOutcome::Missing);
        assert_eq!(out.contribution, Contribution::penalty(120.0));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::Missing);
        assert!(out.diagnostics[0].message.contains("'Bound'"));
        assert!(out.solved.unwrap().samples().iter().all(|s| *s == Some(0.0)));
    }

    #[test]
    fn short_run_without_solution_key_is_missing() {
        let ctx = EvalContext::new(Mode::HeuristicShort, 60.0, 100).unwrap();
        let record = serde_json::json!({
            "Algorithm": { "Name": "greedy" },
            "Bound": { "Value": 4, "Time": 2 }
        });
        let trace = crate::trace::parse_trace(&record, crate::reference::Sense::Min);

        let out = one(&ctx, &row("10", "4", "min"), trace);
        assert_eq!(out.outcome, RunOutcome::Missing);
        assert_eq!(out.contribution, Contribution::penalty(60.0));
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::Missing);
        assert!(out.diagnostics[0].message.contains("'Solution'"));
        assert_eq!(out.scalars, Scalars::default());
        assert!(out.gap_profile.unwrap().samples().iter().all(|s| *s == Some(0.0)));
    }

    #[test]
    fn malformed_trace_is_fatal() {
        let ctx = EvalContext::new(Mode::Exact, 60.0, 100).unwrap();
        let res = evaluate_instance(
            &ctx,
            0,
            &row("1", "1", "min"),
            &[("algo".to_string(), RunTrace::malformed("bad"))],
        );
        assert!(matches!(res, Err(BenchError::MalformedTrace { .. })));
    }

    #[test]
    fn short_mode_reports_gap_in_raw_orientation() {
        let ctx = EvalContext::new(Mode::HeuristicShort, 60.0, 1000).unwrap();
        // Maximization: raw 10 found, best known 11.
        let trace = RunTrace::ok(vec![Checkpoint::new(-10.0, 6.0)], vec![]);
        let out = one(&ctx, &row("11", "", "max"), trace);
        assert_eq!(out.scalars.value, Some(10.0));
        let g = out.scalars.gap.unwrap();
        assert!((g - 1.0 / 11.0).abs() < 1e-12);
        let profile = out.gap_profile.unwrap();
        assert_eq!(profile.get(90), Some(0.0));
        assert_eq!(profile.get(91), Some(1.0));
    }

    #[test]
    fn short_mode_late_result_fails() {
        let ctx = EvalContext::new(Mode::Bound, 60.0, 100).unwrap();
        let trace = RunTrace::ok(vec![], vec![Checkpoint::new(9.0, 61.0)]);
        let out = one(&ctx, &row("", "9", "min"), trace);
        assert_eq!(out.outcome, RunOutcome::Failed);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::TimeLimitExceeded);
    }

    #[test]
    fn long_mode_tracks_gap_to_best_known() {
        let ctx = EvalContext::new(Mode::HeuristicLong, 10.0, 10).unwrap();
        let trace = RunTrace::ok(
            vec![Checkpoint::new(20.0, 2.0), Checkpoint::new(10.0, 5.0)],
            vec![],
        );
        let out = one(&ctx, &row("10", "", "min"), trace);
        let tracks = out.tracks.unwrap();
        assert_eq!(tracks.gap.get(1), Some(1.0));
        assert_eq!(tracks.gap.get(2), Some(0.5));
        assert_eq!(tracks.gap.get(5), Some(0.0));
        assert_eq!(out.scalars.gap, Some(0.0));
        assert_eq!(out.scalars.time, Some(5.0));
        // 2 undefined + 3 * 0.5 + 6 * 0 over 11 samples.
        let expected = (2.0 + 1.5) / 11.0;
        assert!((out.scalars.average_gap.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn primal_dual_mode_uses_the_bound_track() {
        let ctx = EvalContext::new(Mode::PrimalDual, 10.0, 10).unwrap();
        let trace = RunTrace::ok(
            vec![Checkpoint::new(12.0, 0.0), Checkpoint::new(10.0, 6.0)],
            vec![Checkpoint::new(6.0, 0.0), Checkpoint::new(10.0, 6.0)],
        );
        let out = one(&ctx, &row("", "", "min"), trace);
        let tracks = out.tracks.unwrap();
        assert_eq!(tracks.gap.get(0), Some(0.5));
        assert!((6..=10).all(|i| tracks.gap.get(i) == Some(0.0)));
        assert_eq!(tracks.dual.get(3), Some(6.0));
        assert_eq!(tracks.primal.get(7), Some(0.0));
    }
}
