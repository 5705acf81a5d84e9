//! Audit of a run's final primal/dual pair against the certified bound.

use crate::metrics::curve::Checkpoint;
use crate::metrics::gap::gap;
use serde::Serialize;
use std::fmt;

pub const CONSISTENCY_TOLERANCE: f64 = 0.001;

/// Everything needed to explain why a run was reclassified as failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inconsistency {
    pub dataset: String,
    pub path: String,
    pub best_known_bound: Option<f64>,
    pub time: f64,
    pub primal: f64,
    pub dual: f64,
    pub primal_dual_gap: f64,
    pub dual_bound_gap: Option<f64>,
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: bkb {} time {} primal {} dual {} gap(primal, dual) {} gap(dual, bkb) {}",
            self.dataset,
            self.path,
            fmt_opt(self.best_known_bound),
            self.time,
            self.primal,
            self.dual,
            self.primal_dual_gap,
            fmt_opt(self.dual_bound_gap),
        )
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Require `gap(primal, dual) <= tol` and, with a reference, `gap(dual, bkb) <= tol`.
pub fn check_consistency(
    dataset: &str,
    path: &str,
    primal: Checkpoint,
    dual: Checkpoint,
    best_known_bound: Option<f64>,
) -> Result<(), Inconsistency> {
    let primal_dual_gap = gap(primal.value, dual.value);
    let dual_bound_gap = best_known_bound.map(|bkb| gap(dual.value, bkb));

    let within = |g: f64| g <= CONSISTENCY_TOLERANCE;
    if within(primal_dual_gap) && dual_bound_gap.is_none_or(within) {
        return Ok(());
    }

    Err(Inconsistency {
        dataset: dataset.to_string(),
        path: path.to_string(),
        best_known_bound,
        time: primal.time,
        primal: primal.value,
        dual: dual.value,
        primal_dual_gap,
        dual_bound_gap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disagreement_with_reference_bound_fails() {
        let p = Checkpoint::new(5.0, 12.0);
        let err = check_consistency("d", "p", p, p, Some(6.0)).unwrap_err();
        assert_eq!(err.primal_dual_gap, 0.0);
        let g = err.dual_bound_gap.unwrap();
        assert!((g - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(err.time, 12.0);
    }

    #[test]
    fn agreement_within_tolerance_passes() {
        let p = Checkpoint::new(1000.0, 3.0);
        let d = Checkpoint::new(999.5, 3.0);
        assert!(check_consistency("d", "p", p, d, Some(1000.0)).is_ok());
    }

    #[test]
    fn open_primal_dual_gap_fails_without_reference() {
        let p = Checkpoint::new(110.0, 3.0);
        let d = Checkpoint::new(100.0, 3.0);
        let err = check_consistency("d", "p", p, d, None).unwrap_err();
        assert_eq!(err.dual_bound_gap, None);
        assert!(err.to_string().contains("bkb -"));
    }
}
