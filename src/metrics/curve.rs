//! Step curves sampled on a `TimeGrid`.

use crate::metrics::gap::gap;
use crate::metrics::grid::TimeGrid;
use serde::{Deserialize, Serialize};

/// One observation of an incumbent solution or bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub value: f64,
    pub time: f64,
}

impl Checkpoint {
    pub fn new(value: f64, time: f64) -> Self {
        Self { value, time }
    }
}

/// `resolution + 1` samples; `None` means no value yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Curve(Vec<Option<f64>>);

/// Whether a zero gap latches for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapClosure {
    Open,
    /// Certified optimality is absorbing: from the first zero-gap index on,
    /// primal, dual and gap are all held at 0.
    Absorbing,
}

impl Curve {
    pub fn undefined(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub fn filled(len: usize, value: f64) -> Self {
        Self(vec![Some(value); len])
    }

    pub fn from_samples(samples: Vec<Option<f64>>) -> Self {
        Self(samples)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    pub fn samples(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn last(&self) -> Option<f64> {
        self.0.last().copied().flatten()
    }

    /// Mean over all samples, undefined samples counted as `undefined_as`.
    pub fn mean(&self, undefined_as: f64) -> f64 {
        if self.0.is_empty() {
            return undefined_as;
        }
        let sum: f64 = self.0.iter().map(|s| s.unwrap_or(undefined_as)).sum();
        sum / self.0.len() as f64
    }

    /// Apply `f` to every defined sample.
    pub fn map_defined(&self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.iter().map(|s| s.map(&f)).collect())
    }

    fn fill(&mut self, from: usize, to: usize, value: f64) {
        if from > to {
            return;
        }
        for sample in &mut self.0[from..=to] {
            *sample = Some(value);
        }
    }
}

/// 0 before the solve index, 1 from `index_at_or_after(t)` through the end.
/// `None` (never solved, or failed verification) gives an all-zero curve.
pub fn solved_curve(grid: &TimeGrid, solve_time: Option<f64>) -> Curve {
    let mut curve = Curve::filled(grid.len(), 0.0);
    if let Some(t) = solve_time.filter(|t| *t <= grid.time_limit()) {
        curve.fill(grid.index_at_or_after(t), grid.resolution(), 1.0);
    }
    curve
}

/// Indicator on the unit gap axis: 1 for every `g >= gap`.
pub fn gap_profile_curve(gap_axis: &TimeGrid, gap: Option<f64>) -> Curve {
    solved_curve(gap_axis, gap)
}

/// Right-continuous step curve through an ordered checkpoint track.
///
/// Checkpoint `k` holds over `[index_at_or_after(t_k), index_at_or_before(t_{k+1})]`
/// and the last one holds through the end of the grid. Checkpoints after the
/// time limit are never reached.
pub fn value_curve(grid: &TimeGrid, checkpoints: &[Checkpoint]) -> Curve {
    let mut curve = Curve::undefined(grid.len());
    let in_limit: Vec<&Checkpoint> = checkpoints
        .iter()
        .filter(|c| c.time <= grid.time_limit())
        .collect();

    for (k, checkpoint) in in_limit.iter().enumerate() {
        let from = grid.index_at_or_after(checkpoint.time);
        let to = match in_limit.get(k + 1) {
            Some(next) => grid.index_at_or_before(next.time),
            None => grid.resolution(),
        };
        curve.fill(from, to, checkpoint.value);
    }
    curve
}

/// Reference value drawn as a flat track; `None` stays undefined.
pub fn constant_curve(grid: &TimeGrid, value: Option<f64>) -> Curve {
    match value {
        Some(v) => Curve::filled(grid.len(), v),
        None => Curve::undefined(grid.len()),
    }
}

/// Pointwise gap between two tracks; an undefined side counts as gap 1.
///
/// With `GapClosure::Absorbing`, `primal` and `dual` are rewritten in place
/// to 0 from the first index whose gap is exactly 0.
pub fn gap_over_time(primal: &mut Curve, dual: &mut Curve, closure: GapClosure) -> Curve {
    let len = primal.len().min(dual.len());
    let mut samples = Vec::with_capacity(len);
    let mut closed = false;

    for i in 0..len {
        if closed {
            primal.0[i] = Some(0.0);
            dual.0[i] = Some(0.0);
            samples.push(Some(0.0));
            continue;
        }
        let g = match (primal.0[i], dual.0[i]) {
            (Some(p), Some(d)) => gap(p, d),
            _ => 1.0,
        };
        samples.push(Some(g));
        if closure == GapClosure::Absorbing && g == 0.0 {
            closed = true;
            primal.0[i] = Some(0.0);
            dual.0[i] = Some(0.0);
        }
    }
    Curve(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TimeGrid {
        TimeGrid::new(10.0, 10).unwrap()
    }

    #[test]
    fn solved_curve_steps_at_ceil_index() {
        let grid = TimeGrid::new(3600.0, 1000).unwrap();
        let curve = solved_curve(&grid, Some(1800.0));
        assert_eq!(curve.len(), 1001);
        assert!((0..500).all(|i| curve.get(i) == Some(0.0)));
        assert!((500..=1000).all(|i| curve.get(i) == Some(1.0)));
    }

    #[test]
    fn unsolved_curve_is_all_zero() {
        let curve = solved_curve(&grid(), None);
        assert!(curve.samples().iter().all(|s| *s == Some(0.0)));
        let late = solved_curve(&grid(), Some(10.5));
        assert!(late.samples().iter().all(|s| *s == Some(0.0)));
    }

    #[test]
    fn value_curve_is_undefined_before_first_checkpoint() {
        let track = [Checkpoint::new(9.0, 2.5), Checkpoint::new(7.0, 6.0)];
        let curve = value_curve(&grid(), &track);
        assert_eq!(curve.get(0), None);
        assert_eq!(curve.get(2), None);
        assert_eq!(curve.get(3), Some(9.0));
        assert_eq!(curve.get(5), Some(9.0));
        assert_eq!(curve.get(6), Some(7.0));
        assert_eq!(curve.get(10), Some(7.0));
    }

    #[test]
    fn value_curve_ignores_checkpoints_past_limit() {
        let track = [Checkpoint::new(4.0, 1.0), Checkpoint::new(2.0, 11.0)];
        let curve = value_curve(&grid(), &track);
        assert_eq!(curve.last(), Some(4.0));
    }

    #[test]
    fn checkpoints_in_one_cell_keep_the_latest() {
        let track = [Checkpoint::new(5.0, 1.2), Checkpoint::new(4.0, 1.5)];
        let curve = value_curve(&grid(), &track);
        assert_eq!(curve.get(1), None);
        assert_eq!(curve.get(2), Some(4.0));
    }

    #[test]
    fn undefined_side_counts_as_full_gap() {
        let mut primal = value_curve(&grid(), &[Checkpoint::new(11.0, 5.0)]);
        let mut dual = constant_curve(&grid(), Some(10.0));
        let g = gap_over_time(&mut primal, &mut dual, GapClosure::Open);
        assert_eq!(g.get(4), Some(1.0));
        assert!((g.get(5).unwrap() - 1.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn absorbing_closure_holds_zero() {
        let mut primal = value_curve(
            &grid(),
            &[Checkpoint::new(12.0, 0.0), Checkpoint::new(10.0, 4.0), Checkpoint::new(10.5, 7.0)],
        );
        let mut dual = value_curve(&grid(), &[Checkpoint::new(8.0, 0.0), Checkpoint::new(10.0, 4.0)]);
        let g = gap_over_time(&mut primal, &mut dual, GapClosure::Absorbing);
        assert!(g.get(3).unwrap() > 0.0);
        assert!((4..=10).all(|i| g.get(i) == Some(0.0)));
        assert_eq!(primal.get(8), Some(0.0));
        assert_eq!(dual.get(8), Some(0.0));
    }

    #[test]
    fn open_closure_lets_gap_reopen() {
        let mut primal = value_curve(
            &grid(),
            &[Checkpoint::new(10.0, 0.0), Checkpoint::new(10.5, 7.0)],
        );
        let mut dual = constant_curve(&grid(), Some(10.0));
        let g = gap_over_time(&mut primal, &mut dual, GapClosure::Open);
        assert_eq!(g.get(6), Some(0.0));
        assert!(g.get(7).unwrap() > 0.0);
        assert_eq!(primal.get(7), Some(10.5));
    }

    #[test]
    fn mean_counts_undefined_samples() {
        let curve = Curve::from_samples(vec![Some(0.0), None, Some(0.5), Some(0.5)]);
        assert_eq!(curve.mean(1.0), 0.5);
    }
}
