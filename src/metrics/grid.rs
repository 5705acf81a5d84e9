use crate::error::BenchError;
use serde::Serialize;

pub const DEFAULT_RESOLUTION: usize = 1000;

/// Fixed discretization of `[0, time_limit]` into `resolution + 1` samples.
///
/// Sample `i` is the right-continuous state at `i / resolution * time_limit`.
/// The gap profile reuses the same type with `time_limit = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeGrid {
    time_limit: f64,
    resolution: usize,
}

impl TimeGrid {
    pub fn new(time_limit: f64, resolution: usize) -> Result<Self, BenchError> {
        if !time_limit.is_finite() || time_limit <= 0.0 {
            return Err(BenchError::InvalidGrid(format!(
                "time limit must be positive and finite, got {}",
                time_limit
            )));
        }
        if resolution == 0 {
            return Err(BenchError::InvalidGrid("resolution must be at least 1".into()));
        }
        Ok(Self {
            time_limit,
            resolution,
        })
    }

    /// Unit axis used for "instances with gap <= g" profiles.
    pub fn unit(resolution: usize) -> Result<Self, BenchError> {
        Self::new(1.0, resolution)
    }

    pub fn time_limit(&self) -> f64 {
        self.time_limit
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Number of samples (`resolution + 1`).
    pub fn len(&self) -> usize {
        self.resolution + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn time_at(&self, index: usize) -> f64 {
        index.min(self.resolution) as f64 / self.resolution as f64 * self.time_limit
    }

    pub fn times(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.time_at(i)).collect()
    }

    /// First index whose sample time is `>= t`.
    pub fn index_at_or_after(&self, t: f64) -> usize {
        self.clamp(self.scaled(t).ceil())
    }

    /// Last index whose sample time is `<= t`.
    pub fn index_at_or_before(&self, t: f64) -> usize {
        self.clamp(self.scaled(t).floor())
    }

    fn scaled(&self, t: f64) -> f64 {
        self.resolution as f64 * t / self.time_limit
    }

    fn clamp(&self, x: f64) -> usize {
        if x.is_nan() || x <= 0.0 {
            0
        } else if x >= self.resolution as f64 {
            self.resolution
        } else {
            x as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_time_maps_to_middle_index() {
        let grid = TimeGrid::new(3600.0, 1000).unwrap();
        assert_eq!(grid.index_at_or_after(1800.0), 500);
        assert_eq!(grid.index_at_or_before(1800.0), 500);
        assert_eq!(grid.index_at_or_after(1800.5), 501);
        assert_eq!(grid.index_at_or_before(1800.5), 500);
    }

    #[test]
    fn indices_are_clamped() {
        let grid = TimeGrid::new(10.0, 100).unwrap();
        assert_eq!(grid.index_at_or_after(-1.0), 0);
        assert_eq!(grid.index_at_or_after(25.0), 100);
        assert_eq!(grid.index_at_or_before(f64::INFINITY), 100);
        assert_eq!(grid.index_at_or_after(f64::NAN), 0);
    }

    #[test]
    fn times_cover_the_closed_interval() {
        let grid = TimeGrid::new(3600.0, 1000).unwrap();
        let times = grid.times();
        assert_eq!(times.len(), 1001);
        assert_eq!(times[0], 0.0);
        assert_eq!(times[1000], 3600.0);
        assert_eq!(times[500], 1800.0);
    }

    #[test]
    fn rejects_degenerate_grids() {
        assert!(TimeGrid::new(0.0, 1000).is_err());
        assert!(TimeGrid::new(f64::NAN, 1000).is_err());
        assert!(TimeGrid::new(60.0, 0).is_err());
    }
}
