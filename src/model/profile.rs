//! Running per-label profiles over the instance set.

use crate::metrics::Curve;

/// Integer counts per grid index (sums of 0/1 indicator curves).
#[derive(Debug, Clone, PartialEq)]
pub struct CountProfile {
    counts: Vec<u64>,
}

impl CountProfile {
    pub fn new(len: usize) -> Self {
        Self {
            counts: vec![0; len],
        }
    }

    /// Add one indicator curve; any positive sample counts as 1.
    pub fn add_indicator(&mut self, curve: &Curve) {
        for (count, sample) in self.counts.iter_mut().zip(curve.samples()) {
            if matches!(sample, Some(v) if *v > 0.0) {
                *count += 1;
            }
        }
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn into_counts(self) -> Vec<u64> {
        self.counts
    }
}

/// `(sum, count)` per grid index. Division happens once, in `finalize`,
/// which consumes the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanProfile {
    sums: Vec<f64>,
    counts: Vec<u64>,
}

impl MeanProfile {
    pub fn new(len: usize) -> Self {
        Self {
            sums: vec![0.0; len],
            counts: vec![0; len],
        }
    }

    /// Fold one curve in; undefined samples do not contribute.
    pub fn add(&mut self, curve: &Curve) {
        for (i, sample) in curve.samples().iter().enumerate().take(self.sums.len()) {
            if let Some(v) = sample {
                self.sums[i] += v;
                self.counts[i] += 1;
            }
        }
    }

    pub fn finalize(self) -> Curve {
        Curve::from_samples(
            self.sums
                .into_iter()
                .zip(self.counts)
                .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_profile_sums_indicators() {
        let mut profile = CountProfile::new(3);
        profile.add_indicator(&Curve::from_samples(vec![Some(0.0), Some(1.0), Some(1.0)]));
        profile.add_indicator(&Curve::from_samples(vec![Some(0.0), Some(0.0), Some(1.0)]));
        assert_eq!(profile.counts(), &[0, 1, 2]);
    }

    #[test]
    fn mean_profile_divides_once_per_index() {
        let mut profile = MeanProfile::new(3);
        profile.add(&Curve::from_samples(vec![Some(1.0), Some(0.5), None]));
        profile.add(&Curve::from_samples(vec![Some(0.0), Some(0.25), None]));
        profile.add(&Curve::from_samples(vec![Some(0.5), Some(0.0), None]));
        let mean = profile.finalize();
        assert_eq!(mean.get(0), Some(0.5));
        assert_eq!(mean.get(1), Some(0.25));
        assert_eq!(mean.get(2), None);
    }
}
