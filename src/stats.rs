//! Online summary statistics.
//!
//! `RunningStat` keeps count, sum, min, max and a Welford mean/variance pair so
//! per-cut timings can be accumulated over millions of records in O(1) memory.
//! Two accumulators built over disjoint shards combine with [`RunningStat::merge`]
//! (Chan et al. parallel update), which is order independent up to rounding.

/// Single-pass mean/variance/min/max accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    mean: f64,
    /// Sum of squared deviations from the running mean.
    m2: f64,
}

impl RunningStat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new observation.
    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Combine another accumulator into this one.
    pub fn merge(&mut self, other: &RunningStat) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }

        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;

        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Number of observations pushed.
    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Smallest observation, or 0.0 when empty.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest observation, or 0.0 when empty.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Mean of the observations, or 0.0 when empty.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance (`M2 / count`), or 0.0 when empty.
    pub fn variance(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.m2 / self.count as f64 }
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn stat_of(values: &[f64]) -> RunningStat {
        let mut stat = RunningStat::new();
        for &v in values {
            stat.push(v);
        }
        stat
    }

    #[test]
    fn one_through_five() {
        let stat = stat_of(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(stat.len(), 5);
        assert!(close(stat.mean(), 3.0));
        assert!(close(stat.variance(), 2.0));
        assert!(close(stat.stddev(), 2.0_f64.sqrt()));
        assert_eq!(stat.min(), 1.0);
        assert_eq!(stat.max(), 5.0);
        assert!(close(stat.sum(), 15.0));
    }

    #[test]
    fn permutation_does_not_change_moments() {
        let a = stat_of(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let b = stat_of(&[4.0, 1.0, 5.0, 3.0, 2.0]);
        assert!(close(a.mean(), b.mean()));
        assert!(close(a.variance(), b.variance()));
        assert_eq!(a.min(), b.min());
        assert_eq!(a.max(), b.max());
    }

    #[test]
    fn empty_accumulator_reports_zeroes() {
        let stat = RunningStat::new();
        assert!(stat.is_empty());
        assert_eq!(stat.mean(), 0.0);
        assert_eq!(stat.variance(), 0.0);
        assert_eq!(stat.min(), 0.0);
        assert_eq!(stat.max(), 0.0);
    }

    #[test]
    fn negative_first_value_sets_min_and_max() {
        let stat = stat_of(&[-3.0]);
        assert_eq!(stat.min(), -3.0);
        assert_eq!(stat.max(), -3.0);
        assert_eq!(stat.variance(), 0.0);
    }

    #[test]
    fn merge_matches_single_pass() {
        let whole = stat_of(&[1.0, 2.0, 3.0, 4.0, 5.0, 10.0, -2.0]);
        let mut left = stat_of(&[1.0, 2.0, 3.0]);
        let right = stat_of(&[4.0, 5.0, 10.0, -2.0]);
        left.merge(&right);

        assert_eq!(left.len(), whole.len());
        assert!(close(left.mean(), whole.mean()));
        assert!(close(left.variance(), whole.variance()));
        assert_eq!(left.min(), whole.min());
        assert_eq!(left.max(), whole.max());
        assert!(close(left.sum(), whole.sum()));
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let mut stat = stat_of(&[2.0, 4.0]);
        stat.merge(&RunningStat::new());
        assert_eq!(stat, stat_of(&[2.0, 4.0]));

        let mut empty = RunningStat::new();
        empty.merge(&stat);
        assert_eq!(empty, stat);
    }
}
