//! Shifted-exponential model of measurement noise.
//!
//! A trial cost is modeled as `L + E`, where `L` is the true minimal cost (the floor) and `E` is
//! exponentially distributed with rate `λ`. The maximum-likelihood estimate of `L` is the sample minimum,
//! and the estimate of `λ` is the reciprocal of the gap between the sample mean and minimum.
//!
//! The probability that `n` trials produce no sample below `L (1 + β)` is bounded by `exp(-λ β L n)`.
//! Bounding this probability by `α` gives the relative error `β = -ln(α) / (n λ L)` achieved after `n` trials,
//! and the number of trials `n = -ln(α) / (λ β L)` needed to achieve the target relative error.

/// Estimates of the shifted-exponential model parameters after a round.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Estimate {
    /// Floor estimate (the running sample minimum).
    pub floor: i64,
    /// Sample mean, computed as the sum of counts divided by the total trial count.
    pub mean: f64,
    /// Rate estimate. Infinite if the estimate is degenerate.
    pub rate: f64,
    /// Relative error of the floor estimate at the requested confidence. Zero if the estimate
    /// is degenerate; infinite if the floor is non-positive.
    pub beta: f64,
}

impl Estimate {
    /// Computes estimates from the running statistics of a session.
    #[allow(clippy::cast_precision_loss)] // counts are well within `f64` precision for practical purposes
    pub fn new(sum: i128, floor: i64, total_trials: u64, alpha: f64) -> Self {
        let mean = sum as f64 / total_trials as f64;
        let rate = 1.0 / (mean - floor as f64);

        if !rate.is_finite() || rate <= 0.0 {
            // No spread between the mean and the floor: the floor is hit by every trial.
            return Self {
                floor,
                mean,
                rate: f64::INFINITY,
                beta: 0.0,
            };
        }

        let beta = if floor > 0 {
            -alpha.ln() / (total_trials as f64 * rate * floor as f64)
        } else {
            f64::INFINITY
        };
        Self {
            floor,
            mean,
            rate,
            beta,
        }
    }

    /// Checks whether the sample mean doesn't exceed the floor, so that the rate is undefined.
    pub fn is_degenerate(&self) -> bool {
        self.rate.is_infinite()
    }

    /// Projects the total number of trials necessary to reach `beta_min` relative error.
    /// Saturates to `u64::MAX` if the projection is unbounded.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn projected_total(&self, alpha: f64, beta_min: f64) -> u64 {
        let factor = self.rate * beta_min * self.floor as f64;
        if factor > 0.0 && factor.is_finite() {
            // `as` saturates for out-of-range floats
            (-alpha.ln() / factor).floor() as u64
        } else {
            u64::MAX
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALPHA: f64 = 0.05;

    #[test]
    fn estimating_constant_counts() {
        // 31 trials of 1000 accounted as 30 trials
        let estimate = Estimate::new(31_000, 1_000, 30, ALPHA);
        assert!((estimate.mean - 1_033.333).abs() < 1e-3, "{estimate:?}");
        assert!((estimate.rate - 0.03).abs() < 1e-9, "{estimate:?}");
        assert!((estimate.beta - 0.003_328_6).abs() < 1e-6, "{estimate:?}");
        assert!(!estimate.is_degenerate());
    }

    #[test]
    fn zero_spread_is_degenerate() {
        let estimate = Estimate::new(30_000, 1_000, 30, ALPHA);
        assert!(estimate.is_degenerate());
        assert_eq!(estimate.beta, 0.0);
        assert_eq!(estimate.projected_total(ALPHA, 0.05), u64::MAX);

        let estimate = Estimate::new(0, 0, 10, ALPHA);
        assert!(estimate.is_degenerate());
        assert_eq!(estimate.beta, 0.0);
    }

    #[test]
    fn mean_below_floor_is_degenerate() {
        let estimate = Estimate::new(-100, -5, 10, ALPHA);
        assert!(estimate.is_degenerate());
    }

    #[test]
    fn non_positive_floor_has_unbounded_error() {
        let estimate = Estimate::new(500, 0, 10, ALPHA);
        assert!(!estimate.is_degenerate());
        assert!(estimate.beta.is_infinite());
        assert_eq!(estimate.projected_total(ALPHA, 0.05), u64::MAX);
    }

    #[test]
    fn projecting_total_trials() {
        // mean = 2000, floor = 1000 => rate = 1e-3
        let estimate = Estimate::new(200_000, 1_000, 100, ALPHA);
        assert!((estimate.rate - 1e-3).abs() < 1e-12);
        // -ln(0.05) / (1e-3 * 0.05 * 1000) = 59.9...
        assert_eq!(estimate.projected_total(ALPHA, 0.05), 59);
        assert_eq!(estimate.projected_total(0.001, 0.05), 138);
    }

    #[test]
    fn smaller_alpha_increases_error() {
        let loose = Estimate::new(200_000, 1_000, 100, 0.1);
        let tight = Estimate::new(200_000, 1_000, 100, 0.01);
        assert!(tight.beta > loose.beta);
    }
}
