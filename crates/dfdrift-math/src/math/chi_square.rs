//! Chi-square distribution and the two-sample homogeneity test.
//!
//! # Homogeneity test
//!
//! Given two count vectors `r` and `s` over the same `k` categories, the
//! statistic is
//!
//! ```text
//! χ² = Σ (r_i / w - s_i · w)² / (r_i + s_i),   w = sqrt(Σr / Σs)
//! ```
//!
//! which reduces to `Σ (r_i - s_i)² / (r_i + s_i)` when both samples have the
//! same size. Under H₀ (both samples come from one distribution) it follows a
//! chi-square distribution with `k - 1` degrees of freedom; the p-value is the
//! upper tail at the observed statistic.
//!
//! ```
//! use dfdrift_math::homogeneity_test;
//!
//! let observed = homogeneity_test(&[48, 22, 33, 47], &[35, 36, 42, 27]).unwrap();
//! assert_eq!(observed.degrees_of_freedom, 3);
//! assert!(observed.p_value < 0.05); // reject H₀ at α = 0.05
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::gamma::{gamma_p, gamma_q};

const CRITICAL_VALUE_BISECTIONS: usize = 200;

/// Errors from the two-sample chi-square test.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HomogeneityError {
    #[error("need at least 2 categories, got {found}")]
    TooFewCategories { found: usize },

    #[error("count vectors differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("{side} sample has no observations")]
    EmptySample { side: &'static str },

    #[error("both samples have zero observations in category {index}")]
    EmptyCategory { index: usize },
}

/// Result of a two-sample chi-square homogeneity test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomogeneityTest {
    /// χ² statistic.
    pub statistic: f64,
    /// Degrees of freedom (`categories - 1`).
    pub degrees_of_freedom: usize,
    /// Upper-tail probability of the statistic under H₀.
    pub p_value: f64,
}

impl HomogeneityTest {
    /// Whether H₀ is rejected at significance level `alpha`.
    pub fn rejects_at(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// CDF of the chi-square distribution with `df` degrees of freedom.
pub fn chi_square_cdf(x: f64, df: f64) -> f64 {
    if x.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    gamma_p(df / 2.0, x / 2.0)
}

/// Survival function (upper tail) of the chi-square distribution.
pub fn chi_square_sf(x: f64, df: f64) -> f64 {
    if x.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    gamma_q(df / 2.0, x / 2.0)
}

/// The `1 - alpha` quantile of the chi-square distribution.
///
/// A statistic above this value rejects H₀ at level `alpha`. Returns NaN
/// unless `0 < alpha < 1` and `df > 0`.
pub fn chi_square_critical_value(alpha: f64, df: f64) -> f64 {
    if !(alpha > 0.0 && alpha < 1.0) || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }

    let mut lo = 0.0;
    let mut hi = df.max(1.0);
    while chi_square_sf(hi, df) > alpha {
        lo = hi;
        hi *= 2.0;
    }
    for _ in 0..CRITICAL_VALUE_BISECTIONS {
        let mid = 0.5 * (lo + hi);
        if chi_square_sf(mid, df) > alpha {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= f64::EPSILON * hi {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// Two-sample chi-square homogeneity test over aligned count vectors.
///
/// `left[i]` and `right[i]` must count the same category.
pub fn homogeneity_test(left: &[u64], right: &[u64]) -> Result<HomogeneityTest, HomogeneityError> {
    if left.len() != right.len() {
        return Err(HomogeneityError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    if left.len() < 2 {
        return Err(HomogeneityError::TooFewCategories { found: left.len() });
    }

    let left_total: u64 = left.iter().sum();
    let right_total: u64 = right.iter().sum();
    if left_total == 0 {
        return Err(HomogeneityError::EmptySample { side: "left" });
    }
    if right_total == 0 {
        return Err(HomogeneityError::EmptySample { side: "right" });
    }
    if let Some(index) = left
        .iter()
        .zip(right)
        .position(|(&l, &r)| l == 0 && r == 0)
    {
        return Err(HomogeneityError::EmptyCategory { index });
    }

    let weight = if left_total == right_total {
        1.0
    } else {
        (left_total as f64 / right_total as f64).sqrt()
    };

    let statistic: f64 = left
        .iter()
        .zip(right)
        .map(|(&l, &r)| {
            let (l, r) = (l as f64, r as f64);
            let dev = l / weight - r * weight;
            dev * dev / (l + r)
        })
        .sum();

    let degrees_of_freedom = left.len() - 1;
    Ok(HomogeneityTest {
        statistic,
        degrees_of_freedom,
        p_value: chi_square_sf(statistic, degrees_of_freedom as f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    // ==================== Distribution functions ====================

    #[test]
    fn df_two_is_exponential() {
        // χ²(2) = Exp(1/2): S(x) = e^(-x/2)
        for x in [0.5_f64, 1.0, 4.0, 20.0] {
            assert!(approx_eq(chi_square_sf(x, 2.0), (-x / 2.0).exp(), 1e-12));
            assert!(approx_eq(chi_square_cdf(x, 2.0), 1.0 - (-x / 2.0).exp(), 1e-12));
        }
    }

    #[test]
    fn cdf_and_sf_at_zero() {
        assert_eq!(chi_square_cdf(0.0, 3.0), 0.0);
        assert_eq!(chi_square_sf(0.0, 3.0), 1.0);
        assert_eq!(chi_square_sf(-1.0, 3.0), 1.0);
    }

    #[test]
    fn invalid_df_is_nan() {
        assert!(chi_square_cdf(1.0, 0.0).is_nan());
        assert!(chi_square_sf(1.0, -2.0).is_nan());
        assert!(chi_square_sf(f64::NAN, 2.0).is_nan());
    }

    #[test]
    fn critical_values_match_tables() {
        // Standard table values for α = 0.05
        assert!(approx_eq(chi_square_critical_value(0.05, 1.0), 3.841_459, 1e-5));
        assert!(approx_eq(chi_square_critical_value(0.05, 3.0), 7.814_728, 1e-5));
        assert!(approx_eq(chi_square_critical_value(0.05, 10.0), 18.307_038, 1e-5));
        // α = 0.01, df = 2: -2 ln(0.01)
        assert!(approx_eq(chi_square_critical_value(0.01, 2.0), 9.210_340, 1e-5));
    }

    #[test]
    fn critical_value_rejects_bad_alpha() {
        assert!(chi_square_critical_value(0.0, 3.0).is_nan());
        assert!(chi_square_critical_value(1.0, 3.0).is_nan());
        assert!(chi_square_critical_value(0.05, 0.0).is_nan());
    }

    // ==================== Homogeneity test ====================

    #[test]
    fn unequal_sample_sizes_known_values() {
        let t = homogeneity_test(&[48, 22, 33, 47], &[35, 36, 42, 27]).unwrap();
        assert!(approx_eq(t.statistic, 11.569_790, 1e-5), "statistic {}", t.statistic);
        assert_eq!(t.degrees_of_freedom, 3);
        assert!(approx_eq(t.p_value, 0.009_012, 1e-5), "p-value {}", t.p_value);
        assert!(t.rejects_at(0.05));
        assert!(t.statistic > chi_square_critical_value(0.05, 3.0));
    }

    #[test]
    fn disjoint_supports() {
        // [2, 0] vs [0, 3]: w = sqrt(2/3), χ² = 2/w² + 3w² = 3 + 2 = 5
        let t = homogeneity_test(&[2, 0], &[0, 3]).unwrap();
        assert!(approx_eq(t.statistic, 5.0, 1e-12));
        assert_eq!(t.degrees_of_freedom, 1);
        assert!(approx_eq(t.p_value, 0.025_347, 1e-5));
    }

    #[test]
    fn identical_samples_do_not_reject() {
        let t = homogeneity_test(&[10, 20, 30], &[10, 20, 30]).unwrap();
        assert!(approx_eq(t.statistic, 0.0, 1e-12));
        assert!(approx_eq(t.p_value, 1.0, 1e-12));
        assert!(!t.rejects_at(0.05));
    }

    #[test]
    fn proportional_samples_do_not_reject() {
        // Same shape, twice the size: weighting removes the scale.
        let t = homogeneity_test(&[10, 20, 30], &[20, 40, 60]).unwrap();
        assert!(approx_eq(t.statistic, 0.0, 1e-9));
    }

    #[test]
    fn many_categories_keep_an_accurate_p_value() {
        // Alternating (1, 0) / (0, 1): χ² = k with k - 1 degrees of freedom.
        let k = 200_000usize;
        let left: Vec<u64> = (0..k).map(|i| (i % 2 == 0) as u64).collect();
        let right: Vec<u64> = (0..k).map(|i| (i % 2 == 1) as u64).collect();
        let t = homogeneity_test(&left, &right).unwrap();
        assert!(approx_eq(t.statistic, k as f64, 1e-6));
        assert_eq!(t.degrees_of_freedom, k - 1);
        assert!(approx_eq(t.p_value, 0.498_949, 1e-5), "p-value {}", t.p_value);
    }

    #[test]
    fn precondition_errors() {
        assert_eq!(
            homogeneity_test(&[1], &[1]),
            Err(HomogeneityError::TooFewCategories { found: 1 })
        );
        assert_eq!(
            homogeneity_test(&[1, 2], &[1]),
            Err(HomogeneityError::LengthMismatch { left: 2, right: 1 })
        );
        assert_eq!(
            homogeneity_test(&[0, 0], &[1, 2]),
            Err(HomogeneityError::EmptySample { side: "left" })
        );
        assert_eq!(
            homogeneity_test(&[1, 2], &[0, 0]),
            Err(HomogeneityError::EmptySample { side: "right" })
        );
        assert_eq!(
            homogeneity_test(&[1, 0, 2], &[3, 0, 1]),
            Err(HomogeneityError::EmptyCategory { index: 1 })
        );
    }
}
