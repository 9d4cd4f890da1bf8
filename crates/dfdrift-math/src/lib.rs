//! dfdrift math utilities.
//!
//! Log-gamma, regularized incomplete gamma, the chi-square distribution and
//! the two-sample chi-square homogeneity test used to compare frequency
//! distributions.

pub mod math;

pub use math::chi_square::*;
pub use math::gamma::*;
pub use math::stable::*;
