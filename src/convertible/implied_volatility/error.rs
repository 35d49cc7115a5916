//! Error types for implied volatility calculation.

use std::fmt;

/// Errors specific to IV calculation.
///
/// All of them are per-row: the caller records the row as unresolved and
/// moves on.
#[derive(Debug, Clone, PartialEq)]
pub enum IVError {
    /// A required input (spot or premium) is missing for the row.
    MissingInput {
        /// Name of the missing input.
        field: &'static str,
    },

    /// Invalid input parameters for IV calculation.
    InvalidParams {
        /// Description of the invalid parameter.
        message: String,
    },

    /// The evaluation date is on or after maturity.
    Expired {
        /// Time to expiry in years.
        time_to_expiry: f64,
    },

    /// Premium is below the no-arbitrage lower bound of the option.
    PremiumBelowLowerBound {
        /// Observed premium.
        premium: f64,
        /// Lower bound, `max(intrinsic, S - K·e^(-rT))` for a call.
        bound: f64,
    },

    /// Premium is above the no-arbitrage upper bound of the option.
    PremiumAboveUpperBound {
        /// Observed premium.
        premium: f64,
        /// Upper bound, the spot for a call.
        bound: f64,
    },

    /// Premium is not reachable by any volatility inside the solver bounds.
    NotBracketed {
        /// Observed premium.
        premium: f64,
        /// Model price at the minimum volatility.
        min_price: f64,
        /// Model price at the maximum volatility.
        max_price: f64,
    },

    /// The root finder did not converge within max iterations.
    ConvergenceFailure {
        /// Number of iterations attempted.
        iterations: u32,
        /// Last IV estimate before giving up.
        last_iv: f64,
    },
}

impl fmt::Display for IVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IVError::MissingInput { field } => {
                write!(f, "missing input: {field}")
            }
            IVError::InvalidParams { message } => {
                write!(f, "invalid parameters: {message}")
            }
            IVError::Expired { time_to_expiry } => {
                write!(
                    f,
                    "option expired: time to expiry {time_to_expiry:.6} years"
                )
            }
            IVError::PremiumBelowLowerBound { premium, bound } => {
                write!(
                    f,
                    "premium {premium:.4} is below the lower price bound {bound:.4}"
                )
            }
            IVError::PremiumAboveUpperBound { premium, bound } => {
                write!(
                    f,
                    "premium {premium:.4} is above the upper price bound {bound:.4}"
                )
            }
            IVError::NotBracketed {
                premium,
                min_price,
                max_price,
            } => {
                write!(
                    f,
                    "root not bracketed: premium {premium:.4} outside [{min_price:.4}, {max_price:.4}]"
                )
            }
            IVError::ConvergenceFailure {
                iterations,
                last_iv,
            } => {
                write!(
                    f,
                    "solver did not converge after {iterations} iterations, last IV: {last_iv:.4}"
                )
            }
        }
    }
}

impl std::error::Error for IVError {}
