//! Types for implied volatility calculation.

use super::error::IVError;
use serde::{Deserialize, Serialize};

/// Option type for IV calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option (right to buy the underlying at strike price).
    Call,
    /// Put option (right to sell the underlying at strike price).
    Put,
}

/// Parameters for IV calculation.
///
/// Times are year fractions measured from the evaluation date. Exercise is
/// allowed from `time_to_first_exercise` (clamped at zero) through
/// `time_to_expiry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IVParams {
    /// Underlying spot price in price units.
    pub spot: f64,
    /// Option strike price in price units.
    pub strike: f64,
    /// Time to expiration in years (e.g., 30 days = 30.0 / 365.0).
    pub time_to_expiry: f64,
    /// Time until early exercise opens, in years; `0.0` for a plain American option.
    pub time_to_first_exercise: f64,
    /// Risk-free interest rate (annualized, e.g., 0.05 for 5%).
    pub risk_free_rate: f64,
    /// Option type (Call or Put).
    pub option_type: OptionType,
}

impl IVParams {
    /// Creates new IV parameters exercisable immediately.
    ///
    /// # Arguments
    /// - `spot`: Underlying spot price in price units
    /// - `strike`: Option strike price in price units
    /// - `time_to_expiry`: Time to expiration in years
    /// - `risk_free_rate`: Risk-free interest rate (annualized)
    /// - `option_type`: Call or Put
    #[must_use]
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        option_type: OptionType,
    ) -> Self {
        Self {
            spot,
            strike,
            time_to_expiry,
            time_to_first_exercise: 0.0,
            risk_free_rate,
            option_type,
        }
    }

    /// Creates parameters for a call option.
    #[must_use]
    pub fn call(spot: f64, strike: f64, time_to_expiry: f64, risk_free_rate: f64) -> Self {
        Self::new(
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            OptionType::Call,
        )
    }

    /// Creates parameters for a put option.
    #[must_use]
    pub fn put(spot: f64, strike: f64, time_to_expiry: f64, risk_free_rate: f64) -> Self {
        Self::new(
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            OptionType::Put,
        )
    }

    /// Delays early exercise until `time_to_first_exercise` years from now.
    #[must_use]
    pub fn with_first_exercise(mut self, time_to_first_exercise: f64) -> Self {
        self.time_to_first_exercise = time_to_first_exercise;
        self
    }

    /// True when the option may be exercised at the evaluation date.
    #[must_use]
    pub fn exercisable_now(&self) -> bool {
        self.time_to_first_exercise <= 0.0
    }

    /// Calculates the intrinsic value of the option.
    ///
    /// For calls: max(0, spot - strike)
    /// For puts: max(0, strike - spot)
    #[must_use]
    pub fn intrinsic_value(&self) -> f64 {
        match self.option_type {
            OptionType::Call => (self.spot - self.strike).max(0.0),
            OptionType::Put => (self.strike - self.spot).max(0.0),
        }
    }

    /// No-arbitrage lower bound of the premium.
    ///
    /// The European bound `S - K·e^(-rT)` (calls) or `K·e^(-rT) - S` (puts),
    /// raised to intrinsic value when exercise is open now.
    #[must_use]
    pub fn lower_bound(&self) -> f64 {
        let discounted_strike = self.strike * (-self.risk_free_rate * self.time_to_expiry).exp();
        let european = match self.option_type {
            OptionType::Call => (self.spot - discounted_strike).max(0.0),
            OptionType::Put => (discounted_strike - self.spot).max(0.0),
        };
        if self.exercisable_now() {
            european.max(self.intrinsic_value())
        } else {
            european
        }
    }

    /// No-arbitrage upper bound of the premium: spot for calls, strike for puts.
    #[must_use]
    pub fn upper_bound(&self) -> f64 {
        match self.option_type {
            OptionType::Call => self.spot,
            OptionType::Put => self.strike,
        }
    }
}

/// Per-row outcome of an implied volatility solve.
///
/// `Unresolved` only becomes the numeric sentinel `0` at the output boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IvOutcome {
    /// The solver converged.
    Converged {
        /// Implied volatility in decimal form (0.25 = 25%).
        iv: f64,
        /// Number of solver iterations used.
        iterations: u32,
    },
    /// No volatility could be recovered for the row.
    Unresolved,
}

impl IvOutcome {
    /// Implied volatility in decimal form, if converged.
    #[must_use]
    pub fn iv(&self) -> Option<f64> {
        match self {
            IvOutcome::Converged { iv, .. } => Some(*iv),
            IvOutcome::Unresolved => None,
        }
    }

    /// Returns the IV as a percentage (e.g., 25.0 for 25%), if converged.
    #[must_use]
    pub fn iv_percent(&self) -> Option<f64> {
        self.iv().map(|iv| iv * 100.0)
    }

    /// Percentage with `0.0` standing in for an unresolved row.
    #[must_use]
    pub fn sentinel_percent(&self) -> f64 {
        self.iv_percent().unwrap_or(0.0)
    }

    /// Returns true if the solver converged.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, IvOutcome::Converged { .. })
    }
}

impl From<Result<(f64, u32), IVError>> for IvOutcome {
    fn from(result: Result<(f64, u32), IVError>) -> Self {
        match result {
            Ok((iv, iterations)) => IvOutcome::Converged { iv, iterations },
            Err(_) => IvOutcome::Unresolved,
        }
    }
}
