//! Brent solver for implied volatility calculation.
//!
//! This module finds the volatility that makes a pricing model's premium equal
//! to an observed premium. The model is a black box: any type implementing
//! [`PricingModel`] can be inverted, provided its premium increases with
//! volatility.

use super::error::IVError;
use super::types::IVParams;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A model that prices an option at a given volatility.
pub trait PricingModel {
    /// Theoretical premium of the option described by `params` at volatility `vol`.
    fn premium(&self, params: &IVParams, vol: f64) -> f64;
}

/// Configuration for the implied volatility solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum iterations before giving up.
    pub max_iterations: u32,
    /// Convergence tolerance on volatility.
    pub tolerance: f64,
    /// Convergence tolerance on the price residual.
    pub price_tolerance: f64,
    /// Initial IV guess (default: 0.08012).
    pub initial_guess: f64,
    /// Minimum IV bound (default: 1e-7).
    pub min_iv: f64,
    /// Maximum IV bound (default: 4.0 = 400%).
    pub max_iv: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            price_tolerance: 1e-10,
            initial_guess: 0.08012,
            min_iv: 1e-7,
            max_iv: 4.0,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the volatility convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the price residual tolerance.
    #[must_use]
    pub fn with_price_tolerance(mut self, price_tolerance: f64) -> Self {
        self.price_tolerance = price_tolerance;
        self
    }

    /// Sets the initial IV guess.
    #[must_use]
    pub fn with_initial_guess(mut self, initial_guess: f64) -> Self {
        self.initial_guess = initial_guess;
        self
    }

    /// Sets the IV bounds.
    #[must_use]
    pub fn with_bounds(mut self, min_iv: f64, max_iv: f64) -> Self {
        self.min_iv = min_iv;
        self.max_iv = max_iv;
        self
    }
}

/// Validates input parameters for IV calculation.
fn validate_params(params: &IVParams) -> Result<(), IVError> {
    if params.spot <= 0.0 || !params.spot.is_finite() {
        return Err(IVError::InvalidParams {
            message: format!("spot price must be positive, got {}", params.spot),
        });
    }

    if params.strike <= 0.0 || !params.strike.is_finite() {
        return Err(IVError::InvalidParams {
            message: format!("strike price must be positive, got {}", params.strike),
        });
    }

    if !params.risk_free_rate.is_finite() {
        return Err(IVError::InvalidParams {
            message: format!("risk-free rate must be finite, got {}", params.risk_free_rate),
        });
    }

    if params.time_to_expiry <= 0.0 || params.time_to_expiry.is_nan() {
        return Err(IVError::Expired {
            time_to_expiry: params.time_to_expiry,
        });
    }

    Ok(())
}

/// Checks the premium against the no-arbitrage bounds of the option.
fn check_premium(params: &IVParams, premium: f64, config: &SolverConfig) -> Result<(), IVError> {
    if !premium.is_finite() {
        return Err(IVError::InvalidParams {
            message: format!("premium must be finite, got {premium}"),
        });
    }

    let lower = params.lower_bound();
    if premium < lower - config.price_tolerance {
        return Err(IVError::PremiumBelowLowerBound {
            premium,
            bound: lower,
        });
    }

    let upper = params.upper_bound();
    if premium > upper + config.price_tolerance {
        return Err(IVError::PremiumAboveUpperBound {
            premium,
            bound: upper,
        });
    }

    if premium <= 0.0 {
        return Err(IVError::InvalidParams {
            message: format!("premium must be positive, got {premium}"),
        });
    }

    Ok(())
}

/// Solves for implied volatility using Brent's method.
///
/// The initial guess is priced first. If it already reproduces the premium it
/// is returned; otherwise it selects which half of `[min_iv, max_iv]` holds
/// the root, and Brent's method (inverse quadratic interpolation with
/// bisection fallback) narrows that bracket.
///
/// # Arguments
/// - `model`: Pricing model to invert
/// - `params`: Option parameters (spot, strike, times, rate, type)
/// - `premium`: Observed premium to match
/// - `config`: Solver configuration
///
/// # Returns
/// - `Ok((iv, iterations))`: Converged IV and number of iterations
/// - `Err(IVError)`: If inputs are invalid, the premium cannot be reached, or
///   the solver runs out of iterations
///
/// # Example
/// ```ignore
/// use cb_implied_vol::convertible::implied_volatility::{BlackScholes, IVParams, SolverConfig, solve_iv};
///
/// let params = IVParams::call(100.0, 100.0, 0.25, 0.05);
/// let (iv, iterations) = solve_iv(&BlackScholes, &params, 5.0, &SolverConfig::default())?;
/// println!("IV: {:.2}%, converged in {} iterations", iv * 100.0, iterations);
/// ```
pub fn solve_iv<M: PricingModel + ?Sized>(
    model: &M,
    params: &IVParams,
    premium: f64,
    config: &SolverConfig,
) -> Result<(f64, u32), IVError> {
    validate_params(params)?;
    check_premium(params, premium, config)?;

    let objective = |vol: f64| model.premium(params, vol) - premium;

    let guess = config.initial_guess.clamp(config.min_iv, config.max_iv);
    let f_guess = objective(guess);
    if f_guess.abs() <= config.price_tolerance {
        return Ok((guess, 1));
    }

    let ((low, f_low), (high, f_high)) = if f_guess < 0.0 {
        ((guess, f_guess), (config.max_iv, objective(config.max_iv)))
    } else {
        ((config.min_iv, objective(config.min_iv)), (guess, f_guess))
    };

    if f_low > 0.0 || f_high < 0.0 {
        let min_price = model.premium(params, config.min_iv);
        let max_price = model.premium(params, config.max_iv);
        return Err(IVError::NotBracketed {
            premium,
            min_price,
            max_price,
        });
    }

    brent(objective, (low, f_low), (high, f_high), config)
}

/// Brent root search on a bracket whose endpoints straddle zero.
fn brent<F: Fn(f64) -> f64>(
    objective: F,
    (mut a, mut fa): (f64, f64),
    (mut b, mut fb): (f64, f64),
    config: &SolverConfig,
) -> Result<(f64, u32), IVError> {
    if fa.abs() <= config.price_tolerance {
        return Ok((a, 1));
    }
    if fb.abs() <= config.price_tolerance {
        return Ok((b, 1));
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for iteration in 1..=config.max_iterations {
        if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.tolerance;
        let xm = 0.5 * (c - b);
        trace!("brent iteration {} vol={:.8} residual={:.3e}", iteration, b, fb);
        if xm.abs() <= tol1 || fb.abs() <= config.price_tolerance {
            return Ok((b, iteration));
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol1 {
            d
        } else {
            tol1.copysign(xm)
        };
        fb = objective(b);
    }

    Err(IVError::ConvergenceFailure {
        iterations: config.max_iterations,
        last_iv: b,
    })
}
