//! American option pricing on a binomial lattice.
//!
//! The underlying follows geometric Brownian motion with flat rate and flat
//! volatility. Exercise opens at a fixed first-exercise date and runs through
//! maturity; before that date the lattice only rolls back continuation
//! values.
//!
//! The lattice is the equal-probability variant: `p = 1/2` and
//!
//! `u, d = exp(r·dt - ln cosh(σ√dt) ± σ√dt)`
//!
//! which keeps the discounted stock a martingale for every `σ >= 0`, so very
//! low trial volatilities never produce invalid branch probabilities.
//!
//! The price is corrected with the European control variate:
//! `lattice American - lattice European + closed-form European`.

use super::black_scholes::BlackScholes;
use super::error::IVError;
use super::solver::PricingModel;
use super::types::{IVParams, OptionType};
use crate::convertible::calendar::{DayCount, TradingCalendar};
use crate::convertible::terms::RunConfig;
use chrono::NaiveDate;
use tracing::{debug, trace};

#[inline(always)]
fn intrinsic(option_type: OptionType, spot: f64, strike: f64) -> f64 {
    match option_type {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    }
}

/// Rolls the lattice back and returns `(american, european)` values.
fn rollback(params: &IVParams, vol: f64, steps: usize) -> (f64, f64) {
    let dt = params.time_to_expiry / steps as f64;
    let sigma_step = vol.max(0.0) * dt.sqrt();
    let drift = params.risk_free_rate * dt - sigma_step.cosh().ln();
    let u = (drift + sigma_step).exp();
    let d = (drift - sigma_step).exp();
    let ratio = u / d;
    let disc_half = 0.5 * (-params.risk_free_rate * dt).exp();

    let first_step = if params.exercisable_now() {
        0
    } else {
        (params.time_to_first_exercise / dt - 1e-9).ceil().max(0.0) as usize
    };

    let mut american = vec![0.0_f64; steps + 1];
    {
        let mut st = params.spot * d.powi(steps as i32);
        for value in american.iter_mut() {
            *value = intrinsic(params.option_type, st, params.strike);
            st *= ratio;
        }
    }
    let mut european = american.clone();

    for i in (0..steps).rev() {
        let can_exercise = i >= first_step;
        let mut st = params.spot * d.powi(i as i32);
        for j in 0..=i {
            european[j] = disc_half * (european[j + 1] + european[j]);
            let continuation = disc_half * (american[j + 1] + american[j]);
            american[j] = if can_exercise {
                continuation.max(intrinsic(params.option_type, st, params.strike))
            } else {
                continuation
            };
            st *= ratio;
        }
    }

    (american[0], european[0])
}

/// Prices dated American options with a fixed first-exercise date.
///
/// Rate, day count and calendar are shared read-only by every call; the
/// evaluation date is supplied per call.
#[derive(Debug, Clone)]
pub struct AmericanOptionPricer {
    risk_free_rate: f64,
    first_exercise_date: NaiveDate,
    day_count: DayCount,
    calendar: TradingCalendar,
    steps: usize,
}

impl AmericanOptionPricer {
    /// Creates a pricer.
    #[must_use]
    pub fn new(
        risk_free_rate: f64,
        first_exercise_date: NaiveDate,
        day_count: DayCount,
        calendar: TradingCalendar,
        steps: usize,
    ) -> Self {
        Self {
            risk_free_rate,
            first_exercise_date,
            day_count,
            calendar,
            steps: steps.max(1),
        }
    }

    /// Creates a pricer from the run configuration.
    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.risk_free_rate,
            config.first_exercise_date,
            config.day_count,
            config.trading_calendar(),
            config.binomial_steps,
        )
    }

    /// Flat risk-free rate.
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Number of lattice steps.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Builds the year-fraction parameters of a call evaluated on `evaluation_date`.
    pub fn call_params(
        &self,
        spot: f64,
        strike: f64,
        maturity: NaiveDate,
        evaluation_date: NaiveDate,
    ) -> Result<IVParams, IVError> {
        self.params(spot, strike, maturity, evaluation_date, OptionType::Call)
    }

    /// Builds the year-fraction parameters of an option evaluated on `evaluation_date`.
    pub fn params(
        &self,
        spot: f64,
        strike: f64,
        maturity: NaiveDate,
        evaluation_date: NaiveDate,
        option_type: OptionType,
    ) -> Result<IVParams, IVError> {
        if spot <= 0.0 || !spot.is_finite() {
            return Err(IVError::InvalidParams {
                message: format!("spot price must be positive, got {spot}"),
            });
        }
        if strike <= 0.0 || !strike.is_finite() {
            return Err(IVError::InvalidParams {
                message: format!("strike price must be positive, got {strike}"),
            });
        }

        let time_to_expiry = self.day_count.year_fraction(evaluation_date, maturity);
        if time_to_expiry <= 0.0 {
            return Err(IVError::Expired { time_to_expiry });
        }
        if !self.calendar.is_business_day(evaluation_date) {
            debug!("evaluation date {} is not a business day", evaluation_date);
        }

        let time_to_first_exercise = self
            .day_count
            .year_fraction(evaluation_date, self.first_exercise_date);

        Ok(
            IVParams::new(spot, strike, time_to_expiry, self.risk_free_rate, option_type)
                .with_first_exercise(time_to_first_exercise),
        )
    }

    /// Premium of a call at volatility `vol`.
    pub fn price(
        &self,
        spot: f64,
        strike: f64,
        maturity: NaiveDate,
        evaluation_date: NaiveDate,
        vol: f64,
    ) -> Result<f64, IVError> {
        let params = self.call_params(spot, strike, maturity, evaluation_date)?;
        Ok(self.lattice_price(&params, vol))
    }

    /// Control-variate lattice premium for year-fraction parameters.
    #[must_use]
    pub fn lattice_price(&self, params: &IVParams, vol: f64) -> f64 {
        if params.time_to_expiry <= 0.0 {
            return params.intrinsic_value();
        }

        let (american, european) = rollback(params, vol, self.steps);
        let closed_form = BlackScholes::price(params, vol);
        let price = (american - european + closed_form).max(0.0);
        trace!(
            "lattice vol={:.6} american={:.6} european={:.6} closed_form={:.6}",
            vol, american, european, closed_form
        );
        price
    }
}

impl PricingModel for AmericanOptionPricer {
    fn premium(&self, params: &IVParams, vol: f64) -> f64 {
        self.lattice_price(params, vol)
    }
}
