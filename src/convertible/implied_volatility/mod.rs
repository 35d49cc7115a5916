//! Implied volatility of the conversion option.
//!
//! This module prices the conversion option as a forward-starting American
//! call on a binomial lattice and inverts that price for volatility.
//!
//! # Overview
//!
//! Implied Volatility (IV) is the option's price translated into different
//! units. The premium extracted from a bond quote and the IV in % carry the
//! same information.
//!
//! # Inversion
//!
//! There is no closed form for an American premium, so the pricer is treated
//! as a black-box objective and inverted with Brent's method. Every row is
//! solved independently from the same initial guess.
//!
//! # Example
//!
//! ```ignore
//! use cb_implied_vol::convertible::implied_volatility::{
//!     AmericanOptionPricer, IvOutcome, SolverConfig, solve_iv,
//! };
//!
//! let params = pricer.call_params(spot, 295.0, put_date, quote_date)?;
//! let outcome: IvOutcome = solve_iv(&pricer, &params, premium, &SolverConfig::default()).into();
//! println!("IV: {:.2}%", outcome.sentinel_percent());
//! ```

mod american;
mod black_scholes;
mod error;
mod solver;
mod types;

pub use american::AmericanOptionPricer;
pub use black_scholes::BlackScholes;
pub use error::IVError;
pub use solver::{PricingModel, SolverConfig, solve_iv};
pub use types::{IVParams, IvOutcome, OptionType};
