//! # Convertible Bond Implied Volatility
//!
//! Recovers the implied volatility of the conversion option embedded in a
//! convertible bond from intraday quote snapshots of the bond and of its
//! underlying stock.
//!
//! ## Pipeline
//!
//! 1. **Mid prices**: each five-level snapshot becomes a bid mid and an ask
//!    mid, the mean of the non-zero levels of that side.
//! 2. **Alignment**: per trading day, both series are forward-filled and the
//!    bond series is asof-joined onto the stock series. Rows at or before the
//!    08:59 local pre-open cut-off are dropped.
//! 3. **Premium extraction**: bond prices are restated as option premiums
//!    per share by removing a linearly amortized bond floor.
//! 4. **Inversion**: a forward-starting American call is priced on a binomial
//!    lattice and inverted for volatility, independently for every row and
//!    side.
//!
//! Rows whose volatility cannot be recovered are kept and carry the
//! sentinel `0` in the output table.
//!
//! ## Example
//!
//! ```ignore
//! use cb_implied_vol::prelude::*;
//! use std::path::Path;
//!
//! let pipeline = Pipeline::new(RunConfig::default())?;
//! let records = pipeline.run(Path::new("data/stock"), Path::new("data/bond"))?;
//! pipeline.write_output(Path::new("iv.csv"), &records)?;
//! ```

pub mod convertible;
pub mod market;
pub mod prelude;

pub use convertible::implied_volatility;
pub use convertible::{Pipeline, PipelineError, RunConfig};
