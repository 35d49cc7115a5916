//! Batch run from paired quote directories to the implied volatility table.
//!
//! Stages: load and align each trading day, restate the bond mids as option
//! premiums, then solve bid and ask implied volatility row by row. Per-row
//! solver failures are logged and carried as [`IvOutcome::Unresolved`]; only
//! structural input problems abort the run.

use super::converter::BondToOptionConverter;
use super::implied_volatility::{
    AmericanOptionPricer, IVError, IvOutcome, SolverConfig, solve_iv,
};
use super::terms::{ConfigError, RunConfig};
use crate::market::{
    AlignedRecord, MarketDataError, MidPriceSample, QuoteMidPricer, SeriesAligner, loader,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::panic;
use std::path::Path;
use std::thread;
use tracing::{debug, info, trace, warn};

/// Output datetime layout, microsecond precision.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Fatal errors of a batch run.
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// Invalid run configuration.
    Config(ConfigError),
    /// Input or output files could not be used.
    MarketData(MarketDataError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(err) => write!(f, "configuration error: {err}"),
            PipelineError::MarketData(err) => write!(f, "market data error: {err}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Config(err) => Some(err),
            PipelineError::MarketData(err) => Some(err),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err)
    }
}

impl From<MarketDataError> for PipelineError {
    fn from(err: MarketDataError) -> Self {
        PipelineError::MarketData(err)
    }
}

/// Aligned row with the bond mids restated as conversion-option premiums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionEquivalentRecord {
    /// Local wall-clock time of the row.
    pub datetime: NaiveDateTime,
    /// Stock bid mid.
    pub stock_bid_mid: Option<f64>,
    /// Stock ask mid.
    pub stock_ask_mid: Option<f64>,
    /// Option premium per share implied by the bond bid mid.
    pub cb_bid_one_mid: Option<f64>,
    /// Option premium per share implied by the bond ask mid.
    pub cb_ask_one_mid: Option<f64>,
}

/// One row of the final table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IvRecord {
    /// Local wall-clock time of the row.
    pub datetime: NaiveDateTime,
    /// Stock bid mid.
    pub stock_bid_mid: Option<f64>,
    /// Stock ask mid.
    pub stock_ask_mid: Option<f64>,
    /// Option premium implied by the bond bid mid.
    pub cb_bid_one_mid: Option<f64>,
    /// Option premium implied by the bond ask mid.
    pub cb_ask_one_mid: Option<f64>,
    /// Implied volatility from the bid side.
    pub bid_iv: IvOutcome,
    /// Implied volatility from the ask side.
    pub ask_iv: IvOutcome,
}

impl IvRecord {
    /// Output form: formatted datetime, IV in percent, `0` for unresolved.
    #[must_use]
    pub fn to_row(&self) -> IvRow {
        IvRow {
            datetime: self.datetime.format(DATETIME_FORMAT).to_string(),
            stock_bid_mid: self.stock_bid_mid,
            stock_ask_mid: self.stock_ask_mid,
            cb_bid_one_mid: self.cb_bid_one_mid,
            cb_ask_one_mid: self.cb_ask_one_mid,
            bid_iv: self.bid_iv.sentinel_percent(),
            ask_iv: self.ask_iv.sentinel_percent(),
        }
    }
}

/// Serialized output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IvRow {
    /// Local time formatted with [`DATETIME_FORMAT`].
    #[serde(rename = "Datetime")]
    pub datetime: String,
    /// Stock bid mid, empty when missing.
    #[serde(rename = "Stock_Bid_Mid")]
    pub stock_bid_mid: Option<f64>,
    /// Stock ask mid, empty when missing.
    #[serde(rename = "Stock_Ask_Mid")]
    pub stock_ask_mid: Option<f64>,
    /// Option premium from the bond bid mid.
    #[serde(rename = "CB_Bid_One_Mid")]
    pub cb_bid_one_mid: Option<f64>,
    /// Option premium from the bond ask mid.
    #[serde(rename = "CB_Ask_One_Mid")]
    pub cb_ask_one_mid: Option<f64>,
    /// Bid implied volatility in percent, `0` when unresolved.
    #[serde(rename = "Bid_IV")]
    pub bid_iv: f64,
    /// Ask implied volatility in percent, `0` when unresolved.
    #[serde(rename = "Ask_IV")]
    pub ask_iv: f64,
}

/// Resolved/unresolved counts over both sides of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IvSummary {
    /// Rows in the table.
    pub rows: usize,
    /// Converged bid or ask solves.
    pub resolved: usize,
    /// Bid or ask solves collapsed to the sentinel.
    pub unresolved: usize,
}

impl IvSummary {
    /// Counts the outcomes of `records`.
    #[must_use]
    pub fn from_records(records: &[IvRecord]) -> Self {
        records
            .iter()
            .flat_map(|record| [record.bid_iv, record.ask_iv])
            .fold(
                IvSummary {
                    rows: records.len(),
                    ..IvSummary::default()
                },
                |mut summary, outcome| {
                    if outcome.is_converged() {
                        summary.resolved += 1;
                    } else {
                        summary.unresolved += 1;
                    }
                    summary
                },
            )
    }
}

/// A configured batch run.
///
/// All components are built once from the [`RunConfig`] and shared
/// read-only by every row.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: RunConfig,
    aligner: SeriesAligner,
    converter: BondToOptionConverter,
    pricer: AmericanOptionPricer,
}

impl Pipeline {
    /// Validates `config` and builds the run components.
    pub fn new(config: RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let aligner = config.aligner()?;
        let converter = BondToOptionConverter::new(&config.terms);
        let pricer = AmericanOptionPricer::from_config(&config);
        debug!(
            "pipeline ready: {} lattice steps, {} worker(s)",
            pricer.steps(),
            config.workers.max(1)
        );
        Ok(Self {
            config,
            aligner,
            converter,
            pricer,
        })
    }

    /// Run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Bond-to-premium converter of the run.
    pub fn converter(&self) -> &BondToOptionConverter {
        &self.converter
    }

    /// American pricer of the run.
    pub fn pricer(&self) -> &AmericanOptionPricer {
        &self.pricer
    }

    /// Solver settings applied to every row.
    pub fn solver_config(&self) -> &SolverConfig {
        &self.config.solver
    }

    /// Reads one pair of day files into mid-price samples.
    pub fn load_day(
        &self,
        stock_path: &Path,
        bond_path: &Path,
    ) -> Result<(Vec<MidPriceSample>, Vec<MidPriceSample>), MarketDataError> {
        let stock = QuoteMidPricer::price_all(&loader::read_quote_file(stock_path)?);
        let bond = QuoteMidPricer::price_all(&loader::read_quote_file(bond_path)?);
        Ok((stock, bond))
    }

    /// Loads and aligns every paired day of the two directories.
    pub fn load_days(
        &self,
        stock_dir: &Path,
        bond_dir: &Path,
    ) -> Result<Vec<AlignedRecord>, MarketDataError> {
        let pairs = loader::pair_day_files(stock_dir, bond_dir)?;

        let mut stock_days = Vec::with_capacity(pairs.len());
        let mut bond_days = Vec::with_capacity(pairs.len());
        for (stock_path, bond_path) in &pairs {
            info!("Processing {}", stock_path.display());
            info!("Processing {}", bond_path.display());
            let (stock, bond) = self.load_day(stock_path, bond_path)?;
            stock_days.push(stock);
            bond_days.push(bond);
        }

        self.aligner.align_days(&stock_days, &bond_days)
    }

    /// Restates the bond columns of an aligned row as option premiums.
    #[must_use]
    pub fn to_option_equivalent(&self, record: &AlignedRecord) -> OptionEquivalentRecord {
        OptionEquivalentRecord {
            datetime: record.datetime,
            stock_bid_mid: record.stock_bid_mid,
            stock_ask_mid: record.stock_ask_mid,
            cb_bid_one_mid: record
                .bond_bid_mid
                .map(|price| self.converter.option_price(price)),
            cb_ask_one_mid: record
                .bond_ask_mid
                .map(|price| self.converter.option_price(price)),
        }
    }

    /// Solves the implied volatility of one quote.
    ///
    /// The quote's own date is the evaluation date and the put date is the
    /// maturity.
    pub fn solve(
        &self,
        spot: Option<f64>,
        premium: Option<f64>,
        evaluation_date: NaiveDate,
    ) -> Result<(f64, u32), IVError> {
        let spot = spot.ok_or(IVError::MissingInput { field: "spot" })?;
        let premium = premium.ok_or(IVError::MissingInput { field: "premium" })?;
        let params = self.pricer.call_params(
            spot,
            self.config.terms.conversion_price,
            self.config.terms.put_date,
            evaluation_date,
        )?;
        solve_iv(&self.pricer, &params, premium, &self.config.solver)
    }

    fn solve_side(
        &self,
        side: &str,
        datetime: NaiveDateTime,
        spot: Option<f64>,
        premium: Option<f64>,
    ) -> IvOutcome {
        let result = self.solve(spot, premium, datetime.date());
        match &result {
            Ok((iv, iterations)) => {
                trace!("{} IV at {}: {:.6} in {} iterations", side, datetime, iv, iterations);
            }
            Err(err) => warn!("{} IV unresolved at {}: {}", side, datetime, err),
        }
        result.into()
    }

    /// Solves bid and ask implied volatility for one row.
    #[must_use]
    pub fn solve_row(&self, record: &OptionEquivalentRecord) -> IvRecord {
        IvRecord {
            datetime: record.datetime,
            stock_bid_mid: record.stock_bid_mid,
            stock_ask_mid: record.stock_ask_mid,
            cb_bid_one_mid: record.cb_bid_one_mid,
            cb_ask_one_mid: record.cb_ask_one_mid,
            bid_iv: self.solve_side(
                "bid",
                record.datetime,
                record.stock_bid_mid,
                record.cb_bid_one_mid,
            ),
            ask_iv: self.solve_side(
                "ask",
                record.datetime,
                record.stock_ask_mid,
                record.cb_ask_one_mid,
            ),
        }
    }

    /// Solves every row, spread over the configured workers.
    ///
    /// Output order always matches input order.
    #[must_use]
    pub fn annotate(&self, records: &[AlignedRecord]) -> Vec<IvRecord> {
        let solve_chunk = |chunk: &[AlignedRecord]| -> Vec<IvRecord> {
            chunk
                .iter()
                .map(|record| self.solve_row(&self.to_option_equivalent(record)))
                .collect()
        };

        let workers = self.config.workers.max(1);
        if workers == 1 || records.len() < 2 {
            return solve_chunk(records);
        }

        let chunk_size = records.len().div_ceil(workers);
        thread::scope(|scope| {
            let handles: Vec<_> = records
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || solve_chunk(chunk)))
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(rows) => rows,
                    Err(payload) => panic::resume_unwind(payload),
                })
                .collect()
        })
    }

    /// Runs the whole batch over two quote directories.
    pub fn run(&self, stock_dir: &Path, bond_dir: &Path) -> Result<Vec<IvRecord>, PipelineError> {
        let aligned = self.load_days(stock_dir, bond_dir)?;
        info!("aligned {} rows, solving implied volatility", aligned.len());

        let records = self.annotate(&aligned);
        let summary = IvSummary::from_records(&records);
        info!(
            "{} rows: {} IVs resolved, {} unresolved",
            summary.rows, summary.resolved, summary.unresolved
        );
        Ok(records)
    }

    /// Writes the table as CSV.
    pub fn write_output(&self, path: &Path, records: &[IvRecord]) -> Result<(), PipelineError> {
        let rows: Vec<IvRow> = records.iter().map(IvRecord::to_row).collect();
        loader::write_records(path, &rows)?;
        info!("wrote {} rows to {}", rows.len(), path.display());
        Ok(())
    }
}
