//! Convertible bond terms, conversion-option pricing and the batch pipeline.

pub mod calendar;
pub mod converter;
/// Forward-starting American pricer and implied volatility solver.
pub mod implied_volatility;
pub mod pipeline;
pub mod terms;

pub use calendar::{CalendarKind, DayCount, TradingCalendar};
pub use converter::BondToOptionConverter;
pub use pipeline::{IvRecord, IvRow, IvSummary, OptionEquivalentRecord, Pipeline, PipelineError};
pub use terms::{ConfigError, ConvertibleTerms, RunConfig};
