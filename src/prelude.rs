//! Commonly used types, re-exported for glob import.

pub use crate::convertible::implied_volatility::{
    AmericanOptionPricer, BlackScholes, IVError, IVParams, IvOutcome, OptionType, PricingModel,
    SolverConfig, solve_iv,
};
pub use crate::convertible::{
    BondToOptionConverter, CalendarKind, ConfigError, ConvertibleTerms, DayCount, IvRecord, IvRow,
    IvSummary, OptionEquivalentRecord, Pipeline, PipelineError, RunConfig, TradingCalendar,
};
pub use crate::market::{
    AlignedRecord, BOOK_DEPTH, MarketDataError, MidPriceSample, QuoteMidPricer, QuoteSnapshot,
    SeriesAligner, forward_fill,
};
