//! Quote market data: snapshots, mid prices and stock/bond time alignment.

pub mod error;
/// Quote file discovery, parsing and CSV output.
pub mod loader;
pub mod series;
pub mod snapshot;

pub use error::MarketDataError;
pub use series::{AlignedRecord, SeriesAligner, forward_fill};
pub use snapshot::{BOOK_DEPTH, MidPriceSample, QuoteMidPricer, QuoteSnapshot};
