//! Quote snapshots for market data

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Number of quoted price levels carried on each side of a snapshot.
pub const BOOK_DEPTH: usize = 5;

/// A multi-level bid/ask snapshot of one instrument at a specific point in time.
///
/// A level priced at `0.0` carries no quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    /// Timestamp of the snapshot (nanoseconds since epoch)
    pub timestamp: i64,

    /// Bid prices, best level first
    pub bids: [f64; BOOK_DEPTH],

    /// Ask prices, best level first
    pub asks: [f64; BOOK_DEPTH],
}

impl QuoteSnapshot {
    /// Creates a snapshot from raw level prices.
    #[must_use]
    pub fn new(timestamp: i64, bids: [f64; BOOK_DEPTH], asks: [f64; BOOK_DEPTH]) -> Self {
        Self {
            timestamp,
            bids,
            asks,
        }
    }

    /// Mean of the quoted bid levels.
    pub fn bid_mid(&self) -> Option<f64> {
        let mid = QuoteMidPricer::side_mid(&self.bids);
        trace!("bid_mid: {:?}", mid);
        mid
    }

    /// Mean of the quoted ask levels.
    pub fn ask_mid(&self) -> Option<f64> {
        let mid = QuoteMidPricer::side_mid(&self.asks);
        trace!("ask_mid: {:?}", mid);
        mid
    }
}

/// Representative per-side prices derived from one [`QuoteSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MidPriceSample {
    /// Timestamp of the source snapshot (nanoseconds since epoch)
    pub timestamp: i64,
    /// Mean of the quoted bid levels, `None` when the side is empty
    pub bid_mid: Option<f64>,
    /// Mean of the quoted ask levels, `None` when the side is empty
    pub ask_mid: Option<f64>,
}

impl MidPriceSample {
    /// True when neither side carries a price.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bid_mid.is_none() && self.ask_mid.is_none()
    }
}

/// Collapses multi-level snapshots into one mid price per side.
///
/// Prices are not validated: negative or implausible levels are averaged
/// like any other non-zero level.
pub struct QuoteMidPricer;

impl QuoteMidPricer {
    /// Arithmetic mean of the non-zero levels of one side of the book.
    ///
    /// NaN levels are treated as absent, the same as zero.
    #[must_use]
    pub fn side_mid(levels: &[f64]) -> Option<f64> {
        let (sum, count) = levels
            .iter()
            .filter(|price| **price != 0.0 && !price.is_nan())
            .fold((0.0_f64, 0_usize), |(sum, count), price| {
                (sum + price, count + 1)
            });

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Derives the mid-price sample of a single snapshot.
    #[must_use]
    pub fn price(snapshot: &QuoteSnapshot) -> MidPriceSample {
        MidPriceSample {
            timestamp: snapshot.timestamp,
            bid_mid: snapshot.bid_mid(),
            ask_mid: snapshot.ask_mid(),
        }
    }

    /// Derives one sample per snapshot, preserving input order.
    #[must_use]
    pub fn price_all(snapshots: &[QuoteSnapshot]) -> Vec<MidPriceSample> {
        snapshots.iter().map(Self::price).collect()
    }
}
