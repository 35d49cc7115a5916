//! Time-series alignment of independently sampled mid-price series.
//!
//! Each instrument's samples are forward-filled on their own timeline, then
//! the bond series is asof-joined onto the stock series: every stock
//! observation picks up the latest bond sample at or before its own
//! timestamp. Rows outside the regular session are dropped last.

use super::error::MarketDataError;
use super::snapshot::MidPriceSample;
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// One row of the joint stock/bond timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRecord {
    /// Stock observation timestamp (nanoseconds since epoch).
    pub timestamp: i64,
    /// Local wall-clock time of the stock observation.
    pub datetime: NaiveDateTime,
    /// Forward-filled stock bid mid.
    pub stock_bid_mid: Option<f64>,
    /// Forward-filled stock ask mid.
    pub stock_ask_mid: Option<f64>,
    /// Timestamp of the bond sample the bond columns were taken from.
    pub bond_timestamp: Option<i64>,
    /// Bond bid mid as of `timestamp`.
    pub bond_bid_mid: Option<f64>,
    /// Bond ask mid as of `timestamp`.
    pub bond_ask_mid: Option<f64>,
}

/// Replaces each missing side with the latest earlier value on that side.
///
/// Leading gaps stay missing. Bid and ask are filled independently.
#[must_use]
pub fn forward_fill(samples: &[MidPriceSample]) -> Vec<MidPriceSample> {
    let mut last_bid = None;
    let mut last_ask = None;

    samples
        .iter()
        .map(|sample| {
            last_bid = sample.bid_mid.or(last_bid);
            last_ask = sample.ask_mid.or(last_ask);
            MidPriceSample {
                timestamp: sample.timestamp,
                bid_mid: last_bid,
                ask_mid: last_ask,
            }
        })
        .collect()
}

/// Drops samples missing on both sides.
#[must_use]
pub fn drop_empty(samples: Vec<MidPriceSample>) -> Vec<MidPriceSample> {
    samples
        .into_iter()
        .filter(|sample| !sample.is_empty())
        .collect()
}

/// Last-observation-carried-forward join keyed on timestamp.
///
/// `left` drives the output cadence; both inputs must be sorted by
/// timestamp. A right sample with the same timestamp as a left sample
/// is considered observed. Returns, per left sample, the index of the
/// matched right sample.
#[must_use]
pub fn asof_indices(left: &[MidPriceSample], right: &[MidPriceSample]) -> Vec<Option<usize>> {
    let mut cursor = 0;
    let mut matched = None;

    left.iter()
        .map(|sample| {
            while cursor < right.len() && right[cursor].timestamp <= sample.timestamp {
                matched = Some(cursor);
                cursor += 1;
            }
            matched
        })
        .collect()
}

/// Converts an epoch-nanosecond timestamp to local wall-clock time.
#[must_use]
pub fn localize(timestamp: i64, offset: &FixedOffset) -> NaiveDateTime {
    DateTime::from_timestamp_nanos(timestamp)
        .with_timezone(offset)
        .naive_local()
}

/// Aligns a stock series and a bond series onto the stock timeline.
#[derive(Debug, Clone)]
pub struct SeriesAligner {
    offset: FixedOffset,
    session_cutoff: NaiveTime,
}

impl SeriesAligner {
    /// Creates an aligner localizing timestamps at `offset` and keeping only
    /// rows strictly after `session_cutoff`.
    #[must_use]
    pub fn new(offset: FixedOffset, session_cutoff: NaiveTime) -> Self {
        Self {
            offset,
            session_cutoff,
        }
    }

    /// UTC offset used to localize timestamps.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Rows at or before this time of day are pre-open noise.
    pub fn session_cutoff(&self) -> NaiveTime {
        self.session_cutoff
    }

    /// True when `datetime` falls inside the regular session.
    #[must_use]
    pub fn in_session(&self, datetime: &NaiveDateTime) -> bool {
        datetime.time() > self.session_cutoff
    }

    /// Sorts (stably), forward-fills and drops fully-missing samples.
    #[must_use]
    pub fn prepare(&self, samples: &[MidPriceSample]) -> Vec<MidPriceSample> {
        let mut ordered = samples.to_vec();
        if !ordered.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp) {
            debug!("samples out of timestamp order, sorting {} rows", ordered.len());
            ordered.sort_by_key(|sample| sample.timestamp);
        }
        drop_empty(forward_fill(&ordered))
    }

    /// Aligns one trading day of stock and bond samples.
    #[must_use]
    pub fn align_day(&self, stock: &[MidPriceSample], bond: &[MidPriceSample]) -> Vec<AlignedRecord> {
        let stock = self.prepare(stock);
        let bond = self.prepare(bond);
        let matches = asof_indices(&stock, &bond);

        let records: Vec<AlignedRecord> = stock
            .iter()
            .zip(matches)
            .filter_map(|(sample, matched)| {
                let datetime = localize(sample.timestamp, &self.offset);
                if !self.in_session(&datetime) {
                    trace!("dropping pre-session row at {}", datetime);
                    return None;
                }
                let bond_sample = matched.map(|index| bond[index]);
                Some(AlignedRecord {
                    timestamp: sample.timestamp,
                    datetime,
                    stock_bid_mid: sample.bid_mid,
                    stock_ask_mid: sample.ask_mid,
                    bond_timestamp: bond_sample.map(|b| b.timestamp),
                    bond_bid_mid: bond_sample.and_then(|b| b.bid_mid),
                    bond_ask_mid: bond_sample.and_then(|b| b.ask_mid),
                })
            })
            .collect();

        debug!(
            "aligned {} stock rows against {} bond rows into {} records",
            stock.len(),
            bond.len(),
            records.len()
        );
        records
    }

    /// Aligns paired trading days and concatenates them in input order.
    ///
    /// Each day starts from an empty fill state. A count mismatch between
    /// the two sides is fatal.
    pub fn align_days(
        &self,
        stock_days: &[Vec<MidPriceSample>],
        bond_days: &[Vec<MidPriceSample>],
    ) -> Result<Vec<AlignedRecord>, MarketDataError> {
        if stock_days.len() != bond_days.len() {
            return Err(MarketDataError::FileCountMismatch {
                stock: stock_days.len(),
                bond: bond_days.len(),
            });
        }

        Ok(stock_days
            .iter()
            .zip(bond_days)
            .flat_map(|(stock, bond)| self.align_day(stock, bond))
            .collect())
    }
}
