//! CSV quote files: discovery, day pairing, parsing and output writing.

use super::error::MarketDataError;
use super::snapshot::{BOOK_DEPTH, QuoteSnapshot};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// One raw row of a quote file. Columns beyond these are ignored.
#[derive(Debug, Deserialize)]
struct QuoteRow {
    #[serde(rename = "Timestamp")]
    timestamp: i64,
    #[serde(rename = "BidPrice0", default)]
    bid_price_0: Option<f64>,
    #[serde(rename = "BidPrice1", default)]
    bid_price_1: Option<f64>,
    #[serde(rename = "BidPrice2", default)]
    bid_price_2: Option<f64>,
    #[serde(rename = "BidPrice3", default)]
    bid_price_3: Option<f64>,
    #[serde(rename = "BidPrice4", default)]
    bid_price_4: Option<f64>,
    #[serde(rename = "AskPrice0", default)]
    ask_price_0: Option<f64>,
    #[serde(rename = "AskPrice1", default)]
    ask_price_1: Option<f64>,
    #[serde(rename = "AskPrice2", default)]
    ask_price_2: Option<f64>,
    #[serde(rename = "AskPrice3", default)]
    ask_price_3: Option<f64>,
    #[serde(rename = "AskPrice4", default)]
    ask_price_4: Option<f64>,
}

impl From<QuoteRow> for QuoteSnapshot {
    fn from(row: QuoteRow) -> Self {
        let level = |price: Option<f64>| price.unwrap_or(0.0);
        let bids: [f64; BOOK_DEPTH] = [
            level(row.bid_price_0),
            level(row.bid_price_1),
            level(row.bid_price_2),
            level(row.bid_price_3),
            level(row.bid_price_4),
        ];
        let asks: [f64; BOOK_DEPTH] = [
            level(row.ask_price_0),
            level(row.ask_price_1),
            level(row.ask_price_2),
            level(row.ask_price_3),
            level(row.ask_price_4),
        ];
        QuoteSnapshot::new(row.timestamp, bids, asks)
    }
}

/// Parses quote snapshots from any CSV source with a header row.
///
/// `origin` only labels errors.
pub fn read_quotes<R: io::Read>(
    reader: R,
    origin: &Path,
) -> Result<Vec<QuoteSnapshot>, MarketDataError> {
    let mut reader = csv::Reader::from_reader(reader);
    reader
        .deserialize::<QuoteRow>()
        .map(|row| {
            row.map(QuoteSnapshot::from)
                .map_err(|err| MarketDataError::Csv {
                    path: origin.to_path_buf(),
                    message: err.to_string(),
                })
        })
        .collect()
}

/// Reads every snapshot of one quote file.
pub fn read_quote_file(path: &Path) -> Result<Vec<QuoteSnapshot>, MarketDataError> {
    let file = fs::File::open(path).map_err(|err| MarketDataError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let snapshots = read_quotes(io::BufReader::new(file), path)?;
    debug!("read {} snapshots from {}", snapshots.len(), path.display());
    Ok(snapshots)
}

/// Lists the regular files of `dir`, sorted by file name.
pub fn list_quote_files(dir: &Path) -> Result<Vec<PathBuf>, MarketDataError> {
    let io_error = |err: io::Error| MarketDataError::Io {
        path: dir.to_path_buf(),
        message: err.to_string(),
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if entry.file_type().map_err(io_error)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Pairs stock and bond day files 1:1 in sorted file-name order.
pub fn pair_day_files(
    stock_dir: &Path,
    bond_dir: &Path,
) -> Result<Vec<(PathBuf, PathBuf)>, MarketDataError> {
    let stock_files = list_quote_files(stock_dir)?;
    let bond_files = list_quote_files(bond_dir)?;

    if stock_files.len() != bond_files.len() {
        error!("convertible bond and stock data do not have the same dates");
        return Err(MarketDataError::FileCountMismatch {
            stock: stock_files.len(),
            bond: bond_files.len(),
        });
    }
    if stock_files.is_empty() {
        return Err(MarketDataError::EmptyDirectory {
            path: stock_dir.to_path_buf(),
        });
    }

    Ok(stock_files.into_iter().zip(bond_files).collect())
}

/// Writes serializable rows as CSV with a header row.
pub fn write_records_to<W: io::Write, T: Serialize>(
    writer: W,
    rows: &[T],
    origin: &Path,
) -> Result<(), MarketDataError> {
    let csv_error = |message: String| MarketDataError::Csv {
        path: origin.to_path_buf(),
        message,
    };

    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row).map_err(|err| csv_error(err.to_string()))?;
    }
    wtr.flush().map_err(|err| csv_error(err.to_string()))
}

/// Writes serializable rows to a CSV file, replacing it if present.
pub fn write_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), MarketDataError> {
    let file = fs::File::create(path).map_err(|err| MarketDataError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    write_records_to(io::BufWriter::new(file), rows, path)?;
    debug!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
