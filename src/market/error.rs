//! Error types for quote loading and alignment.

use std::fmt;
use std::path::PathBuf;

/// Fatal errors raised while reading or pairing quote data.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// The stock and bond directories hold a different number of day files.
    FileCountMismatch {
        /// Number of stock files.
        stock: usize,
        /// Number of bond files.
        bond: usize,
    },

    /// An input directory holds no quote files.
    EmptyDirectory {
        /// Directory that was scanned.
        path: PathBuf,
    },

    /// Filesystem failure.
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error message.
        message: String,
    },

    /// Malformed CSV content.
    Csv {
        /// File being parsed or written.
        path: PathBuf,
        /// Underlying error message.
        message: String,
    },
}

impl fmt::Display for MarketDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketDataError::FileCountMismatch { stock, bond } => {
                write!(
                    f,
                    "stock and bond data do not cover the same dates: {stock} stock files, {bond} bond files"
                )
            }
            MarketDataError::EmptyDirectory { path } => {
                write!(f, "no quote files found in {}", path.display())
            }
            MarketDataError::Io { path, message } => {
                write!(f, "i/o error on {}: {message}", path.display())
            }
            MarketDataError::Csv { path, message } => {
                write!(f, "csv error in {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for MarketDataError {}
