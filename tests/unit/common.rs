use cb_implied_vol::prelude::Pipeline;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SECOND: i64 = 1_000_000_000;
pub const DAY: i64 = 86_400 * SECOND;
// 2023-05-02 00:00:00 UTC, 08:00 in Taipei
pub const DAY_START_UTC: i64 = 1_682_985_600_000_000_000;

pub const HEADER: &str = "Timestamp,BidPrice0,BidPrice1,BidPrice2,BidPrice3,BidPrice4,\
AskPrice0,AskPrice1,AskPrice2,AskPrice3,AskPrice4";

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Scratch directory removed on drop.
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(label: &str) -> Self {
        let id = NEXT_DIR.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "cb_implied_vol_{label}_{}_{id}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn subdir(&self, name: &str) -> PathBuf {
        let dir = self.path.join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Epoch nanoseconds of a Taipei wall-clock time, `day` days after 2023-05-02.
pub fn taipei(day: i64, hour: i64, minute: i64, second: i64) -> i64 {
    DAY_START_UTC + day * DAY + ((hour - 8) * 3600 + minute * 60 + second) * SECOND
}

pub fn trade_date(day: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 5, 2).unwrap() + chrono::Duration::days(day)
}

/// Five distinct levels whose mean is `mid`.
pub fn levels_around(mid: f64) -> [f64; 5] {
    [mid - 0.2, mid - 0.1, mid, mid + 0.1, mid + 0.2]
}

pub struct QuoteRow {
    pub timestamp: i64,
    pub bids: [f64; 5],
    pub asks: [f64; 5],
}

impl QuoteRow {
    pub fn around(timestamp: i64, bid_mid: f64, ask_mid: f64) -> Self {
        Self {
            timestamp,
            bids: levels_around(bid_mid),
            asks: levels_around(ask_mid),
        }
    }
}

pub fn write_quote_file(path: &Path, rows: &[QuoteRow]) {
    let mut content = String::from(HEADER);
    content.push('\n');
    for row in rows {
        let levels: Vec<String> = row
            .bids
            .iter()
            .chain(row.asks.iter())
            .map(|price| price.to_string())
            .collect();
        content.push_str(&format!("{},{}\n", row.timestamp, levels.join(",")));
    }
    fs::write(path, content).unwrap();
}

/// Bond price whose option premium is the pipeline's lattice price at `vol`.
pub fn bond_price_at_vol(pipeline: &Pipeline, spot: f64, date: NaiveDate, vol: f64) -> f64 {
    let terms = &pipeline.config().terms;
    let premium = pipeline
        .pricer()
        .price(spot, terms.conversion_price, terms.put_date, date, vol)
        .unwrap();
    pipeline.converter().bond_price(premium)
}
