use crate::common::{HEADER, SECOND, TempDir, taipei};
use cb_implied_vol::market::loader;
use cb_implied_vol::prelude::*;
use chrono::{FixedOffset, NaiveTime};
use std::fs;

fn aligner() -> SeriesAligner {
    SeriesAligner::new(
        FixedOffset::east_opt(8 * 3600).unwrap(),
        NaiveTime::from_hms_opt(8, 59, 0).unwrap(),
    )
}

/// Deterministic pseudo-random sequence for irregular sampling.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }
}

fn irregular_series(rng: &mut Lcg, start: i64, count: usize, max_gap_secs: u64) -> Vec<MidPriceSample> {
    let mut timestamp = start;
    (0..count)
        .map(|_| {
            timestamp += (rng.next() % max_gap_secs) as i64 * SECOND;
            let bid = (rng.next() % 4 != 0).then(|| 100.0 + (rng.next() % 50) as f64 / 10.0);
            let ask = (rng.next() % 4 != 0).then(|| 101.0 + (rng.next() % 50) as f64 / 10.0);
            MidPriceSample {
                timestamp,
                bid_mid: bid,
                ask_mid: ask,
            }
        })
        .collect()
}

#[test]
fn test_asof_join_never_looks_ahead() {
    let mut rng = Lcg(7);
    for _ in 0..20 {
        let stock = irregular_series(&mut rng, taipei(0, 8, 55, 0), 60, 30);
        let bond = irregular_series(&mut rng, taipei(0, 8, 55, 0), 200, 8);

        let records = aligner().align_day(&stock, &bond);
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        for record in &records {
            if let Some(bond_timestamp) = record.bond_timestamp {
                assert!(bond_timestamp <= record.timestamp);
            }
        }
    }
}

#[test]
fn test_session_filter_and_fill() {
    let mut rng = Lcg(42);
    let stock = irregular_series(&mut rng, taipei(0, 8, 50, 0), 120, 20);
    let bond = irregular_series(&mut rng, taipei(0, 8, 50, 0), 300, 6);

    let cutoff = NaiveTime::from_hms_opt(8, 59, 0).unwrap();
    let records = aligner().align_day(&stock, &bond);
    assert!(!records.is_empty());
    assert!(records.iter().all(|r| r.datetime.time() > cutoff));
    assert!(
        records
            .iter()
            .all(|r| r.stock_bid_mid.is_some() || r.stock_ask_mid.is_some())
    );
}

#[test]
fn test_forward_fill_is_idempotent() {
    let mut rng = Lcg(3);
    let series = irregular_series(&mut rng, taipei(0, 9, 0, 0), 100, 5);
    let once = forward_fill(&series);
    assert_eq!(forward_fill(&once), once);
}

#[test]
fn test_quote_file_with_gaps_and_extra_columns() {
    let tmp = TempDir::new("gappy");
    let path = tmp.path().join("bond.csv");
    let content = format!(
        "{HEADER},Volume\n\
         {},110,109.5,0,0,0,111,,,,,5\n\
         {},,,,,,,,,,,3\n\
         {},0,0,0,0,0,112,112.5,113,113.5,114,1\n",
        taipei(0, 9, 0, 0),
        taipei(0, 9, 0, 1),
        taipei(0, 9, 0, 2),
    );
    fs::write(&path, content).unwrap();

    let snapshots = loader::read_quote_file(&path).unwrap();
    assert_eq!(snapshots.len(), 3);

    let samples = QuoteMidPricer::price_all(&snapshots);
    assert_eq!(samples[0].bid_mid, Some(109.75));
    assert_eq!(samples[0].ask_mid, Some(111.0));
    assert!(samples[1].is_empty());
    assert_eq!(samples[2].bid_mid, None);
    assert_eq!(samples[2].ask_mid, Some(113.0));

    let prepared = aligner().prepare(&samples);
    assert_eq!(prepared.len(), 3);
    assert_eq!(prepared[1].bid_mid, Some(109.75));
    assert_eq!(prepared[1].ask_mid, Some(111.0));
    assert_eq!(prepared[2].bid_mid, Some(109.75));
    assert_eq!(prepared[2].ask_mid, Some(113.0));
}

#[test]
fn test_days_are_filled_independently() {
    let stock_day_one = vec![MidPriceSample {
        timestamp: taipei(0, 9, 0, 0),
        bid_mid: Some(280.0),
        ask_mid: Some(281.0),
    }];
    let bond_day_one = vec![MidPriceSample {
        timestamp: taipei(0, 9, 0, 0),
        bid_mid: Some(110.0),
        ask_mid: Some(111.0),
    }];
    let stock_day_two = vec![MidPriceSample {
        timestamp: taipei(1, 9, 30, 0),
        bid_mid: Some(282.0),
        ask_mid: None,
    }];
    let bond_day_two = vec![MidPriceSample {
        timestamp: taipei(1, 9, 45, 0),
        bid_mid: Some(112.0),
        ask_mid: Some(113.0),
    }];

    let records = aligner()
        .align_days(
            &[stock_day_one, stock_day_two],
            &[bond_day_one, bond_day_two],
        )
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].stock_ask_mid, None);
    assert_eq!(records[1].bond_bid_mid, None);
}
