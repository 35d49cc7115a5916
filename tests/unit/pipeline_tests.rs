use crate::common::{QuoteRow, TempDir, bond_price_at_vol, taipei, trade_date, write_quote_file};
use cb_implied_vol::prelude::*;
use chrono::{NaiveTime, Timelike};
use std::fs;

const STOCK_BID: f64 = 279.0;
const STOCK_ASK: f64 = 281.5;
const BID_VOL: f64 = 0.25;
const ASK_VOL: f64 = 0.30;

fn stock_times() -> [(i64, i64, i64); 5] {
    [(8, 58, 0), (9, 0, 0), (9, 0, 5), (9, 1, 0), (9, 5, 0)]
}

/// Writes one trading day: sparse stock quotes, bond quotes every 10 seconds.
fn write_day(pipeline: &Pipeline, stock_dir: &std::path::Path, bond_dir: &std::path::Path, day: i64) {
    let date = trade_date(day);
    let file_name = format!("{}.csv", date.format("%Y%m%d"));

    let stock: Vec<QuoteRow> = stock_times()
        .iter()
        .map(|(h, m, s)| QuoteRow::around(taipei(day, *h, *m, *s), STOCK_BID, STOCK_ASK))
        .collect();
    write_quote_file(&stock_dir.join(&file_name), &stock);

    let bond_bid = bond_price_at_vol(pipeline, STOCK_BID, date, BID_VOL);
    let bond_ask = bond_price_at_vol(pipeline, STOCK_ASK, date, ASK_VOL);
    let start = taipei(day, 8, 58, 0);
    let bond: Vec<QuoteRow> = (0..=48)
        .map(|tick| QuoteRow::around(start + tick * 10 * crate::common::SECOND, bond_bid, bond_ask))
        .collect();
    write_quote_file(&bond_dir.join(&file_name), &bond);
}

#[test]
fn test_end_to_end_two_days() {
    let tmp = TempDir::new("end_to_end");
    let stock_dir = tmp.subdir("stock");
    let bond_dir = tmp.subdir("bond");
    let pipeline = Pipeline::new(RunConfig::default()).unwrap();
    write_day(&pipeline, &stock_dir, &bond_dir, 0);
    write_day(&pipeline, &stock_dir, &bond_dir, 1);

    let records = pipeline.run(&stock_dir, &bond_dir).unwrap();

    // One pre-session stock row per day is dropped
    assert_eq!(records.len(), 8);
    let cutoff = NaiveTime::from_hms_opt(8, 59, 0).unwrap();
    for record in &records {
        assert!(record.datetime.time() > cutoff);
        let bid = record.bid_iv.iv().expect("bid IV resolved");
        let ask = record.ask_iv.iv().expect("ask IV resolved");
        assert!((bid - BID_VOL).abs() < 1e-4, "bid {bid}");
        assert!((ask - ASK_VOL).abs() < 1e-4, "ask {ask}");
    }
    assert!(records.windows(2).all(|w| w[0].datetime <= w[1].datetime));
    assert_eq!(records[0].datetime.date(), trade_date(0));
    assert_eq!(records[4].datetime.date(), trade_date(1));
    assert_eq!(records[0].datetime.hour(), 9);
}

#[test]
fn test_output_table() {
    let tmp = TempDir::new("output");
    let stock_dir = tmp.subdir("stock");
    let bond_dir = tmp.subdir("bond");
    let pipeline = Pipeline::new(RunConfig::default()).unwrap();
    write_day(&pipeline, &stock_dir, &bond_dir, 0);

    let records = pipeline.run(&stock_dir, &bond_dir).unwrap();
    let output = tmp.path().join("iv.csv");
    pipeline.write_output(&output, &records).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines[0],
        "Datetime,Stock_Bid_Mid,Stock_Ask_Mid,CB_Bid_One_Mid,CB_Ask_One_Mid,Bid_IV,Ask_IV"
    );
    assert_eq!(lines.len(), 1 + records.len());
    assert!(lines[1].starts_with("2023-05-02 09:00:00.000000,"));

    let fields: Vec<&str> = lines[1].split(',').collect();
    let bid_iv: f64 = fields[5].parse().unwrap();
    assert!((bid_iv - BID_VOL * 100.0).abs() < 1e-2);
}

#[test]
fn test_unresolved_rows_do_not_stop_the_run() {
    let tmp = TempDir::new("containment");
    let stock_dir = tmp.subdir("stock");
    let bond_dir = tmp.subdir("bond");
    let pipeline = Pipeline::new(RunConfig::default()).unwrap();
    let floor = pipeline.converter().bond_floor();
    let fair = bond_price_at_vol(&pipeline, STOCK_BID, trade_date(0), BID_VOL);

    // Deep in the money while the bond trades at its floor: zero premium
    write_quote_file(
        &stock_dir.join("20230502.csv"),
        &[
            QuoteRow::around(taipei(0, 9, 0, 0), 600.0, 600.0),
            QuoteRow::around(taipei(0, 9, 2, 0), STOCK_BID, STOCK_BID),
            QuoteRow::around(taipei(0, 9, 3, 0), STOCK_BID, STOCK_BID),
        ],
    );
    write_quote_file(
        &bond_dir.join("20230502.csv"),
        &[
            QuoteRow::around(taipei(0, 8, 59, 30), floor, floor),
            QuoteRow::around(taipei(0, 9, 1, 0), fair, fair),
        ],
    );

    let records = pipeline.run(&stock_dir, &bond_dir).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].bid_iv, IvOutcome::Unresolved);
    assert_eq!(records[0].to_row().bid_iv, 0.0);
    assert!(records[1].bid_iv.is_converged());
    assert!(records[2].ask_iv.is_converged());

    let summary = IvSummary::from_records(&records);
    assert_eq!(summary.unresolved, 2);
    assert_eq!(summary.resolved, 4);
}

#[test]
fn test_stock_rows_before_first_bond_quote_are_kept() {
    let tmp = TempDir::new("late_bond");
    let stock_dir = tmp.subdir("stock");
    let bond_dir = tmp.subdir("bond");
    let pipeline = Pipeline::new(RunConfig::default()).unwrap();
    let fair = bond_price_at_vol(&pipeline, STOCK_BID, trade_date(0), BID_VOL);

    write_quote_file(
        &stock_dir.join("20230502.csv"),
        &[
            QuoteRow::around(taipei(0, 9, 0, 0), STOCK_BID, STOCK_ASK),
            QuoteRow::around(taipei(0, 9, 5, 0), STOCK_BID, STOCK_ASK),
        ],
    );
    write_quote_file(
        &bond_dir.join("20230502.csv"),
        &[QuoteRow::around(taipei(0, 9, 2, 0), fair, fair)],
    );

    let records = pipeline.run(&stock_dir, &bond_dir).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].cb_bid_one_mid, None);
    assert_eq!(records[0].bid_iv, IvOutcome::Unresolved);
    assert!(records[1].cb_bid_one_mid.is_some());
    assert!(records[1].bid_iv.is_converged());

    let row = records[0].to_row();
    assert_eq!(row.cb_bid_one_mid, None);
    assert_eq!(row.bid_iv, 0.0);
}

#[test]
fn test_file_count_mismatch_is_fatal() {
    let tmp = TempDir::new("mismatch");
    let stock_dir = tmp.subdir("stock");
    let bond_dir = tmp.subdir("bond");
    let row = [QuoteRow::around(taipei(0, 9, 0, 0), STOCK_BID, STOCK_ASK)];
    write_quote_file(&stock_dir.join("20230502.csv"), &row);
    write_quote_file(&stock_dir.join("20230503.csv"), &row);
    write_quote_file(&bond_dir.join("20230502.csv"), &row);

    let pipeline = Pipeline::new(RunConfig::default()).unwrap();
    let result = pipeline.run(&stock_dir, &bond_dir);
    assert!(matches!(
        result,
        Err(PipelineError::MarketData(MarketDataError::FileCountMismatch { stock: 2, bond: 1 }))
    ));
}

#[test]
fn test_empty_directories_are_fatal() {
    let tmp = TempDir::new("empty");
    let stock_dir = tmp.subdir("stock");
    let bond_dir = tmp.subdir("bond");

    let pipeline = Pipeline::new(RunConfig::default()).unwrap();
    assert!(matches!(
        pipeline.run(&stock_dir, &bond_dir),
        Err(PipelineError::MarketData(MarketDataError::EmptyDirectory { .. }))
    ));
}

#[test]
fn test_parallel_run_matches_sequential() {
    let tmp = TempDir::new("parallel");
    let stock_dir = tmp.subdir("stock");
    let bond_dir = tmp.subdir("bond");
    let sequential = Pipeline::new(RunConfig::default()).unwrap();
    write_day(&sequential, &stock_dir, &bond_dir, 0);
    write_day(&sequential, &stock_dir, &bond_dir, 1);

    let parallel = Pipeline::new(RunConfig {
        workers: 4,
        ..RunConfig::default()
    })
    .unwrap();

    assert_eq!(
        sequential.run(&stock_dir, &bond_dir).unwrap(),
        parallel.run(&stock_dir, &bond_dir).unwrap()
    );
}

#[test]
fn test_config_file_overrides() {
    let tmp = TempDir::new("config");
    let path = tmp.path().join("run.json");
    fs::write(
        &path,
        r#"{"risk_free_rate": 0.02, "workers": 2, "solver": {"max_iv": 3.0}}"#,
    )
    .unwrap();

    let config = RunConfig::from_file(&path).unwrap();
    assert!((config.risk_free_rate - 0.02).abs() < 1e-12);
    assert_eq!(config.workers, 2);
    assert!((config.solver.max_iv - 3.0).abs() < 1e-12);
    assert_eq!(config.binomial_steps, 200);

    let pipeline = Pipeline::new(config).unwrap();
    assert!((pipeline.pricer().risk_free_rate() - 0.02).abs() < 1e-12);
}
