//! End-to-end tests for `run_session`: config + chart files in, CSV records,
//! summary and snapshot out.

use std::path::Path;

use tradesim_core::domain::{Chart, ChartElement, EpisodeState, ExitReason, Period, CANDLES, ONE_DAY_MS, ONE_HOUR_MS};
use tradesim_core::engine::{StartMode, StopToken, STALE_DATA_MESSAGE};
use tradesim_runner::{
    load_snapshot, run_session, SessionConfig, SessionReport, SNAPSHOT_FILE, SUMMARY_FILE,
};

const H: i64 = ONE_HOUR_MS;
/// 2024-01-01T00:00:00Z
const T0: i64 = 1_704_067_200_000;

fn write_chart(path: &Path, start: i64, n: i64) {
    let mut chart = Chart::new();
    chart.insert_series(
        Period::Hours1,
        CANDLES,
        (0..n)
            .map(|i| {
                let begin = start + i * H;
                ChartElement::new(begin, begin + H).with_value("close", 100.0 + i as f64)
            })
            .collect(),
    );
    std::fs::write(path, serde_json::to_string(&chart).unwrap()).unwrap();
}

fn config(initial: &str, final_dt: &str, extra: &str) -> SessionConfig {
    let toml = format!(
        "time_frame = \"01-hs\"\ninitial_datetime = \"{initial}\"\nfinal_datetime = \"{final_dt}\"\n{extra}\n\
         [quoted_asset]\ninitial_balance = 1000.0\n"
    );
    SessionConfig::from_toml(&toml).unwrap()
}

fn data_rows(path: &Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count() - 1
}

#[test]
fn final_datetime_session_writes_records_summary_and_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let chart = dir.path().join("chart.json");
    write_chart(&chart, T0, 48);
    let cfg = config("2024-01-01T01:00:00Z", "2024-01-01T20:00:00Z", "");
    let token = StopToken::new();

    let report = run_session(&cfg, &chart, &dir.path().join("out"), false, &token).unwrap();

    assert_eq!(report.mode, StartMode::Fresh);
    assert_eq!(report.summary.exit_reason, Some(ExitReason::FinalDatetimeReached));
    assert_eq!(report.summary.candles_processed, 21);
    assert_eq!(report.records_appended, 41);
    assert_eq!(report.stop_reason.as_deref(), Some("Final Datetime Reached"));
    assert_eq!(report.info_messages, 41);

    assert_eq!(data_rows(&report.run_dir.join("episode.csv")), 41);
    // opened and closed at the begin of the first and the stopping candle
    assert_eq!(report.episode.opened_at, Some(T0));
    assert_eq!(report.episode.closed_at, Some(T0 + 20 * H));
    let saved: SessionReport =
        serde_json::from_str(&std::fs::read_to_string(report.run_dir.join(SUMMARY_FILE)).unwrap())
            .unwrap();
    assert_eq!(saved.summary, report.summary);

    let session_dir = dir.path().join("out").join(cfg.session_id().unwrap());
    let snapshot = load_snapshot(&session_dir.join(SNAPSHOT_FILE)).unwrap().unwrap();
    assert_eq!(snapshot.candle.index, 20);
}

#[test]
fn resume_continues_after_data_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let chart = dir.path().join("chart.json");
    let out = dir.path().join("out");
    let cfg = config("2024-01-01T01:00:00Z", "2024-12-31T00:00:00Z", "");

    write_chart(&chart, T0, 30);
    let first = run_session(&cfg, &chart, &out, false, &StopToken::new()).unwrap();
    assert_eq!(first.summary.exit_reason, Some(ExitReason::AllAvailableCandlesProcessed));
    assert!(first.summary.head_of_the_market);
    assert_eq!(first.snapshot.candle.index, 29);

    // ten more closed candles arrive
    write_chart(&chart, T0, 40);
    let second = run_session(&cfg, &chart, &out, true, &StopToken::new()).unwrap();

    assert_eq!(second.mode, StartMode::Resume);
    assert_eq!(second.summary.start_index, Some(29));
    assert_eq!(second.summary.candles_processed, 10);
    assert_eq!(second.snapshot.candle.index, 39);
    assert_ne!(first.run_dir, second.run_dir);
    assert!(second.run_dir.ends_with("run-002"));
}

#[test]
fn resume_without_snapshot_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let chart = dir.path().join("chart.json");
    write_chart(&chart, T0, 10);
    let cfg = config("2024-01-01T01:00:00Z", "2024-12-31T00:00:00Z", "");

    let report = run_session(&cfg, &chart, &dir.path().join("out"), true, &StopToken::new()).unwrap();

    assert_eq!(report.mode, StartMode::Fresh);
    assert_eq!(report.summary.start_index, Some(0));
}

#[test]
fn stale_data_stops_session_and_flushes_empty_run() {
    let dir = tempfile::tempdir().unwrap();
    let chart = dir.path().join("chart.json");
    write_chart(&chart, T0, 10);
    let cfg = config("2024-02-01T00:00:00Z", "2024-12-31T00:00:00Z", "");

    let report = run_session(&cfg, &chart, &dir.path().join("out"), false, &StopToken::new()).unwrap();

    assert_eq!(report.summary.exit_reason, Some(ExitReason::StaleData));
    assert!(report.summary.flushed);
    assert_eq!(report.summary.candles_processed, 0);
    assert_eq!(report.episode.exit_type, Some(ExitReason::StaleData));
    assert_eq!(report.episode.state, EpisodeState::Closed);
    assert_eq!(report.stop_reason.as_deref(), Some(STALE_DATA_MESSAGE));
    assert_eq!(report.records_appended, 0);
    assert!(report.run_dir.is_dir());
    assert!(!report.run_dir.join("episode.csv").exists());
    assert!(report.run_dir.join(SUMMARY_FILE).exists());
}

#[test]
fn balance_limit_breach_on_start_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let chart = dir.path().join("chart.json");
    write_chart(&chart, T0, 10);
    // quoted balance 1000 already at the maximum
    let cfg = {
        let mut cfg = config("2024-01-01T01:00:00Z", "2024-12-31T00:00:00Z", "");
        cfg.quoted_asset.maximum_balance = Some(1000.0);
        cfg
    };

    let report = run_session(&cfg, &chart, &dir.path().join("out"), false, &StopToken::new()).unwrap();

    assert_eq!(report.summary.exit_reason, Some(ExitReason::MinOrMaxBalanceReached));
    assert_eq!(report.summary.candles_processed, 1);
    assert_eq!(
        report.error_messages,
        vec!["Max Balance reached @ 2024-01-01 00:00:00 UTC".to_string()]
    );
}

#[test]
fn day_partitioned_session_rolls_to_next_day_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    write_chart(&data.join("2024-01-01.json"), T0, 24);
    write_chart(&data.join("2024-01-02.json"), T0 + ONE_DAY_MS, 24);
    let out = dir.path().join("out");
    let cfg = config(
        "2024-01-01T01:00:00Z",
        "2024-12-31T00:00:00Z",
        "day_partitioned = true",
    );

    let first = run_session(&cfg, &data, &out, false, &StopToken::new()).unwrap();
    assert!(first.chart.ends_with("2024-01-01.json"));
    assert_eq!(first.summary.last_index, Some(22));
    assert_eq!(first.snapshot.candle.index, 0);
    assert_eq!(first.snapshot.process_date, T0 + ONE_DAY_MS);

    let second = run_session(&cfg, &data, &out, true, &StopToken::new()).unwrap();
    assert!(second.chart.ends_with("2024-01-02.json"));
    assert_eq!(second.summary.start_index, Some(0));
    assert_eq!(second.summary.candles_processed, 23);
    assert_eq!(second.snapshot.process_date, T0 + 2 * ONE_DAY_MS);
}

#[test]
fn missing_chart_file_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config("2024-01-01T01:00:00Z", "2024-12-31T00:00:00Z", "");

    let err = run_session(
        &cfg,
        &dir.path().join("nope.json"),
        &dir.path().join("out"),
        false,
        &StopToken::new(),
    )
    .unwrap_err();

    assert!(matches!(err, tradesim_runner::RunError::Data(_)));
}
