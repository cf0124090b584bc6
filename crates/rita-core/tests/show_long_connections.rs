//! End-to-end tests for the long-connections report over SQLite datasets.
//!
//! Each test builds a dataset file in a temp data directory, resolves it the
//! way the CLI does (config → dataset path → read-only source), and captures
//! stdout into a buffer.

use rita_core::Error;
use rita_core::config::Config;
use rita_core::conn::{ConnRecord, is_duration_descending};
use rita_core::error::StorageError;
use rita_core::output::{OutputMode, RenderContext};
use rita_core::report::LongConnections;
use rita_core::storage::{
    RecordSource, SortKey, SqliteRecordSource, create_conn_table, insert_conn,
};
use rusqlite::Connection;
use tempfile::TempDir;

/// Config whose data directory is the temp dir.
fn config_for(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.general.data_dir = dir.path().to_string_lossy().to_string();
    config
}

/// Write a dataset file `<data_dir>/<name>.sqlite` with the given records.
fn write_dataset(config: &Config, name: &str, records: &[ConnRecord]) {
    let path = config.dataset_path(name);
    let conn = Connection::open(&path).expect("create dataset");
    create_conn_table(&conn, &config.structure.conn_table).expect("create table");
    for record in records {
        insert_conn(&conn, &config.structure.conn_table, record).expect("insert record");
    }
}

fn example_records() -> Vec<ConnRecord> {
    vec![
        ConnRecord::new("10.0.0.3", 5555, "10.0.0.4", 443, 5.0, "udp"),
        ConnRecord::new("10.0.0.1", 1234, "10.0.0.2", 80, 120.5, "tcp"),
        ConnRecord::new("192.168.1.7", 51000, "8.8.8.8", 53, 0.25, "udp"),
    ]
}

fn run_report(config: &Config, dataset: &str, mode: OutputMode) -> (rita_core::Result<()>, String) {
    let mut out = Vec::new();
    let result = SqliteRecordSource::open(&config.dataset_path(dataset)).and_then(|source| {
        LongConnections::new(dataset, config.structure.conn_table.clone(), mode)
            .with_context(RenderContext::default().color(false))
            .run(&source, &mut out)
            .map(|_| ())
    });
    (result, String::from_utf8(out).expect("utf-8 output"))
}

#[test]
fn delimited_report_lists_longest_first() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);
    write_dataset(&config, "office", &example_records());

    let (result, stdout) = run_report(&config, "office", OutputMode::Delimited);
    result.expect("report succeeds");

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "10.0.0.1,1234,10.0.0.2,80,120.5,tcp",
            "10.0.0.3,5555,10.0.0.4,443,5,udp",
            "192.168.1.7,51000,8.8.8.8,53,0.25,udp",
        ]
    );
}

#[test]
fn every_line_splits_into_six_typed_fields() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);
    write_dataset(&config, "office", &example_records());

    let (result, stdout) = run_report(&config, "office", OutputMode::Delimited);
    result.expect("report succeeds");

    let mut previous = f64::INFINITY;
    for line in stdout.lines() {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 6, "line {line:?}");
        assert!(!fields[0].is_empty());
        fields[1].parse::<i64>().expect("source port");
        assert!(!fields[2].is_empty());
        fields[3].parse::<i64>().expect("destination port");
        let dur = fields[4].parse::<f64>().expect("duration");
        assert!(dur <= previous);
        previous = dur;
        assert!(!fields[5].is_empty());
    }
}

#[test]
fn human_report_writes_table_before_lines() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);
    write_dataset(&config, "office", &example_records());

    let (result, stdout) = run_report(&config, "office", OutputMode::Human);
    result.expect("report succeeds");

    assert!(stdout.starts_with('+'), "table must come first:\n{stdout}");
    assert!(stdout.contains("Destination Port"));
    assert!(stdout.contains("120.50"));

    let delimited: Vec<&str> = stdout
        .lines()
        .filter(|line| !line.starts_with('+') && !line.starts_with('|'))
        .collect();
    assert_eq!(delimited.len(), 3);
    assert_eq!(delimited[0], "10.0.0.1,1234,10.0.0.2,80,120.5,tcp");
}

#[test]
fn ties_keep_insertion_order() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);
    write_dataset(
        &config,
        "ties",
        &[
            ConnRecord::new("10.0.0.1", 1, "10.0.0.9", 22, 30.0, "tcp"),
            ConnRecord::new("10.0.0.2", 2, "10.0.0.9", 22, 30.0, "tcp"),
            ConnRecord::new("10.0.0.3", 3, "10.0.0.9", 22, 60.0, "tcp"),
            ConnRecord::new("10.0.0.4", 4, "10.0.0.9", 22, 30.0, "tcp"),
        ],
    );

    let path = config.dataset_path("ties");
    let source = SqliteRecordSource::open(&path).expect("open");
    assert_eq!(source.path(), Some(path.as_path()));
    let records = source
        .fetch_all("conn", SortKey::descending(rita_core::conn::ConnField::Dur))
        .expect("fetch");

    assert!(is_duration_descending(&records));
    let sources: Vec<&str> = records.iter().map(|r| r.src.as_str()).collect();
    assert_eq!(sources, vec!["10.0.0.3", "10.0.0.1", "10.0.0.2", "10.0.0.4"]);
}

#[test]
fn empty_collection_reports_dataset_and_writes_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);
    write_dataset(&config, "quiet", &[]);

    let (result, stdout) = run_report(&config, "quiet", OutputMode::Human);

    let err = result.expect_err("empty dataset must fail");
    assert!(matches!(err, Error::EmptyResult { ref dataset } if dataset == "quiet"));
    assert!(err.to_string().contains("quiet"));
    assert!(stdout.is_empty());
}

#[test]
fn missing_collection_is_treated_as_empty() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);
    let path = config.dataset_path("bare");
    let conn = Connection::open(&path).expect("create dataset");
    conn.execute_batch("CREATE TABLE dns (query TEXT);")
        .expect("create unrelated table");

    let (result, stdout) = run_report(&config, "bare", OutputMode::Delimited);

    assert!(matches!(result, Err(Error::EmptyResult { .. })));
    assert!(stdout.is_empty());
}

#[test]
fn missing_dataset_is_a_storage_error() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);

    let (result, stdout) = run_report(&config, "nowhere", OutputMode::Delimited);

    assert!(matches!(
        result,
        Err(Error::Storage(StorageError::DatasetNotFound(_)))
    ));
    assert!(stdout.is_empty());
}

#[test]
fn dataset_may_name_a_file_directly() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);
    write_dataset(&config, "office", &example_records());
    let direct = config.dataset_path("office").to_string_lossy().to_string();

    let other = Config::default();
    let (result, stdout) = run_report(&other, &direct, OutputMode::Delimited);

    result.expect("report succeeds");
    assert_eq!(stdout.lines().count(), 3);
}
