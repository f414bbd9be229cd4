use aqi_forecast::store::{parse_sheet, CsvFileSource};
use aqi_forecast::{Division, ForecastError, Series, SeriesSnapshot, SeriesSource, SeriesStore};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const SHEET: &str = "\
Date,City,AQI,Station
01/03/2024,Dhaka,170,Agargaon
01/01/2024,Dhaka,150,Agargaon
01/02/2024,Dhaka,DNA,Agargaon
01/01/2024,Chittagong,80,Khulshi
01/02/2024,Chittgong,90,Khulshi
01/01/2024,Barisal,60,Sadar
01/01/2024,Cumilla,100,Sadar
2024-01-04,Dhaka,999,Agargaon
01/02/2024,Sylhet,DNA,Sadar
01/03/2024,Sylhet,,Sadar
";

#[test]
fn test_parse_sheet_cleans_and_groups() {
    let series = parse_sheet(SHEET.as_bytes()).unwrap();

    let dhaka = &series[&Division::Dhaka];
    assert_eq!(dhaka.values(), &[150.0, 160.0, 170.0]);
    assert_eq!(dhaka.last_date(), Some(date(2024, 1, 3)));

    assert_eq!(series[&Division::Chattogram].values(), &[80.0, 90.0]);
    assert_eq!(series[&Division::Barishal].values(), &[60.0]);

    // all-missing divisions and cities outside the eight are dropped
    assert!(!series.contains_key(&Division::Sylhet));
    assert_eq!(series.len(), 3);
}

#[test]
fn test_parse_sheet_duplicate_dates() {
    let sheet = "\
Date,City,AQI
01/01/2024,Rangpur,100
01/01/2024,Rangpur,DNA
01/02/2024,Rangpur,120
01/02/2024,Rangpur,140
";
    let series = parse_sheet(sheet.as_bytes()).unwrap();
    assert_eq!(series[&Division::Rangpur].values(), &[100.0, 140.0]);
}

#[test]
fn test_parse_sheet_tolerates_ragged_rows() {
    let sheet = "\
Date,City,AQI
01/01/2024,Dhaka,100
01/02/2024,Dhaka
01/03/2024,Dhaka,120
01/04/2024
01/04/2024,Dhaka,130
";
    let series = parse_sheet(sheet.as_bytes()).unwrap();
    // short row is a missing value and gets interpolated
    assert_eq!(series[&Division::Dhaka].values(), &[100.0, 110.0, 120.0, 130.0]);
}

#[test]
fn test_parse_sheet_missing_column() {
    let sheet = "Date,Division,AQI\n01/01/2024,Dhaka,100\n";
    let err = parse_sheet(sheet.as_bytes()).unwrap_err();
    assert!(matches!(err, ForecastError::DataSource(ref msg) if msg.contains("City")));
}

#[test]
fn test_csv_file_source() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", SHEET).unwrap();

    let source = CsvFileSource::new(file.path());
    assert_eq!(source.path(), file.path());

    let snapshot = source.fetch().unwrap();
    assert_eq!(
        snapshot.divisions(),
        vec![Division::Dhaka, Division::Chattogram, Division::Barishal]
    );
    assert_eq!(snapshot.total_observations(), 6);

    let missing = CsvFileSource::new("does/not/exist.csv").fetch();
    assert!(matches!(missing, Err(ForecastError::Io(_))));
}

/// Source returning a one-point Dhaka series whose value is the fetch count
#[derive(Debug, Default)]
struct CountingSource {
    fetches: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl SeriesSource for CountingSource {
    fn fetch(&self) -> aqi_forecast::Result<SeriesSnapshot> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ForecastError::DataSource("sheet unavailable".to_string()));
        }
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let series = Series::daily(date(2024, 1, 1), &[n as f64]).unwrap();
        Ok(SeriesSnapshot::new(HashMap::from([(Division::Dhaka, series)])))
    }
}

#[test]
fn test_store_caches_until_stale() {
    let source = CountingSource::default();
    let fetches = Arc::clone(&source.fetches);
    let store = SeriesStore::new(Box::new(source), Duration::from_secs(3600));

    assert_eq!(store.max_age(), Duration::from_secs(3600));
    assert!(store.is_stale());
    assert_eq!(store.age(), None);

    let before = chrono::Utc::now();
    let first = store.snapshot().unwrap();
    assert!(first.fetched_at() >= before);
    let second = store.snapshot().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(!store.is_stale());

    store.refresh().unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[test]
fn test_store_refetches_after_max_age() {
    let source = CountingSource::default();
    let fetches = Arc::clone(&source.fetches);
    let store = SeriesStore::new(Box::new(source), Duration::from_millis(1));

    store.snapshot().unwrap();
    std::thread::sleep(Duration::from_millis(10));
    assert!(store.is_stale());
    let series = store.get_series(Division::Dhaka).unwrap().unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(series.values(), &[2.0]);
}

#[test]
fn test_held_snapshot_survives_refresh() {
    let store = SeriesStore::new(Box::new(CountingSource::default()), Duration::from_secs(3600));

    let held = store.snapshot().unwrap();
    let refreshed = store.refresh().unwrap();

    assert_eq!(held.get(Division::Dhaka).unwrap().values(), &[1.0]);
    assert_eq!(refreshed.get(Division::Dhaka).unwrap().values(), &[2.0]);
    assert!(Arc::ptr_eq(&refreshed, &store.snapshot().unwrap()));
}

#[test]
fn test_failed_refresh_keeps_previous_snapshot() {
    let source = CountingSource::default();
    let failing = Arc::clone(&source.failing);
    let store = SeriesStore::new(Box::new(source), Duration::from_secs(3600));

    let before = store.snapshot().unwrap();
    failing.store(true, Ordering::SeqCst);

    assert!(matches!(store.refresh(), Err(ForecastError::DataSource(_))));
    assert!(Arc::ptr_eq(&before, &store.snapshot().unwrap()));
}

#[test]
fn test_get_series_returns_owned_copy() {
    let store = SeriesStore::new(Box::new(CountingSource::default()), Duration::from_secs(3600));

    let mut copy = store.get_series(Division::Dhaka).unwrap().unwrap();
    copy.push(aqi_forecast::Observation::new(date(2024, 1, 2), 5.0))
        .unwrap();

    assert_eq!(store.snapshot().unwrap().get(Division::Dhaka).unwrap().len(), 1);
    assert_eq!(store.get_series(Division::Khulna).unwrap(), None);
}

#[test]
fn test_published_snapshot_skips_fetch() {
    let source = CountingSource::default();
    let fetches = Arc::clone(&source.fetches);
    let store = SeriesStore::new(Box::new(source), Duration::from_secs(3600));

    let series = Series::daily(date(2024, 6, 1), &[42.0, 43.0]).unwrap();
    store.publish(SeriesSnapshot::new(HashMap::from([
        (Division::Sylhet, series),
        (Division::Rangpur, Series::empty()),
    ])));

    let snapshot = store.snapshot().unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
    assert_eq!(snapshot.divisions(), vec![Division::Sylhet]);
}
