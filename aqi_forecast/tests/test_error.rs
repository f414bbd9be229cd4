use aqi_features::FeatureError;
use aqi_forecast::{Division, ErrorCategory, ForecastError};
use rstest::rstest;
use std::io;
use std::path::PathBuf;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::Io(_)));

    let feature_error = FeatureError::UnknownField("pm10".to_string());
    let forecast_error = ForecastError::from(feature_error);
    assert!(matches!(forecast_error, ForecastError::Feature(_)));

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(ForecastError::from(json_error), ForecastError::Json(_)));
}

#[test]
fn test_error_display() {
    assert_eq!(ForecastError::NoData(Division::Sylhet).to_string(), "No data for Sylhet");
    assert_eq!(
        ForecastError::EmptySeries.to_string(),
        "Cannot forecast from an empty series"
    );

    let error = ForecastError::ModelFormat {
        path: PathBuf::from("models/Dhaka.json"),
        reason: "tree 0: tree has no nodes".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("models/Dhaka.json"));
    assert!(message.contains("tree has no nodes"));
}

#[rstest]
#[case(ForecastError::UnknownDivision("X".into()), ErrorCategory::Validation, 400)]
#[case(ForecastError::NoModel(Division::Khulna), ErrorCategory::Configuration, 500)]
#[case(ForecastError::NoModels(PathBuf::from("models")), ErrorCategory::Configuration, 500)]
#[case(ForecastError::NoData(Division::Dhaka), ErrorCategory::NoData, 404)]
#[case(ForecastError::EmptySeries, ErrorCategory::Precondition, 500)]
#[case(ForecastError::Cancelled, ErrorCategory::Cancelled, 499)]
#[case(ForecastError::DataSource("bad".into()), ErrorCategory::Internal, 500)]
fn test_error_categories(
    #[case] error: ForecastError,
    #[case] category: ErrorCategory,
    #[case] status: u16,
) {
    assert_eq!(error.category(), category);
    assert_eq!(category.status_code(), status);
}

#[test]
fn test_csv_error_prefix_appears_once() {
    let mut reader = csv::Reader::from_reader("Date,City,AQI\n01/01/2024,Dhaka\n".as_bytes());
    let csv_error = reader.records().find_map(|r| r.err()).unwrap();

    let message = ForecastError::from(csv_error).to_string();
    assert!(message.starts_with("CSV error:"));
    assert!(!message.contains("CSV error: CSV error"));
}
