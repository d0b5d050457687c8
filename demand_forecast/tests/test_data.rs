use chrono::NaiveDate;
use demand_forecast::config::HistoryColumns;
use demand_forecast::data::{
    parse_date, DataLoader, History, Observation, OnHandInventory, RawObservation, RunId, Series,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,product,units_sold,promo_flag").unwrap();
    writeln!(file, "2023-01-01,A,10,0").unwrap();
    writeln!(file, "2023-01-02,A,12,1").unwrap();
    writeln!(file, "2023-01-03,A,,0").unwrap();
    writeln!(file, "2023-01-01,B,3,0").unwrap();
    writeln!(file, "2023-01-02,,4,0").unwrap();

    let history = DataLoader::from_csv(file.path(), &HistoryColumns::default()).unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history.row_count(), 4);
    assert_eq!(history.keys().collect::<Vec<_>>(), vec!["A", "B"]);

    let a = history.get("A").unwrap();
    assert_eq!(a.rows[0].date, Some(date(2023, 1, 1)));
    assert_eq!(a.rows[1].value, Some(12.0));
    assert_eq!(a.rows[1].covariate, Some(1.0));
    assert_eq!(a.rows[2].value, None);
}

#[test]
fn test_loader_without_covariate_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "day,sku,qty").unwrap();
    writeln!(file, "2023-05-01,X,7").unwrap();
    writeln!(file, "2023-05-02,X,8").unwrap();

    let columns = HistoryColumns {
        date: "day".to_string(),
        product: "sku".to_string(),
        value: "qty".to_string(),
        covariate: Some("promo_flag".to_string()),
    };
    let history = DataLoader::from_csv(file.path(), &columns).unwrap();

    let x = history.get("X").unwrap();
    assert_eq!(x.rows.len(), 2);
    assert!(x.rows.iter().all(|r| r.covariate.is_none()));
}

#[test]
fn test_data_loader_error_handling() {
    assert!(DataLoader::from_csv("nonexistent_file.csv", &HistoryColumns::default()).is_err());

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "when,what").unwrap();
    writeln!(file, "2023-01-01,1").unwrap();
    assert!(DataLoader::from_csv(file.path(), &HistoryColumns::default()).is_err());
}

#[test]
fn test_parse_date() {
    assert_eq!(parse_date("2023-02-03"), Some(date(2023, 2, 3)));
    assert_eq!(parse_date(" 2023-02-03 "), Some(date(2023, 2, 3)));
    assert_eq!(parse_date("2023-02-03 00:00:00"), Some(date(2023, 2, 3)));
    assert_eq!(parse_date("03/02/2023"), None);
    assert_eq!(parse_date("2023-02-30"), None);
}

#[test]
fn test_series_validation() {
    let obs = |d: NaiveDate, v: f64| Observation {
        date: d,
        value: v,
        covariate: None,
    };

    let (jan1, jan2) = (date(2023, 1, 1), date(2023, 1, 2));
    assert!(Series::new("ok", vec![obs(jan1, 1.0), obs(jan2, 0.0)]).is_ok());
    assert!(Series::new("empty", vec![]).is_err());
    assert!(Series::new("order", vec![obs(jan2, 1.0), obs(jan1, 1.0)]).is_err());
    assert!(Series::new("dupe", vec![obs(jan1, 1.0), obs(jan1, 1.0)]).is_err());
    assert!(Series::new("negative", vec![obs(date(2023, 1, 1), -1.0)]).is_err());
}

#[test]
fn test_raw_observation_usable() {
    assert!(RawObservation::new(date(2023, 1, 1), 0.0).usable().is_some());
    assert!(RawObservation::new(date(2023, 1, 1), -0.5).usable().is_none());
    assert!(RawObservation::new(date(2023, 1, 1), f64::INFINITY).usable().is_none());

    let with_nan_covariate = RawObservation::new(date(2023, 1, 1), 1.0).with_covariate(f64::NAN);
    assert_eq!(with_nan_covariate.usable().unwrap().covariate, None);
}

#[test]
fn test_history_from_rows_groups_by_key() {
    let history = History::from_rows(vec![
        ("b", RawObservation::new(date(2023, 1, 1), 1.0)),
        ("a", RawObservation::new(date(2023, 1, 1), 2.0)),
        ("b", RawObservation::new(date(2023, 1, 2), 3.0)),
    ]);

    assert_eq!(history.len(), 2);
    assert_eq!(history.get("b").unwrap().rows.len(), 2);
    assert_eq!(history.keys().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn test_on_hand_inventory_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "product,on_hand").unwrap();
    writeln!(file, "A,25").unwrap();
    writeln!(file, "B,0.5").unwrap();

    let inventory = OnHandInventory::from_csv(file.path()).unwrap();

    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory.get("A"), 25.0);
    assert_eq!(inventory.get("B"), 0.5);
    assert_eq!(inventory.get("unknown"), 0.0);
}

#[test]
fn test_on_hand_rejects_bad_rows() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "product,on_hand").unwrap();
    writeln!(file, "A,lots").unwrap();

    assert!(OnHandInventory::from_csv(file.path()).is_err());
}

#[test]
fn test_run_id() {
    let now = RunId::now();
    assert_eq!(now.as_str().len(), 15);
    assert!(RunId::new("20240101_120000").is_ok());
    assert!(RunId::new("nightly-7").is_ok());
    assert!(RunId::new("").is_err());
    assert!(RunId::new("../escape").is_err());

    let earlier = RunId::new("20240101_120000").unwrap();
    let later = RunId::new("20240102_000000").unwrap();
    assert!(earlier < later);
}
