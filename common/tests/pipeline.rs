use std::{fs, path::Path};

use common::{
    BreakdownError,
    config::{Condition, Config, ParseFailurePolicy, Settings},
    pipeline,
    stage::Stage,
};

const HEADER: &str = "Started,start_communication,prepareCkpts,applyCktps,Applied\n";

fn write_csv(path: &Path, rows: &[&str]) {
    let mut contents = HEADER.to_owned();
    for row in rows {
        contents.push_str(row);
        contents.push('\n');
    }
    fs::write(path, contents).unwrap();
}

fn config(dir: &Path, conditions: Vec<Condition>) -> Config {
    Config {
        name: "test".to_owned(),
        input: dir.join("input.csv"),
        output_dir: dir.join("output"),
        conditions,
        settings: Settings::default(),
        plots: Vec::new(),
    }
}

fn three_conditions() -> Vec<Condition> {
    vec![
        Condition::new("Distributed", 1, 10, true),
        Condition::new("Centralized", 11, 20, false),
        Condition::new("Conventional", 21, 30, false),
    ]
}

#[test]
fn constant_rows_give_constant_means() {
    let dir = tempfile::tempdir().unwrap();
    let mut rows = vec!["1.0,2.0,3.0,4.0,1"; 10];
    rows.extend(vec!["5.0,6.0,7.0,8.0,1"; 20]);
    write_csv(&dir.path().join("input.csv"), &rows);

    let config = config(dir.path(), three_conditions());
    let result = pipeline::breakdowns(&config).unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result[0].condition, "Distributed");
    assert_eq!(result[0].means(), [1.0, 2.0, 3.0, 4.0]);
    for stage in Stage::ALL {
        assert_eq!(result[0].series(stage).len(), 10);
    }
    assert_eq!(result[1].means(), [5.0, 6.0, 0.0, 8.0]);
    assert_eq!(result[2].means(), [5.0, 6.0, 0.0, 8.0]);
}

#[test]
fn series_length_matches_range_whatever_the_content() {
    let dir = tempfile::tempdir().unwrap();
    let rows = ["1,2,3,4,1", "x,y,z,w,1", ",,,,", "2,2,2,2,1", "9,9,9,9,9"];
    write_csv(&dir.path().join("input.csv"), &rows);

    let config = config(dir.path(), vec![Condition::new("Mirrored", 1, 4, true)]);
    let result = pipeline::breakdowns(&config).unwrap();
    for stage in Stage::ALL {
        let series = result[0].series(stage);
        assert_eq!(series.len(), 4);
        let sum: f64 = series.values().iter().sum();
        assert_eq!(series.mean(), sum / series.len() as f64);
    }
    assert_eq!(result[0].mean(Stage::StartJvm), 0.75);
}

#[test]
fn running_twice_gives_identical_means() {
    let dir = tempfile::tempdir().unwrap();
    let rows = [
        "12.31,0.57,1.92,3.003,1",
        "11.87,0.61,2.04,2.871,1",
        "12.02,0.55,1.88,2.954,1",
        "13.40,0.49,0.00,4.102,1",
    ];
    write_csv(&dir.path().join("input.csv"), &rows);

    let config = config(
        dir.path(),
        vec![
            Condition::new("Distributed", 1, 3, true),
            Condition::new("Centralized", 4, 4, false),
        ],
    );
    let first = pipeline::breakdowns(&config).unwrap();
    let second = pipeline::breakdowns(&config).unwrap();
    for (a, b) in first.iter().zip(&second) {
        let a = a.means().map(f64::to_bits);
        let b = b.means().map(f64::to_bits);
        assert_eq!(a, b);
    }
}

#[test]
fn missing_input_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), three_conditions());

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BreakdownError>(),
        Some(BreakdownError::Io { .. })
    ));
    assert!(!config.output_dir.exists());
}

#[test]
fn invalid_config_is_rejected_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(
        dir.path(),
        vec![
            Condition::new("Distributed", 1, 10, true),
            Condition::new("Centralized", 10, 20, false),
        ],
    );
    let err = pipeline::breakdowns(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BreakdownError>(),
        Some(BreakdownError::Config(_))
    ));
}

#[test]
fn fail_policy_aborts_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("input.csv"), &["1,2,3,four,1"]);
    let mut config = config(dir.path(), vec![Condition::new("Distributed", 1, 1, true)]);
    config.settings.on_parse_failure = ParseFailurePolicy::Fail;

    let err = pipeline::breakdowns(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BreakdownError>(),
        Some(BreakdownError::NumericParse { row: 1, column: 3, .. })
    ));
}
