use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::{
    config::{Condition, ParseFailurePolicy},
    error::BreakdownError,
    stage::{RestoreBreakdown, Stage},
};

/// Groups data rows into their conditions and accumulates the stage durations.
///
/// Row 0 is the header and always skipped, rows outside every condition range
/// are ignored. The returned breakdowns follow the order of `conditions`.
pub fn aggregate(
    rows: &[StringRecord],
    conditions: &[Condition],
    policy: ParseFailurePolicy,
) -> Result<Vec<RestoreBreakdown>, BreakdownError> {
    let mut breakdowns = conditions
        .iter()
        .map(|c| RestoreBreakdown::new(&c.name))
        .collect::<Vec<_>>();
    let mut ignored = 0;

    for (row, record) in rows.iter().enumerate().skip(1) {
        let Some(idx) = classify(conditions, row) else {
            ignored += 1;
            continue;
        };
        let condition = &conditions[idx];
        debug!("Row {row} -> {}", condition.name);

        if let Some(values) = parse_row(row, record, condition, policy)? {
            breakdowns[idx].push_row(values);
        }
    }

    if ignored > 0 {
        warn!("Ignored {ignored} rows outside of every condition range");
    }

    for (breakdown, condition) in breakdowns.iter().zip(conditions) {
        if breakdown.samples() < condition.rows.len() {
            warn!(
                "{} has {} of {} expected rows",
                breakdown.condition,
                breakdown.samples(),
                condition.rows.len()
            );
        }
        log_summary(breakdown);
    }

    Ok(breakdowns)
}

/// Index of the condition whose range contains `row`
pub fn classify(conditions: &[Condition], row: usize) -> Option<usize> {
    conditions.iter().position(|c| c.rows.contains(row))
}

fn parse_row(
    row: usize,
    record: &StringRecord,
    condition: &Condition,
    policy: ParseFailurePolicy,
) -> Result<Option<[f64; 4]>, BreakdownError> {
    let mut values = [0.0; 4];
    for stage in Stage::ALL {
        if stage == Stage::PrepareCkpts && !condition.has_prepare_stage {
            continue;
        }
        let column = stage.column();
        let raw = record.get(column).unwrap_or_default();
        match raw.trim().parse::<f64>() {
            Ok(value) => values[column] = value,
            Err(_) => match policy {
                ParseFailurePolicy::Zero => {
                    warn!("Row {row}: {} value {raw:?} is not a number, using 0", stage.name());
                }
                ParseFailurePolicy::SkipRow => {
                    warn!("Row {row}: {} value {raw:?} is not a number, skipping row", stage.name());
                    return Ok(None);
                }
                ParseFailurePolicy::Fail => {
                    return Err(BreakdownError::NumericParse {
                        row,
                        column,
                        value: raw.to_owned(),
                    });
                }
            },
        }
    }
    Ok(Some(values))
}

fn log_summary(breakdown: &RestoreBreakdown) {
    info!("----------------------------------------------");
    for stage in Stage::ALL {
        info!(
            "{}.{} -> {:.2}",
            breakdown.condition,
            stage.name(),
            breakdown.mean(stage)
        );
    }
    info!("----------------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<StringRecord> {
        let mut rows = vec![StringRecord::from(vec![
            "Started",
            "start_communication",
            "prepareCkpts",
            "applyCktps",
            "Applied",
        ])];
        rows.extend(data.iter().map(|r| StringRecord::from(r.to_vec())));
        rows
    }

    fn two_conditions() -> Vec<Condition> {
        vec![
            Condition::new("Distributed", 1, 2, true),
            Condition::new("Centralized", 3, 4, false),
        ]
    }

    #[test]
    fn boundary_rows_land_in_exactly_one_condition() {
        let conditions = two_conditions();
        assert_eq!(classify(&conditions, 0), None);
        assert_eq!(classify(&conditions, 2), Some(0));
        assert_eq!(classify(&conditions, 3), Some(1));
        assert_eq!(classify(&conditions, 5), None);
    }

    #[test]
    fn prepare_column_is_not_read_without_prepare_stage() {
        let rows = rows(&[
            &["1", "2", "3", "4", "x"],
            &["3", "4", "5", "6", "x"],
            &["5", "6", "7", "8", "x"],
            &["5", "6", "not read", "8", "x"],
        ]);
        let result = aggregate(&rows, &two_conditions(), ParseFailurePolicy::Fail).unwrap();
        assert_eq!(result[0].means(), [2.0, 3.0, 4.0, 5.0]);
        assert_eq!(result[1].means(), [5.0, 6.0, 0.0, 8.0]);
        assert!(
            result[1]
                .series(Stage::PrepareCkpts)
                .values()
                .iter()
                .all(|v| *v == 0.0)
        );
    }

    #[test]
    fn zero_policy_keeps_row() {
        let rows = rows(&[&["1", "oops", "3", "4", ""], &["3", "4", "5", "6", ""]]);
        let result = aggregate(&rows, &two_conditions(), ParseFailurePolicy::Zero).unwrap();
        assert_eq!(result[0].samples(), 2);
        assert_eq!(result[0].mean(Stage::StartCommunication), 2.0);
    }

    #[test]
    fn skip_policy_drops_row() {
        let rows = rows(&[&["1", "oops", "3", "4", ""], &["3", "4", "5", "6", ""]]);
        let result = aggregate(&rows, &two_conditions(), ParseFailurePolicy::SkipRow).unwrap();
        assert_eq!(result[0].samples(), 1);
        assert_eq!(result[0].means(), [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn fail_policy_reports_position() {
        let rows = rows(&[&["1", "2", "3", "4", ""], &["3", "4", "5", "bad", ""]]);
        let err = aggregate(&rows, &two_conditions(), ParseFailurePolicy::Fail).unwrap_err();
        match err {
            BreakdownError::NumericParse { row, column, value } => {
                assert_eq!((row, column, value.as_str()), (2, 3, "bad"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_field_follows_policy() {
        let rows = vec![
            StringRecord::from(vec!["a", "b"]),
            StringRecord::from(vec!["1", "2"]),
        ];
        let conditions = vec![Condition::new("Short", 1, 1, true)];
        let result = aggregate(&rows, &conditions, ParseFailurePolicy::Zero).unwrap();
        assert_eq!(result[0].means(), [1.0, 2.0, 0.0, 0.0]);
        assert!(aggregate(&rows, &conditions, ParseFailurePolicy::Fail).is_err());
    }

    #[test]
    fn header_only_gives_empty_series() {
        let rows = rows(&[]);
        let result = aggregate(&rows, &two_conditions(), ParseFailurePolicy::Zero).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].samples(), 0);
        assert_eq!(result[0].means(), [0.0; 4]);
    }
}
