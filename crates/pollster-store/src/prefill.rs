//! Seeding a new response from the participant's history.

use chrono::DateTime;
use polars::prelude::{col, lit, AnyValue, DataFrame, IntoLazy, SortMultipleOptions};
use pollster_model::PrefillPolicy;
use serde_json::Value;

use crate::engine::StorageEngine;
use crate::error::Result;
use crate::model::ResultsModel;
use crate::submit::Record;

/// Marker stored under this key when a record came from migrated data.
pub const SOURCE_FIELD: &str = "_source_";

fn json_of(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(n) => Value::from(*n),
        AnyValue::Int16(n) => Value::from(*n),
        AnyValue::Int32(n) => Value::from(*n),
        AnyValue::Int64(n) => Value::from(*n),
        AnyValue::UInt8(n) => Value::from(*n),
        AnyValue::UInt16(n) => Value::from(*n),
        AnyValue::UInt32(n) => Value::from(*n),
        AnyValue::UInt64(n) => Value::from(*n),
        AnyValue::Float32(n) => Value::from(*n),
        AnyValue::Float64(n) => Value::from(*n),
        AnyValue::Datetime(ms, _, _) | AnyValue::DatetimeOwned(ms, _, _) => {
            DateTime::from_timestamp_millis(*ms)
                .map_or(Value::Null, |dt| Value::String(dt.to_rfc3339()))
        }
        other => Value::String(other.to_string()),
    }
}

fn first_row_record(frame: &DataFrame) -> Result<Option<Record>> {
    if frame.height() == 0 {
        return Ok(None);
    }
    let mut record = Record::new();
    for column in frame.get_columns() {
        let value = json_of(&column.get(0)?);
        if !value.is_null() {
            record.insert(column.name().to_string(), value);
        }
    }
    Ok(Some(record))
}

fn latest_matching(
    frame: DataFrame,
    user_id: i64,
    global_id: &str,
) -> Result<Option<Record>> {
    let latest = frame
        .lazy()
        .filter(
            col("user")
                .eq(lit(user_id))
                .and(col("global_id").eq(lit(global_id))),
        )
        .sort(
            ["timestamp"],
            SortMultipleOptions::default().with_order_descending(true),
        )
        .limit(1)
        .collect()?;
    first_row_record(&latest)
}

/// The participant's most recent stored response, if any.
pub fn last_participation(
    engine: &dyn StorageEngine,
    model: &ResultsModel,
    user_id: i64,
    global_id: &str,
) -> Result<Option<Record>> {
    let frame = engine.read_table(model.table_name())?;
    latest_matching(frame, user_id, global_id)
}

/// Resolves the survey's prefill policy into a seed record.
///
/// `PreviousData` falls back to a migrated side table named
/// `<results table>_previousdata`; records from there are tagged with
/// [`SOURCE_FIELD`] so callers can tell them apart.
pub fn prefill(
    engine: &dyn StorageEngine,
    policy: PrefillPolicy,
    model: &ResultsModel,
    user_id: i64,
    global_id: &str,
) -> Result<Option<Record>> {
    match policy {
        PrefillPolicy::None => Ok(None),
        PrefillPolicy::Last => last_participation(engine, model, user_id, global_id),
        PrefillPolicy::PreviousData => {
            if let Some(record) = last_participation(engine, model, user_id, global_id)? {
                return Ok(Some(record));
            }
            let side_table = format!("{}_previousdata", model.table_name());
            if !engine.has_table(&side_table) {
                return Ok(None);
            }
            let frame = engine.read_table(&side_table)?;
            Ok(latest_matching(frame, user_id, global_id)?.map(|mut record| {
                record.insert(
                    SOURCE_FIELD.to_string(),
                    Value::String("previousdata".to_string()),
                );
                record
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngine;
    use crate::submit::append_submission;
    use chrono::{TimeZone, Utc};
    use pollster_model::{ChoiceOption, Question, QuestionType, Survey};
    use pollster_schema::TypeRegistry;
    use serde_json::json;

    fn survey() -> Survey {
        let question = Question {
            id: 1,
            ordinal: 1,
            title: "Symptoms".into(),
            kind: QuestionType::MultipleChoice,
            data_type: "Numeric".into(),
            data_name: "Q1".into(),
            options: vec![
                ChoiceOption {
                    id: 1,
                    ordinal: 1,
                    value: "0".into(),
                    ..ChoiceOption::default()
                },
                ChoiceOption {
                    id: 2,
                    ordinal: 2,
                    value: "1".into(),
                    ..ChoiceOption::default()
                },
            ],
            ..Question::default()
        };
        let mut survey = Survey::new(1, "weekly");
        survey.questions.push(question);
        survey
    }

    fn seeded_engine(survey: &Survey, model: &ResultsModel) -> MemoryEngine {
        let mut engine = MemoryEngine::new();
        engine
            .create_table(model.table_name(), model.empty_frame())
            .unwrap();
        for (day, selected) in [(1, "Q1_0"), (2, "Q1_1")] {
            let mut record = Record::new();
            record.insert("user".into(), json!(42));
            record.insert("global_id".into(), json!("gid-1"));
            record.insert(selected.into(), json!(true));
            let at = Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap();
            append_submission(&mut engine, survey, model, &record, at)
                .unwrap()
                .unwrap();
        }
        engine
    }

    #[test]
    fn last_policy_picks_the_newest_response() {
        let survey = survey();
        let model = ResultsModel::compile(&survey, &TypeRegistry::builtin()).unwrap();
        let engine = seeded_engine(&survey, &model);

        let record = prefill(&engine, PrefillPolicy::Last, &model, 42, "gid-1")
            .unwrap()
            .expect("a previous response exists");
        assert_eq!(record.get("Q1_1"), Some(&json!(true)));
        assert_eq!(record.get("Q1_0"), Some(&json!(false)));
    }

    #[test]
    fn other_participants_do_not_leak() {
        let survey = survey();
        let model = ResultsModel::compile(&survey, &TypeRegistry::builtin()).unwrap();
        let engine = seeded_engine(&survey, &model);
        let record = prefill(&engine, PrefillPolicy::Last, &model, 42, "gid-other").unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn none_policy_never_reads_storage() {
        let survey = survey();
        let model = ResultsModel::compile(&survey, &TypeRegistry::builtin()).unwrap();
        // No results table created at all.
        let engine = MemoryEngine::new();
        let record = prefill(&engine, PrefillPolicy::None, &model, 42, "gid-1").unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn previous_data_falls_back_to_the_side_table() {
        let survey = survey();
        let model = ResultsModel::compile(&survey, &TypeRegistry::builtin()).unwrap();
        let mut engine = MemoryEngine::new();
        engine
            .create_table(model.table_name(), model.empty_frame())
            .unwrap();
        engine
            .create_table("results_weekly_previousdata", model.empty_frame())
            .unwrap();
        let mut record = Record::new();
        record.insert("user".into(), json!(42));
        record.insert("global_id".into(), json!("gid-1"));
        record.insert("Q1_0".into(), json!(true));
        let frame = crate::submit::record_frame(
            &model,
            &record,
            Utc.with_ymd_and_hms(2025, 11, 1, 9, 0, 0).unwrap(),
        )
        .unwrap();
        engine
            .append_rows("results_weekly_previousdata", frame)
            .unwrap();

        let seeded = prefill(&engine, PrefillPolicy::PreviousData, &model, 42, "gid-1")
            .unwrap()
            .expect("migrated data exists");
        assert_eq!(seeded.get(SOURCE_FIELD), Some(&json!("previousdata")));
        assert_eq!(seeded.get("Q1_0"), Some(&json!(true)));
    }
}
