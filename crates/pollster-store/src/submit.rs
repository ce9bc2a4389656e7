//! Response intake: validation against the survey definition and
//! materialization into a typed single-row frame.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, Series, TimeUnit};
use pollster_model::{Question, QuestionType, Survey};
use pollster_schema::ColumnKind;
use serde_json::Value;

use crate::engine::StorageEngine;
use crate::error::Result;
use crate::model::ResultsModel;

/// One submitted response, keyed by storage field name.
pub type Record = BTreeMap<String, Value>;

/// A single validation failure, attributed to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionIssue {
    pub field: String,
    pub message: String,
}

fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn is_selected(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

fn format_issue(
    model: &ResultsModel,
    question: &Question,
    field_name: &str,
    record: &Record,
) -> Option<SubmissionIssue> {
    let Some(Value::String(text)) = record.get(field_name) else {
        return None;
    };
    if text.is_empty() {
        return None;
    }
    let valid = model
        .field(field_name)
        .is_none_or(|f| f.spec.accepts(text));
    if valid {
        return None;
    }
    let message = if question.error_message.is_empty() {
        "Invalid value".to_string()
    } else {
        question.error_message.clone()
    };
    Some(SubmissionIssue {
        field: field_name.to_string(),
        message,
    })
}

/// Checks a record against the survey's questions and the compiled model.
///
/// Mandatory checks run per question; format checks run against every
/// storage field the question compiles to, so matrix cells and open-answer
/// sub-fields with a formatted column type get the same scrutiny as a main
/// answer. Returns one issue per violated constraint; an empty vector
/// means the record is fit to store.
pub fn validate_record(
    survey: &Survey,
    model: &ResultsModel,
    record: &Record,
) -> Vec<SubmissionIssue> {
    let mut issues = Vec::new();
    for question in survey.ordered_questions() {
        match question.kind {
            QuestionType::MultipleChoice => {
                if question.is_mandatory {
                    let any_selected = question
                        .options
                        .iter()
                        .filter(|o| !o.is_virtual)
                        .any(|o| is_selected(record.get(&question.option_data_name(o))));
                    if !any_selected {
                        issues.push(SubmissionIssue {
                            field: question.data_name.clone(),
                            message: "At least one option should be selected".to_string(),
                        });
                    }
                }
                for option in question.open_options() {
                    let name = question.open_option_data_name(option);
                    issues.extend(format_issue(model, question, &name, record));
                }
            }
            QuestionType::MatrixSelect | QuestionType::MatrixEntry => {
                if question.is_mandatory {
                    let any_filled = question.matrix_cells().iter().any(|(row, column)| {
                        !is_empty_value(
                            record.get(&question.data_name_for_row_column(row, column)),
                        )
                    });
                    if !any_filled {
                        issues.push(SubmissionIssue {
                            field: question.data_name.clone(),
                            message: "This field is required".to_string(),
                        });
                    }
                }
                for (row, column) in question.matrix_cells() {
                    let name = question.data_name_for_row_column(row, column);
                    issues.extend(format_issue(model, question, &name, record));
                }
            }
            QuestionType::Builtin | QuestionType::Text | QuestionType::SingleChoice => {
                let value = record.get(&question.data_name);
                if question.is_mandatory && is_empty_value(value) {
                    issues.push(SubmissionIssue {
                        field: question.data_name.clone(),
                        message: "This field is required".to_string(),
                    });
                }
                issues.extend(format_issue(model, question, &question.data_name, record));
                for option in question.open_options() {
                    let name = question.open_option_data_name(option);
                    issues.extend(format_issue(model, question, &name, record));
                }
            }
        }
    }
    issues
}

fn string_of(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn int_of(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

/// Builds the single-row typed frame for one validated record.
///
/// The `timestamp` field is always stamped with `submitted_at`, ignoring any
/// value the record may carry for it.
pub fn record_frame(
    model: &ResultsModel,
    record: &Record,
    submitted_at: DateTime<Utc>,
) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(model.fields().len());
    for field in model.fields() {
        let name = field.name.as_str();
        let value = record.get(name);
        let column = match field.spec.kind {
            ColumnKind::Bool => {
                Series::new(name.into(), &[is_selected(value)]).into_column()
            }
            ColumnKind::Numeric => {
                Series::new(name.into(), &[int_of(value)]).into_column()
            }
            ColumnKind::Timestamp => {
                Series::new(name.into(), &[submitted_at.timestamp_millis()])
                    .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                    .into_column()
            }
            ColumnKind::Text
            | ColumnKind::YearMonth
            | ColumnKind::Date
            | ColumnKind::PostalCode => {
                Series::new(name.into(), &[string_of(value)]).into_column()
            }
        };
        columns.push(column);
    }
    Ok(DataFrame::new(columns)?)
}

/// Validates and stores one record into the survey's results table.
///
/// On validation failure nothing is written and the issues are returned in
/// `Ok(Err(..))` form so storage errors stay distinguishable.
pub fn append_submission(
    engine: &mut dyn StorageEngine,
    survey: &Survey,
    model: &ResultsModel,
    record: &Record,
    submitted_at: DateTime<Utc>,
) -> Result<std::result::Result<(), Vec<SubmissionIssue>>> {
    let issues = validate_record(survey, model, record);
    if !issues.is_empty() {
        return Ok(Err(issues));
    }
    let frame = record_frame(model, record, submitted_at)?;
    engine.append_rows(model.table_name(), frame)?;
    Ok(Ok(()))
}
