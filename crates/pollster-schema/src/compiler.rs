//! Question-to-fields schema compiler.
//!
//! Compiles a question into the ordered list of storage fields its answers
//! occupy. Field order is a public contract: fields appear in question
//! ordinal order and, within a question, in option/row/column ordinal
//! order, because it fixes both CSV export column order and form field
//! order.

use polars::prelude::{DataFrame, Field, Schema};

use pollster_model::{ChoiceOption, Question, QuestionType, Survey};

use crate::error::SchemaError;
use crate::registry::{ColumnKind, ColumnSpec, TypeRegistry};

/// One compiled storage field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub spec: ColumnSpec,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, spec: ColumnSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}

fn open_option_field(
    question: &Question,
    option: &ChoiceOption,
    registry: &TypeRegistry,
) -> Result<FieldDef, SchemaError> {
    let type_name = question
        .open_option_data_type
        .as_deref()
        .unwrap_or(&question.data_type);
    let verbose = format!("{}: {} Open Answer", question.title, option.value);
    let spec = registry.resolve(type_name, &verbose, None)?;
    Ok(FieldDef::new(question.open_option_data_name(option), spec))
}

/// Compile one question into its ordered storage fields.
pub fn compile_question(
    question: &Question,
    registry: &TypeRegistry,
) -> Result<Vec<FieldDef>, SchemaError> {
    let mut fields = Vec::new();
    match question.kind {
        QuestionType::Builtin => {
            let spec = registry.resolve(&question.data_type, &question.title, None)?;
            fields.push(FieldDef::new(question.data_name.clone(), spec));
        }
        QuestionType::Text => {
            let pattern = (!question.regex.is_empty()).then_some(question.regex.as_str());
            let spec = registry.resolve(&question.data_type, &question.title, pattern)?;
            fields.push(FieldDef::new(question.data_name.clone(), spec));
        }
        QuestionType::SingleChoice => {
            let spec = registry.resolve(&question.data_type, &question.title, None)?;
            fields.push(FieldDef::new(question.data_name.clone(), spec));
            for option in question.open_options() {
                fields.push(open_option_field(question, option, registry)?);
            }
        }
        QuestionType::MultipleChoice => {
            for option in question.ordered_options() {
                let verbose = format!("{}: {}", question.title, option.value);
                fields.push(FieldDef::new(
                    question.option_data_name(option),
                    ColumnSpec::new(ColumnKind::Bool, verbose),
                ));
                if option.is_open {
                    fields.push(open_option_field(question, option, registry)?);
                }
            }
        }
        QuestionType::MatrixSelect | QuestionType::MatrixEntry => {
            for (row, column) in question.matrix_cells() {
                let row_label = if row.title.is_empty() {
                    format!("row {}", row.ordinal)
                } else {
                    row.title.clone()
                };
                let column_label = if column.title.is_empty() {
                    format!("column {}", column.ordinal)
                } else {
                    column.title.clone()
                };
                let verbose = format!("{} ({}, {})", question.title, row_label, column_label);
                let spec = registry.resolve(&question.data_type, &verbose, None)?;
                fields.push(FieldDef::new(
                    question.data_name_for_row_column(row, column),
                    spec,
                ));
            }
        }
    }
    Ok(fields)
}

/// Compile all of a survey's questions, in ordinal order.
pub fn compile_questions(
    survey: &Survey,
    registry: &TypeRegistry,
) -> Result<Vec<FieldDef>, SchemaError> {
    let mut fields = Vec::new();
    for question in survey.ordered_questions() {
        fields.extend(compile_question(question, registry)?);
    }
    Ok(fields)
}

/// Polars schema for a compiled field list.
pub fn fields_schema(fields: &[FieldDef]) -> Schema {
    Schema::from_iter(
        fields
            .iter()
            .map(|f| Field::new(f.name.as_str().into(), f.spec.dtype())),
    )
}

/// Empty typed frame for a compiled field list.
pub fn empty_frame(fields: &[FieldDef]) -> DataFrame {
    DataFrame::empty_with_schema(&fields_schema(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;
    use pollster_model::{QuestionColumn, QuestionRow};

    fn registry() -> TypeRegistry {
        TypeRegistry::builtin()
    }

    fn option(id: i64, ordinal: i32, value: &str) -> ChoiceOption {
        ChoiceOption {
            id,
            ordinal,
            text: format!("option {value}"),
            value: value.to_string(),
            ..ChoiceOption::default()
        }
    }

    #[test]
    fn text_question_single_field_with_pattern() {
        let question = Question {
            id: 1,
            ordinal: 1,
            title: "Postal code".into(),
            kind: QuestionType::Text,
            data_type: "Text".into(),
            data_name: "Q3".into(),
            regex: r"^\d{4}$".into(),
            ..Question::default()
        };
        let fields = compile_question(&question, &registry()).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "Q3");
        assert!(fields[0].spec.accepts("1234"));
        assert!(!fields[0].spec.accepts("x"));
    }

    #[test]
    fn multiple_choice_expands_per_option_with_open_fields() {
        let mut question = Question {
            id: 1,
            ordinal: 1,
            title: "Symptoms".into(),
            kind: QuestionType::MultipleChoice,
            data_type: "Numeric".into(),
            data_name: "Q1".into(),
            ..Question::default()
        };
        question.options.push(option(1, 1, "0"));
        question.options.push(option(2, 2, "1"));
        let mut open = option(3, 3, "2");
        open.is_open = true;
        question.options.push(open);

        let fields = compile_question(&question, &registry()).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Q1_0", "Q1_1", "Q1_2", "Q1_2_open"]);
        assert_eq!(fields[0].spec.dtype(), DataType::Boolean);
        // Open answer falls back to the question's own data type.
        assert_eq!(fields[3].spec.dtype(), DataType::Int64);
        assert_eq!(fields[3].spec.verbose_name, "Symptoms: 2 Open Answer");
    }

    #[test]
    fn option_fields_follow_ordinal_not_authoring_order() {
        let mut question = Question {
            id: 1,
            ordinal: 1,
            title: "Symptoms".into(),
            kind: QuestionType::MultipleChoice,
            data_type: "Numeric".into(),
            data_name: "Q1".into(),
            ..Question::default()
        };
        question.options.push(option(2, 2, "1"));
        question.options.push(option(1, 1, "0"));
        let fields = compile_question(&question, &registry()).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Q1_0", "Q1_1"]);
    }

    #[test]
    fn single_choice_open_option_uses_declared_open_type() {
        let mut question = Question {
            id: 1,
            ordinal: 1,
            title: "Gender".into(),
            kind: QuestionType::SingleChoice,
            data_type: "Numeric".into(),
            open_option_data_type: Some("Text".into()),
            data_name: "Q2".into(),
            ..Question::default()
        };
        let mut open = option(1, 1, "other");
        open.is_open = true;
        question.options.push(open);

        let fields = compile_question(&question, &registry()).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "Q2");
        assert_eq!(fields[0].spec.dtype(), DataType::Int64);
        assert_eq!(fields[1].name, "Q2_other_open");
        assert_eq!(fields[1].spec.dtype(), DataType::String);
    }

    #[test]
    fn matrix_question_fields_cover_cells_in_order() {
        let question = Question {
            id: 1,
            ordinal: 1,
            title: "Worry".into(),
            kind: QuestionType::MatrixSelect,
            data_type: "Numeric".into(),
            data_name: "Q20".into(),
            rows: (1..=2)
                .map(|i| QuestionRow {
                    id: i,
                    ordinal: i as i32,
                    title: String::new(),
                })
                .collect(),
            columns: (1..=3)
                .map(|i| QuestionColumn {
                    id: i,
                    ordinal: i as i32,
                    title: String::new(),
                })
                .collect(),
            ..Question::default()
        };
        let fields = compile_question(&question, &registry()).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Q20_multi_row1_col1",
                "Q20_multi_row1_col2",
                "Q20_multi_row1_col3",
                "Q20_multi_row2_col1",
                "Q20_multi_row2_col2",
                "Q20_multi_row2_col3",
            ]
        );
        assert_eq!(fields[0].spec.verbose_name, "Worry (row 1, column 1)");
    }

    #[test]
    fn unknown_data_type_is_fatal() {
        let question = Question {
            id: 1,
            ordinal: 1,
            kind: QuestionType::Text,
            data_type: "Blob".into(),
            data_name: "Q9".into(),
            ..Question::default()
        };
        let err = compile_question(&question, &registry()).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType(_)));
    }

    #[test]
    fn compilation_is_deterministic() {
        let mut survey = Survey::new(1, "weekly");
        for (id, ordinal, name) in [(1, 2, "Q2"), (2, 1, "Q1")] {
            survey.questions.push(Question {
                id,
                ordinal,
                kind: QuestionType::Text,
                data_type: "Text".into(),
                data_name: name.into(),
                ..Question::default()
            });
        }
        let first: Vec<String> = compile_questions(&survey, &registry())
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        let second: Vec<String> = compile_questions(&survey, &registry())
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(first, vec!["Q1".to_string(), "Q2".to_string()]);
        assert_eq!(first, second);
    }
}
