use serde::{Deserialize, Serialize};

use crate::enums::QuestionType;
use crate::identifier::{is_identifier, is_option_value};

/// Row of a matrix-type question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionRow {
    pub id: i64,
    pub ordinal: i32,
    #[serde(default)]
    pub title: String,
}

/// Column of a matrix-type question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionColumn {
    pub id: i64,
    pub ordinal: i32,
    #[serde(default)]
    pub title: String,
}

/// One selectable (or derived) answer of a question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: i64,
    /// Option whose value this one mirrors, when set.
    #[serde(default)]
    pub clone_of: Option<i64>,
    /// Restricts a matrix option to one row.
    #[serde(default)]
    pub row: Option<i64>,
    /// Restricts a matrix option to one column.
    #[serde(default)]
    pub column: Option<i64>,
    /// Derived value (range or pattern test), not a presented choice.
    #[serde(default)]
    pub is_virtual: bool,
    /// The choice carries a free-text elaboration field.
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub starts_hidden: bool,
    pub ordinal: i32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub virtual_type: Option<String>,
    #[serde(default)]
    pub virtual_inf: String,
    #[serde(default)]
    pub virtual_sup: String,
    #[serde(default)]
    pub virtual_regex: String,
}

impl ChoiceOption {
    /// Validate authoring data, returning human-readable problems.
    pub fn check(&self, question: &Question) -> Vec<String> {
        let mut errors = Vec::new();
        if self.is_virtual {
            if self.virtual_inf.is_empty()
                && self.virtual_sup.is_empty()
                && self.virtual_regex.is_empty()
            {
                errors.push(format!(
                    "Missing parameters for derived value in question \"{}\"",
                    question.title
                ));
            }
        } else {
            if self.text.is_empty() {
                errors.push(format!(
                    "Empty text for option in question \"{}\"",
                    question.title
                ));
            }
            if self.value.is_empty() {
                errors.push(format!(
                    "Missing value for option \"{}\" in question \"{}\"",
                    self.text, question.title
                ));
            } else if question.kind == QuestionType::MultipleChoice && !is_option_value(&self.value)
            {
                errors.push(format!(
                    "Invalid value \"{}\" for option \"{}\" in question \"{}\"",
                    self.value, self.text, question.title
                ));
            }
        }
        errors
    }
}

/// One survey question, owning its options and matrix axes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    /// Stable display and storage-field order within the survey.
    pub ordinal: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Registry name of the column type for this question's answers.
    pub data_type: String,
    /// Registry name of the column type for open-answer sub-fields;
    /// falls back to `data_type` when unset.
    #[serde(default)]
    pub open_option_data_type: Option<String>,
    pub data_name: String,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub starts_hidden: bool,
    /// Format constraint applied to text answers.
    #[serde(default)]
    pub regex: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub visual: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub rows: Vec<QuestionRow>,
    #[serde(default)]
    pub columns: Vec<QuestionColumn>,
}

impl Question {
    /// Storage field name for one matrix cell.
    pub fn data_name_for_row_column(&self, row: &QuestionRow, column: &QuestionColumn) -> String {
        format!(
            "{}_multi_row{}_col{}",
            self.data_name, row.ordinal, column.ordinal
        )
    }

    /// Storage field name for one option of a multiple-choice question.
    pub fn option_data_name(&self, option: &ChoiceOption) -> String {
        match self.kind {
            QuestionType::MultipleChoice => format!("{}_{}", self.data_name, option.value),
            _ => self.data_name.clone(),
        }
    }

    /// Storage field name of an option's free-text elaboration.
    pub fn open_option_data_name(&self, option: &ChoiceOption) -> String {
        format!("{}_{}_open", self.data_name, option.value)
    }

    /// Options in ordinal order. Like questions within a survey, options
    /// may be authored out of order; schema-facing consumers must see the
    /// stable ordering.
    pub fn ordered_options(&self) -> Vec<&ChoiceOption> {
        let mut options: Vec<&ChoiceOption> = self.options.iter().collect();
        options.sort_by_key(|o| o.ordinal);
        options
    }

    /// Matrix rows in ordinal order.
    pub fn ordered_rows(&self) -> Vec<&QuestionRow> {
        let mut rows: Vec<&QuestionRow> = self.rows.iter().collect();
        rows.sort_by_key(|r| r.ordinal);
        rows
    }

    /// Matrix columns in ordinal order.
    pub fn ordered_columns(&self) -> Vec<&QuestionColumn> {
        let mut columns: Vec<&QuestionColumn> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.ordinal);
        columns
    }

    /// Options flagged as open answers, in ordinal order.
    pub fn open_options(&self) -> impl Iterator<Item = &ChoiceOption> {
        self.ordered_options().into_iter().filter(|o| o.is_open)
    }

    /// The (row, column) cells of a matrix question that are in scope.
    ///
    /// A cell is in scope unless every row/column-bound option excludes it:
    /// with no row- or column-bound options at all, the full cross product
    /// applies; otherwise a cell must be reachable by at least one option
    /// whose row and column restrictions both admit it.
    pub fn matrix_cells(&self) -> Vec<(&QuestionRow, &QuestionColumn)> {
        let scoped: Vec<&ChoiceOption> = self
            .options
            .iter()
            .filter(|o| o.row.is_some() || o.column.is_some())
            .collect();
        let mut cells = Vec::new();
        let columns = self.ordered_columns();
        for row in self.ordered_rows() {
            for &column in &columns {
                let in_scope = scoped.is_empty()
                    || self.options.iter().any(|o| {
                        o.row.is_none_or(|r| r == row.id)
                            && o.column.is_none_or(|c| c == column.id)
                    });
                if in_scope {
                    cells.push((row, column));
                }
            }
        }
        cells
    }

    /// Validate authoring data for this question and its options.
    pub fn check(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.data_name.is_empty() {
            errors.push(format!("Missing data name for question \"{}\"", self.title));
        } else if !is_identifier(&self.data_name) {
            errors.push(format!(
                "Invalid data name \"{}\" for question \"{}\"",
                self.data_name, self.title
            ));
        }
        for option in &self.options {
            errors.extend(option.check(self));
        }
        if self.kind == QuestionType::MultipleChoice {
            // Option values become column-name suffixes, so a duplicated
            // value among presented choices would collide in storage.
            let mut seen: Vec<&str> = Vec::new();
            let mut reported: Vec<&str> = Vec::new();
            for option in self.options.iter().filter(|o| !o.is_virtual) {
                let value = option.value.as_str();
                if seen.contains(&value) && !reported.contains(&value) {
                    errors.push(format!(
                        "Duplicated value {} in question {}",
                        value, self.title
                    ));
                    reported.push(value);
                }
                seen.push(value);
            }
        }
        errors
    }
}
