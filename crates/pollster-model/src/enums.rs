use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Survey lifecycle state. A survey is authored while `Draft`, installed
/// into live storage by publishing, and archived by unpublishing. The
/// authoring records stay editable in `Draft` and `Unpublished`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurveyStatus {
    #[default]
    Draft,
    Published,
    Unpublished,
}

impl SurveyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyStatus::Draft => "DRAFT",
            SurveyStatus::Published => "PUBLISHED",
            SurveyStatus::Unpublished => "UNPUBLISHED",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, SurveyStatus::Published)
    }

    /// Questions, options, rows and columns may only be changed while the
    /// survey is in an editable state. This is a policy predicate, not an
    /// enforced storage constraint.
    pub fn is_editable(&self) -> bool {
        matches!(self, SurveyStatus::Draft | SurveyStatus::Unpublished)
    }
}

impl fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SurveyStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Ok(SurveyStatus::Draft),
            "PUBLISHED" => Ok(SurveyStatus::Published),
            "UNPUBLISHED" => Ok(SurveyStatus::Unpublished),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

/// Question shape, which drives the storage fields compiled for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    /// System-provided question; one field, never shown with choices.
    Builtin,
    /// Free text with optional format pattern; one field.
    #[default]
    Text,
    /// One field holding the chosen value, plus open-answer fields.
    SingleChoice,
    /// One boolean field per option, plus open-answer fields.
    MultipleChoice,
    /// One field per (row, column) cell, chosen from options.
    MatrixSelect,
    /// One field per (row, column) cell, free entry.
    MatrixEntry,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Builtin => "builtin",
            QuestionType::Text => "text",
            QuestionType::SingleChoice => "single-choice",
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::MatrixSelect => "matrix-select",
            QuestionType::MatrixEntry => "matrix-entry",
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, QuestionType::MatrixSelect | QuestionType::MatrixEntry)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
