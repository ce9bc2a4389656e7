//! Translation overlays for survey authoring text.
//!
//! A translation survey is a one-per-(language, survey) overlay; each record
//! targets one base entity by id and may leave fields empty. Resolution
//! always falls back to the base-language text, it never fails.

use serde::{Deserialize, Serialize};

use crate::question::{ChoiceOption, Question, QuestionColumn, QuestionRow};
use crate::survey::Survey;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TranslationStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationQuestion {
    pub question_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationOption {
    pub option_id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationQuestionRow {
    pub row_id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationQuestionColumn {
    pub column_id: i64,
    #[serde(default)]
    pub title: String,
}

/// Localized overlay for one survey in one language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationSurvey {
    pub survey_id: i64,
    pub language: String,
    #[serde(default)]
    pub status: TranslationStatus,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<TranslationQuestion>,
    #[serde(default)]
    pub options: Vec<TranslationOption>,
    #[serde(default)]
    pub rows: Vec<TranslationQuestionRow>,
    #[serde(default)]
    pub columns: Vec<TranslationQuestionColumn>,
}

impl TranslationSurvey {
    /// Direct (scan) lookup path; the indexed path goes through
    /// [`crate::prefetch::SurveyPrefetch`].
    pub fn question(&self, question_id: i64) -> Option<&TranslationQuestion> {
        self.questions.iter().find(|t| t.question_id == question_id)
    }

    pub fn option(&self, option_id: i64) -> Option<&TranslationOption> {
        self.options.iter().find(|t| t.option_id == option_id)
    }

    pub fn row(&self, row_id: i64) -> Option<&TranslationQuestionRow> {
        self.rows.iter().find(|t| t.row_id == row_id)
    }

    pub fn column(&self, column_id: i64) -> Option<&TranslationQuestionColumn> {
        self.columns.iter().find(|t| t.column_id == column_id)
    }
}

fn overlay<'a>(translated: Option<&'a str>, base: &'a str) -> &'a str {
    match translated {
        Some(text) if !text.is_empty() => text,
        _ => base,
    }
}

pub fn survey_title<'a>(survey: &'a Survey, translation: Option<&'a TranslationSurvey>) -> &'a str {
    overlay(translation.map(|t| t.title.as_str()), &survey.title)
}

pub fn question_title<'a>(
    question: &'a Question,
    translation: Option<&'a TranslationSurvey>,
) -> &'a str {
    let t = translation.and_then(|t| t.question(question.id));
    overlay(t.map(|t| t.title.as_str()), &question.title)
}

pub fn question_description<'a>(
    question: &'a Question,
    translation: Option<&'a TranslationSurvey>,
) -> &'a str {
    let t = translation.and_then(|t| t.question(question.id));
    overlay(t.map(|t| t.description.as_str()), &question.description)
}

pub fn question_error_message<'a>(
    question: &'a Question,
    translation: Option<&'a TranslationSurvey>,
) -> &'a str {
    let t = translation.and_then(|t| t.question(question.id));
    overlay(t.map(|t| t.error_message.as_str()), &question.error_message)
}

pub fn option_text<'a>(
    option: &'a ChoiceOption,
    translation: Option<&'a TranslationSurvey>,
) -> &'a str {
    let t = translation.and_then(|t| t.option(option.id));
    overlay(t.map(|t| t.text.as_str()), &option.text)
}

pub fn row_title<'a>(
    row: &'a QuestionRow,
    translation: Option<&'a TranslationSurvey>,
) -> &'a str {
    let t = translation.and_then(|t| t.row(row.id));
    overlay(t.map(|t| t.title.as_str()), &row.title)
}

pub fn column_title<'a>(
    column: &'a QuestionColumn,
    translation: Option<&'a TranslationSurvey>,
) -> &'a str {
    let t = translation.and_then(|t| t.column(column.id));
    overlay(t.map(|t| t.title.as_str()), &column.title)
}
