//! Bulk-loaded lookup indexes for one survey.
//!
//! Rendering a survey touches rules and translations for every question and
//! option. Instead of per-entity scans (or hidden lazily-populated cache
//! fields), callers build a [`SurveyPrefetch`] once and pass it where bulk
//! access is needed; entities themselves stay plain data. Absence of a
//! prefetch means the scan-based lookup paths on the entities apply.

use std::collections::HashMap;

use crate::i18n::{
    TranslationOption, TranslationQuestion, TranslationQuestionColumn, TranslationQuestionRow,
    TranslationSurvey,
};
use crate::question::{ChoiceOption, Question, QuestionColumn, QuestionRow};
use crate::rule::Rule;
use crate::survey::Survey;

/// Read-only snapshot of a survey's rule and translation indexes.
///
/// This is not a live cache: it reflects the survey as it was when built
/// and must be rebuilt after authoring changes.
pub struct SurveyPrefetch<'a> {
    rules_by_subject: HashMap<i64, Vec<&'a Rule>>,
    question_overlays: HashMap<i64, &'a TranslationQuestion>,
    option_overlays: HashMap<i64, &'a TranslationOption>,
    row_overlays: HashMap<i64, &'a TranslationQuestionRow>,
    column_overlays: HashMap<i64, &'a TranslationQuestionColumn>,
}

impl<'a> SurveyPrefetch<'a> {
    pub fn new(survey: &'a Survey, translation: Option<&'a TranslationSurvey>) -> Self {
        let mut rules_by_subject: HashMap<i64, Vec<&'a Rule>> = HashMap::new();
        for rule in &survey.rules {
            rules_by_subject
                .entry(rule.subject_question)
                .or_default()
                .push(rule);
        }
        let mut question_overlays = HashMap::new();
        let mut option_overlays = HashMap::new();
        let mut row_overlays = HashMap::new();
        let mut column_overlays = HashMap::new();
        if let Some(translation) = translation {
            for t in &translation.questions {
                question_overlays.insert(t.question_id, t);
            }
            for t in &translation.options {
                option_overlays.insert(t.option_id, t);
            }
            for t in &translation.rows {
                row_overlays.insert(t.row_id, t);
            }
            for t in &translation.columns {
                column_overlays.insert(t.column_id, t);
            }
        }
        Self {
            rules_by_subject,
            question_overlays,
            option_overlays,
            row_overlays,
            column_overlays,
        }
    }

    /// Rules whose subject is the given question, in authoring order.
    pub fn rules_for(&self, question_id: i64) -> &[&'a Rule] {
        self.rules_by_subject
            .get(&question_id)
            .map(|rules| rules.as_slice())
            .unwrap_or(&[])
    }

    pub fn question_title(&self, question: &'a Question) -> &'a str {
        match self.question_overlays.get(&question.id) {
            Some(t) if !t.title.is_empty() => &t.title,
            _ => &question.title,
        }
    }

    pub fn question_error_message(&self, question: &'a Question) -> &'a str {
        match self.question_overlays.get(&question.id) {
            Some(t) if !t.error_message.is_empty() => &t.error_message,
            _ => &question.error_message,
        }
    }

    pub fn option_text(&self, option: &'a ChoiceOption) -> &'a str {
        match self.option_overlays.get(&option.id) {
            Some(t) if !t.text.is_empty() => &t.text,
            _ => &option.text,
        }
    }

    pub fn row_title(&self, row: &'a QuestionRow) -> &'a str {
        match self.row_overlays.get(&row.id) {
            Some(t) if !t.title.is_empty() => &t.title,
            _ => &row.title,
        }
    }

    pub fn column_title(&self, column: &'a QuestionColumn) -> &'a str {
        match self.column_overlays.get(&column.id) {
            Some(t) if !t.title.is_empty() => &t.title,
            _ => &column.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleType;

    #[test]
    fn rules_indexed_by_subject_question() {
        let mut survey = Survey::new(1, "weekly");
        survey.rules.push(Rule {
            id: 1,
            rule_type: RuleType {
                id: 1,
                title: "Show".into(),
                js_class: "ShowQuestion".into(),
            },
            is_sufficient: true,
            subject_question: 10,
            subject_options: vec![100],
            object_question: Some(11),
            object_options: vec![],
        });
        survey.rules.push(Rule {
            id: 2,
            subject_question: 10,
            ..Rule::default()
        });
        survey.rules.push(Rule {
            id: 3,
            subject_question: 12,
            ..Rule::default()
        });

        let prefetch = SurveyPrefetch::new(&survey, None);
        assert_eq!(prefetch.rules_for(10).len(), 2);
        assert_eq!(prefetch.rules_for(12).len(), 1);
        assert!(prefetch.rules_for(99).is_empty());
    }

    #[test]
    fn indexed_translation_agrees_with_scan_path() {
        let mut survey = Survey::new(1, "weekly");
        survey.questions.push(Question {
            id: 5,
            ordinal: 1,
            title: "Base".into(),
            ..Question::default()
        });
        let translation = TranslationSurvey {
            survey_id: 1,
            language: "it".into(),
            questions: vec![TranslationQuestion {
                question_id: 5,
                title: "Tradotto".into(),
                ..TranslationQuestion::default()
            }],
            ..TranslationSurvey::default()
        };
        let prefetch = SurveyPrefetch::new(&survey, Some(&translation));
        let question = &survey.questions[0];
        assert_eq!(prefetch.question_title(question), "Tradotto");
        assert_eq!(
            crate::i18n::question_title(question, Some(&translation)),
            prefetch.question_title(question)
        );
    }
}
