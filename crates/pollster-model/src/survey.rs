use serde::{Deserialize, Serialize};

use crate::enums::SurveyStatus;
use crate::identifier::is_identifier;
use crate::prefill::PrefillPolicy;
use crate::question::Question;
use crate::rule::Rule;

/// A survey as authored: ordered questions plus lifecycle state.
///
/// The shortname doubles as the root of the survey's storage table name
/// (`results_<shortname>`), so once published it is immutable in effect:
/// changing it orphans previously collected storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: i64,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub title: String,
    pub shortname: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: SurveyStatus,
    #[serde(default)]
    pub prefill_method: PrefillPolicy,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Survey {
    pub fn new(id: i64, shortname: impl Into<String>) -> Self {
        Self {
            id,
            shortname: shortname.into(),
            ..Self::default()
        }
    }

    pub fn is_published(&self) -> bool {
        self.status.is_published()
    }

    pub fn is_editable(&self) -> bool {
        self.status.is_editable()
    }

    /// Questions in ordinal order. Authoring tools may append out of order;
    /// all schema-facing consumers must see the stable ordering.
    pub fn ordered_questions(&self) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self.questions.iter().collect();
        questions.sort_by_key(|q| q.ordinal);
        questions
    }

    /// Name of the live results table for this survey.
    pub fn table_name(&self) -> String {
        format!("results_{}", self.shortname)
    }

    /// Validate the survey and everything it owns, returning human-readable
    /// problems. An empty list means the survey can be published.
    pub fn check(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.shortname.is_empty() {
            errors.push("Missing survey shortname".to_string());
        } else if !is_identifier(&self.shortname) {
            errors.push(format!("Invalid survey shortname \"{}\"", self.shortname));
        }
        for question in self.ordered_questions() {
            errors.extend(question.check());
        }
        errors
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::QuestionType;

    fn survey_with_questions() -> Survey {
        let mut survey = Survey::new(7, "weekly");
        survey.questions.push(Question {
            id: 2,
            ordinal: 2,
            title: "Fever".into(),
            kind: QuestionType::Text,
            data_type: "Text".into(),
            data_name: "Q2".into(),
            ..Question::default()
        });
        survey.questions.push(Question {
            id: 1,
            ordinal: 1,
            title: "Symptoms".into(),
            kind: QuestionType::Text,
            data_type: "Text".into(),
            data_name: "Q1".into(),
            ..Question::default()
        });
        survey
    }

    #[test]
    fn questions_ordered_by_ordinal() {
        let survey = survey_with_questions();
        let names: Vec<&str> = survey
            .ordered_questions()
            .iter()
            .map(|q| q.data_name.as_str())
            .collect();
        assert_eq!(names, vec!["Q1", "Q2"]);
    }

    #[test]
    fn check_flags_missing_and_invalid_shortname() {
        let mut survey = survey_with_questions();
        survey.shortname = String::new();
        assert_eq!(survey.check(), vec!["Missing survey shortname".to_string()]);
        survey.shortname = "bad-name".into();
        assert_eq!(
            survey.check(),
            vec!["Invalid survey shortname \"bad-name\"".to_string()]
        );
    }

    #[test]
    fn table_name_derives_from_shortname() {
        assert_eq!(survey_with_questions().table_name(), "results_weekly");
    }
}
