use serde::{Deserialize, Serialize};

/// Kind of conditional behavior a rule drives on the participant's form.
/// The `js_class` names the client-side evaluator; the core only stores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleType {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub js_class: String,
}

/// Conditional relation between a subject question/option set and an
/// optional object question/option set. Rules are advisory metadata for a
/// downstream evaluator; no cycle detection is performed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    pub rule_type: RuleType,
    /// Sufficient relations fire when any subject option matches;
    /// necessary ones require all of them.
    #[serde(default = "default_sufficient")]
    pub is_sufficient: bool,
    pub subject_question: i64,
    #[serde(default)]
    pub subject_options: Vec<i64>,
    #[serde(default)]
    pub object_question: Option<i64>,
    #[serde(default)]
    pub object_options: Vec<i64>,
}

fn default_sufficient() -> bool {
    true
}

impl Rule {
    pub fn js_class(&self) -> &str {
        &self.rule_type.js_class
    }
}
