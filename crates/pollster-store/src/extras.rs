//! Auxiliary statements installed alongside a survey's results table.
//!
//! Some surveys carry derived views that downstream consumers query
//! directly. They are applied after the table is created on publish and
//! are keyed by storage backend, since identifier quoting differs.

use crate::engine::{BackendKind, StorageEngine};
use crate::error::Result;

/// One statement to run against the storage engine after publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraStatement {
    DropView(String),
    CreateView { name: String, sql: String },
}

impl ExtraStatement {
    pub fn apply(&self, engine: &mut dyn StorageEngine) -> Result<()> {
        match self {
            Self::DropView(name) => engine.drop_view(name),
            Self::CreateView { name, sql } => engine.create_view(name, sql),
        }
    }
}

/// Derived health status per response, classified from the symptom answers.
///
/// The gastrointestinal and common-cold branches require at least two of
/// their symptoms, counted by summing per-symptom CASE expressions. The
/// common-cold branches come after all allergy-related branches.
fn health_status_sql(quote: &str) -> String {
    let q = |ident: &str| format!("{quote}{ident}{quote}");
    let one_if = |ident: &str| format!("CASE WHEN {} THEN 1 ELSE 0 END", q(ident));
    let gastro = format!(
        "{} + {} + {} + {} >= 2",
        one_if("Q1_17"),
        one_if("Q1_15"),
        one_if("Q1_16"),
        one_if("Q1_18"),
    );
    let cold = format!(
        "{} + {} + {} + {} >= 2",
        one_if("Q1_3"),
        one_if("Q1_4"),
        one_if("Q1_6"),
        one_if("Q1_5"),
    );
    let allergy = format!(
        "(NOT {q1_1}) AND (NOT {q1_2}) AND ({q6d} = 0 OR {q6d} IS NULL)\n\
                AND ({q1_3} OR {q1_4} OR {q1_14}) AND {q11} = 2",
        q1_1 = q("Q1_1"),
        q1_2 = q("Q1_2"),
        q1_3 = q("Q1_3"),
        q1_4 = q("Q1_4"),
        q1_14 = q("Q1_14"),
        q6d = q("Q6d"),
        q11 = q("Q11"),
    );
    format!(
        "SELECT {user}, {gid}, {ts},\n\
         CASE\n\
           WHEN {q1_0} THEN 'NO-SYMPTOMS'\n\
           WHEN ({q5} = 0 OR {q6b} = 0)\n\
                AND ({q1_1} OR {q1_2} OR {q6d} = 3 OR {q6d} = 4 OR {q6d} = 5\n\
                     OR {q1_11} OR {q1_8} OR {q1_9})\n\
                AND ({q1_5} OR {q1_6} OR {q1_7})\n\
             THEN 'ILI'\n\
           WHEN ({allergy})\n\
                AND ({gastro})\n\
             THEN 'ALLERGY-or-HAY-FEVER-and-GASTROINTESTINAL'\n\
           WHEN {allergy}\n\
             THEN 'ALLERGY-or-HAY-FEVER'\n\
           WHEN ({cold})\n\
                AND ({gastro})\n\
             THEN 'COMMON-COLD-and-GASTROINTESTINAL'\n\
           WHEN {cold}\n\
             THEN 'COMMON-COLD'\n\
           WHEN {gastro}\n\
             THEN 'GASTROINTESTINAL'\n\
           ELSE 'NON-SPECIFIC-SYMPTOMS'\n\
         END AS status\n\
         FROM {table}",
        user = q("user"),
        gid = q("global_id"),
        ts = q("timestamp"),
        table = q("results_weekly"),
        q1_0 = q("Q1_0"),
        q1_1 = q("Q1_1"),
        q1_2 = q("Q1_2"),
        q1_5 = q("Q1_5"),
        q1_6 = q("Q1_6"),
        q1_7 = q("Q1_7"),
        q1_8 = q("Q1_8"),
        q1_9 = q("Q1_9"),
        q1_11 = q("Q1_11"),
        q5 = q("Q5"),
        q6b = q("Q6b"),
        q6d = q("Q6d"),
    )
}

/// Statements a survey's publish must run, in order, for the given backend.
///
/// Only the weekly symptom survey carries extras today: a `health_status`
/// view deriving a coarse illness classification from the raw answers.
pub fn survey_extra_statements(kind: BackendKind, shortname: &str) -> Vec<ExtraStatement> {
    if shortname != "weekly" {
        return Vec::new();
    }
    let quote = match kind {
        BackendKind::Disk => "\"",
        BackendKind::Memory => "",
    };
    vec![
        ExtraStatement::DropView("health_status".to_string()),
        ExtraStatement::CreateView {
            name: "health_status".to_string(),
            sql: health_status_sql(quote),
        },
    ]
}

/// Statements undoing a survey's extras when it leaves publication.
pub fn survey_extra_teardown(shortname: &str) -> Vec<ExtraStatement> {
    if shortname != "weekly" {
        return Vec::new();
    }
    vec![ExtraStatement::DropView("health_status".to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_weekly_survey_carries_extras() {
        assert!(survey_extra_statements(BackendKind::Memory, "intake").is_empty());
        let extras = survey_extra_statements(BackendKind::Memory, "weekly");
        assert_eq!(extras.len(), 2);
        assert_eq!(extras[0], ExtraStatement::DropView("health_status".into()));
        assert!(survey_extra_teardown("intake").is_empty());
        assert_eq!(
            survey_extra_teardown("weekly"),
            vec![ExtraStatement::DropView("health_status".into())]
        );
    }

    #[test]
    fn disk_backend_quotes_identifiers() {
        let extras = survey_extra_statements(BackendKind::Disk, "weekly");
        let ExtraStatement::CreateView { sql, .. } = &extras[1] else {
            panic!("expected a view");
        };
        assert!(sql.contains("\"Q1_0\""));
        assert!(sql.contains("FROM \"results_weekly\""));
    }

    #[test]
    fn classification_counts_two_or_more_symptoms() {
        let extras = survey_extra_statements(BackendKind::Memory, "weekly");
        let ExtraStatement::CreateView { sql, .. } = &extras[1] else {
            panic!("expected a view");
        };
        assert!(sql.contains("CASE WHEN Q1_17 THEN 1 ELSE 0 END"));
        assert!(sql.contains(">= 2"));
        assert!(sql.contains("Q6d = 0 OR Q6d IS NULL"));
        assert!(sql.contains("Q6d = 3 OR Q6d = 4 OR Q6d = 5"));
    }
}
