//! Publish and unpublish a survey against a storage engine.
//!
//! Publishing compiles the survey into a results table and installs any
//! auxiliary statements. A table left over under the same name (from a
//! previous incarnation of the shortname) is renamed aside, never dropped.
//! These steps run one by one against the engine; a failure partway leaves
//! the earlier steps in place.

use chrono::Utc;
use pollster_model::{Survey, SurveyStatus};
use pollster_schema::TypeRegistry;
use tracing::info;

use crate::engine::StorageEngine;
use crate::error::Result;
use crate::extras::{survey_extra_statements, survey_extra_teardown};
use crate::model::ResultsModel;

const BACKUP_TIMESTAMP: &str = "%Y%m%d%H%M%S";

/// Picks a backup name that does not collide with an existing table.
///
/// Two renames within the same second would otherwise produce the same
/// timestamped name.
fn unique_backup_name(engine: &dyn StorageEngine, base: &str) -> String {
    if !engine.has_table(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if !engine.has_table(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Publishes `survey`, making it the live version of its shortname.
///
/// Returns consistency problems found by [`Survey::check`]; a non-empty
/// vector means nothing was changed. Any published peer sharing the
/// shortname is unpublished first, its data renamed aside.
pub fn publish(
    survey: &mut Survey,
    peers: &mut [Survey],
    engine: &mut dyn StorageEngine,
    registry: &TypeRegistry,
) -> Result<Vec<String>> {
    if survey.is_published() {
        return Ok(Vec::new());
    }
    let problems = survey.check();
    if !problems.is_empty() {
        return Ok(problems);
    }
    let model = ResultsModel::compile(survey, registry)?;

    for peer in peers.iter_mut() {
        if peer.id != survey.id && peer.shortname == survey.shortname && peer.is_published() {
            unpublish(peer, engine)?;
        }
    }

    let table = model.table_name();
    if engine.has_table(table) {
        let stamp = Utc::now().format(BACKUP_TIMESTAMP);
        let backup = unique_backup_name(engine, &format!("{table}_vx_{stamp}"));
        info!(table, backup = %backup, "renaming leftover results table aside");
        engine.rename_table(table, &backup)?;
    }

    engine.create_table(table, model.empty_frame())?;
    info!(table, survey_id = survey.id, "created results table");

    for statement in survey_extra_statements(engine.kind(), &survey.shortname) {
        statement.apply(engine)?;
    }

    survey.status = SurveyStatus::Published;
    Ok(Vec::new())
}

/// Unpublishes `survey`, renaming its results table to a versioned backup.
pub fn unpublish(survey: &mut Survey, engine: &mut dyn StorageEngine) -> Result<()> {
    if !survey.is_published() {
        return Ok(());
    }
    let table = survey.table_name();
    if engine.has_table(&table) {
        let version = if survey.version.is_empty() {
            "0"
        } else {
            survey.version.as_str()
        };
        let stamp = Utc::now().format(BACKUP_TIMESTAMP);
        let backup = unique_backup_name(engine, &format!("{table}_v{version}_{stamp}"));
        info!(table = %table, backup = %backup, survey_id = survey.id, "archiving results table");
        engine.rename_table(&table, &backup)?;
    }
    // Extra views reference the live table by name; they come down with it.
    for statement in survey_extra_teardown(&survey.shortname) {
        statement.apply(engine)?;
    }
    survey.status = SurveyStatus::Unpublished;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngine;
    use crate::submit::{append_submission, Record};
    use pollster_model::{ChoiceOption, Question, QuestionType};
    use serde_json::json;

    fn survey(id: i64, shortname: &str) -> Survey {
        let question = Question {
            id: 1,
            ordinal: 1,
            title: "Symptoms".into(),
            kind: QuestionType::MultipleChoice,
            data_type: "Numeric".into(),
            data_name: "Q1".into(),
            options: vec![ChoiceOption {
                id: 1,
                ordinal: 1,
                text: "None".into(),
                value: "0".into(),
                ..ChoiceOption::default()
            }],
            ..Question::default()
        };
        let mut survey = Survey::new(id, shortname);
        survey.title = shortname.to_string();
        survey.questions.push(question);
        survey
    }

    #[test]
    fn publish_creates_the_results_table() {
        let registry = TypeRegistry::builtin();
        let mut engine = MemoryEngine::new();
        let mut s = survey(1, "intake");
        let problems = publish(&mut s, &mut [], &mut engine, &registry).unwrap();
        assert!(problems.is_empty());
        assert!(s.is_published());
        assert!(engine.has_table("results_intake"));
    }

    #[test]
    fn publish_is_a_noop_when_already_published() {
        let registry = TypeRegistry::builtin();
        let mut engine = MemoryEngine::new();
        let mut s = survey(1, "intake");
        publish(&mut s, &mut [], &mut engine, &registry).unwrap();
        // No TableExists error on the second call.
        let problems = publish(&mut s, &mut [], &mut engine, &registry).unwrap();
        assert!(problems.is_empty());
    }

    #[test]
    fn check_failures_block_publish() {
        let registry = TypeRegistry::builtin();
        let mut engine = MemoryEngine::new();
        let mut s = survey(1, "intake");
        s.questions[0].data_name = "1bad".into();
        let problems = publish(&mut s, &mut [], &mut engine, &registry).unwrap();
        assert!(!problems.is_empty());
        assert!(!s.is_published(), "status must not change on failure");
        assert!(!engine.has_table("results_intake"));
    }

    #[test]
    fn publish_unpublishes_the_live_peer_and_keeps_its_data() {
        let registry = TypeRegistry::builtin();
        let mut engine = MemoryEngine::new();
        let mut old = survey(1, "weekly");
        old.version = "1".into();
        publish(&mut old, &mut [], &mut engine, &registry).unwrap();

        let model = ResultsModel::compile(&old, &registry).unwrap();
        let mut record = Record::new();
        record.insert("user".into(), json!(42));
        record.insert("global_id".into(), json!("gid-1"));
        record.insert("Q1_0".into(), json!(true));
        append_submission(&mut engine, &old, &model, &record, Utc::now())
            .unwrap()
            .unwrap();

        let mut new = survey(2, "weekly");
        let mut peers = [old];
        publish(&mut new, &mut peers, &mut engine, &registry).unwrap();

        assert!(!peers[0].is_published());
        assert!(new.is_published());
        // The new table is empty, the old data lives under a versioned name.
        assert_eq!(engine.read_table("results_weekly").unwrap().height(), 0);
        let backup = engine
            .table_names()
            .into_iter()
            .find(|n| n.starts_with("results_weekly_v1_"))
            .expect("archived table");
        assert_eq!(engine.read_table(&backup).unwrap().height(), 1);
    }

    #[test]
    fn weekly_publish_installs_the_health_status_view() {
        let registry = TypeRegistry::builtin();
        let mut engine = MemoryEngine::new();
        let mut s = survey(1, "weekly");
        publish(&mut s, &mut [], &mut engine, &registry).unwrap();
        assert!(engine.has_view("health_status"));
        // This weekly survey lacks most symptom fields, so the view cannot
        // plan. The results table must stay queryable regardless.
        let df = engine.query("SELECT * FROM results_weekly").unwrap();
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn unpublish_removes_the_health_status_view() {
        let registry = TypeRegistry::builtin();
        let mut engine = MemoryEngine::new();
        engine
            .create_table(
                "results_intake",
                ResultsModel::compile(&survey(2, "intake"), &registry)
                    .unwrap()
                    .empty_frame(),
            )
            .unwrap();
        let mut s = survey(1, "weekly");
        publish(&mut s, &mut [], &mut engine, &registry).unwrap();
        unpublish(&mut s, &mut engine).unwrap();
        assert!(!engine.has_view("health_status"));
        // Other tables stay queryable after the weekly table is archived.
        let df = engine.query("SELECT * FROM results_intake").unwrap();
        assert_eq!(df.height(), 0);
    }

    #[test]
    fn unpublish_version_defaults_to_zero() {
        let registry = TypeRegistry::builtin();
        let mut engine = MemoryEngine::new();
        let mut s = survey(1, "intake");
        publish(&mut s, &mut [], &mut engine, &registry).unwrap();
        unpublish(&mut s, &mut engine).unwrap();
        assert!(engine
            .table_names()
            .iter()
            .any(|n| n.starts_with("results_intake_v0_")));
    }

    #[test]
    fn backup_names_stay_unique_within_one_second() {
        let registry = TypeRegistry::builtin();
        let mut engine = MemoryEngine::new();
        let mut s = survey(1, "intake");
        for _ in 0..3 {
            publish(&mut s, &mut [], &mut engine, &registry).unwrap();
            unpublish(&mut s, &mut engine).unwrap();
        }
        let backups: Vec<String> = engine
            .table_names()
            .into_iter()
            .filter(|n| n.starts_with("results_intake_v0_"))
            .collect();
        assert_eq!(backups.len(), 3);
    }
}
