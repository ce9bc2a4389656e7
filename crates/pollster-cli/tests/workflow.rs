//! End-to-end workspace workflow: author, publish, submit, export, chart.

use std::fs;

use pollster_charts::{Chart, ChartKind, ChartStatus, SqlFilter};
use pollster_cli::cli::{ChartReadArgs, ChartSelector, ExportArgs, SubmitArgs, SurveySelector};
use pollster_cli::commands::{
    run_chart_data, run_chart_rebuild, run_export, run_survey_check, run_survey_publish,
    run_survey_submit,
};
use pollster_cli::workspace::{SurveyFile, Workspace};
use pollster_model::{ChoiceOption, Question, QuestionType, Survey};
use tempfile::TempDir;

fn selector(shortname: &str) -> SurveySelector {
    SurveySelector {
        shortname: shortname.to_string(),
        id: None,
    }
}

fn sample_survey() -> Survey {
    let question = Question {
        id: 1,
        ordinal: 1,
        title: "Symptoms".into(),
        kind: QuestionType::MultipleChoice,
        data_type: "Numeric".into(),
        data_name: "Q1".into(),
        options: vec![
            ChoiceOption {
                id: 1,
                ordinal: 1,
                text: "No symptoms".into(),
                value: "0".into(),
                ..ChoiceOption::default()
            },
            ChoiceOption {
                id: 2,
                ordinal: 2,
                text: "Fever".into(),
                value: "1".into(),
                ..ChoiceOption::default()
            },
        ],
        ..Question::default()
    };
    let mut survey = Survey::new(1, "weekly");
    survey.title = "Weekly symptoms".into();
    survey.questions.push(question);
    survey
}

fn workspace_with_survey() -> (TempDir, Workspace) {
    let tmp = tempfile::tempdir().unwrap();
    let ws = Workspace::new(tmp.path());
    fs::create_dir_all(ws.surveys_dir()).unwrap();
    fs::create_dir_all(ws.charts_dir()).unwrap();
    ws.save_survey(&SurveyFile {
        path: ws.surveys_dir().join("weekly.json"),
        survey: sample_survey(),
    })
    .unwrap();
    (tmp, ws)
}

#[test]
fn publish_submit_export_round_trip() {
    let (tmp, ws) = workspace_with_survey();

    assert!(run_survey_check(&ws, &selector("weekly")).unwrap());
    assert!(run_survey_publish(&ws, &selector("weekly")).unwrap());
    assert!(ws.data_dir().join("results_weekly.csv").exists());

    // The published status was written back to the survey file.
    let reloaded = ws.load_surveys().unwrap();
    assert!(reloaded[0].survey.is_published());

    let record_path = tmp.path().join("record.json");
    fs::write(
        &record_path,
        r#"{"user": 42, "global_id": "g-1", "Q1_1": true}"#,
    )
    .unwrap();
    let accepted = run_survey_submit(
        &ws,
        &SubmitArgs {
            survey: selector("weekly"),
            record: record_path.clone(),
        },
    )
    .unwrap();
    assert!(accepted);

    let out_path = tmp.path().join("export.csv");
    run_export(
        &ws,
        &ExportArgs {
            survey: selector("weekly"),
            output: Some(out_path.clone()),
        },
    )
    .unwrap();
    let exported = fs::read_to_string(&out_path).unwrap();
    assert!(exported.starts_with("User,Person,Channel,Timestamp"));
    assert!(exported.lines().count() >= 2);
}

#[test]
fn invalid_submission_is_rejected_with_exit_status() {
    let (tmp, ws) = workspace_with_survey();

    // Make the choice mandatory so an empty record fails validation.
    let mut surveys = ws.load_surveys().unwrap();
    surveys[0].survey.questions[0].is_mandatory = true;
    ws.save_survey(&surveys[0]).unwrap();

    run_survey_publish(&ws, &selector("weekly")).unwrap();
    let record_path = tmp.path().join("record.json");
    fs::write(&record_path, r#"{"user": 42, "global_id": "g-1"}"#).unwrap();
    let accepted = run_survey_submit(
        &ws,
        &SubmitArgs {
            survey: selector("weekly"),
            record: record_path,
        },
    )
    .unwrap();
    assert!(!accepted);
}

#[test]
fn chart_rebuild_and_data_read_from_the_workspace() {
    let (tmp, ws) = workspace_with_survey();
    run_survey_publish(&ws, &selector("weekly")).unwrap();

    let record_path = tmp.path().join("record.json");
    fs::write(
        &record_path,
        r#"{"user": 42, "global_id": "g-1", "Q1_0": true}"#,
    )
    .unwrap();
    run_survey_submit(
        &ws,
        &SubmitArgs {
            survey: selector("weekly"),
            record: record_path,
        },
    )
    .unwrap();

    let chart = Chart {
        survey_id: 1,
        survey_shortname: "weekly".into(),
        shortname: "totals".into(),
        kind: ChartKind::Table,
        status: ChartStatus::Published,
        sqlsource: "SELECT COUNT(*) AS responses FROM results_weekly".into(),
        sqlfilter: SqlFilter::None,
        realtime: false,
        geotable: "zip_codes".into(),
        chartwrapper: String::new(),
        template: String::new(),
    };
    fs::write(
        ws.charts_dir().join("totals.json"),
        serde_json::to_string_pretty(&chart).unwrap(),
    )
    .unwrap();

    let chart_selector = ChartSelector {
        survey: "weekly".into(),
        chart: "totals".into(),
    };
    run_chart_rebuild(&ws, &chart_selector).unwrap();
    assert!(ws.data_dir().join("charts_weekly_totals.csv").exists());
    run_chart_data(
        &ws,
        &ChartReadArgs {
            chart: ChartSelector {
                survey: "weekly".into(),
                chart: "totals".into(),
            },
            user_id: 0,
            global_id: String::new(),
            json: false,
        },
    )
    .unwrap();
    // The template-context form of the same rows.
    run_chart_data(
        &ws,
        &ChartReadArgs {
            chart: chart_selector,
            user_id: 0,
            global_id: String::new(),
            json: true,
        },
    )
    .unwrap();
}
