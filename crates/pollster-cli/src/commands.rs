//! Command implementations.

use std::fs;
use std::io;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::Table;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use pollster_charts::{load_colors, load_data, template_rows, update_data, update_table};
use pollster_schema::TypeRegistry;
use pollster_store::{
    Record, ResultsModel, append_submission, prefill, publish, unpublish, write_results_csv,
};
use tracing::info;

use crate::cli::{ChartReadArgs, ChartSelector, ExportArgs, PrefillArgs, SubmitArgs, SurveySelector};
use crate::workspace::{SurveyFile, Workspace, select_chart, select_survey};

fn styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table
}

pub fn run_survey_list(workspace: &Workspace) -> Result<()> {
    let surveys = workspace.load_surveys()?;
    let mut table = styled_table();
    table.set_header(vec!["Id", "Shortname", "Version", "Status", "Questions"]);
    for file in &surveys {
        let s = &file.survey;
        table.add_row(vec![
            s.id.to_string(),
            s.shortname.clone(),
            s.version.clone(),
            s.status.as_str().to_string(),
            s.questions.len().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Returns whether the survey passed its consistency check.
pub fn run_survey_check(workspace: &Workspace, args: &SurveySelector) -> Result<bool> {
    let surveys = workspace.load_surveys()?;
    let index = select_survey(&surveys, &args.shortname, args.id)?;
    let problems = surveys[index].survey.check();
    if problems.is_empty() {
        println!("{}: ok", args.shortname);
        return Ok(true);
    }
    for problem in &problems {
        println!("{}: {problem}", args.shortname);
    }
    Ok(false)
}

/// Returns whether the publish went through.
pub fn run_survey_publish(workspace: &Workspace, args: &SurveySelector) -> Result<bool> {
    let mut surveys = workspace.load_surveys()?;
    let index = select_survey(&surveys, &args.shortname, args.id)?;
    let mut engine = workspace.open_engine()?;
    let registry = TypeRegistry::builtin();

    let (target, peers) = take_target(&mut surveys, index);
    let mut survey = target.survey;
    let mut peer_surveys: Vec<_> = peers.iter().map(|f| f.survey.clone()).collect();
    let problems = publish(&mut survey, &mut peer_surveys, &mut engine, &registry)?;
    if !problems.is_empty() {
        for problem in &problems {
            println!("{}: {problem}", args.shortname);
        }
        return Ok(false);
    }
    // Persist the status changes, the unpublished peers included.
    workspace.save_survey(&SurveyFile {
        path: target.path,
        survey,
    })?;
    for (file, survey) in peers.into_iter().zip(peer_surveys) {
        workspace.save_survey(&SurveyFile {
            path: file.path,
            survey,
        })?;
    }
    info!(shortname = %args.shortname, "survey published");
    Ok(true)
}

pub fn run_survey_unpublish(workspace: &Workspace, args: &SurveySelector) -> Result<()> {
    let mut surveys = workspace.load_surveys()?;
    let index = select_survey(&surveys, &args.shortname, args.id)?;
    let mut engine = workspace.open_engine()?;
    let file = &mut surveys[index];
    unpublish(&mut file.survey, &mut engine)?;
    workspace.save_survey(file)?;
    info!(shortname = %args.shortname, "survey unpublished");
    Ok(())
}

/// Returns whether the submission was accepted.
pub fn run_survey_submit(workspace: &Workspace, args: &SubmitArgs) -> Result<bool> {
    let surveys = workspace.load_surveys()?;
    let index = select_survey(&surveys, &args.survey.shortname, args.survey.id)?;
    let survey = &surveys[index].survey;
    let registry = TypeRegistry::builtin();
    let model = ResultsModel::compile(survey, &registry)?;
    let mut engine = workspace.open_engine()?;

    let text = fs::read_to_string(&args.record)
        .with_context(|| format!("reading {}", args.record.display()))?;
    let record: Record = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.record.display()))?;

    match append_submission(&mut engine, survey, &model, &record, Utc::now())? {
        Ok(()) => {
            println!("stored 1 response in {}", model.table_name());
            Ok(true)
        }
        Err(issues) => {
            for issue in &issues {
                println!("{}: {}", issue.field, issue.message);
            }
            Ok(false)
        }
    }
}

fn take_target(surveys: &mut Vec<SurveyFile>, index: usize) -> (SurveyFile, Vec<SurveyFile>) {
    let target = surveys.remove(index);
    let peers = std::mem::take(surveys);
    (target, peers)
}

pub fn run_export(workspace: &Workspace, args: &ExportArgs) -> Result<()> {
    let surveys = workspace.load_surveys()?;
    let index = select_survey(&surveys, &args.survey.shortname, args.survey.id)?;
    let survey = &surveys[index].survey;
    let registry = TypeRegistry::builtin();
    let model = ResultsModel::compile(survey, &registry)?;
    let engine = workspace.open_engine()?;

    match &args.output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_results_csv(&engine, &model, file)?;
            println!("wrote {}", path.display());
        }
        None => write_results_csv(&engine, &model, io::stdout().lock())?,
    }
    Ok(())
}

pub fn run_chart_rebuild(workspace: &Workspace, args: &ChartSelector) -> Result<()> {
    let charts = workspace.load_charts()?;
    let chart = select_chart(&charts, &args.survey, &args.chart)?;
    let mut engine = workspace.open_engine()?;
    let cache = workspace.tile_cache();
    if update_table(chart, &mut engine, &cache)? {
        println!("rebuilt {}", chart.table_name());
    } else {
        println!("{}: nothing to build (no query)", chart.shortname);
    }
    Ok(())
}

pub fn run_chart_refresh(workspace: &Workspace, args: &ChartSelector) -> Result<()> {
    let charts = workspace.load_charts()?;
    let chart = select_chart(&charts, &args.survey, &args.chart)?;
    let mut engine = workspace.open_engine()?;
    let cache = workspace.tile_cache();
    if update_data(chart, &mut engine, &cache)? {
        println!("refreshed {}", chart.table_name());
    } else {
        println!("{}: nothing to refresh", chart.shortname);
    }
    Ok(())
}

pub fn run_chart_data(workspace: &Workspace, args: &ChartReadArgs) -> Result<()> {
    let charts = workspace.load_charts()?;
    let chart = select_chart(&charts, &args.chart.survey, &args.chart.chart)?;
    let engine = workspace.open_engine()?;
    let data = load_data(&engine, chart, args.user_id, &args.global_id);

    if args.json {
        let (_, rows) = template_rows(&data);
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = styled_table();
    table.set_header(data.columns.clone());
    for row in &data.rows {
        table.add_row(row.iter().map(cell_text));
    }
    println!("{table}");
    Ok(())
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn run_chart_colors(workspace: &Workspace, args: &ChartReadArgs) -> Result<()> {
    let charts = workspace.load_charts()?;
    let chart = select_chart(&charts, &args.chart.survey, &args.chart.chart)?;
    let engine = workspace.open_engine()?;
    for color in load_colors(&engine, chart, args.user_id, &args.global_id) {
        println!("{color}");
    }
    Ok(())
}

pub fn run_prefill(workspace: &Workspace, args: &PrefillArgs) -> Result<()> {
    let surveys = workspace.load_surveys()?;
    let index = select_survey(&surveys, &args.survey.shortname, args.survey.id)?;
    let survey = &surveys[index].survey;
    let registry = TypeRegistry::builtin();
    let model = ResultsModel::compile(survey, &registry)?;
    let engine = workspace.open_engine()?;

    match prefill(
        &engine,
        survey.prefill_method,
        &model,
        args.user_id,
        &args.global_id,
    )? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("no prefill data"),
    }
    Ok(())
}
