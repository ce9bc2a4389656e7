//! CLI argument definitions for the pollster tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "pollster",
    version,
    about = "Epidemiological survey platform - author, publish and analyze surveys",
    long_about = "Author surveys, publish them into dynamic results tables,\n\
                  collect submissions, and build charts and map views over\n\
                  the stored responses."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Authoring workspace directory (surveys/, charts/, data/, tiles/).
    #[arg(
        long = "workspace",
        value_name = "DIR",
        default_value = ".",
        global = true
    )]
    pub workspace: PathBuf,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Survey authoring and lifecycle.
    #[command(subcommand)]
    Survey(SurveyCommand),

    /// Export a survey's results as CSV.
    Export(ExportArgs),

    /// Chart tables, map views and read paths.
    #[command(subcommand)]
    Chart(ChartCommand),

    /// Show the record a participant's next submission starts from.
    Prefill(PrefillArgs),
}

#[derive(Subcommand)]
pub enum SurveyCommand {
    /// List the surveys in the workspace.
    List,

    /// Check a survey definition for consistency problems.
    Check(SurveySelector),

    /// Publish a survey, creating its results table.
    Publish(SurveySelector),

    /// Unpublish a survey, archiving its results table.
    Unpublish(SurveySelector),

    /// Validate and store one submission read from a JSON file.
    Submit(SubmitArgs),
}

#[derive(Parser)]
pub struct SurveySelector {
    /// Survey shortname.
    #[arg(value_name = "SHORTNAME")]
    pub shortname: String,

    /// Disambiguate when several survey versions share the shortname.
    #[arg(long = "id")]
    pub id: Option<i64>,
}

#[derive(Parser)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub survey: SurveySelector,

    /// JSON file with one response object keyed by field name.
    #[arg(value_name = "RECORD_FILE")]
    pub record: PathBuf,
}

#[derive(Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub survey: SurveySelector,

    /// Output file (default: stdout).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ChartCommand {
    /// Rebuild a chart's table and map view from its query.
    Rebuild(ChartSelector),

    /// Re-materialize a chart's data without changing its shape.
    Refresh(ChartSelector),

    /// Run a chart's data query and print the rows.
    Data(ChartReadArgs),

    /// Print the distinct map colors of a chart.
    Colors(ChartReadArgs),
}

#[derive(Parser)]
pub struct ChartSelector {
    /// Shortname of the survey the chart belongs to.
    #[arg(value_name = "SURVEY")]
    pub survey: String,

    /// Chart shortname.
    #[arg(value_name = "CHART")]
    pub chart: String,
}

#[derive(Parser)]
pub struct ChartReadArgs {
    #[command(flatten)]
    pub chart: ChartSelector,

    /// Account id for user-scoped charts.
    #[arg(long = "user", default_value_t = 0)]
    pub user_id: i64,

    /// Household member id for person-scoped charts.
    #[arg(long = "global-id", default_value = "")]
    pub global_id: String,

    /// Print rows as JSON objects, the form a chart template consumes.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct PrefillArgs {
    #[command(flatten)]
    pub survey: SurveySelector,

    /// Account id of the participant.
    #[arg(long = "user")]
    pub user_id: i64,

    /// Household member id of the participant.
    #[arg(long = "global-id")]
    pub global_id: String,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
