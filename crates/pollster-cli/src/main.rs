//! Pollster survey platform CLI.

use clap::{ColorChoice, Parser};
use pollster_cli::cli::{ChartCommand, Cli, Command, LogFormatArg, LogLevelArg, SurveyCommand};
use pollster_cli::commands::{
    run_chart_colors, run_chart_data, run_chart_rebuild, run_chart_refresh, run_export,
    run_prefill, run_survey_check, run_survey_list, run_survey_publish, run_survey_submit,
    run_survey_unpublish,
};
use pollster_cli::logging::{LogConfig, LogFormat, init_logging};
use pollster_cli::workspace::Workspace;
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let workspace = Workspace::new(&cli.workspace);
    let outcome = match &cli.command {
        Command::Survey(command) => match command {
            SurveyCommand::List => run_survey_list(&workspace).map(|()| true),
            SurveyCommand::Check(args) => run_survey_check(&workspace, args),
            SurveyCommand::Publish(args) => run_survey_publish(&workspace, args),
            SurveyCommand::Unpublish(args) => run_survey_unpublish(&workspace, args).map(|()| true),
            SurveyCommand::Submit(args) => run_survey_submit(&workspace, args),
        },
        Command::Export(args) => run_export(&workspace, args).map(|()| true),
        Command::Chart(command) => match command {
            ChartCommand::Rebuild(args) => run_chart_rebuild(&workspace, args).map(|()| true),
            ChartCommand::Refresh(args) => run_chart_refresh(&workspace, args).map(|()| true),
            ChartCommand::Data(args) => run_chart_data(&workspace, args).map(|()| true),
            ChartCommand::Colors(args) => run_chart_colors(&workspace, args).map(|()| true),
        },
        Command::Prefill(args) => run_prefill(&workspace, args).map(|()| true),
    };
    let exit_code = match outcome {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
