//! The file-based authoring workspace.
//!
//! Layout under the workspace root:
//!
//! - `surveys/*.json` - one survey definition per file
//! - `charts/*.json` - one chart definition per file
//! - `data/` - the disk storage engine's table directory
//! - `tiles/` - cached rendered map tiles

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use pollster_charts::{Chart, TileCache};
use pollster_model::Survey;
use pollster_store::DiskEngine;

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

/// A survey definition together with the file it was loaded from, so
/// lifecycle status changes can be written back.
#[derive(Debug)]
pub struct SurveyFile {
    pub path: PathBuf,
    pub survey: Survey,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn surveys_dir(&self) -> PathBuf {
        self.root.join("surveys")
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.root.join("charts")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn tiles_dir(&self) -> PathBuf {
        self.root.join("tiles")
    }

    /// Every survey in the workspace, in file name order.
    pub fn load_surveys(&self) -> Result<Vec<SurveyFile>> {
        let mut surveys = Vec::new();
        for path in json_files(&self.surveys_dir())? {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let survey: Survey = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            surveys.push(SurveyFile { path, survey });
        }
        Ok(surveys)
    }

    pub fn save_survey(&self, file: &SurveyFile) -> Result<()> {
        let text = serde_json::to_string_pretty(&file.survey)?;
        fs::write(&file.path, text)
            .with_context(|| format!("writing {}", file.path.display()))?;
        Ok(())
    }

    pub fn load_charts(&self) -> Result<Vec<Chart>> {
        let mut charts = Vec::new();
        for path in json_files(&self.charts_dir())? {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let chart: Chart = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            charts.push(chart);
        }
        Ok(charts)
    }

    pub fn open_engine(&self) -> Result<DiskEngine> {
        Ok(DiskEngine::open(self.data_dir())?)
    }

    pub fn tile_cache(&self) -> TileCache {
        TileCache::new(self.tiles_dir())
    }
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    if !dir.is_dir() {
        return Ok(paths);
    }
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Picks one survey by shortname, optionally pinned to an exact id.
///
/// Without an id, a single match wins; with several versions present the
/// unpublished one is preferred, since that is the one being worked on.
pub fn select_survey(surveys: &[SurveyFile], shortname: &str, id: Option<i64>) -> Result<usize> {
    let matches: Vec<usize> = surveys
        .iter()
        .enumerate()
        .filter(|(_, f)| f.survey.shortname == shortname)
        .filter(|(_, f)| id.is_none_or(|id| f.survey.id == id))
        .map(|(i, _)| i)
        .collect();
    match matches.as_slice() {
        [] => bail!("no survey named {shortname:?} in the workspace"),
        [index] => Ok(*index),
        indexes => {
            let drafts: Vec<usize> = indexes
                .iter()
                .copied()
                .filter(|&i| !surveys[i].survey.is_published())
                .collect();
            if let [index] = drafts.as_slice() {
                return Ok(*index);
            }
            let ids: Vec<i64> = indexes.iter().map(|&i| surveys[i].survey.id).collect();
            bail!("several surveys named {shortname:?} (ids {ids:?}), pass --id")
        }
    }
}

/// Picks one chart by survey and chart shortname.
pub fn select_chart<'a>(charts: &'a [Chart], survey: &str, chart: &str) -> Result<&'a Chart> {
    charts
        .iter()
        .find(|c| c.survey_shortname == survey && c.shortname == chart)
        .with_context(|| format!("no chart {chart:?} for survey {survey:?} in the workspace"))
}
