//! Map tile rendering and the on-disk tile cache.
//!
//! The raster renderer itself is an external collaborator behind
//! [`TileRenderer`]; this module supplies it the geometry-joined data, a
//! color style derived from the chart's `color` column, and the tile's
//! geographic bounds, then caches the returned bytes on disk.

use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use pollster_store::StorageEngine;
use tracing::debug;

use crate::chart::{Chart, SqlFilter};
use crate::error::{ChartError, Result};
use crate::reader::{load_colors, map_frame};

/// Which identity a cached tile was rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileScope {
    Shared,
    User(i64),
    Person(String),
}

impl TileScope {
    fn suffix(&self) -> String {
        match self {
            Self::Shared => String::new(),
            Self::User(id) => format!("_user_{id}"),
            Self::Person(gid) => format!("_gid_{gid}"),
        }
    }
}

/// Geographic bounds of one web-mercator tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

fn tile_latitude(y: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees()
}

/// Bounds of tile `(x, y)` at zoom `z` in the standard slippy-map scheme.
pub fn tile_bounds(z: u8, x: u32, y: u32) -> TileBounds {
    let n = f64::from(2u32.pow(u32::from(z)));
    TileBounds {
        min_lat: tile_latitude(f64::from(y) + 1.0, n),
        max_lat: tile_latitude(f64::from(y), n),
        min_lng: f64::from(x) / n * 360.0 - 180.0,
        max_lng: (f64::from(x) + 1.0) / n * 360.0 - 180.0,
    }
}

/// One fill/stroke rule of a map style, keyed on the `color` column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRule {
    /// Value of the `color` column this rule matches.
    pub category: String,
    /// Normalized CSS color actually drawn.
    pub color: String,
}

/// Style handed to the raster renderer, one rule per distinct color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapStyle {
    pub rules: Vec<ColorRule>,
}

fn is_css_hex(color: &str) -> bool {
    let hex = match color.strip_prefix('#') {
        Some(h) => h,
        None => return false,
    };
    (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

impl MapStyle {
    /// Builds a style from the distinct values of the `color` column.
    /// Values that are not parseable colors are drawn red.
    pub fn from_colors<I: IntoIterator<Item = String>>(colors: I) -> Self {
        let rules = colors
            .into_iter()
            .map(|category| {
                let color = if is_css_hex(&category) {
                    category.clone()
                } else {
                    "#ff0000".to_string()
                };
                ColorRule { category, color }
            })
            .collect();
        Self { rules }
    }
}

/// External raster renderer.
pub trait TileRenderer {
    /// Renders one 256x256 tile image from the geometry-joined rows.
    fn render(
        &self,
        style: &MapStyle,
        data: &DataFrame,
        bounds: TileBounds,
    ) -> std::result::Result<Vec<u8>, String>;
}

/// On-disk cache of rendered tiles, one file per (tile, scope).
#[derive(Debug, Clone)]
pub struct TileCache {
    root: PathBuf,
}

impl TileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn chart_dir(&self, chart: &Chart) -> PathBuf {
        self.root
            .join(format!("survey_{}", chart.survey_id))
            .join(&chart.shortname)
    }

    /// Path for one tile, creating parent directories on first use.
    /// Concurrent creation of the same directory is not an error.
    pub fn tile_path(
        &self,
        chart: &Chart,
        scope: &TileScope,
        z: u8,
        x: u32,
        y: u32,
    ) -> Result<PathBuf> {
        let dir = self.chart_dir(chart).join(z.to_string());
        if let Err(err) = fs::create_dir_all(&dir) {
            if err.kind() != std::io::ErrorKind::AlreadyExists {
                return Err(err.into());
            }
        }
        Ok(dir.join(format!("{x}_{y}{}", scope.suffix())))
    }

    /// Removes every cached tile of the chart. Missing directories are fine.
    pub fn clear(&self, chart: &Chart) {
        let dir = self.chart_dir(chart);
        if let Err(err) = fs::remove_dir_all(&dir) {
            if err.kind() != std::io::ErrorKind::NotFound {
                debug!(dir = %dir.display(), error = %err, "could not clear tile cache");
            }
        }
    }
}

fn tile_scope(chart: &Chart, user_id: i64, global_id: &str) -> Result<TileScope> {
    Ok(match chart.sqlfilter {
        SqlFilter::None => TileScope::Shared,
        SqlFilter::User => TileScope::User(user_id),
        SqlFilter::Person => {
            // The scope lands in a file name; reuse the SQL-side validation.
            chart.filter_clause(user_id, global_id)?;
            TileScope::Person(global_id.to_string())
        }
    })
}

/// Serves one map tile, rendering and caching it on first request.
pub fn get_map_tile(
    engine: &dyn StorageEngine,
    chart: &Chart,
    renderer: &dyn TileRenderer,
    cache: &TileCache,
    user_id: i64,
    global_id: &str,
    z: u8,
    x: u32,
    y: u32,
) -> Result<Vec<u8>> {
    let scope = tile_scope(chart, user_id, global_id)?;
    let path = cache.tile_path(chart, &scope, z, x, y)?;
    if path.exists() {
        return Ok(fs::read(&path)?);
    }
    let frame = map_frame(engine, chart, user_id, global_id)?;
    let style = MapStyle::from_colors(load_colors(engine, chart, user_id, global_id));
    let bytes = renderer
        .render(&style, &frame, tile_bounds(z, x, y))
        .map_err(ChartError::Renderer)?;
    write_tile(&path, &bytes)?;
    Ok(bytes)
}

fn write_tile(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartKind, ChartStatus};

    fn chart(filter: SqlFilter) -> Chart {
        Chart {
            survey_id: 3,
            survey_shortname: "weekly".into(),
            shortname: "activity".into(),
            kind: ChartKind::Map,
            status: ChartStatus::Published,
            sqlsource: String::new(),
            sqlfilter: filter,
            realtime: false,
            geotable: "zip_codes".into(),
            chartwrapper: String::new(),
            template: String::new(),
        }
    }

    #[test]
    fn tile_paths_encode_chart_zoom_and_scope() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = TileCache::new(tmp.path());
        let c = chart(SqlFilter::None);

        let shared = cache.tile_path(&c, &TileScope::Shared, 4, 8, 5).unwrap();
        assert!(shared.ends_with("survey_3/activity/4/8_5"));
        let user = cache.tile_path(&c, &TileScope::User(42), 4, 8, 5).unwrap();
        assert!(user.ends_with("survey_3/activity/4/8_5_user_42"));
        let person = cache
            .tile_path(&c, &TileScope::Person("g-1".into()), 4, 8, 5)
            .unwrap();
        assert!(person.ends_with("survey_3/activity/4/8_5_gid_g-1"));
        assert!(shared.parent().unwrap().is_dir());
    }

    #[test]
    fn clear_removes_cached_tiles_and_tolerates_absence() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = TileCache::new(tmp.path());
        let c = chart(SqlFilter::None);
        let path = cache.tile_path(&c, &TileScope::Shared, 1, 0, 0).unwrap();
        fs::write(&path, b"png").unwrap();

        cache.clear(&c);
        assert!(!path.exists());
        // A second clear finds nothing to remove.
        cache.clear(&c);
    }

    #[test]
    fn zoom_zero_tile_spans_the_world() {
        let b = tile_bounds(0, 0, 0);
        assert!((b.min_lng - -180.0).abs() < 1e-9);
        assert!((b.max_lng - 180.0).abs() < 1e-9);
        assert!((b.max_lat - 85.0511).abs() < 0.001);
        assert!((b.min_lat + 85.0511).abs() < 0.001);
    }

    #[test]
    fn unparseable_colors_fall_back_to_red() {
        let style = MapStyle::from_colors(vec!["#00ff00".to_string(), "bogus".to_string()]);
        assert_eq!(style.rules[0].color, "#00ff00");
        assert_eq!(style.rules[1].category, "bogus");
        assert_eq!(style.rules[1].color, "#ff0000");
    }
}
