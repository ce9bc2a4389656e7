//! Chart read paths.
//!
//! Every query here embeds admin-authored SQL, so execution failures are
//! part of normal operation: `load_data` and `load_colors` degrade to
//! placeholder output instead of propagating, keeping a broken chart from
//! taking the page down with it.

use std::collections::BTreeMap;

use polars::prelude::{AnyValue, DataFrame};
use pollster_store::StorageEngine;
use serde_json::Value;
use tracing::warn;

use crate::chart::Chart;
use crate::error::Result;

/// Column names plus rows of one executed chart query.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ChartData {
    /// The one-row placeholder shown when a chart query cannot run.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            columns: vec!["Error".to_string()],
            rows: vec![vec![Value::String(message.into())]],
        }
    }

    pub fn is_error(&self) -> bool {
        self.columns == ["Error"]
    }
}

fn json_of(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(n) => Value::from(*n),
        AnyValue::Int16(n) => Value::from(*n),
        AnyValue::Int32(n) => Value::from(*n),
        AnyValue::Int64(n) => Value::from(*n),
        AnyValue::UInt8(n) => Value::from(*n),
        AnyValue::UInt16(n) => Value::from(*n),
        AnyValue::UInt32(n) => Value::from(*n),
        AnyValue::UInt64(n) => Value::from(*n),
        AnyValue::Float32(n) => Value::from(*n),
        AnyValue::Float64(n) => Value::from(*n),
        other => Value::String(other.to_string()),
    }
}

fn frame_data(frame: &DataFrame) -> Result<ChartData> {
    let columns = frame
        .get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let mut rows = Vec::with_capacity(frame.height());
    for row in 0..frame.height() {
        let mut cells = Vec::with_capacity(frame.width());
        for column in frame.get_columns() {
            cells.push(json_of(&column.get(row)?));
        }
        rows.push(cells);
    }
    Ok(ChartData { columns, rows })
}

fn scoped_query(chart: &Chart, base: String, user_id: i64, global_id: &str) -> Result<String> {
    Ok(match chart.filter_clause(user_id, global_id)? {
        Some(clause) => format!("{base} {clause}"),
        None => base,
    })
}

/// Runs the chart's data query, scoped by its filter.
///
/// Realtime charts run `sqlsource` as a subquery; materialized charts read
/// the chart table. Never fails on bad admin SQL.
pub fn load_data(
    engine: &dyn StorageEngine,
    chart: &Chart,
    user_id: i64,
    global_id: &str,
) -> ChartData {
    if !chart.has_data() {
        return ChartData::error("SQL query is missing");
    }
    let base = if chart.realtime {
        format!("SELECT * FROM ({}) A", chart.sqlsource)
    } else {
        format!("SELECT * FROM {}", chart.table_name())
    };
    let query = match scoped_query(chart, base, user_id, global_id) {
        Ok(q) => q,
        Err(err) => return ChartData::error(err.to_string()),
    };
    match engine.query(&query) {
        Ok(frame) => frame_data(&frame).unwrap_or_else(|err| ChartData::error(err.to_string())),
        Err(err) => {
            warn!(chart = %chart.shortname, error = %err, "chart query failed");
            ChartData::error(err.to_string())
        }
    }
}

/// Distinct values of the chart's `color` column, scoped by its filter.
///
/// A failing query yields plain red so the map still renders; the editor
/// page is where the admin sees the actual error.
pub fn load_colors(
    engine: &dyn StorageEngine,
    chart: &Chart,
    user_id: i64,
    global_id: &str,
) -> Vec<String> {
    if !chart.has_data() {
        return Vec::new();
    }
    let base = if chart.realtime {
        format!("SELECT DISTINCT color FROM ({}) A", chart.sqlsource)
    } else {
        format!("SELECT DISTINCT color FROM {}", chart.table_name())
    };
    let result = scoped_query(chart, base, user_id, global_id)
        .and_then(|query| Ok(engine.query(&query)?));
    match result {
        Ok(frame) => match frame.column("color") {
            Ok(column) => (0..frame.height())
                .filter_map(|row| match column.get(row) {
                    Ok(AnyValue::String(s)) => Some(s.to_string()),
                    Ok(AnyValue::StringOwned(s)) => Some(s.to_string()),
                    _ => None,
                })
                .collect(),
            Err(_) => vec!["#ff0000".to_string()],
        },
        Err(err) => {
            warn!(chart = %chart.shortname, error = %err, "color query failed");
            vec!["#ff0000".to_string()]
        }
    }
}

/// Geometry-joined rows backing the chart's map view, scoped by its filter.
/// Unlike the placeholder paths this propagates failures, since the tile
/// renderer cannot draw without data.
pub fn map_frame(
    engine: &dyn StorageEngine,
    chart: &Chart,
    user_id: i64,
    global_id: &str,
) -> Result<DataFrame> {
    let base = format!("SELECT * FROM {}", chart.view_name());
    let query = scoped_query(chart, base, user_id, global_id)?;
    Ok(engine.query(&query)?)
}

/// Map center for a participant's postal code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCenter {
    pub lat: f64,
    pub lng: f64,
}

fn sql_text(value: &str) -> String {
    value.replace('\'', "''")
}

fn float_of(value: &AnyValue) -> Option<f64> {
    match value {
        AnyValue::Float64(f) => Some(*f),
        AnyValue::Float32(f) => Some(f64::from(*f)),
        AnyValue::Int64(n) => Some(*n as f64),
        AnyValue::Int32(n) => Some(f64::from(*n)),
        _ => None,
    }
}

/// Centroid of a postal-code geometry, for centering the map widget.
/// Lookup failures simply yield no center.
pub fn load_zip_coords(
    engine: &dyn StorageEngine,
    chart: &Chart,
    zip_code_key: &str,
    country: Option<&str>,
) -> Option<MapCenter> {
    let mut query = format!(
        "SELECT lat, lng FROM {} WHERE zip_code_key = '{}'",
        chart.geotable,
        sql_text(zip_code_key)
    );
    if let Some(country) = country {
        query.push_str(&format!(" AND country = '{}'", sql_text(country)));
    }
    let frame = engine.query(&query).ok()?;
    if frame.height() == 0 {
        return None;
    }
    let lat = float_of(&frame.column("lat").ok()?.get(0).ok()?)?;
    let lng = float_of(&frame.column("lng").ok()?.get(0).ok()?)?;
    Some(MapCenter { lat, lng })
}

const GEOMETRY_COLUMNS: [&str; 9] = [
    "lat", "lng", "lat_min", "lat_max", "lng_min", "lng_max", "color", "geo_key", "geo_country",
];

/// Attributes of the map region containing a clicked point.
///
/// Returns the first view row whose bounding box contains the point, with
/// the geometry and styling columns stripped. Empty when the click hits no
/// region or the view cannot be queried.
pub fn map_click_info(
    engine: &dyn StorageEngine,
    chart: &Chart,
    lat: f64,
    lng: f64,
) -> BTreeMap<String, String> {
    let query = format!(
        "SELECT * FROM {} WHERE lat_min <= {lat} AND lat_max >= {lat} \
         AND lng_min <= {lng} AND lng_max >= {lng}",
        chart.view_name()
    );
    let mut info = BTreeMap::new();
    let frame = match engine.query(&query) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(chart = %chart.shortname, error = %err, "map click query failed");
            return info;
        }
    };
    if frame.height() == 0 {
        return info;
    }
    for column in frame.get_columns() {
        let name = column.name().as_str();
        if GEOMETRY_COLUMNS.contains(&name) {
            continue;
        }
        if let Ok(value) = column.get(0) {
            if !matches!(value, AnyValue::Null) {
                info.insert(name.to_string(), text_of(&value));
            }
        }
    }
    info
}

/// Rows of a template chart as name-keyed maps, ready for a template
/// engine's context. Column order is preserved in the returned names.
pub fn template_rows(data: &ChartData) -> (Vec<String>, Vec<BTreeMap<String, Value>>) {
    let rows = data
        .rows
        .iter()
        .map(|cells| {
            data.columns
                .iter()
                .cloned()
                .zip(cells.iter().cloned())
                .collect()
        })
        .collect();
    (data.columns.clone(), rows)
}

fn text_of(value: &AnyValue) -> String {
    match value {
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn template_rows_key_cells_by_column_name() {
        let data = ChartData {
            columns: vec!["zip".to_string(), "cases".to_string()],
            rows: vec![vec![json!("1000"), json!(3)], vec![json!("2000"), json!(5)]],
        };
        let (columns, rows) = template_rows(&data);
        assert_eq!(columns, ["zip", "cases"]);
        assert_eq!(rows[0]["zip"], json!("1000"));
        assert_eq!(rows[1]["cases"], json!(5));
    }
}
