//! Chart table and view rebuilds.

use pollster_store::StorageEngine;
use regex::Regex;
use tracing::info;

use crate::chart::{Chart, ChartKind};
use crate::error::Result;
use crate::tiles::TileCache;

/// The geometry-joined view query for a map chart.
///
/// Joins the materialized chart table against the reference geometry table
/// on the postal-code key, case-insensitively. When the source query
/// mentions `zip_code_country` the join also matches the country, so
/// identical postal codes from different countries stay apart.
fn geometry_join_sql(chart: &Chart) -> String {
    let mentions_country = Regex::new(r"\bzip_code_country\b")
        .map(|re| re.is_match(&chart.sqlsource))
        .unwrap_or(false);
    // Case folding happens in the subqueries so the join condition stays a
    // plain column equality.
    if mentions_country {
        format!(
            "SELECT A.*, B.lat, B.lng, B.lat_min, B.lat_max, B.lng_min, B.lng_max \
             FROM (SELECT *, UPPER(zip_code_key) AS geo_key, \
                          UPPER(zip_code_country) AS geo_country FROM {table}) A \
             INNER JOIN (SELECT UPPER(zip_code_key) AS geo_key, \
                                UPPER(country) AS geo_country, \
                                lat, lng, lat_min, lat_max, lng_min, lng_max \
                           FROM {geo}) B \
             ON A.geo_key = B.geo_key AND A.geo_country = B.geo_country",
            table = chart.table_name(),
            geo = chart.geotable,
        )
    } else {
        format!(
            "SELECT A.*, B.lat, B.lng, B.lat_min, B.lat_max, B.lng_min, B.lng_max \
             FROM (SELECT *, UPPER(zip_code_key) AS geo_key FROM {table}) A \
             INNER JOIN (SELECT UPPER(zip_code_key) AS geo_key, \
                                lat, lng, lat_min, lat_max, lng_min, lng_max \
                           FROM {geo}) B \
             ON A.geo_key = B.geo_key",
            table = chart.table_name(),
            geo = chart.geotable,
        )
    }
}

/// Rebuilds the chart's table and, for map charts, its geometry view.
///
/// Existing table and view are dropped first. Realtime charts keep no
/// materialized data, so for them this only clears leftovers. Returns
/// whether anything was built; a chart without a query is a no-op.
pub fn update_table(
    chart: &Chart,
    engine: &mut dyn StorageEngine,
    cache: &TileCache,
) -> Result<bool> {
    if !chart.has_data() {
        return Ok(false);
    }
    let table = chart.table_name();
    let view = chart.view_name();
    engine.drop_view(&view)?;
    engine.drop_table(&table)?;
    if !chart.realtime {
        let frame = engine.query(&chart.sqlsource)?;
        engine.create_table(&table, frame)?;
        if chart.kind == ChartKind::Map {
            engine.create_view(&view, &geometry_join_sql(chart))?;
        }
        cache.clear(chart);
        info!(chart = %chart.shortname, table = %table, "rebuilt chart table");
    }
    Ok(true)
}

/// Re-materializes the chart's data without touching table or view shape.
/// Realtime charts and charts without a query are no-ops.
pub fn update_data(
    chart: &Chart,
    engine: &mut dyn StorageEngine,
    cache: &TileCache,
) -> Result<bool> {
    if !chart.has_data() || chart.realtime {
        return Ok(false);
    }
    let table = chart.table_name();
    let frame = engine.query(&chart.sqlsource)?;
    engine.replace_rows(&table, frame)?;
    cache.clear(chart);
    info!(chart = %chart.shortname, table = %table, "refreshed chart data");
    Ok(true)
}
