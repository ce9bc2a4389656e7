//! Chart definitions.

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, Result};

/// Rendering strategy of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    /// Tabular data handed to a client-side chart widget.
    Table,
    /// Choropleth map over postal-code geometries.
    Map,
    /// Rows fed into an admin-authored text template.
    Template,
}

/// Row-level scope applied to every chart read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SqlFilter {
    #[default]
    None,
    /// Restrict to rows of the current account.
    User,
    /// Restrict to rows of one household member.
    Person,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChartStatus {
    #[default]
    Draft,
    Published,
}

/// An admin-authored aggregation over one survey's results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    pub survey_id: i64,
    pub survey_shortname: String,
    pub shortname: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    #[serde(default)]
    pub status: ChartStatus,
    /// Raw aggregation query over the survey's results table.
    #[serde(default)]
    pub sqlsource: String,
    #[serde(default)]
    pub sqlfilter: SqlFilter,
    /// Compute on read instead of materializing into a table.
    #[serde(default)]
    pub realtime: bool,
    /// Reference geometry table joined into the map view.
    #[serde(default = "default_geotable")]
    pub geotable: String,
    /// Client-side widget configuration, passed through verbatim.
    #[serde(default)]
    pub chartwrapper: String,
    /// Body of a template chart.
    #[serde(default)]
    pub template: String,
}

fn default_geotable() -> String {
    "zip_codes".to_string()
}

impl Chart {
    pub fn table_name(&self) -> String {
        format!("charts_{}_{}", self.survey_shortname, self.shortname)
    }

    pub fn view_name(&self) -> String {
        format!("{}_view", self.table_name())
    }

    pub fn has_data(&self) -> bool {
        !self.sqlsource.is_empty()
    }

    pub fn is_published(&self) -> bool {
        self.status == ChartStatus::Published
    }

    /// The `WHERE` clause implementing this chart's row scope, if any.
    ///
    /// The global id is interpolated into admin-visible SQL, so anything
    /// outside `[0-9A-Za-z-]` is rejected outright.
    pub fn filter_clause(&self, user_id: i64, global_id: &str) -> Result<Option<String>> {
        match self.sqlfilter {
            SqlFilter::None => Ok(None),
            SqlFilter::User => Ok(Some(format!("WHERE \"user\" = {user_id}"))),
            SqlFilter::Person => {
                if !is_safe_global_id(global_id) {
                    return Err(ChartError::InvalidGlobalId(global_id.to_string()));
                }
                Ok(Some(format!(
                    "WHERE \"user\" = {user_id} AND global_id = '{global_id}'"
                )))
            }
        }
    }
}

fn is_safe_global_id(global_id: &str) -> bool {
    !global_id.is_empty()
        && global_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}
