//! CSV export of a survey's results with human-readable headers.

use std::io::Write;

use chrono::DateTime;
use polars::prelude::AnyValue;

use crate::engine::StorageEngine;
use crate::error::Result;
use crate::model::ResultsModel;

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        AnyValue::Datetime(ms, _, _) | AnyValue::DatetimeOwned(ms, _, _) => {
            DateTime::from_timestamp_millis(*ms)
                .map_or_else(String::new, |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        }
        other => other.to_string(),
    }
}

/// Writes the survey's results as CSV, one row per response.
///
/// Columns follow the model's field order and carry the field labels, not
/// the storage names, so the file reads like the questionnaire.
pub fn write_results_csv<W: Write>(
    engine: &dyn StorageEngine,
    model: &ResultsModel,
    writer: W,
) -> Result<()> {
    let frame = engine.read_table(model.table_name())?;
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(model.fields().iter().map(|f| f.spec.verbose_name.as_str()))?;
    for row in 0..frame.height() {
        let mut cells = Vec::with_capacity(model.fields().len());
        for field in model.fields() {
            let value = frame.column(&field.name)?.get(row)?;
            cells.push(cell_text(&value));
        }
        csv.write_record(&cells)?;
    }
    csv.flush()?;
    Ok(())
}
