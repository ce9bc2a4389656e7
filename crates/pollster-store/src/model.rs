//! Survey-to-storage compilation.
//!
//! A published survey owns one results table. [`ResultsModel`] captures that
//! table's column layout: a fixed prelude of bookkeeping fields followed by
//! the fields compiled from the survey's questions.

use polars::prelude::{DataFrame, Schema};
use pollster_model::Survey;
use pollster_schema::{compile_questions, empty_frame, fields_schema, FieldDef, TypeRegistry};

use crate::error::{Result, StoreError};

/// Compiled storage layout for one survey.
#[derive(Debug, Clone)]
pub struct ResultsModel {
    table_name: String,
    fields: Vec<FieldDef>,
}

impl ResultsModel {
    /// Compiles `survey` against `registry` into a storage layout.
    ///
    /// The bookkeeping fields (`user`, `global_id`, `channel`, `timestamp`)
    /// always come first, in that order, followed by the question fields in
    /// question ordinal order.
    pub fn compile(survey: &Survey, registry: &TypeRegistry) -> Result<Self> {
        if survey.shortname.is_empty() {
            return Err(StoreError::MissingShortname);
        }
        let mut fields = standard_fields(registry)?;
        fields.extend(compile_questions(survey, registry)?);
        Ok(Self {
            table_name: survey.table_name(),
            fields,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn schema(&self) -> Schema {
        fields_schema(&self.fields)
    }

    pub fn empty_frame(&self) -> DataFrame {
        empty_frame(&self.fields)
    }
}

fn standard_fields(registry: &TypeRegistry) -> Result<Vec<FieldDef>> {
    Ok(vec![
        FieldDef {
            name: "user".to_string(),
            spec: registry.resolve("Numeric", "User", None)?,
        },
        FieldDef {
            name: "global_id".to_string(),
            spec: registry.resolve("Text", "Person", None)?,
        },
        FieldDef {
            name: "channel".to_string(),
            spec: registry.resolve("Text", "Channel", None)?,
        },
        FieldDef {
            name: "timestamp".to_string(),
            spec: registry.resolve("Timestamp", "Timestamp", None)?,
        },
    ])
}
