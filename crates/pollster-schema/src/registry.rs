//! Column type registry.
//!
//! Maps abstract question data-type names from the authoring records to
//! concrete storage column types, with optional format validation. The
//! registry is a pure lookup: resolving decorates a [`ColumnSpec`] with a
//! label and a pattern, it never touches storage.

use std::collections::BTreeMap;

use polars::prelude::{DataType, TimeUnit};
use regex::Regex;

use crate::error::SchemaError;

/// Closed set of storage column shapes a question can compile to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
    /// Submission time; internal, never exposed to respondents.
    Timestamp,
    /// `YYYY-MM` month stored as text.
    YearMonth,
    /// `YYYY-MM-DD` date stored as text.
    Date,
    PostalCode,
    Bool,
}

impl ColumnKind {
    pub fn dtype(&self) -> DataType {
        match self {
            ColumnKind::Text
            | ColumnKind::YearMonth
            | ColumnKind::Date
            | ColumnKind::PostalCode => DataType::String,
            ColumnKind::Numeric => DataType::Int64,
            ColumnKind::Timestamp => DataType::Datetime(TimeUnit::Milliseconds, None),
            ColumnKind::Bool => DataType::Boolean,
        }
    }

    /// Built-in format constraint for kinds that store formatted text.
    pub fn builtin_pattern(&self) -> Option<&'static str> {
        match self {
            ColumnKind::YearMonth => Some(r"^\d{4}-(0[1-9]|1[0-2])$"),
            ColumnKind::Date => Some(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$"),
            _ => None,
        }
    }
}

/// Registry entry mapping an abstract type name to a column shape and the
/// CSS/JS display classes the participant-facing form uses.
#[derive(Debug, Clone)]
pub struct QuestionDataType {
    pub title: String,
    pub kind: ColumnKind,
    pub css_class: String,
    pub js_class: String,
}

impl QuestionDataType {
    /// Timestamp-typed entries hold internal fields that are never
    /// presented to respondents.
    pub fn is_internal(&self) -> bool {
        self.kind == ColumnKind::Timestamp
    }
}

/// Registry entry for a derived (virtual) option's value type.
#[derive(Debug, Clone)]
pub struct VirtualOptionType {
    pub title: String,
    pub kind: ColumnKind,
    pub js_class: String,
}

/// Resolved column: shape, display label, optional format constraint.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub verbose_name: String,
    pub pattern: Option<Regex>,
}

impl ColumnSpec {
    pub fn new(kind: ColumnKind, verbose_name: impl Into<String>) -> Self {
        Self {
            kind,
            verbose_name: verbose_name.into(),
            pattern: None,
        }
    }

    pub fn dtype(&self) -> DataType {
        self.kind.dtype()
    }

    /// Validate a raw text value against the format constraint, if any.
    /// Kinds without a constraint accept everything.
    pub fn accepts(&self, value: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(value),
            None => true,
        }
    }
}

/// Lookup table of question data types and virtual option types.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, QuestionDataType>,
    virtual_types: BTreeMap<String, VirtualOptionType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the standard authoring types.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (title, kind, css, js) in [
            ("Text", ColumnKind::Text, "text-field", "PollsterText"),
            (
                "Numeric",
                ColumnKind::Numeric,
                "numeric-field",
                "PollsterNumeric",
            ),
            (
                "Timestamp",
                ColumnKind::Timestamp,
                "timestamp-field",
                "PollsterTimestamp",
            ),
            (
                "YearMonth",
                ColumnKind::YearMonth,
                "monthyear-field",
                "PollsterMonthYear",
            ),
            ("Date", ColumnKind::Date, "date-field", "PollsterDate"),
            (
                "PostalCode",
                ColumnKind::PostalCode,
                "postalcode-field",
                "PollsterPostalCode",
            ),
        ] {
            registry.register(QuestionDataType {
                title: title.to_string(),
                kind,
                css_class: css.to_string(),
                js_class: js.to_string(),
            });
        }
        for (title, kind, js) in [
            ("Range", ColumnKind::Numeric, "PollsterVirtualRange"),
            ("Regex", ColumnKind::Text, "PollsterVirtualRegex"),
        ] {
            registry.register_virtual(VirtualOptionType {
                title: title.to_string(),
                kind,
                js_class: js.to_string(),
            });
        }
        registry
    }

    pub fn register(&mut self, data_type: QuestionDataType) {
        self.types.insert(data_type.title.clone(), data_type);
    }

    pub fn register_virtual(&mut self, virtual_type: VirtualOptionType) {
        self.virtual_types
            .insert(virtual_type.title.clone(), virtual_type);
    }

    pub fn get(&self, name: &str) -> Option<&QuestionDataType> {
        self.types.get(name)
    }

    pub fn get_virtual(&self, name: &str) -> Option<&VirtualOptionType> {
        self.virtual_types.get(name)
    }

    /// Resolve a type name into a column spec, attaching the label and an
    /// optional format constraint. A supplied constraint overrides the
    /// kind's built-in one.
    pub fn resolve(
        &self,
        name: &str,
        verbose_name: &str,
        pattern: Option<&str>,
    ) -> Result<ColumnSpec, SchemaError> {
        let data_type = self
            .types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        let mut spec = ColumnSpec::new(data_type.kind, verbose_name);
        let pattern = match pattern {
            Some(p) if !p.is_empty() => Some(p),
            _ => data_type.kind.builtin_pattern(),
        };
        if let Some(pattern) = pattern {
            spec.pattern = Some(Regex::new(pattern).map_err(|source| {
                SchemaError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                }
            })?);
        }
        Ok(spec)
    }
}
