//! Storage layer for survey results.
//!
//! Compiles a survey into a results table layout, stores validated
//! submissions through pluggable engines (in-memory or CSV-on-disk),
//! drives the publish/unpublish lifecycle, and serves prefill and export.

pub mod disk;
pub mod engine;
pub mod error;
pub mod export;
pub mod extras;
pub mod lifecycle;
pub mod memory;
pub mod model;
pub mod prefill;
pub mod submit;

pub use disk::DiskEngine;
pub use engine::{BackendKind, StorageEngine};
pub use error::{Result, StoreError};
pub use export::write_results_csv;
pub use extras::{ExtraStatement, survey_extra_statements};
pub use lifecycle::{publish, unpublish};
pub use memory::MemoryEngine;
pub use model::ResultsModel;
pub use prefill::{SOURCE_FIELD, last_participation, prefill};
pub use submit::{Record, SubmissionIssue, append_submission, record_frame, validate_record};
