pub mod compiler;
pub mod error;
pub mod registry;

pub use compiler::{FieldDef, compile_question, compile_questions, empty_frame, fields_schema};
pub use error::SchemaError;
pub use registry::{ColumnKind, ColumnSpec, QuestionDataType, TypeRegistry, VirtualOptionType};
