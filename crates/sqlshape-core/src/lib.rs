//! Core types for sqlshape.
//!
//! This crate provides the foundational pieces shared by the query layer:
//!
//! - `Value` for dynamically-typed bound values
//! - `Field`, `FieldInfo` and the `Entity` trait for column metadata
//! - `Dialect` and `DbSetting` for per-backend text rules
//! - `ParameterBag` and `Command`, the hand-off to the `Executor`
//! - the crate-wide `Error` taxonomy

pub mod error;
pub mod executor;
pub mod field;
pub mod identifiers;
pub mod metadata;
pub mod params;
pub mod row;
pub mod setting;
pub mod types;
pub mod value;

pub use error::{
    ConfigError, Error, ExecutionError, ExpressionError, ExpressionErrorKind, MetadataError,
    MetadataErrorKind, OperatorError, OperatorErrorKind, Result, UnsupportedError,
};
pub use executor::{Command, Executor};
pub use field::{Entity, Field, FieldInfo};
pub use identifiers::{is_valid_parameter_name, parameter_name_for, sanitize_identifier};
pub use metadata::{FieldSource, StaticFieldSource, TableFields};
pub use params::ParameterBag;
pub use row::{ColumnInfo, Row};
pub use setting::{DbSetting, Dialect};
pub use types::{SqlType, TypeInfo};
pub use value::Value;
