//! sqlshape - shape-cached SQL statement generation over typed filter trees.
//!
//! sqlshape sits between application code and a database driver. Callers
//! describe what they want (a filter, a value bag, an entity type) and
//! sqlshape:
//!
//! - normalizes every filter form into a [`QueryGroup`] tree
//! - reduces the call to a value-free fingerprint ([`CacheKey`])
//! - renders SQL text once per fingerprint and dialect, then reuses it
//! - binds the call's values as named parameters and hands the
//!   [`Command`] to the host's [`Executor`]
//!
//! # Quick Start
//!
//! ```
//! use sqlshape::prelude::*;
//!
//! struct Person;
//!
//! static PERSON_FIELDS: [FieldInfo; 2] = [
//!     FieldInfo::new("id", "Id", SqlType::BigInt).primary_key(true).identity(true),
//!     FieldInfo::new("age", "Age", SqlType::Integer),
//! ];
//!
//! impl Entity for Person {
//!     const TABLE_NAME: &'static str = "Person";
//!
//!     fn fields() -> &'static [FieldInfo] {
//!         &PERSON_FIELDS
//!     }
//! }
//!
//! let group = QueryGroup::parse::<Person>(Some(&Expression::member("age").ge(18))).unwrap();
//! assert_eq!(group.get_string(&Dialect::Postgres.setting()), r#"("Age" >= @Age)"#);
//! ```
//!
//! # Crates
//!
//! - [`sqlshape_core`]: values, field metadata, dialect settings, the
//!   executor contract and the error taxonomy
//! - [`sqlshape_query`]: filter trees, fingerprints, the command-text
//!   cache, statement builders and the dispatcher

pub use sqlshape_core::{
    ColumnInfo, Command, ConfigError, DbSetting, Dialect, Entity, Error, ExecutionError, Executor,
    ExpressionError, ExpressionErrorKind, Field, FieldInfo, FieldSource, MetadataError,
    MetadataErrorKind, OperatorError, OperatorErrorKind, ParameterBag, Result, Row, SqlType,
    StaticFieldSource, TableFields, TypeInfo, UnsupportedError, Value, is_valid_parameter_name,
    parameter_name_for,
};

pub use sqlshape_query::{
    Aggregate, AggregateRequest, Arity, BatchQueryRequest, BinaryOp, CacheKey, CacheStats,
    CancellableTraceLog, CommandTextCache, Conjunction, DeleteRequest, Dispatcher, ExistsRequest,
    Expression, FieldSet, FieldShape, FilterInput, FilterShape, InsertRequest, MergeRequest,
    Method, MysqlStatementBuilder, Operator, Order, OrderField, Paging, PostgresStatementBuilder,
    QueryAllRequest, QueryField, QueryGroup, QueryMultipleRequest, QueryOptions, QueryRequest,
    Scope, Select, ShapeToken, SqlServerStatementBuilder, SqliteStatementBuilder,
    StatementBuilder, StatementBuilderRegistry, Target, TraceHook, TraceLog, TruncateRequest,
    UpdateRequest, ValueShape, parse_fields,
};

/// Prelude module for convenient imports.
///
/// ```
/// use sqlshape::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Core
        Command,
        DbSetting,
        Dialect,
        Entity,
        Error,
        Executor,
        Field,
        FieldInfo,
        FieldSource,
        ParameterBag,
        Result,
        Row,
        SqlType,
        Value,
        // Filters
        Expression,
        FilterInput,
        Operator,
        OrderField,
        QueryField,
        QueryGroup,
        Scope,
        // Dispatch
        CommandTextCache,
        Dispatcher,
        QueryOptions,
        StatementBuilder,
        StatementBuilderRegistry,
        TraceHook,
    };
}
