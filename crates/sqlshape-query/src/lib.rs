//! Filter trees, command-text caching and statement builders for sqlshape.
//!
//! `sqlshape-query` is the **statement generation layer**. It turns filter
//! inputs into [`QueryGroup`] trees, reduces each call to a value-free
//! fingerprint, and renders (once per fingerprint) the SQL text for the
//! connection's dialect.
//!
//! # Role In The Architecture
//!
//! - **Filters**: [`Expression`], named-value bags, field triples and ready
//!   trees all normalize into a [`QueryGroup`] through [`Scope::normalize`].
//! - **Fingerprints**: every operation has a request type in [`request`];
//!   [`CacheKey`] wraps them for the [`CommandTextCache`].
//! - **Dialects**: one [`StatementBuilder`] per backend, looked up in the
//!   [`StatementBuilderRegistry`].
//! - **Dispatch**: [`Dispatcher`] runs the whole pipeline against an
//!   [`Executor`](sqlshape_core::Executor), calling [`TraceHook`]s around
//!   execution.

pub mod cache;
pub mod dispatch;
pub mod expression;
pub mod hooks;
pub mod input;
pub mod operator;
pub mod order;
pub mod query_field;
pub mod query_group;
pub mod registry;
pub mod request;
pub mod shape;
pub mod statement;

pub use cache::{CacheStats, CommandTextCache};
pub use dispatch::{Dispatcher, QueryOptions};
pub use expression::{BinaryOp, Expression, Method, parse_fields};
pub use hooks::{CancellableTraceLog, TraceHook, TraceLog};
pub use input::{FilterInput, Scope};
pub use operator::{Arity, Conjunction, Operator};
pub use order::{Order, OrderField};
pub use query_field::QueryField;
pub use query_group::QueryGroup;
pub use registry::StatementBuilderRegistry;
pub use request::{
    Aggregate, AggregateRequest, BatchQueryRequest, CacheKey, DeleteRequest, ExistsRequest,
    FieldSet, InsertRequest, MergeRequest, QueryAllRequest, QueryMultipleRequest, QueryRequest,
    Target, TruncateRequest, UpdateRequest,
};
pub use shape::{FieldShape, FilterShape, ShapeToken, ValueShape};
pub use statement::{
    MysqlStatementBuilder, Paging, PostgresStatementBuilder, Select, SqlServerStatementBuilder,
    SqliteStatementBuilder, StatementBuilder,
};
