//! Operation dispatch: normalize → fingerprint → cached text → hooks → execute.

use std::sync::Arc;
use std::time::Instant;

use sqlshape_core::{
    Command, Error, ExecutionError, Executor, Field, FieldSource, MetadataError,
    MetadataErrorKind, ParameterBag, Result, Row, Value, is_valid_parameter_name,
};

use crate::cache::CommandTextCache;
use crate::hooks::{CancellableTraceLog, TraceHook, TraceLog};
use crate::input::{FilterInput, Scope};
use crate::order::OrderField;
use crate::query_group::QueryGroup;
use crate::registry::StatementBuilderRegistry;
use crate::request::{
    Aggregate, AggregateRequest, BatchQueryRequest, CacheKey, DeleteRequest, ExistsRequest,
    FieldSet, InsertRequest, MergeRequest, QueryAllRequest, QueryMultipleRequest, QueryRequest,
    TruncateRequest, UpdateRequest,
};

/// Projection, ordering, top and hints of a query.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Selected columns; `None` selects every known field
    pub fields: Option<Vec<Field>>,
    pub order: Vec<OrderField>,
    pub top: Option<u64>,
    pub hints: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn order_by(mut self, order: OrderField) -> Self {
        self.order.push(order);
        self
    }

    pub fn top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    pub fn hints(mut self, hints: impl Into<String>) -> Self {
        self.hints = Some(hints.into());
        self
    }
}

/// Runs every operation against one executor.
///
/// The cache and registry are owned by the host and shared between
/// dispatchers; a dispatcher itself is cheap to build per connection.
pub struct Dispatcher<'a, X: Executor + ?Sized> {
    executor: &'a X,
    cache: &'a CommandTextCache,
    registry: &'a StatementBuilderRegistry,
    hook: Option<&'a dyn TraceHook>,
    source: Option<&'a dyn FieldSource>,
}

impl<'a, X: Executor + ?Sized> Dispatcher<'a, X> {
    pub fn new(
        executor: &'a X,
        cache: &'a CommandTextCache,
        registry: &'a StatementBuilderRegistry,
    ) -> Self {
        Self {
            executor,
            cache,
            registry,
            hook: None,
            source: None,
        }
    }

    /// Install a trace hook.
    pub fn with_trace(mut self, hook: &'a dyn TraceHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Install a metadata source for table-name scopes.
    pub fn with_field_source(mut self, source: &'a dyn FieldSource) -> Self {
        self.source = Some(source);
        self
    }

    // ==================== Queries ====================

    /// Rows matching `filter`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = scope.table_name()))]
    pub fn query(
        &self,
        scope: &Scope,
        filter: impl Into<FilterInput>,
        options: QueryOptions,
    ) -> Result<Vec<Row>> {
        let group = scope.normalize(filter.into(), self.source)?;
        let key = CacheKey::Query(self.query_request(scope, &group, options)?);
        let command = Command::new(&*self.text(&key)?, group.map_parameters()?);
        self.run(&key, command, Vec::new, |c| self.executor.query(c))
    }

    /// Every row of the target.
    #[tracing::instrument(level = "debug", skip_all, fields(table = scope.table_name()))]
    pub fn query_all(&self, scope: &Scope, options: QueryOptions) -> Result<Vec<Row>> {
        let key = CacheKey::QueryAll(QueryAllRequest {
            target: scope.target(),
            fields: self.field_set(scope, options.fields)?,
            order: options.order,
            hints: options.hints,
            dialect: self.executor.dialect(),
        });
        let command = Command::new(&*self.text(&key)?, ParameterBag::new());
        self.run(&key, command, Vec::new, |c| self.executor.query(c))
    }

    /// Several queries in one round trip, one result set per query.
    ///
    /// Parameter names shared between queries are rewritten before any text
    /// is generated, so every statement binds its own values.
    #[tracing::instrument(level = "debug", skip_all, fields(count = queries.len()))]
    pub fn query_multiple(
        &self,
        queries: Vec<(Scope, FilterInput, QueryOptions)>,
    ) -> Result<Vec<Vec<Row>>> {
        let dialect = self.executor.dialect();
        let builder = self.registry.get(dialect)?;
        if !builder.setting().supports_multiple_statements {
            return Err(Error::unsupported(dialect.name(), "multiple statements per command"));
        }

        let mut groups = Vec::with_capacity(queries.len());
        let mut rest = Vec::with_capacity(queries.len());
        for (scope, filter, options) in queries {
            groups.push(scope.normalize(filter, self.source)?);
            rest.push((scope, options));
        }
        QueryGroup::fix_for_query_multiple(&mut groups);

        let mut texts = Vec::with_capacity(groups.len());
        for (index, (group, (scope, options))) in groups.iter().zip(rest).enumerate() {
            let key = CacheKey::QueryMultiple(QueryMultipleRequest {
                index,
                inner: self.query_request(&scope, group, options)?,
            });
            texts.push(self.text(&key)?);
        }
        let text = texts.iter().map(|t| &**t).collect::<Vec<_>>().join(" ");
        let command = Command::new(text, QueryGroup::as_mapped_object(&groups)?);
        self.run_named("QueryMultiple", command, Vec::new, |c| {
            self.executor.query_multiple(c)
        })
    }

    /// One page of rows, ordered by `options.order`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = scope.table_name(), page = page))]
    pub fn batch_query(
        &self,
        scope: &Scope,
        filter: impl Into<FilterInput>,
        page: u64,
        rows_per_batch: u64,
        options: QueryOptions,
    ) -> Result<Vec<Row>> {
        let group = scope.normalize(filter.into(), self.source)?;
        let key = CacheKey::BatchQuery(BatchQueryRequest {
            target: scope.target(),
            fields: self.field_set(scope, options.fields)?,
            filter: group.shape(),
            order: options.order,
            page,
            rows_per_batch,
            hints: options.hints,
            dialect: self.executor.dialect(),
        });
        let command = Command::new(&*self.text(&key)?, group.map_parameters()?);
        self.run(&key, command, Vec::new, |c| self.executor.query(c))
    }

    // ==================== Aggregates ====================

    /// Aggregate over the rows matching `filter`; `field` may be omitted for
    /// `Count`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = scope.table_name(), function = ?function))]
    pub fn aggregate(
        &self,
        function: Aggregate,
        scope: &Scope,
        field: Option<&str>,
        filter: impl Into<FilterInput>,
        hints: Option<&str>,
    ) -> Result<Value> {
        let group = scope.normalize(filter.into(), self.source)?;
        let key = CacheKey::Aggregate(AggregateRequest {
            function,
            target: scope.target(),
            field: field.map(|f| scope.column(f).name().to_string()),
            filter: group.shape(),
            hints: hints.map(str::to_string),
            dialect: self.executor.dialect(),
        });
        let command = Command::new(&*self.text(&key)?, group.map_parameters()?);
        self.run(&key, command, || Value::Null, |c| self.executor.scalar(c))
    }

    /// Number of matching rows.
    pub fn count(&self, scope: &Scope, filter: impl Into<FilterInput>) -> Result<i64> {
        let value = self.aggregate(Aggregate::Count, scope, None, filter, None)?;
        Ok(value.as_i64().unwrap_or(0))
    }

    /// Number of rows.
    pub fn count_all(&self, scope: &Scope) -> Result<i64> {
        self.count(scope, FilterInput::Empty)
    }

    pub fn max(&self, scope: &Scope, field: &str, filter: impl Into<FilterInput>) -> Result<Value> {
        self.aggregate(Aggregate::Max, scope, Some(field), filter, None)
    }

    pub fn min(&self, scope: &Scope, field: &str, filter: impl Into<FilterInput>) -> Result<Value> {
        self.aggregate(Aggregate::Min, scope, Some(field), filter, None)
    }

    pub fn sum(&self, scope: &Scope, field: &str, filter: impl Into<FilterInput>) -> Result<Value> {
        self.aggregate(Aggregate::Sum, scope, Some(field), filter, None)
    }

    pub fn average(
        &self,
        scope: &Scope,
        field: &str,
        filter: impl Into<FilterInput>,
    ) -> Result<Value> {
        self.aggregate(Aggregate::Average, scope, Some(field), filter, None)
    }

    /// Whether any row matches.
    #[tracing::instrument(level = "debug", skip_all, fields(table = scope.table_name()))]
    pub fn exists(
        &self,
        scope: &Scope,
        filter: impl Into<FilterInput>,
        hints: Option<&str>,
    ) -> Result<bool> {
        let group = scope.normalize(filter.into(), self.source)?;
        let key = CacheKey::Exists(ExistsRequest {
            target: scope.target(),
            filter: group.shape(),
            hints: hints.map(str::to_string),
            dialect: self.executor.dialect(),
        });
        let command = Command::new(&*self.text(&key)?, group.map_parameters()?);
        self.run(&key, command, || false, |c| {
            self.executor.scalar(c).map(|v| !v.is_null())
        })
    }

    // ==================== Writes ====================

    /// Insert one row, returning its identity (or primary) value.
    #[tracing::instrument(level = "debug", skip_all, fields(table = scope.table_name()))]
    pub fn insert(&self, scope: &Scope, values: ParameterBag, hints: Option<&str>) -> Result<Value> {
        let values = self.to_columns(scope, values)?;
        let key = CacheKey::Insert(InsertRequest {
            target: scope.target(),
            fields: fields_of(&values),
            primary: name_of(scope.optional_primary(self.source)?),
            identity: name_of(scope.identity(self.source)?),
            hints: hints.map(str::to_string),
            dialect: self.executor.dialect(),
        });
        let (text, prefix) = self.text_and_prefix(&key)?;
        let command = Command::new(&*text, referenced(&text, &prefix, values));
        self.run(&key, command, || Value::Null, |c| self.executor.scalar(c))
    }

    /// Update the given columns of the rows matching `filter`.
    ///
    /// An empty filter targets the row whose primary key value is in
    /// `values`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = scope.table_name()))]
    pub fn update(
        &self,
        scope: &Scope,
        values: ParameterBag,
        filter: impl Into<FilterInput>,
        hints: Option<&str>,
    ) -> Result<u64> {
        let values = self.to_columns(scope, values)?;
        let primary = scope.optional_primary(self.source)?;
        let filter = match filter.into() {
            FilterInput::Empty => {
                let primary = scope.primary(self.source)?;
                let value = values.get(primary.name()).cloned().ok_or_else(|| {
                    Error::Metadata(MetadataError {
                        kind: MetadataErrorKind::PrimaryKeyNotFound,
                        target: scope.table_name().to_string(),
                        message: format!("no value given for primary key '{}'", primary.name()),
                    })
                })?;
                FilterInput::Key(value)
            }
            other => other,
        };
        let mut group = scope.normalize(filter, self.source)?;
        group.prefix_parameters("_");

        let key = CacheKey::Update(UpdateRequest {
            target: scope.target(),
            fields: fields_of(&values),
            filter: group.shape(),
            primary: name_of(primary),
            identity: name_of(scope.identity(self.source)?),
            hints: hints.map(str::to_string),
            dialect: self.executor.dialect(),
        });
        let (text, prefix) = self.text_and_prefix(&key)?;
        let mut parameters = referenced(&text, &prefix, values);
        parameters.extend(group.map_parameters()?)?;
        let command = Command::new(&*text, parameters);
        self.run(&key, command, || 0, |c| self.executor.execute(c))
    }

    /// Delete the rows matching `filter`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = scope.table_name()))]
    pub fn delete(
        &self,
        scope: &Scope,
        filter: impl Into<FilterInput>,
        hints: Option<&str>,
    ) -> Result<u64> {
        let group = scope.normalize(filter.into(), self.source)?;
        let key = CacheKey::Delete(DeleteRequest {
            target: scope.target(),
            filter: group.shape(),
            hints: hints.map(str::to_string),
            dialect: self.executor.dialect(),
        });
        let command = Command::new(&*self.text(&key)?, group.map_parameters()?);
        self.run(&key, command, || 0, |c| self.executor.execute(c))
    }

    /// Delete every row.
    pub fn delete_all(&self, scope: &Scope, hints: Option<&str>) -> Result<u64> {
        self.delete(scope, FilterInput::Empty, hints)
    }

    /// Insert or update one row matched on `qualifiers` (default: the
    /// primary key), returning its identity (or primary) value.
    #[tracing::instrument(level = "debug", skip_all, fields(table = scope.table_name()))]
    pub fn merge(
        &self,
        scope: &Scope,
        values: ParameterBag,
        qualifiers: Option<Vec<Field>>,
        hints: Option<&str>,
    ) -> Result<Value> {
        let values = self.to_columns(scope, values)?;
        let qualifiers = qualifiers
            .unwrap_or_default()
            .iter()
            .map(|q| scope.column(q.name()).name().to_string())
            .collect();
        let key = CacheKey::Merge(MergeRequest {
            target: scope.target(),
            fields: fields_of(&values),
            qualifiers: FieldSet::new(qualifiers),
            primary: name_of(scope.optional_primary(self.source)?),
            identity: name_of(scope.identity(self.source)?),
            hints: hints.map(str::to_string),
            dialect: self.executor.dialect(),
        });
        let (text, prefix) = self.text_and_prefix(&key)?;
        let command = Command::new(&*text, referenced(&text, &prefix, values));
        self.run(&key, command, || Value::Null, |c| self.executor.scalar(c))
    }

    /// Remove every row of the target.
    #[tracing::instrument(level = "debug", skip_all, fields(table = scope.table_name()))]
    pub fn truncate(&self, scope: &Scope) -> Result<u64> {
        let key = CacheKey::Truncate(TruncateRequest {
            target: scope.target(),
            dialect: self.executor.dialect(),
        });
        let command = Command::new(&*self.text(&key)?, ParameterBag::new());
        self.run(&key, command, || 0, |c| self.executor.execute(c))
    }

    // ==================== Plumbing ====================

    fn query_request(
        &self,
        scope: &Scope,
        group: &QueryGroup,
        options: QueryOptions,
    ) -> Result<QueryRequest> {
        Ok(QueryRequest {
            target: scope.target(),
            fields: self.field_set(scope, options.fields)?,
            filter: group.shape(),
            order: options.order,
            top: options.top,
            hints: options.hints,
            dialect: self.executor.dialect(),
        })
    }

    fn field_set(&self, scope: &Scope, fields: Option<Vec<Field>>) -> Result<FieldSet> {
        let fields = match fields {
            Some(fields) => fields,
            None => scope.fields(self.source)?,
        };
        Ok(FieldSet::from_fields(&fields))
    }

    fn text(&self, key: &CacheKey) -> Result<Arc<str>> {
        self.text_and_prefix(key).map(|(text, _)| text)
    }

    /// Cached text plus the parameter prefix of the builder it belongs to.
    fn text_and_prefix(&self, key: &CacheKey) -> Result<(Arc<str>, String)> {
        let (builder, revision) = self.registry.get_with_revision(key.dialect())?;
        let text = self
            .cache
            .get_text(key, revision, |key| builder.build(key))?;
        Ok((text, builder.setting().parameter_prefix.clone()))
    }

    /// Rename value-bag entries to their column names.
    fn to_columns(&self, scope: &Scope, values: ParameterBag) -> Result<ParameterBag> {
        if values.is_empty() {
            return Err(Error::Metadata(MetadataError {
                kind: MetadataErrorKind::EmptyFieldSet,
                target: scope.table_name().to_string(),
                message: "no values given".to_string(),
            }));
        }
        let mut columns = ParameterBag::new();
        for (name, value) in values {
            let column = scope.column(&name);
            if !is_valid_parameter_name(column.name()) {
                return Err(Error::config(format!(
                    "column '{}' cannot be bound as a parameter",
                    column.name()
                )));
            }
            columns.insert(column.name(), value)?;
        }
        Ok(columns)
    }

    fn run<T>(
        &self,
        key: &CacheKey,
        command: Command,
        cancelled: impl FnOnce() -> T,
        execute: impl FnOnce(&Command) -> Result<T>,
    ) -> Result<T> {
        self.run_named(key.operation(), command, cancelled, execute)
    }

    fn run_named<T>(
        &self,
        operation: &'static str,
        command: Command,
        cancelled: impl FnOnce() -> T,
        execute: impl FnOnce(&Command) -> Result<T>,
    ) -> Result<T> {
        let command = match self.hook {
            Some(hook) => {
                let mut log = CancellableTraceLog::new(operation, command);
                hook.before(&mut log);
                if log.is_cancelled() {
                    tracing::warn!(operation, throw = log.is_throwing(), "command cancelled by trace hook");
                    if log.is_throwing() {
                        return Err(Error::Cancelled(log.statement().to_string()));
                    }
                    return Ok(cancelled());
                }
                log.into_command()
            }
            None => command,
        };

        tracing::debug!(
            operation,
            sql = %command.text,
            parameters = ?command.parameters.names().collect::<Vec<_>>(),
            "executing command"
        );
        let started = Instant::now();
        let result = execute(&command).map_err(|e| attach_sql(e, &command.text))?;

        if let Some(hook) = self.hook {
            hook.after(&TraceLog {
                operation,
                statement: command.text,
                parameters: command.parameters,
                elapsed: started.elapsed(),
            });
        }
        Ok(result)
    }
}

/// Keep only the parameters the statement text refers to.
fn referenced(text: &str, prefix: &str, values: ParameterBag) -> ParameterBag {
    values
        .into_iter()
        .filter(|(name, _)| mentions(text, &format!("{prefix}{name}")))
        .collect()
}

fn fields_of(values: &ParameterBag) -> FieldSet {
    FieldSet::new(values.names().map(str::to_string).collect())
}

fn name_of(field: Option<Field>) -> Option<String> {
    field.map(|f| f.name().to_string())
}

/// Whether `marker` occurs in `text` as a whole parameter reference.
fn mentions(text: &str, marker: &str) -> bool {
    text.match_indices(marker).any(|(i, _)| {
        text[i + marker.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}

fn attach_sql(error: Error, sql: &str) -> Error {
    match error {
        Error::Execution(ExecutionError {
            message,
            sql: None,
            source,
        }) => Error::Execution(ExecutionError {
            message,
            sql: Some(sql.to_string()),
            source,
        }),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_whole_names_only() {
        let text = "UPDATE [T] SET [Id_1] = @Id_1 WHERE ([Id] = @_Id);";
        assert!(mentions(text, "@Id_1"));
        assert!(mentions(text, "@_Id"));
        assert!(!mentions(text, "@Id"));
        assert!(mentions("SELECT @Id AS [Result];", "@Id"));
        assert!(mentions("VALUES (@Id)", "@Id"));
    }

    #[test]
    fn test_attach_sql_only_when_missing() {
        let err = attach_sql(
            Error::Execution(ExecutionError {
                message: "boom".into(),
                sql: None,
                source: None,
            }),
            "SELECT 1;",
        );
        assert_eq!(err.sql(), Some("SELECT 1;"));

        let err = attach_sql(Error::Custom("x".into()), "SELECT 1;");
        assert_eq!(err.sql(), None);
    }

    #[test]
    fn test_query_options_builder() {
        let options = QueryOptions::new()
            .fields(Field::parse_names(["Id"]))
            .order_by(OrderField::descending("Id"))
            .top(3)
            .hints("WITH (NOLOCK)");
        assert_eq!(options.top, Some(3));
        assert_eq!(options.order.len(), 1);
        assert_eq!(options.hints.as_deref(), Some("WITH (NOLOCK)"));
    }
}
