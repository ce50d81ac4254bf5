//! Dialect statement builders.
//!
//! A [`StatementBuilder`] turns a request fingerprint into SQL text. Only
//! value-free inputs reach it, so the text it returns is safe to cache per
//! fingerprint. The default methods render the ANSI-ish forms shared by most
//! backends; each dialect overrides what differs.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

pub use mysql::MysqlStatementBuilder;
pub use postgres::PostgresStatementBuilder;
pub use sqlite::SqliteStatementBuilder;
pub use sqlserver::SqlServerStatementBuilder;

use sqlshape_core::{DbSetting, Dialect, Error, MetadataError, MetadataErrorKind, Result};

use crate::order::OrderField;
use crate::request::{
    Aggregate, AggregateRequest, BatchQueryRequest, CacheKey, DeleteRequest, ExistsRequest,
    FieldSet, InsertRequest, MergeRequest, QueryAllRequest, QueryRequest, TruncateRequest,
    UpdateRequest,
};
use crate::shape::FilterShape;

/// Row limiting of a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    None,
    /// First `n` rows
    Top(u64),
    /// `rows` rows after skipping `offset`
    Page { offset: u64, rows: u64 },
}

/// Dialect-neutral description of a SELECT.
#[derive(Debug, Clone)]
pub struct Select<'a> {
    pub table: &'a str,
    /// Rendered column expressions
    pub columns: Vec<String>,
    pub filter: &'a FilterShape,
    pub order: &'a [OrderField],
    pub hints: Option<&'a str>,
    pub paging: Paging,
}

/// Renders SQL text for every operation of one dialect.
///
/// Implementations must be deterministic: equal requests yield equal text.
pub trait StatementBuilder: Send + Sync {
    /// Dialect this builder renders for.
    fn dialect(&self) -> Dialect;

    /// Text rules used for quoting, parameters and terminators.
    fn setting(&self) -> &DbSetting;

    /// `INSERT` returning the identity (or primary) value as `Result`.
    fn create_insert(&self, request: &InsertRequest) -> Result<String>;

    /// Insert-or-update matched on the request's qualifiers.
    fn create_merge(&self, request: &MergeRequest) -> Result<String>;

    /// SELECT with `LIMIT`/`OFFSET` paging.
    fn create_select(&self, select: &Select<'_>) -> Result<String> {
        let setting = self.setting();
        let mut sql = format!(
            "SELECT {} FROM {}{}",
            select.columns.join(", "),
            setting.quote_table(select.table),
            self.hints_clause(select.hints)?
        );
        sql.push_str(&where_clause(setting, select.filter));
        sql.push_str(&order_clause(setting, select.order));
        match select.paging {
            Paging::None => {}
            Paging::Top(n) => sql.push_str(&format!(" LIMIT {n}")),
            Paging::Page { offset, rows } => {
                sql.push_str(&format!(" LIMIT {rows} OFFSET {offset}"));
            }
        }
        sql.push_str(&setting.statement_terminator);
        Ok(sql)
    }

    /// Average expression over a quoted column.
    fn average_expression(&self, column: &str) -> String {
        format!("AVG({column})")
    }

    /// Table hint clause, rejected where the dialect has no hints.
    fn hints_clause(&self, hints: Option<&str>) -> Result<String> {
        match hints.map(str::trim) {
            None | Some("") => Ok(String::new()),
            Some(hints) if self.setting().supports_table_hints => Ok(format!(" {hints}")),
            Some(_) => Err(Error::unsupported(self.dialect().name(), "table hints")),
        }
    }

    fn create_query(&self, request: &QueryRequest) -> Result<String> {
        let table = request.target.table();
        self.create_select(&Select {
            table,
            columns: column_list(self.setting(), table, &request.fields)?,
            filter: &request.filter,
            order: &request.order,
            hints: request.hints.as_deref(),
            paging: request.top.map_or(Paging::None, Paging::Top),
        })
    }

    fn create_query_all(&self, request: &QueryAllRequest) -> Result<String> {
        let table = request.target.table();
        self.create_select(&Select {
            table,
            columns: column_list(self.setting(), table, &request.fields)?,
            filter: &FilterShape::empty(),
            order: &request.order,
            hints: request.hints.as_deref(),
            paging: Paging::None,
        })
    }

    fn create_batch_query(&self, request: &BatchQueryRequest) -> Result<String> {
        let table = request.target.table();
        if request.order.is_empty() {
            return Err(Error::unsupported(
                self.dialect().name(),
                "batch query without an ORDER BY",
            ));
        }
        if request.rows_per_batch == 0 {
            return Err(Error::config("rows per batch must be greater than zero"));
        }
        self.create_select(&Select {
            table,
            columns: column_list(self.setting(), table, &request.fields)?,
            filter: &request.filter,
            order: &request.order,
            hints: request.hints.as_deref(),
            paging: Paging::Page {
                offset: request.page.saturating_mul(request.rows_per_batch),
                rows: request.rows_per_batch,
            },
        })
    }

    fn create_aggregate(&self, request: &AggregateRequest) -> Result<String> {
        let setting = self.setting();
        let table = request.target.table();
        let expression = match (request.function, request.field.as_deref()) {
            (Aggregate::Count, None) => "COUNT(*)".to_string(),
            (Aggregate::Average, Some(field)) => self.average_expression(&setting.quote(field)),
            (function, Some(field)) => {
                format!("{}({})", function.function(), setting.quote(field))
            }
            (_, None) => return Err(empty_field_set(table, "aggregate needs a field")),
        };
        self.create_select(&Select {
            table,
            columns: vec![format!(
                "{expression} AS {}",
                setting.quote(request.function.alias())
            )],
            filter: &request.filter,
            order: &[],
            hints: request.hints.as_deref(),
            paging: Paging::None,
        })
    }

    fn create_exists(&self, request: &ExistsRequest) -> Result<String> {
        self.create_select(&Select {
            table: request.target.table(),
            columns: vec![format!("1 AS {}", self.setting().quote("ExistsValue"))],
            filter: &request.filter,
            order: &[],
            hints: request.hints.as_deref(),
            paging: Paging::Top(1),
        })
    }

    /// `UPDATE ... SET` over every field except primary and identity.
    fn create_update(&self, request: &UpdateRequest) -> Result<String> {
        let setting = self.setting();
        let table = request.target.table();
        let keys = [request.primary.as_deref(), request.identity.as_deref()];
        let assignments: Vec<String> = request
            .fields
            .names()
            .iter()
            .filter(|name| !is_any_of(name, &keys))
            .map(|name| format!("{} = {}", setting.quote(name), setting.as_parameter(name)))
            .collect();
        if assignments.is_empty() {
            return Err(empty_field_set(table, "nothing to update"));
        }
        let mut sql = format!(
            "UPDATE {}{} SET {}",
            setting.quote_table(table),
            self.hints_clause(request.hints.as_deref())?,
            assignments.join(", ")
        );
        sql.push_str(&where_clause(setting, &request.filter));
        sql.push_str(&setting.statement_terminator);
        Ok(sql)
    }

    fn create_delete(&self, request: &DeleteRequest) -> Result<String> {
        let setting = self.setting();
        let mut sql = format!(
            "DELETE FROM {}{}",
            setting.quote_table(request.target.table()),
            self.hints_clause(request.hints.as_deref())?
        );
        sql.push_str(&where_clause(setting, &request.filter));
        sql.push_str(&setting.statement_terminator);
        Ok(sql)
    }

    fn create_truncate(&self, request: &TruncateRequest) -> Result<String> {
        let setting = self.setting();
        Ok(format!(
            "TRUNCATE TABLE {}{}",
            setting.quote_table(request.target.table()),
            setting.statement_terminator
        ))
    }

    /// Render the text for any fingerprint.
    fn build(&self, key: &CacheKey) -> Result<String> {
        if key.dialect() != self.dialect() {
            return Err(Error::config(format!(
                "{} builder cannot render a {} request",
                self.dialect(),
                key.dialect()
            )));
        }
        match key {
            CacheKey::Query(r) => self.create_query(r),
            CacheKey::QueryAll(r) => self.create_query_all(r),
            CacheKey::QueryMultiple(r) => self.create_query(&r.inner),
            CacheKey::BatchQuery(r) => self.create_batch_query(r),
            CacheKey::Aggregate(r) => self.create_aggregate(r),
            CacheKey::Exists(r) => self.create_exists(r),
            CacheKey::Insert(r) => self.create_insert(r),
            CacheKey::Update(r) => self.create_update(r),
            CacheKey::Delete(r) => self.create_delete(r),
            CacheKey::Merge(r) => self.create_merge(r),
            CacheKey::Truncate(r) => self.create_truncate(r),
        }
    }
}

/// Quoted column list; an empty set is an error.
pub(crate) fn column_list(setting: &DbSetting, table: &str, fields: &FieldSet) -> Result<Vec<String>> {
    if fields.is_empty() {
        return Err(empty_field_set(table, "no fields to select"));
    }
    Ok(fields.names().iter().map(|n| setting.quote(n)).collect())
}

/// ` WHERE <filter>`, or nothing for an empty filter.
pub(crate) fn where_clause(setting: &DbSetting, filter: &FilterShape) -> String {
    let text = filter.render(setting);
    if text.is_empty() {
        text
    } else {
        format!(" WHERE {text}")
    }
}

/// ` ORDER BY ...`, or nothing.
pub(crate) fn order_clause(setting: &DbSetting, order: &[OrderField]) -> String {
    if order.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = order.iter().map(|o| o.render(setting)).collect();
    format!(" ORDER BY {}", parts.join(", "))
}

/// Columns written by an INSERT: every field except an identity that is
/// not used as a qualifier.
pub(crate) fn insertable<'a>(
    fields: &'a FieldSet,
    identity: Option<&str>,
    qualifiers: Option<&FieldSet>,
) -> Vec<&'a str> {
    fields
        .names()
        .iter()
        .map(String::as_str)
        .filter(|name| {
            let is_identity = identity.is_some_and(|id| id.eq_ignore_ascii_case(name));
            !is_identity || qualifiers.is_some_and(|q| q.contains(name))
        })
        .collect()
}

/// Columns a merge may update: not a qualifier, primary or identity.
pub(crate) fn updatable<'a>(request: &'a MergeRequest, qualifiers: &FieldSet) -> Vec<&'a str> {
    let keys = [request.primary.as_deref(), request.identity.as_deref()];
    request
        .fields
        .names()
        .iter()
        .map(String::as_str)
        .filter(|name| !qualifiers.contains(name) && !is_any_of(name, &keys))
        .collect()
}

/// Merge qualifiers: the explicit ones, else the primary key.
///
/// Every qualifier must be one of the written columns.
pub(crate) fn merge_qualifiers(request: &MergeRequest) -> Result<FieldSet> {
    let qualifiers = if request.qualifiers.is_empty() {
        match &request.primary {
            Some(primary) => FieldSet::new(vec![primary.clone()]),
            None => {
                return Err(Error::Metadata(MetadataError {
                    kind: MetadataErrorKind::PrimaryKeyNotFound,
                    target: request.target.table().to_string(),
                    message: "merge needs qualifiers or a primary key".to_string(),
                }));
            }
        }
    } else {
        request.qualifiers.clone()
    };

    if let Some(missing) = qualifiers
        .names()
        .iter()
        .find(|q| !request.fields.contains(q))
    {
        return Err(Error::Metadata(MetadataError {
            kind: MetadataErrorKind::QualifierNotFound,
            target: request.target.table().to_string(),
            message: format!("merge qualifier '{missing}' is not among the written fields"),
        }));
    }
    Ok(qualifiers)
}

/// The column whose value an insert or merge returns.
pub(crate) fn result_column<'a>(
    identity: Option<&'a str>,
    primary: Option<&'a str>,
) -> Option<&'a str> {
    identity.or(primary)
}

/// The primary key, when the request writes a value for it.
pub(crate) fn bound_primary<'a>(primary: Option<&'a str>, fields: &FieldSet) -> Option<&'a str> {
    primary.filter(|p| fields.contains(p))
}

pub(crate) fn empty_field_set(table: &str, message: &str) -> Error {
    Error::Metadata(MetadataError {
        kind: MetadataErrorKind::EmptyFieldSet,
        target: table.to_string(),
        message: message.to_string(),
    })
}

fn is_any_of(name: &str, keys: &[Option<&str>]) -> bool {
    keys.iter()
        .flatten()
        .any(|key| key.eq_ignore_ascii_case(name))
}
