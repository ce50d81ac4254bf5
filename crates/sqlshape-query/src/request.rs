//! Request fingerprints.
//!
//! Each operation has a request type carrying exactly the structural inputs
//! that influence its generated text: target, field set, filter shape,
//! ordering, paging, hints and dialect. Requests derive `Eq` and `Hash`, so
//! two calls that differ only in bound values produce equal keys.

use sqlshape_core::{Dialect, Field};

use crate::order::OrderField;
use crate::shape::FilterShape;

/// The table a request addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A mapped entity type and its table
    Entity {
        type_name: &'static str,
        table: &'static str,
    },
    /// A table addressed by name
    Table(String),
}

impl Target {
    /// The (possibly schema-qualified) table name.
    pub fn table(&self) -> &str {
        match self {
            Target::Entity { table, .. } => table,
            Target::Table(name) => name,
        }
    }
}

/// Ordered column names of a request.
///
/// Two sets are equal only when their names match exactly, so fingerprints
/// never conflate columns that differ in case. Membership checks made while
/// rendering one request ([`FieldSet::contains`], the identity and key
/// filters of the statement builders) ignore ASCII case, matching how
/// [`Field`] resolves names against metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldSet(Vec<String>);

impl FieldSet {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn from_fields(fields: &[Field]) -> Self {
        Self(fields.iter().map(|f| f.name().to_string()).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether `name` is in the set, ignoring case.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Count,
    Max,
    Min,
    Sum,
    Average,
}

impl Aggregate {
    /// SQL function name.
    pub const fn function(self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
            Aggregate::Max => "MAX",
            Aggregate::Min => "MIN",
            Aggregate::Sum => "SUM",
            Aggregate::Average => "AVG",
        }
    }

    /// Column alias of the result.
    pub const fn alias(self) -> &'static str {
        match self {
            Aggregate::Count => "CountValue",
            Aggregate::Max => "MaxValue",
            Aggregate::Min => "MinValue",
            Aggregate::Sum => "SumValue",
            Aggregate::Average => "AverageValue",
        }
    }
}

/// Filtered query with optional ordering, top and hints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryRequest {
    pub target: Target,
    pub fields: FieldSet,
    pub filter: FilterShape,
    pub order: Vec<OrderField>,
    pub top: Option<u64>,
    pub hints: Option<String>,
    pub dialect: Dialect,
}

impl QueryRequest {
    pub fn new(target: Target, fields: FieldSet, dialect: Dialect) -> Self {
        Self {
            target,
            fields,
            filter: FilterShape::empty(),
            order: Vec::new(),
            top: None,
            hints: None,
            dialect,
        }
    }

    pub fn filter(mut self, filter: FilterShape) -> Self {
        self.filter = filter;
        self
    }

    pub fn order(mut self, order: Vec<OrderField>) -> Self {
        self.order = order;
        self
    }

    pub fn top(mut self, top: Option<u64>) -> Self {
        self.top = top;
        self
    }

    pub fn hints(mut self, hints: Option<String>) -> Self {
        self.hints = hints;
        self
    }
}

/// Unfiltered query of every row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryAllRequest {
    pub target: Target,
    pub fields: FieldSet,
    pub order: Vec<OrderField>,
    pub hints: Option<String>,
    pub dialect: Dialect,
}

/// One statement of a multi-statement command.
///
/// The position is part of the key because fixed parameter names depend
/// on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryMultipleRequest {
    pub index: usize,
    pub inner: QueryRequest,
}

/// One page of an ordered query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchQueryRequest {
    pub target: Target,
    pub fields: FieldSet,
    pub filter: FilterShape,
    pub order: Vec<OrderField>,
    /// Zero-based page index
    pub page: u64,
    pub rows_per_batch: u64,
    pub hints: Option<String>,
    pub dialect: Dialect,
}

/// Count/Max/Min/Sum/Average with an optional filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateRequest {
    pub function: Aggregate,
    pub target: Target,
    /// Aggregated column; `None` counts rows
    pub field: Option<String>,
    pub filter: FilterShape,
    pub hints: Option<String>,
    pub dialect: Dialect,
}

/// Whether any row matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExistsRequest {
    pub target: Target,
    pub filter: FilterShape,
    pub hints: Option<String>,
    pub dialect: Dialect,
}

/// Single-row insert returning the identity (or primary) value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InsertRequest {
    pub target: Target,
    pub fields: FieldSet,
    pub primary: Option<String>,
    pub identity: Option<String>,
    pub hints: Option<String>,
    pub dialect: Dialect,
}

/// Filtered update of the given fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpdateRequest {
    pub target: Target,
    pub fields: FieldSet,
    pub filter: FilterShape,
    pub primary: Option<String>,
    pub identity: Option<String>,
    pub hints: Option<String>,
    pub dialect: Dialect,
}

/// Filtered (or unfiltered) delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteRequest {
    pub target: Target,
    pub filter: FilterShape,
    pub hints: Option<String>,
    pub dialect: Dialect,
}

/// Insert-or-update matched on qualifier fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeRequest {
    pub target: Target,
    pub fields: FieldSet,
    /// Match columns; empty means "the primary key"
    pub qualifiers: FieldSet,
    pub primary: Option<String>,
    pub identity: Option<String>,
    pub hints: Option<String>,
    pub dialect: Dialect,
}

/// Remove every row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TruncateRequest {
    pub target: Target,
    pub dialect: Dialect,
}

/// Key of the command-text cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Query(QueryRequest),
    QueryAll(QueryAllRequest),
    QueryMultiple(QueryMultipleRequest),
    BatchQuery(BatchQueryRequest),
    Aggregate(AggregateRequest),
    Exists(ExistsRequest),
    Insert(InsertRequest),
    Update(UpdateRequest),
    Delete(DeleteRequest),
    Merge(MergeRequest),
    Truncate(TruncateRequest),
}

impl CacheKey {
    /// Operation name, used in logs and trace records.
    pub fn operation(&self) -> &'static str {
        match self {
            CacheKey::Query(_) => "Query",
            CacheKey::QueryAll(_) => "QueryAll",
            CacheKey::QueryMultiple(_) => "QueryMultiple",
            CacheKey::BatchQuery(_) => "BatchQuery",
            CacheKey::Aggregate(r) => match r.function {
                Aggregate::Count => "Count",
                Aggregate::Max => "Max",
                Aggregate::Min => "Min",
                Aggregate::Sum => "Sum",
                Aggregate::Average => "Average",
            },
            CacheKey::Exists(_) => "Exists",
            CacheKey::Insert(_) => "Insert",
            CacheKey::Update(_) => "Update",
            CacheKey::Delete(_) => "Delete",
            CacheKey::Merge(_) => "Merge",
            CacheKey::Truncate(_) => "Truncate",
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            CacheKey::Query(r) => r.dialect,
            CacheKey::QueryAll(r) => r.dialect,
            CacheKey::QueryMultiple(r) => r.inner.dialect,
            CacheKey::BatchQuery(r) => r.dialect,
            CacheKey::Aggregate(r) => r.dialect,
            CacheKey::Exists(r) => r.dialect,
            CacheKey::Insert(r) => r.dialect,
            CacheKey::Update(r) => r.dialect,
            CacheKey::Delete(r) => r.dialect,
            CacheKey::Merge(r) => r.dialect,
            CacheKey::Truncate(r) => r.dialect,
        }
    }

    pub fn target(&self) -> &Target {
        match self {
            CacheKey::Query(r) => &r.target,
            CacheKey::QueryAll(r) => &r.target,
            CacheKey::QueryMultiple(r) => &r.inner.target,
            CacheKey::BatchQuery(r) => &r.target,
            CacheKey::Aggregate(r) => &r.target,
            CacheKey::Exists(r) => &r.target,
            CacheKey::Insert(r) => &r.target,
            CacheKey::Update(r) => &r.target,
            CacheKey::Delete(r) => &r.target,
            CacheKey::Merge(r) => &r.target,
            CacheKey::Truncate(r) => &r.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_field::QueryField;
    use crate::query_group::QueryGroup;
    use std::collections::HashSet;

    fn query(group: &QueryGroup) -> CacheKey {
        CacheKey::Query(
            QueryRequest::new(
                Target::Table("Person".into()),
                FieldSet::new(vec!["Id".into(), "Name".into()]),
                Dialect::SqlServer,
            )
            .filter(group.shape()),
        )
    }

    #[test]
    fn test_values_do_not_affect_keys() {
        let a = QueryGroup::and(vec![QueryField::equal("Id", 1).unwrap()]);
        let b = QueryGroup::and(vec![QueryField::equal("Id", 2).unwrap()]);
        assert_eq!(query(&a), query(&b));

        let mut set = HashSet::new();
        set.insert(query(&a));
        assert!(set.contains(&query(&b)));
    }

    #[test]
    fn test_topology_affects_keys() {
        let a = QueryGroup::and(vec![QueryField::equal("Id", 1).unwrap()]);
        let b = QueryGroup::and(vec![QueryField::equal("Id", 1).unwrap()]).with_group(
            QueryGroup::or(vec![
                QueryField::equal("Name", "x").unwrap(),
                QueryField::equal("Name", "y").unwrap(),
            ]),
        );
        assert_ne!(query(&a), query(&b));
    }

    #[test]
    fn test_structure_affects_keys() {
        let base = QueryRequest::new(
            Target::Table("Person".into()),
            FieldSet::new(vec!["Id".into()]),
            Dialect::Postgres,
        );
        let other_dialect = QueryRequest {
            dialect: Dialect::Mysql,
            ..base.clone()
        };
        let other_case = QueryRequest {
            fields: FieldSet::new(vec!["ID".into()]),
            ..base.clone()
        };
        let with_top = base.clone().top(Some(10));
        assert_ne!(base, other_dialect);
        assert_ne!(base, other_case);
        assert_ne!(base, with_top);
    }

    #[test]
    fn test_field_set_equality_exact_membership_folded() {
        let upper = FieldSet::new(vec!["Id".into(), "Name".into()]);
        let lower = FieldSet::new(vec!["id".into(), "name".into()]);
        assert_ne!(upper, lower);
        assert!(upper.contains("ID"));
        assert!(lower.contains("Name"));
        assert!(!upper.contains("Age"));
    }

    #[test]
    fn test_key_metadata() {
        let key = CacheKey::Truncate(TruncateRequest {
            target: Target::Table("dbo.Person".into()),
            dialect: Dialect::Sqlite,
        });
        assert_eq!(key.operation(), "Truncate");
        assert_eq!(key.dialect(), Dialect::Sqlite);
        assert_eq!(key.target().table(), "dbo.Person");
    }
}
