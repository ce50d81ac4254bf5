//! Filter inputs and their normalization into a [`QueryGroup`].

use serde::Serialize;
use sqlshape_core::{
    Entity, Error, Field, FieldInfo, FieldSource, MetadataError, MetadataErrorKind, Result, Value,
};

use crate::expression::{self, Expression};
use crate::query_field::QueryField;
use crate::query_group::QueryGroup;
use crate::request::Target;

/// Every accepted way of describing a filter.
///
/// All variants are resolved by [`Scope::normalize`]; named-value inputs
/// become an AND of equalities.
#[derive(Debug, Clone, Default)]
pub enum FilterInput {
    /// No filter
    #[default]
    Empty,
    /// Typed predicate
    Expression(Expression),
    /// One predicate
    Field(QueryField),
    /// AND of predicates
    Fields(Vec<QueryField>),
    /// AND of `name = value` equalities
    Values(Vec<(String, Value)>),
    /// JSON object of named values; `null` means no filter
    Json(serde_json::Value),
    /// A ready-made tree
    Group(QueryGroup),
    /// Equality on the primary key
    Key(Value),
}

impl FilterInput {
    /// Named values taken from the properties of any serializable struct.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| Error::Custom(format!("failed to serialize filter: {e}")))?;
        Ok(FilterInput::Json(json))
    }

    /// Primary key equality.
    pub fn key(value: impl Into<Value>) -> Self {
        FilterInput::Key(value.into())
    }

    /// AND of `(name, operator, value)` triples.
    pub fn triples<I, N, V>(triples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, crate::Operator, V)>,
        N: Into<Field>,
        V: Into<Value>,
    {
        let fields = triples
            .into_iter()
            .map(|(name, op, value)| QueryField::new(name, op, value))
            .collect::<Result<Vec<_>>>()?;
        Ok(FilterInput::Fields(fields))
    }
}

impl From<Expression> for FilterInput {
    fn from(expr: Expression) -> Self {
        FilterInput::Expression(expr)
    }
}

impl From<Option<Expression>> for FilterInput {
    fn from(expr: Option<Expression>) -> Self {
        expr.map_or(FilterInput::Empty, FilterInput::Expression)
    }
}

impl From<QueryField> for FilterInput {
    fn from(field: QueryField) -> Self {
        FilterInput::Field(field)
    }
}

impl From<Vec<QueryField>> for FilterInput {
    fn from(fields: Vec<QueryField>) -> Self {
        FilterInput::Fields(fields)
    }
}

impl From<QueryGroup> for FilterInput {
    fn from(group: QueryGroup) -> Self {
        FilterInput::Group(group)
    }
}

impl From<serde_json::Value> for FilterInput {
    fn from(json: serde_json::Value) -> Self {
        FilterInput::Json(json)
    }
}

/// What an operation addresses: a mapped entity or a bare table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Entity {
        type_name: &'static str,
        table: &'static str,
        fields: &'static [FieldInfo],
    },
    Table(String),
}

impl Scope {
    /// Scope of a mapped entity type.
    pub fn entity<E: Entity>() -> Self {
        Scope::Entity {
            type_name: std::any::type_name::<E>(),
            table: E::TABLE_NAME,
            fields: E::fields(),
        }
    }

    /// Scope of a table addressed by name.
    pub fn table(name: impl Into<String>) -> Self {
        Scope::Table(name.into())
    }

    pub fn table_name(&self) -> &str {
        match self {
            Scope::Entity { table, .. } => table,
            Scope::Table(name) => name,
        }
    }

    /// Fingerprint target.
    pub fn target(&self) -> Target {
        match self {
            Scope::Entity {
                type_name, table, ..
            } => Target::Entity {
                type_name: *type_name,
                table: *table,
            },
            Scope::Table(name) => Target::Table(name.clone()),
        }
    }

    /// Default field set: entity metadata, else the metadata source.
    pub fn fields(&self, source: Option<&dyn FieldSource>) -> Result<Vec<Field>> {
        match self {
            Scope::Entity { fields, .. } if !fields.is_empty() => {
                Ok(fields.iter().map(Field::from_info).collect())
            }
            _ => match source {
                Some(source) => source.get_fields(self.table_name()),
                None => Err(self.metadata_error(
                    MetadataErrorKind::FieldsNotFound,
                    "no fields are known for this table",
                )),
            },
        }
    }

    /// Primary key column.
    pub fn primary(&self, source: Option<&dyn FieldSource>) -> Result<Field> {
        self.optional_primary(source)?.ok_or_else(|| {
            self.metadata_error(
                MetadataErrorKind::PrimaryKeyNotFound,
                "table has no primary key",
            )
        })
    }

    /// Primary key column, if declared.
    pub fn optional_primary(&self, source: Option<&dyn FieldSource>) -> Result<Option<Field>> {
        match self {
            Scope::Entity { fields, .. } => {
                Ok(fields.iter().find(|f| f.primary_key).map(Field::from_info))
            }
            Scope::Table(name) => match source {
                Some(source) => Ok(source.table_fields(name)?.and_then(|meta| meta.primary)),
                None => Ok(None),
            },
        }
    }

    /// Identity column, if declared.
    pub fn identity(&self, source: Option<&dyn FieldSource>) -> Result<Option<Field>> {
        match self {
            Scope::Entity { fields, .. } => {
                Ok(fields.iter().find(|f| f.identity).map(Field::from_info))
            }
            Scope::Table(name) => match source {
                Some(source) => Ok(source.table_fields(name)?.and_then(|meta| meta.identity)),
                None => Ok(None),
            },
        }
    }

    /// Map a member or column name to a column, keeping unknown names as given.
    pub fn column(&self, name: &str) -> Field {
        match self {
            Scope::Entity { fields, table, .. } => {
                expression::member_in(fields, table, name).unwrap_or_else(|_| Field::new(name))
            }
            Scope::Table(_) => Field::new(name),
        }
    }

    /// Resolve any filter input into a tree with per-tree unique parameter
    /// names.
    pub fn normalize(
        &self,
        input: FilterInput,
        source: Option<&dyn FieldSource>,
    ) -> Result<QueryGroup> {
        let mut group = match input {
            FilterInput::Empty => QueryGroup::empty(),
            FilterInput::Expression(expr) => match self {
                Scope::Entity { fields, table, .. } => {
                    expression::translate(&expr, &|m: &str| expression::member_in(fields, table, m))?
                }
                Scope::Table(_) => expression::translate(&expr, &expression::passthrough_resolver)?,
            },
            FilterInput::Field(field) => QueryGroup::and(vec![field]),
            FilterInput::Fields(fields) => QueryGroup::and(fields),
            FilterInput::Values(pairs) => self.equalities(pairs)?,
            FilterInput::Json(json) => match json {
                serde_json::Value::Null => QueryGroup::empty(),
                serde_json::Value::Object(map) => self.equalities(
                    map.into_iter()
                        .map(|(name, value)| (name, Value::from_json(value)))
                        .collect(),
                )?,
                other => {
                    return Err(Error::unsupported_expression(format!(
                        "Json({})",
                        json_kind(&other)
                    )));
                }
            },
            FilterInput::Group(group) => group,
            FilterInput::Key(value) => {
                QueryGroup::and(vec![QueryField::equal(self.primary(source)?, value)?])
            }
        };
        group.fix_parameters();
        Ok(group)
    }

    fn equalities(&self, pairs: Vec<(String, Value)>) -> Result<QueryGroup> {
        let fields = pairs
            .into_iter()
            .map(|(name, value)| {
                let operator = if value.is_array() {
                    crate::Operator::In
                } else {
                    crate::Operator::Equal
                };
                QueryField::new(self.column(&name), operator, value)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(QueryGroup::and(fields))
    }

    fn metadata_error(&self, kind: MetadataErrorKind, message: &str) -> Error {
        Error::Metadata(MetadataError {
            kind,
            target: self.table_name().to_string(),
            message: message.to_string(),
        })
    }
}

impl From<&str> for Scope {
    fn from(name: &str) -> Self {
        Scope::Table(name.to_string())
    }
}

impl From<String> for Scope {
    fn from(name: String) -> Self {
        Scope::Table(name)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
