//! Field and entity metadata.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::setting::DbSetting;
use crate::types::{SqlType, TypeInfo};

/// An immutable, named column reference with an optional type tag.
///
/// Two fields are equal when their names match case-insensitively and, if
/// both carry a type, the types match too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sql_type: Option<SqlType>,
}

impl Field {
    /// Create an untyped field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: None,
        }
    }

    /// Create a field tagged with an explicit SQL type.
    pub fn typed(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type: Some(sql_type),
        }
    }

    /// Create a field tagged with the SQL type of a Rust type.
    pub fn of<T: TypeInfo>(name: impl Into<String>) -> Self {
        Self::typed(name, T::sql_type())
    }

    /// Create a field from static entity metadata (column name + type).
    pub fn from_info(info: &FieldInfo) -> Self {
        Self::typed(info.column_name, info.sql_type.clone())
    }

    /// Create one untyped field per name.
    pub fn parse_names<I, S>(names: I) -> Vec<Field>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(Field::new).collect()
    }

    /// All fields of an entity, in declaration order.
    pub fn from_entity<E: Entity>() -> Vec<Field> {
        E::fields().iter().map(Field::from_info).collect()
    }

    /// The field (column) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type tag, if any.
    pub fn sql_type(&self) -> Option<&SqlType> {
        self.sql_type.as_ref()
    }

    /// Render the quoted column name for a dialect setting.
    pub fn as_field(&self, setting: &DbSetting) -> String {
        setting.quote(&self.name)
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        if !self.name.eq_ignore_ascii_case(&other.name) {
            return false;
        }
        match (&self.sql_type, &other.sql_type) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl Eq for Field {}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Only the name participates; the type is optional on either side.
        for b in self.name.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::new(name)
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Field::new(name)
    }
}

/// Metadata about an entity member and the column it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Rust member name
    pub name: &'static str,
    /// Database column name (may differ from member name)
    pub column_name: &'static str,
    /// SQL type for this field
    pub sql_type: SqlType,
    /// Whether this field is nullable
    pub nullable: bool,
    /// Whether this is the primary key
    pub primary_key: bool,
    /// Whether the database generates this value on insert
    pub identity: bool,
}

impl FieldInfo {
    /// Create a new field info with minimal required data.
    pub const fn new(name: &'static str, column_name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            column_name,
            sql_type,
            nullable: false,
            primary_key: false,
            identity: false,
        }
    }

    /// Set the database column name.
    pub const fn column(mut self, name: &'static str) -> Self {
        self.column_name = name;
        self
    }

    /// Set nullable flag.
    pub const fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Set primary key flag.
    pub const fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    /// Set identity (auto-generated) flag.
    pub const fn identity(mut self, value: bool) -> Self {
        self.identity = value;
        self
    }
}

/// A Rust type mapped to a database table.
///
/// Implementations are usually written once per entity with a `static`
/// slice of [`FieldInfo`].
pub trait Entity: Sized + Send + Sync {
    /// The name of the database table (optionally schema-qualified).
    const TABLE_NAME: &'static str;

    /// Get field metadata for all columns.
    fn fields() -> &'static [FieldInfo];

    /// The primary key field, if declared.
    fn primary_key() -> Option<&'static FieldInfo> {
        Self::fields().iter().find(|f| f.primary_key)
    }

    /// The identity field, if declared.
    fn identity() -> Option<&'static FieldInfo> {
        Self::fields().iter().find(|f| f.identity)
    }

    /// Resolve a member name to its mapped column name.
    fn column_for(member: &str) -> Option<&'static str> {
        Self::fields()
            .iter()
            .find(|f| f.name == member || f.column_name.eq_ignore_ascii_case(member))
            .map(|f| f.column_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Person;

    static PERSON_FIELDS: [FieldInfo; 3] = [
        FieldInfo::new("id", "Id", SqlType::BigInt)
            .primary_key(true)
            .identity(true),
        FieldInfo::new("name", "Name", SqlType::Text),
        FieldInfo::new("birth_date", "DateOfBirth", SqlType::Date).nullable(true),
    ];

    impl Entity for Person {
        const TABLE_NAME: &'static str = "Person";

        fn fields() -> &'static [FieldInfo] {
            &PERSON_FIELDS
        }
    }

    #[test]
    fn test_field_equality_ignores_case() {
        assert_eq!(Field::new("Name"), Field::new("NAME"));
        assert_ne!(Field::new("Name"), Field::new("Names"));
    }

    #[test]
    fn test_field_equality_checks_types_when_both_present() {
        assert_eq!(Field::of::<i32>("Id"), Field::new("id"));
        assert_ne!(Field::of::<i32>("Id"), Field::of::<String>("Id"));
        assert_eq!(Field::of::<i64>("Id"), Field::of::<Option<i64>>("ID"));
    }

    #[test]
    fn test_field_hash_consistent_with_eq() {
        let mut set = HashSet::new();
        set.insert(Field::new("Name"));
        assert!(set.contains(&Field::new("name")));
    }

    #[test]
    fn test_entity_metadata() {
        assert_eq!(Person::primary_key().map(|f| f.column_name), Some("Id"));
        assert_eq!(Person::identity().map(|f| f.name), Some("id"));
        assert_eq!(Person::column_for("birth_date"), Some("DateOfBirth"));
        assert_eq!(Person::column_for("missing"), None);

        let names: Vec<String> = Field::from_entity::<Person>()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, ["Id", "Name", "DateOfBirth"]);
    }

    #[test]
    fn test_field_serde() {
        let json = serde_json::to_string(&Field::new("Age")).unwrap();
        assert_eq!(json, r#"{"name":"Age"}"#);
        let back: Field = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name(), "Age");
    }
}
