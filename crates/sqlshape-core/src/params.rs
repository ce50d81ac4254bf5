//! Named parameter bags bound to generated statements.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Error, Result};
use crate::value::Value;

/// An ordered name → value mapping.
///
/// Names are kept in binding order and are unique; inserting a name twice
/// is a [`Error::ParameterCollision`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBag {
    entries: Vec<(String, Value)>,
}

impl ParameterBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, rejecting duplicate names.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(Error::ParameterCollision(name));
        }
        self.entries.push((name, value));
        Ok(())
    }

    /// Add a parameter, replacing the value of an existing name.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Merge every parameter of `other` into this bag.
    pub fn extend(&mut self, other: ParameterBag) -> Result<()> {
        for (name, value) in other.entries {
            self.insert(name, value)?;
        }
        Ok(())
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Check whether a name is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bag built from the properties of any serializable struct or map.
    ///
    /// Properties keep their declaration order.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| Error::Custom(format!("failed to serialize parameters: {e}")))?;
        match json {
            serde_json::Value::Object(map) => {
                let mut bag = Self::new();
                for (name, value) in map {
                    bag.insert(name, Value::from_json(value))?;
                }
                Ok(bag)
            }
            other => Err(Error::Custom(format!(
                "expected an object of named values, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Consume the bag into its pairs.
    pub fn into_vec(self) -> Vec<(String, Value)> {
        self.entries
    }
}

/// Short name of a JSON value kind, for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for ParameterBag {
    /// Later duplicates overwrite earlier values.
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (name, value) in iter {
            bag.set(name, value.into());
        }
        bag
    }
}

impl IntoIterator for ParameterBag {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ParameterBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut bag = ParameterBag::new();
        bag.insert("Id", Value::Int(1)).unwrap();
        let err = bag.insert("Id", Value::Int(2)).unwrap_err();
        assert!(matches!(err, Error::ParameterCollision(ref n) if n == "Id"));
        assert_eq!(bag.get("Id"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_set_replaces() {
        let mut bag = ParameterBag::new();
        bag.set("Name", Value::from("a"));
        bag.set("Name", Value::from("b"));
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("Name"), Some(&Value::from("b")));
    }

    #[test]
    fn test_order_preserved() {
        let mut bag = ParameterBag::new();
        bag.insert("b", Value::Null).unwrap();
        bag.insert("a", Value::Null).unwrap();
        assert_eq!(bag.names().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn test_extend_detects_collision() {
        let mut left = ParameterBag::new();
        left.insert("Id", Value::Int(1)).unwrap();
        let mut right = ParameterBag::new();
        right.insert("Id", Value::Int(2)).unwrap();
        assert!(left.extend(right).is_err());
    }

    #[test]
    fn test_serializes_as_object() {
        let mut bag = ParameterBag::new();
        bag.insert("Age", Value::Int(18)).unwrap();
        let json = serde_json::to_value(&bag).unwrap();
        assert_eq!(json, serde_json::json!({ "Age": { "Int": 18 } }));
    }

    #[test]
    fn test_from_serialize_keeps_declaration_order() {
        #[derive(serde::Serialize)]
        struct Person {
            name: &'static str,
            age: i32,
        }
        let bag = ParameterBag::from_serialize(&Person { name: "Ada", age: 36 }).unwrap();
        assert_eq!(bag.names().collect::<Vec<_>>(), ["name", "age"]);
        assert_eq!(bag.get("age"), Some(&Value::BigInt(36)));

        assert!(ParameterBag::from_serialize(&[1, 2]).is_err());
    }
}
