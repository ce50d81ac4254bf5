//! Single predicates.

use sqlshape_core::{
    DbSetting, Error, Field, OperatorError, OperatorErrorKind, Result, Value,
    is_valid_parameter_name, parameter_name_for,
};

use crate::operator::{Arity, Operator};
use crate::shape::{FieldShape, ValueShape, expand_parameter_names};

/// One predicate: a field, an operator and a value.
///
/// The parameter name is derived from the field name and may be rewritten
/// by the group-level fixing passes unless it was pinned with
/// [`QueryField::with_parameter_name`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryField {
    field: Field,
    operator: Operator,
    value: Value,
    parameter_name: String,
    pinned: bool,
}

impl QueryField {
    /// Create a predicate, validating the value against the operator's arity.
    pub fn new(field: impl Into<Field>, operator: Operator, value: impl Into<Value>) -> Result<Self> {
        let field = field.into();
        let value = value.into();
        validate(&field, operator, &value)?;
        let parameter_name = parameter_name_for(field.name());
        Ok(Self {
            field,
            operator,
            value,
            parameter_name,
            pinned: false,
        })
    }

    /// Shorthand for an `Equal` predicate.
    pub fn equal(field: impl Into<Field>, value: impl Into<Value>) -> Result<Self> {
        Self::new(field, Operator::Equal, value)
    }

    /// Pin a caller-chosen parameter name.
    ///
    /// Pinned names are left alone by every fixing pass; collisions between
    /// pinned names surface as [`Error::ParameterCollision`] when the
    /// parameter bag is built.
    pub fn with_parameter_name(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_valid_parameter_name(&name) {
            return Err(Error::config(format!("invalid parameter name '{name}'")));
        }
        self.parameter_name = name;
        self.pinned = true;
        Ok(self)
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The current (possibly fixed) base parameter name.
    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    /// Whether the parameter name was pinned by the caller.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Unpin and re-derive the parameter name from the field name.
    pub fn reset(&mut self) {
        self.pinned = false;
        self.parameter_name = parameter_name_for(self.field.name());
    }

    /// Rename unless pinned. Returns whether the name changed.
    pub(crate) fn rename(&mut self, name: String) -> bool {
        if self.pinned || self.parameter_name == name {
            return false;
        }
        self.parameter_name = name;
        true
    }

    /// Every parameter name this predicate binds when its base name is `base`.
    pub(crate) fn expanded_names(&self, base: &str) -> Vec<String> {
        expand_parameter_names(base, self.operator, ValueShape::of(self.operator, &self.value))
    }

    /// Value-free description of this predicate.
    pub fn shape(&self) -> FieldShape {
        FieldShape {
            name: self.field.name().to_string(),
            operator: self.operator,
            parameter: self.parameter_name.clone(),
            value: ValueShape::of(self.operator, &self.value),
        }
    }

    /// Render `<quoted-name> <op> <parameters>` for a dialect setting.
    pub fn as_field_and_parameter(&self, setting: &DbSetting) -> String {
        self.shape().render(setting)
    }

    /// The `(name, value)` pairs this predicate binds.
    ///
    /// Names follow the same rule as the rendered text, so the two can
    /// never disagree.
    pub fn parameters(&self) -> Vec<(String, Value)> {
        let value_shape = ValueShape::of(self.operator, &self.value);
        let names = expand_parameter_names(&self.parameter_name, self.operator, value_shape);
        match value_shape {
            ValueShape::Null => Vec::new(),
            ValueShape::Scalar => names
                .into_iter()
                .map(|n| (n, self.value.clone()))
                .collect(),
            ValueShape::Pair | ValueShape::List(_) => {
                let items = self.value.as_array().unwrap_or_default();
                names.into_iter().zip(items.iter().cloned()).collect()
            }
        }
    }
}

fn validate(field: &Field, operator: Operator, value: &Value) -> Result<()> {
    let fail = |kind, message: String| {
        Err(Error::Operator(OperatorError {
            kind,
            field: field.name().to_string(),
            operator: operator.as_sql(),
            message,
        }))
    };
    match (operator.arity(), value.as_array()) {
        (Arity::Scalar, None) => Ok(()),
        (Arity::Scalar, Some(_)) => fail(
            OperatorErrorKind::ArityMismatch,
            format!("{operator} expects a single value, got a list"),
        ),
        (Arity::Pair, Some(items)) if items.len() == 2 => Ok(()),
        (Arity::Pair, Some(items)) => fail(
            OperatorErrorKind::ArityMismatch,
            format!("{operator} expects exactly two values, got {}", items.len()),
        ),
        (Arity::Pair, None) => fail(
            OperatorErrorKind::ArityMismatch,
            format!("{operator} expects a (low, high) pair, got {}", value.type_name()),
        ),
        (Arity::List, Some([])) => fail(
            OperatorErrorKind::EmptyInClause,
            format!("{operator} requires at least one value"),
        ),
        (Arity::List, Some(_)) => Ok(()),
        (Arity::List, None) => fail(
            OperatorErrorKind::ArityMismatch,
            format!("{operator} expects a list, got {}", value.type_name()),
        ),
    }
}
