//! Value-free filter shapes.
//!
//! A [`FilterShape`] captures everything about a filter tree that affects the
//! rendered WHERE text (topology, columns, operators, parameter names, null
//! checks and list lengths) and nothing about the bound values. Statement
//! builders only ever see shapes, so generated text cannot depend on values.

use sqlshape_core::{DbSetting, Value};

use crate::operator::{Arity, Conjunction, Operator};

/// Value structure of one predicate, as far as it changes the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    /// `IS NULL` / `IS NOT NULL`, nothing bound
    Null,
    /// One bound parameter
    Scalar,
    /// `_Left` and `_Right` parameters
    Pair,
    /// One parameter per element
    List(usize),
}

impl ValueShape {
    /// Classify a (validated) value for an operator.
    pub fn of(operator: Operator, value: &Value) -> Self {
        match operator.arity() {
            Arity::Scalar => {
                if value.is_null() && matches!(operator, Operator::Equal | Operator::NotEqual) {
                    ValueShape::Null
                } else {
                    ValueShape::Scalar
                }
            }
            Arity::Pair => ValueShape::Pair,
            Arity::List => ValueShape::List(value.as_array().map_or(0, <[Value]>::len)),
        }
    }
}

/// Shape of a single predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldShape {
    /// Column name, exactly as given
    pub name: String,
    pub operator: Operator,
    /// Base parameter name
    pub parameter: String,
    pub value: ValueShape,
}

impl FieldShape {
    /// Every parameter name this predicate binds, in binding order.
    pub fn parameter_names(&self) -> Vec<String> {
        expand_parameter_names(&self.parameter, self.operator, self.value)
    }

    /// Render `<quoted-name> <op> <parameters>`.
    pub fn render(&self, setting: &DbSetting) -> String {
        let column = setting.quote(&self.name);
        let params: Vec<String> = self
            .parameter_names()
            .iter()
            .map(|n| setting.as_parameter(n))
            .collect();

        match self.value {
            ValueShape::Null => {
                if self.operator == Operator::Equal {
                    format!("{column} IS NULL")
                } else {
                    format!("{column} IS NOT NULL")
                }
            }
            ValueShape::Scalar => {
                format!("{column} {} {}", self.operator.as_sql(), params.join(""))
            }
            ValueShape::Pair => format!(
                "{column} {} {} AND {}",
                self.operator.as_sql(),
                params.first().map_or("", String::as_str),
                params.get(1).map_or("", String::as_str)
            ),
            ValueShape::List(_) => match self.operator {
                Operator::All | Operator::Any => {
                    let separator = if self.operator == Operator::All {
                        Conjunction::And.separator()
                    } else {
                        Conjunction::Or.separator()
                    };
                    let parts: Vec<String> =
                        params.iter().map(|p| format!("{column} = {p}")).collect();
                    format!("({})", parts.join(separator))
                }
                _ => format!("{column} {} ({})", self.operator.as_sql(), params.join(", ")),
            },
        }
    }
}

/// Parameter names bound by one predicate.
///
/// This is the single naming rule shared by text rendering and parameter
/// extraction.
pub(crate) fn expand_parameter_names(
    parameter: &str,
    operator: Operator,
    value: ValueShape,
) -> Vec<String> {
    match value {
        ValueShape::Null => Vec::new(),
        ValueShape::Scalar => vec![parameter.to_string()],
        ValueShape::Pair => vec![format!("{parameter}_Left"), format!("{parameter}_Right")],
        ValueShape::List(n) => (0..n)
            .map(|i| format!("{parameter}_{}_{i}", operator.name()))
            .collect(),
    }
}

/// One node of a flattened filter tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeToken {
    /// A group header; followed by `fields` field tokens, then `groups` child groups
    Group {
        conjunction: Conjunction,
        is_not: bool,
        fields: usize,
        groups: usize,
    },
    Field(FieldShape),
}

/// Pre-order token list describing a whole filter tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterShape {
    tokens: Vec<ShapeToken>,
}

struct Frame {
    conjunction: Conjunction,
    is_not: bool,
    parts: Vec<String>,
    pending_groups: usize,
}

impl Frame {
    fn finish(self) -> String {
        if self.parts.is_empty() {
            return String::new();
        }
        let inner = self.parts.join(self.conjunction.separator());
        if self.is_not {
            format!("NOT ({inner})")
        } else {
            format!("({inner})")
        }
    }
}

impl FilterShape {
    /// The shape of "no filter".
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_tokens(tokens: Vec<ShapeToken>) -> Self {
        Self { tokens }
    }

    /// Tokens in pre-order.
    pub fn tokens(&self) -> &[ShapeToken] {
        &self.tokens
    }

    /// True when no predicate is present anywhere in the tree.
    pub fn is_empty(&self) -> bool {
        !self
            .tokens
            .iter()
            .any(|t| matches!(t, ShapeToken::Field(_)))
    }

    /// Iterate over the predicate shapes in rendering order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldShape> {
        self.tokens.iter().filter_map(|t| match t {
            ShapeToken::Field(f) => Some(f),
            ShapeToken::Group { .. } => None,
        })
    }

    /// Every parameter name referenced by the rendered text.
    pub fn parameter_names(&self) -> Vec<String> {
        self.fields().flat_map(FieldShape::parameter_names).collect()
    }

    /// Render the boolean expression (without `WHERE`).
    ///
    /// Empty trees and empty sub-groups render to nothing.
    pub fn render(&self, setting: &DbSetting) -> String {
        let mut stack: Vec<Frame> = Vec::new();
        let mut tokens = self.tokens.iter();

        loop {
            // Open the next group and consume its own fields.
            let Some(ShapeToken::Group {
                conjunction,
                is_not,
                fields,
                groups,
            }) = tokens.next()
            else {
                return String::new();
            };
            let mut parts = Vec::with_capacity(*fields + *groups);
            for _ in 0..*fields {
                if let Some(ShapeToken::Field(field)) = tokens.next() {
                    parts.push(field.render(setting));
                }
            }
            stack.push(Frame {
                conjunction: *conjunction,
                is_not: *is_not,
                parts,
                pending_groups: *groups,
            });

            // Close every finished group; stop at the first one still
            // waiting for a child.
            loop {
                let Some(top) = stack.last_mut() else {
                    return String::new();
                };
                if top.pending_groups > 0 {
                    top.pending_groups -= 1;
                    break;
                }
                let Some(frame) = stack.pop() else {
                    return String::new();
                };
                let text = frame.finish();
                match stack.last_mut() {
                    Some(parent) => {
                        if !text.is_empty() {
                            parent.parts.push(text);
                        }
                    }
                    None => return text,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlshape_core::Dialect;

    fn field(name: &str, operator: Operator, value: ValueShape) -> ShapeToken {
        ShapeToken::Field(FieldShape {
            name: name.to_string(),
            operator,
            parameter: name.to_string(),
            value,
        })
    }

    fn group(conjunction: Conjunction, is_not: bool, fields: usize, groups: usize) -> ShapeToken {
        ShapeToken::Group {
            conjunction,
            is_not,
            fields,
            groups,
        }
    }

    #[test]
    fn test_value_shape() {
        assert_eq!(
            ValueShape::of(Operator::Equal, &Value::Null),
            ValueShape::Null
        );
        assert_eq!(
            ValueShape::of(Operator::GreaterThan, &Value::Null),
            ValueShape::Scalar
        );
        assert_eq!(
            ValueShape::of(Operator::In, &Value::from(vec![1, 2, 3])),
            ValueShape::List(3)
        );
    }

    #[test]
    fn test_render_field_forms() {
        let setting = Dialect::SqlServer.setting();
        let render = |op, value| {
            FieldShape {
                name: "Id".into(),
                operator: op,
                parameter: "Id".into(),
                value,
            }
            .render(&setting)
        };
        assert_eq!(render(Operator::Equal, ValueShape::Scalar), "[Id] = @Id");
        assert_eq!(render(Operator::Equal, ValueShape::Null), "[Id] IS NULL");
        assert_eq!(
            render(Operator::NotEqual, ValueShape::Null),
            "[Id] IS NOT NULL"
        );
        assert_eq!(
            render(Operator::Between, ValueShape::Pair),
            "[Id] BETWEEN @Id_Left AND @Id_Right"
        );
        assert_eq!(
            render(Operator::NotIn, ValueShape::List(2)),
            "[Id] NOT IN (@Id_NotIn_0, @Id_NotIn_1)"
        );
        assert_eq!(
            render(Operator::Any, ValueShape::List(2)),
            "([Id] = @Id_Any_0 OR [Id] = @Id_Any_1)"
        );
    }

    #[test]
    fn test_render_nested() {
        // (C OR (A AND B))
        let shape = FilterShape::from_tokens(vec![
            group(Conjunction::Or, false, 1, 1),
            field("C", Operator::Equal, ValueShape::Scalar),
            group(Conjunction::And, false, 2, 0),
            field("A", Operator::Equal, ValueShape::Scalar),
            field("B", Operator::Equal, ValueShape::Scalar),
        ]);
        let setting = Dialect::Postgres.setting();
        assert_eq!(
            shape.render(&setting),
            r#"("C" = @C OR ("A" = @A AND "B" = @B))"#
        );
        assert_eq!(shape.parameter_names(), ["C", "A", "B"]);
    }

    #[test]
    fn test_render_negated_and_empty_children() {
        let shape = FilterShape::from_tokens(vec![
            group(Conjunction::And, false, 1, 2),
            field("A", Operator::Equal, ValueShape::Scalar),
            group(Conjunction::And, false, 0, 0),
            group(Conjunction::Or, true, 2, 0),
            field("B", Operator::LessThan, ValueShape::Scalar),
            field("B", Operator::GreaterThan, ValueShape::Scalar),
        ]);
        let setting = Dialect::Sqlite.setting();
        assert_eq!(
            shape.render(&setting),
            "([A] = @A AND NOT ([B] < @B OR [B] > @B))"
        );
    }

    #[test]
    fn test_empty_shape() {
        let setting = Dialect::Mysql.setting();
        assert_eq!(FilterShape::empty().render(&setting), "");
        let only_group = FilterShape::from_tokens(vec![group(Conjunction::And, true, 0, 0)]);
        assert!(only_group.is_empty());
        assert_eq!(only_group.render(&setting), "");
    }

    #[test]
    fn test_deep_tree_renders_without_recursion() {
        let depth = 10_000;
        let mut tokens = Vec::new();
        for _ in 0..depth {
            tokens.push(group(Conjunction::And, false, 0, 1));
        }
        tokens.push(group(Conjunction::And, false, 1, 0));
        tokens.push(field("X", Operator::Equal, ValueShape::Scalar));
        let shape = FilterShape::from_tokens(tokens);
        let text = shape.render(&Dialect::Postgres.setting());
        assert!(text.contains(r#""X" = @X"#));
        assert_eq!(text.matches('(').count(), depth + 1);
    }
}
