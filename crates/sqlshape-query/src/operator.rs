//! Comparison operators and logical conjunctions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How many values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// A single value
    Scalar,
    /// An ordered `(low, high)` pair
    Pair,
    /// A non-empty list
    List,
}

/// Predicate operator of a [`QueryField`](crate::QueryField).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Like,
    NotLike,
    Between,
    NotBetween,
    In,
    NotIn,
    /// Every list element must equal the column (AND of equalities)
    All,
    /// Any list element may equal the column (OR of equalities)
    Any,
}

impl Operator {
    /// Value arity required by this operator.
    pub const fn arity(self) -> Arity {
        match self {
            Operator::Between | Operator::NotBetween => Arity::Pair,
            Operator::In | Operator::NotIn | Operator::All | Operator::Any => Arity::List,
            _ => Arity::Scalar,
        }
    }

    /// SQL token for this operator.
    ///
    /// `All` and `Any` expand to a group of `=` comparisons.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Operator::Equal | Operator::All | Operator::Any => "=",
            Operator::NotEqual => "<>",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT BETWEEN",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }

    /// Operator name, used in parameter suffixes and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Operator::Equal => "Equal",
            Operator::NotEqual => "NotEqual",
            Operator::LessThan => "LessThan",
            Operator::LessThanOrEqual => "LessThanOrEqual",
            Operator::GreaterThan => "GreaterThan",
            Operator::GreaterThanOrEqual => "GreaterThanOrEqual",
            Operator::Like => "Like",
            Operator::NotLike => "NotLike",
            Operator::Between => "Between",
            Operator::NotBetween => "NotBetween",
            Operator::In => "In",
            Operator::NotIn => "NotIn",
            Operator::All => "All",
            Operator::Any => "Any",
        }
    }

    /// The logical complement, when one exists as a single operator.
    pub const fn negate(self) -> Option<Operator> {
        match self {
            Operator::Equal => Some(Operator::NotEqual),
            Operator::NotEqual => Some(Operator::Equal),
            Operator::LessThan => Some(Operator::GreaterThanOrEqual),
            Operator::LessThanOrEqual => Some(Operator::GreaterThan),
            Operator::GreaterThan => Some(Operator::LessThanOrEqual),
            Operator::GreaterThanOrEqual => Some(Operator::LessThan),
            Operator::Like => Some(Operator::NotLike),
            Operator::NotLike => Some(Operator::Like),
            Operator::Between => Some(Operator::NotBetween),
            Operator::NotBetween => Some(Operator::Between),
            Operator::In => Some(Operator::NotIn),
            Operator::NotIn => Some(Operator::In),
            Operator::All | Operator::Any => None,
        }
    }

    /// The operator to use when the operands are swapped (`5 < x` is `x > 5`).
    pub const fn flip(self) -> Operator {
        match self {
            Operator::LessThan => Operator::GreaterThan,
            Operator::LessThanOrEqual => Operator::GreaterThanOrEqual,
            Operator::GreaterThan => Operator::LessThan,
            Operator::GreaterThanOrEqual => Operator::LessThanOrEqual,
            other => other,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical conjunction joining the members of a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    /// SQL keyword.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }

    /// Separator placed between rendered members.
    pub const fn separator(self) -> &'static str {
        match self {
            Conjunction::And => " AND ",
            Conjunction::Or => " OR ",
        }
    }
}
