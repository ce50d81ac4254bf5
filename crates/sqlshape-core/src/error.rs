//! Error types for sqlshape operations.

use std::fmt;

/// The primary error type for all sqlshape operations.
#[derive(Debug)]
pub enum Error {
    /// A predicate construct has no translation rule
    Expression(ExpressionError),
    /// An operator received a value of the wrong shape
    Operator(OperatorError),
    /// The selected dialect cannot render a requested feature
    Unsupported(UnsupportedError),
    /// Two bound parameters ended up with the same name
    ParameterCollision(String),
    /// Entity/table metadata is missing something the operation needs
    Metadata(MetadataError),
    /// Registry or setting misuse
    Config(ConfigError),
    /// A before-execution hook cancelled the call
    Cancelled(String),
    /// Error surfaced by the execution layer
    Execution(ExecutionError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug, Clone)]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
    /// Description of the offending node (e.g. `Binary(Add)`, `Call(ToUpper)`)
    pub node: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionErrorKind {
    /// No mapping rule exists for this node kind
    UnsupportedExpressionShape,
    /// Member name could not be resolved against the entity metadata
    UnknownMember,
}

#[derive(Debug, Clone)]
pub struct OperatorError {
    pub kind: OperatorErrorKind,
    pub field: String,
    /// SQL token or name of the operator
    pub operator: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorErrorKind {
    /// Scalar given where a pair/list is required, or the reverse
    ArityMismatch,
    /// List operator given zero elements
    EmptyInClause,
}

#[derive(Debug, Clone)]
pub struct UnsupportedError {
    pub dialect: &'static str,
    pub feature: String,
}

#[derive(Debug, Clone)]
pub struct MetadataError {
    pub kind: MetadataErrorKind,
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataErrorKind {
    /// No fields are known for the target
    FieldsNotFound,
    /// The operation needs a primary key and the target has none
    PrimaryKeyNotFound,
    /// The operation was given no fields to work with
    EmptyFieldSet,
    /// A merge qualifier has no value in the written row
    QualifierNotFound,
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub message: String,
}

#[derive(Debug)]
pub struct ExecutionError {
    pub message: String,
    pub sql: Option<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Shorthand for an unsupported expression shape.
    pub fn unsupported_expression(node: impl Into<String>) -> Self {
        let node = node.into();
        Error::Expression(ExpressionError {
            kind: ExpressionErrorKind::UnsupportedExpressionShape,
            message: format!("expression '{node}' is not supported"),
            node,
        })
    }

    /// Shorthand for a dialect that cannot render a feature.
    pub fn unsupported(dialect: &'static str, feature: impl Into<String>) -> Self {
        Error::Unsupported(UnsupportedError {
            dialect,
            feature: feature.into(),
        })
    }

    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(ConfigError {
            message: message.into(),
        })
    }

    /// Is this a construction-time error caused by the shape of the caller's input?
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Expression(_) | Error::Operator(_))
    }

    /// Get the operator error kind, if this is an operator error.
    pub fn operator_kind(&self) -> Option<OperatorErrorKind> {
        match self {
            Error::Operator(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Execution(e) => e.sql.as_deref(),
            Error::Cancelled(sql) => Some(sql),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Expression(e) => write!(f, "Expression error: {}", e),
            Error::Operator(e) => write!(f, "Operator error: {}", e),
            Error::Unsupported(e) => write!(f, "Unsupported operation: {}", e),
            Error::ParameterCollision(name) => {
                write!(f, "Parameter collision: '{}' is bound more than once", name)
            }
            Error::Metadata(e) => write!(f, "Metadata error: {}", e.message),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Cancelled(sql) => write!(f, "Execution cancelled: {}", sql),
            Error::Execution(e) => write!(f, "Execution error: {}", e.message),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Execution(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (node: {})", self.message, self.node)
    }
}

impl fmt::Display for OperatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on field '{}' ({})",
            self.message, self.field, self.operator
        )
    }
}

impl fmt::Display for UnsupportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not supported by {}", self.feature, self.dialect)
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (target: {})", self.message, self.target)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ExpressionError> for Error {
    fn from(err: ExpressionError) -> Self {
        Error::Expression(err)
    }
}

impl From<OperatorError> for Error {
    fn from(err: OperatorError) -> Self {
        Error::Operator(err)
    }
}

impl From<UnsupportedError> for Error {
    fn from(err: UnsupportedError) -> Self {
        Error::Unsupported(err)
    }
}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        Error::Metadata(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<ExecutionError> for Error {
    fn from(err: ExecutionError) -> Self {
        Error::Execution(err)
    }
}

/// Result type alias for sqlshape operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_expression_names_node() {
        let err = Error::unsupported_expression("Binary(Add)");
        assert!(err.is_input_error());
        let text = err.to_string();
        assert!(text.contains("Binary(Add)"), "{text}");
    }

    #[test]
    fn operator_kind_helper() {
        let err = Error::Operator(OperatorError {
            kind: OperatorErrorKind::EmptyInClause,
            field: "Id".to_string(),
            operator: "IN",
            message: "list is empty".to_string(),
        });
        assert_eq!(err.operator_kind(), Some(OperatorErrorKind::EmptyInClause));
        assert_eq!(
            err.to_string(),
            "Operator error: list is empty on field 'Id' (IN)"
        );
        assert!(Error::config("x").operator_kind().is_none());
    }

    #[test]
    fn unsupported_display_and_sql_accessor() {
        let err = Error::unsupported("PostgreSQL", "table hints");
        assert_eq!(
            err.to_string(),
            "Unsupported operation: table hints is not supported by PostgreSQL"
        );
        assert!(err.sql().is_none());

        let cancelled = Error::Cancelled("SELECT 1;".to_string());
        assert_eq!(cancelled.sql(), Some("SELECT 1;"));
    }

    #[test]
    fn execution_source_is_exposed() {
        let io = std::io::Error::other("socket closed");
        let err = Error::Execution(ExecutionError {
            message: "driver failure".to_string(),
            sql: Some("SELECT 1;".to_string()),
            source: Some(Box::new(io)),
        });
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.sql(), Some("SELECT 1;"));
    }
}
