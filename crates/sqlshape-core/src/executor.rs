//! Execution-layer interface.
//!
//! The core never talks to a database; it hands a [`Command`] to an
//! [`Executor`] supplied by the host and gets rows or counts back.

use serde::Serialize;

use crate::Result;
use crate::params::ParameterBag;
use crate::row::Row;
use crate::setting::Dialect;
use crate::value::Value;

/// Generated SQL text plus the parameters bound to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Command {
    /// SQL text
    pub text: String,
    /// Parameters, keyed by the names used in `text`
    pub parameters: ParameterBag,
}

impl Command {
    /// Create a command.
    pub fn new(text: impl Into<String>, parameters: ParameterBag) -> Self {
        Self {
            text: text.into(),
            parameters,
        }
    }
}

/// A connection-like object able to run generated commands.
///
/// Implementations own the physical connection or transaction; pooling,
/// timeouts and cancellation live there too.
pub trait Executor: Send + Sync {
    /// Dialect of the underlying connection.
    fn dialect(&self) -> Dialect;

    /// Run a command returning rows.
    fn query(&self, command: &Command) -> Result<Vec<Row>>;

    /// Run a multi-statement command returning one result set per statement.
    fn query_multiple(&self, command: &Command) -> Result<Vec<Vec<Row>>>;

    /// Run a command returning the number of affected rows.
    fn execute(&self, command: &Command) -> Result<u64>;

    /// Run a command returning a single value (first column of first row).
    fn scalar(&self, command: &Command) -> Result<Value> {
        let rows = self.query(command)?;
        Ok(rows
            .first()
            .and_then(|row| row.get(0))
            .cloned()
            .unwrap_or(Value::Null))
    }
}
