//! Before/after execution trace hooks.

use std::time::Duration;

use serde::Serialize;
use sqlshape_core::{Command, ParameterBag};

/// Pre-execution record a hook may inspect, rewrite or cancel.
#[derive(Debug, Clone, Serialize)]
pub struct CancellableTraceLog {
    operation: &'static str,
    statement: String,
    parameters: ParameterBag,
    cancelled: bool,
    throw: bool,
}

impl CancellableTraceLog {
    pub(crate) fn new(operation: &'static str, command: Command) -> Self {
        Self {
            operation,
            statement: command.text,
            parameters: command.parameters,
            cancelled: false,
            throw: false,
        }
    }

    /// Operation name (`Query`, `Insert`, …).
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn parameters(&self) -> &ParameterBag {
        &self.parameters
    }

    /// Replace the statement text wholesale.
    pub fn set_statement(&mut self, statement: impl Into<String>) {
        self.statement = statement.into();
    }

    /// Replace the parameter bag wholesale.
    pub fn set_parameters(&mut self, parameters: ParameterBag) {
        self.parameters = parameters;
    }

    /// Cancel execution. With `throw`, the operation fails with
    /// `Error::Cancelled`; otherwise it returns its empty result.
    pub fn cancel(&mut self, throw: bool) {
        self.cancelled = true;
        self.throw = throw;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_throwing(&self) -> bool {
        self.throw
    }

    pub(crate) fn into_command(self) -> Command {
        Command::new(self.statement, self.parameters)
    }
}

/// Post-execution record.
#[derive(Debug, Clone, Serialize)]
pub struct TraceLog {
    pub operation: &'static str,
    pub statement: String,
    pub parameters: ParameterBag,
    pub elapsed: Duration,
}

/// Interception points around every dispatched command.
pub trait TraceHook: Send + Sync {
    /// Called with the generated command before it runs.
    fn before(&self, _log: &mut CancellableTraceLog) {}

    /// Called after the command ran successfully.
    fn after(&self, _log: &TraceLog) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlshape_core::Value;

    #[test]
    fn test_rewrite_and_cancel() {
        let mut bag = ParameterBag::new();
        bag.insert("Id", Value::Int(1)).unwrap();
        let mut log = CancellableTraceLog::new("Query", Command::new("SELECT 1;", bag));
        assert_eq!(log.operation(), "Query");

        log.set_statement("SELECT 2;");
        log.set_parameters(ParameterBag::new());
        assert!(!log.is_cancelled());
        log.cancel(false);
        assert!(log.is_cancelled());
        assert!(!log.is_throwing());

        let command = log.into_command();
        assert_eq!(command.text, "SELECT 2;");
        assert!(command.parameters.is_empty());
    }

    #[test]
    fn test_trace_log_serializes_parameters_by_name() {
        let mut bag = ParameterBag::new();
        bag.insert("Age", Value::Int(18)).unwrap();
        let log = TraceLog {
            operation: "Count",
            statement: "SELECT COUNT(*);".into(),
            parameters: bag,
            elapsed: Duration::from_millis(3),
        };
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["parameters"]["Age"]["Int"], 18);
        assert_eq!(json["operation"], "Count");
    }
}
