#![allow(dead_code)]

use std::sync::Mutex;

use sqlshape::prelude::*;

/// Executor that records every command and answers with canned rows.
pub struct RecordingExecutor {
    dialect: Dialect,
    rows: Vec<Row>,
    affected: u64,
    commands: Mutex<Vec<Command>>,
}

impl RecordingExecutor {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            rows: Vec::new(),
            affected: 0,
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    /// Answer scalar calls with a single `Result` cell.
    pub fn with_scalar(self, value: impl Into<Value>) -> Self {
        self.with_rows(vec![Row::new(vec!["Result".to_string()], vec![value.into()])])
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    pub fn last(&self) -> Command {
        self.commands
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no command was executed")
    }

    fn record(&self, command: &Command) {
        self.commands.lock().unwrap().push(command.clone());
    }
}

impl Executor for RecordingExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn query(&self, command: &Command) -> Result<Vec<Row>> {
        self.record(command);
        Ok(self.rows.clone())
    }

    fn query_multiple(&self, command: &Command) -> Result<Vec<Vec<Row>>> {
        self.record(command);
        let statements = command.text.matches(';').count();
        Ok(vec![self.rows.clone(); statements])
    }

    fn execute(&self, command: &Command) -> Result<u64> {
        self.record(command);
        Ok(self.affected)
    }
}

pub struct Person;

pub static PERSON_FIELDS: [FieldInfo; 4] = [
    FieldInfo::new("id", "Id", SqlType::BigInt)
        .primary_key(true)
        .identity(true),
    FieldInfo::new("name", "Name", SqlType::Text),
    FieldInfo::new("age", "Age", SqlType::Integer),
    FieldInfo::new("status", "Status", SqlType::Text),
];

impl Entity for Person {
    const TABLE_NAME: &'static str = "Person";

    fn fields() -> &'static [FieldInfo] {
        &PERSON_FIELDS
    }
}

pub fn m(name: &str) -> Expression {
    Expression::member(name)
}

pub fn person() -> Scope {
    Scope::entity::<Person>()
}

pub fn bag<const N: usize>(pairs: [(&str, Value); N]) -> ParameterBag {
    pairs.into_iter().collect()
}
