mod common;

use std::sync::Mutex;

use common::{RecordingExecutor, bag, m, person};
use sqlshape::prelude::*;
use sqlshape::{CancellableTraceLog, ExecutionError, TraceLog};

#[derive(Default)]
struct Recorder {
    before: Mutex<Vec<(String, String)>>,
    after: Mutex<Vec<TraceLog>>,
}

impl TraceHook for Recorder {
    fn before(&self, log: &mut CancellableTraceLog) {
        self.before
            .lock()
            .unwrap()
            .push((log.operation().to_string(), log.statement().to_string()));
    }

    fn after(&self, log: &TraceLog) {
        self.after.lock().unwrap().push(log.clone());
    }
}

struct Rewriter;

impl TraceHook for Rewriter {
    fn before(&self, log: &mut CancellableTraceLog) {
        let statement = format!("/* traced */ {}", log.statement());
        log.set_statement(statement);
        let mut parameters = log.parameters().clone();
        parameters.set("Tenant", Value::from(7));
        log.set_parameters(parameters);
    }
}

struct Canceller {
    throw: bool,
}

impl TraceHook for Canceller {
    fn before(&self, log: &mut CancellableTraceLog) {
        log.cancel(self.throw);
    }
}

struct Failing;

impl Executor for Failing {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn query(&self, _command: &Command) -> Result<Vec<Row>> {
        Err(Error::Execution(ExecutionError {
            message: "relation does not exist".to_string(),
            sql: None,
            source: None,
        }))
    }

    fn query_multiple(&self, command: &Command) -> Result<Vec<Vec<Row>>> {
        self.query(command).map(|rows| vec![rows])
    }

    fn execute(&self, command: &Command) -> Result<u64> {
        self.query(command).map(|_| 0)
    }
}

#[test]
fn hooks_see_operation_statement_and_timing() {
    let cache = CommandTextCache::new();
    let registry = StatementBuilderRegistry::with_defaults();
    let executor = RecordingExecutor::new(Dialect::Sqlite).with_affected(1);
    let recorder = Recorder::default();
    let dispatcher = Dispatcher::new(&executor, &cache, &registry).with_trace(&recorder);

    dispatcher.count(&person(), m("age").ge(18)).unwrap();
    dispatcher.delete(&person(), FilterInput::key(3), None).unwrap();

    let before = recorder.before.lock().unwrap();
    assert_eq!(before.len(), 2);
    assert_eq!(before[0].0, "Count");
    assert_eq!(before[1].0, "Delete");
    assert_eq!(before[1].1, "DELETE FROM [Person] WHERE ([Id] = @Id);");

    let after = recorder.after.lock().unwrap();
    assert_eq!(after.len(), 2);
    assert_eq!(after[1].statement, before[1].1);
    assert_eq!(after[1].parameters.get("Id"), Some(&Value::Int(3)));
}

#[test]
fn before_hook_rewrites_command_wholesale() {
    let cache = CommandTextCache::new();
    let registry = StatementBuilderRegistry::with_defaults();
    let executor = RecordingExecutor::new(Dialect::Postgres);
    let dispatcher = Dispatcher::new(&executor, &cache, &registry).with_trace(&Rewriter);

    dispatcher
        .insert(&person(), bag([("name", Value::from("Ann"))]), None)
        .unwrap();

    let command = executor.last();
    assert!(command.text.starts_with("/* traced */ INSERT INTO \"Person\""));
    assert_eq!(command.parameters.get("Tenant"), Some(&Value::Int(7)));
    assert_eq!(command.parameters.get("Name"), Some(&Value::Text("Ann".into())));

    // The cached text itself is untouched.
    dispatcher
        .insert(&person(), bag([("name", Value::from("Bo"))]), None)
        .unwrap();
    assert!(!executor.last().text.contains("/* traced */ /* traced */"));
}

#[test]
fn silent_cancel_returns_empty_results() {
    let cache = CommandTextCache::new();
    let registry = StatementBuilderRegistry::with_defaults();
    let executor = RecordingExecutor::new(Dialect::Sqlite)
        .with_scalar(Value::BigInt(9))
        .with_affected(5);
    let hook = Canceller { throw: false };
    let dispatcher = Dispatcher::new(&executor, &cache, &registry).with_trace(&hook);

    assert!(
        dispatcher
            .query(&person(), FilterInput::Empty, QueryOptions::new())
            .unwrap()
            .is_empty()
    );
    assert_eq!(dispatcher.count_all(&person()).unwrap(), 0);
    assert!(!dispatcher.exists(&person(), FilterInput::Empty, None).unwrap());
    assert_eq!(dispatcher.delete_all(&person(), None).unwrap(), 0);
    assert_eq!(
        dispatcher
            .insert(&person(), bag([("name", Value::from("Ann"))]), None)
            .unwrap(),
        Value::Null
    );
    assert!(executor.commands().is_empty());
}

#[test]
fn throwing_cancel_raises_cancelled() {
    let cache = CommandTextCache::new();
    let registry = StatementBuilderRegistry::with_defaults();
    let executor = RecordingExecutor::new(Dialect::Sqlite);
    let hook = Canceller { throw: true };
    let dispatcher = Dispatcher::new(&executor, &cache, &registry).with_trace(&hook);

    let err = dispatcher.truncate(&person()).unwrap_err();
    match err {
        Error::Cancelled(statement) => assert_eq!(statement, "DELETE FROM [Person];"),
        other => panic!("expected cancellation, got {other:?}"),
    }
    assert!(executor.commands().is_empty());
}

#[test]
fn executor_errors_carry_the_statement() {
    let cache = CommandTextCache::new();
    let registry = StatementBuilderRegistry::with_defaults();
    let recorder = Recorder::default();
    let dispatcher = Dispatcher::new(&Failing, &cache, &registry).with_trace(&recorder);

    let err = dispatcher.count_all(&person()).unwrap_err();
    assert_eq!(
        err.sql(),
        Some(r#"SELECT COUNT(*) AS "CountValue" FROM "Person";"#)
    );
    // No after-hook for a failed command.
    assert!(recorder.after.lock().unwrap().is_empty());
    assert_eq!(recorder.before.lock().unwrap().len(), 1);
}
