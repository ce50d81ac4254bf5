mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{RecordingExecutor, bag, m, person};
use sqlshape::prelude::*;
use sqlshape::{
    CacheKey, CacheStats, InsertRequest, MergeRequest, PostgresStatementBuilder,
    SqliteStatementBuilder,
};

/// Counts how often command text is actually rendered.
struct CountingBuilder {
    inner: SqliteStatementBuilder,
    builds: AtomicUsize,
}

impl CountingBuilder {
    fn new() -> Self {
        Self {
            inner: SqliteStatementBuilder::new(),
            builds: AtomicUsize::new(0),
        }
    }

    fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl StatementBuilder for CountingBuilder {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn setting(&self) -> &DbSetting {
        self.inner.setting()
    }

    fn create_insert(&self, request: &InsertRequest) -> Result<String> {
        self.inner.create_insert(request)
    }

    fn create_merge(&self, request: &MergeRequest) -> Result<String> {
        self.inner.create_merge(request)
    }

    fn build(&self, key: &CacheKey) -> Result<String> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.inner.build(key)
    }
}

fn counting_registry() -> (StatementBuilderRegistry, Arc<CountingBuilder>) {
    let registry = StatementBuilderRegistry::with_defaults();
    let builder = Arc::new(CountingBuilder::new());
    registry.add(builder.clone(), true).unwrap();
    (registry, builder)
}

#[test]
fn value_changes_reuse_cached_text() {
    let cache = CommandTextCache::new();
    let (registry, builder) = counting_registry();
    let executor = RecordingExecutor::new(Dialect::Sqlite);
    let dispatcher = Dispatcher::new(&executor, &cache, &registry);

    dispatcher
        .query(&person(), m("age").ge(18).and(m("status").eq("active")), QueryOptions::new())
        .unwrap();
    dispatcher
        .query(&person(), m("age").ge(65).and(m("status").eq("retired")), QueryOptions::new())
        .unwrap();

    assert_eq!(builder.builds(), 1);
    assert_eq!(
        cache.stats(),
        CacheStats {
            hits: 1,
            misses: 1,
            entries: 1
        }
    );

    let commands = executor.commands();
    assert_eq!(commands[0].text, commands[1].text);
    assert_eq!(commands[1].parameters.get("Age"), Some(&Value::Int(65)));
}

#[test]
fn topology_change_builds_new_text() {
    let cache = CommandTextCache::new();
    let (registry, builder) = counting_registry();
    let executor = RecordingExecutor::new(Dialect::Sqlite);
    let dispatcher = Dispatcher::new(&executor, &cache, &registry);

    dispatcher.count(&person(), m("age").ge(18)).unwrap();
    dispatcher
        .count(&person(), m("age").ge(18).or(m("status").eq("vip")))
        .unwrap();
    dispatcher.count(&person(), m("age").lt(18)).unwrap();

    assert_eq!(builder.builds(), 3);
    assert_eq!(cache.len(), 3);

    let texts: Vec<String> = executor.commands().into_iter().map(|c| c.text).collect();
    assert_eq!(
        texts[1],
        "SELECT COUNT(*) AS [CountValue] FROM [Person] WHERE ([Age] >= @Age OR [Status] = @Status);"
    );
    assert_ne!(texts[0], texts[2]);
}

#[test]
fn list_length_and_null_are_part_of_the_shape() {
    let cache = CommandTextCache::new();
    let (registry, builder) = counting_registry();
    let executor = RecordingExecutor::new(Dialect::Sqlite);
    let dispatcher = Dispatcher::new(&executor, &cache, &registry);

    dispatcher.count(&person(), m("age").in_list(vec![1, 2])).unwrap();
    dispatcher.count(&person(), m("age").in_list(vec![3, 4])).unwrap();
    dispatcher.count(&person(), m("age").in_list(vec![1, 2, 3])).unwrap();
    assert_eq!(builder.builds(), 2);

    dispatcher.count(&person(), m("name").eq("Ann")).unwrap();
    dispatcher.count(&person(), m("name").eq(Value::Null)).unwrap();
    assert_eq!(builder.builds(), 4);
    assert_eq!(
        executor.last().text,
        "SELECT COUNT(*) AS [CountValue] FROM [Person] WHERE ([Name] IS NULL);"
    );
    assert!(executor.last().parameters.is_empty());
}

#[test]
fn order_and_fields_are_part_of_the_shape() {
    let cache = CommandTextCache::new();
    let (registry, builder) = counting_registry();
    let executor = RecordingExecutor::new(Dialect::Sqlite);
    let dispatcher = Dispatcher::new(&executor, &cache, &registry);

    dispatcher.query(&person(), FilterInput::Empty, QueryOptions::new()).unwrap();
    dispatcher
        .query(
            &person(),
            FilterInput::Empty,
            QueryOptions::new().order_by(OrderField::ascending("Name")),
        )
        .unwrap();
    dispatcher
        .query(
            &person(),
            FilterInput::Empty,
            QueryOptions::new().fields(vec![Field::new("Name")]),
        )
        .unwrap();

    assert_eq!(builder.builds(), 3);
}

#[test]
fn failed_builds_are_not_cached() {
    let cache = CommandTextCache::new();
    let registry = StatementBuilderRegistry::with_defaults();
    let executor = RecordingExecutor::new(Dialect::Sqlite);
    let dispatcher = Dispatcher::new(&executor, &cache, &registry);

    let err = dispatcher
        .query(
            &person(),
            FilterInput::Empty,
            QueryOptions::new().hints("WITH (NOLOCK)"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
    assert!(cache.is_empty());
    assert!(executor.commands().is_empty());

    dispatcher.query(&person(), FilterInput::Empty, QueryOptions::new()).unwrap();
    assert_eq!(cache.len(), 1);
}

#[test]
fn overriding_a_builder_retires_its_cached_text() {
    let cache = CommandTextCache::new();
    let registry = StatementBuilderRegistry::with_defaults();
    let executor = RecordingExecutor::new(Dialect::Postgres);
    let dispatcher = Dispatcher::new(&executor, &cache, &registry);

    for name in ["Ann", "Bo"] {
        dispatcher
            .insert(&person(), bag([("name", Value::from(name))]), None)
            .unwrap();
    }
    assert!(executor.last().text.contains("VALUES (@Name)"));
    assert_eq!(cache.stats().hits, 1);

    let colon = DbSetting::new().quotes("\"", "\"").parameter_prefix(":");
    registry
        .add(Arc::new(PostgresStatementBuilder::with_setting(colon)), true)
        .unwrap();
    dispatcher
        .insert(&person(), bag([("name", Value::from("Cy"))]), None)
        .unwrap();

    let command = executor.last();
    assert!(command.text.contains("VALUES (:Name)"), "{}", command.text);
    assert!(!command.text.contains("@Name"));
    assert_eq!(command.parameters.get("Name"), Some(&Value::Text("Cy".into())));
    assert_eq!(cache.len(), 1);

    registry
        .add(Arc::new(PostgresStatementBuilder::new()), true)
        .unwrap();
    dispatcher
        .insert(&person(), bag([("name", Value::from("Di"))]), None)
        .unwrap();
    let command = executor.last();
    assert!(command.text.contains("VALUES (@Name)"), "{}", command.text);
    assert_eq!(command.parameters.len(), 1);
}

#[test]
fn missing_builder_is_a_config_error() {
    let cache = CommandTextCache::new();
    let registry = StatementBuilderRegistry::new();
    let executor = RecordingExecutor::new(Dialect::Mysql);
    let dispatcher = Dispatcher::new(&executor, &cache, &registry);

    let err = dispatcher.count_all(&person()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn concurrent_callers_share_one_entry() {
    let cache = CommandTextCache::new();
    let (registry, builder) = counting_registry();
    let executor = RecordingExecutor::new(Dialect::Sqlite);

    std::thread::scope(|s| {
        for age in 0..8 {
            let (cache, registry, executor) = (&cache, &registry, &executor);
            s.spawn(move || {
                let dispatcher = Dispatcher::new(executor, cache, registry);
                for offset in 0..25 {
                    dispatcher
                        .count(&person(), m("age").gt(age * 100 + offset))
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(cache.len(), 1);
    assert!((1..=8).contains(&builder.builds()));
    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, 200);

    let commands = executor.commands();
    assert_eq!(commands.len(), 200);
    assert!(commands.iter().all(|c| c.text == commands[0].text));
}
