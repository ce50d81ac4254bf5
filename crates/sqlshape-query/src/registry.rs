//! Dialect → statement builder mapping.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use sqlshape_core::{Dialect, Error, Result};

use crate::statement::{
    MysqlStatementBuilder, PostgresStatementBuilder, SqlServerStatementBuilder,
    SqliteStatementBuilder, StatementBuilder,
};

/// Source of registration revisions, unique across every registry in the
/// process.
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

struct Registered {
    builder: Arc<dyn StatementBuilder>,
    revision: u64,
}

impl Registered {
    fn new(builder: Arc<dyn StatementBuilder>) -> Self {
        Self {
            builder,
            revision: NEXT_REVISION.fetch_add(1, Ordering::Relaxed),
        }
    }
}

/// Maps each dialect to the builder that renders its statements.
///
/// Constructed once at startup and shared by every dispatcher. Every
/// registration gets a fresh revision; cached command text is keyed on it,
/// so replacing a builder retires the text its predecessor rendered.
#[derive(Default)]
pub struct StatementBuilderRegistry {
    builders: RwLock<HashMap<Dialect, Registered>>,
}

impl StatementBuilderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock builder of every dialect.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        {
            let mut builders = registry.builders.write().unwrap_or_else(|e| e.into_inner());
            let defaults: [Arc<dyn StatementBuilder>; 4] = [
                Arc::new(SqlServerStatementBuilder::new()),
                Arc::new(PostgresStatementBuilder::new()),
                Arc::new(SqliteStatementBuilder::new()),
                Arc::new(MysqlStatementBuilder::new()),
            ];
            for builder in defaults {
                builders.insert(builder.dialect(), Registered::new(builder));
            }
        }
        registry
    }

    /// Map `builder` to its dialect.
    ///
    /// An existing mapping is replaced only when `overwrite` is set.
    pub fn add(&self, builder: Arc<dyn StatementBuilder>, overwrite: bool) -> Result<()> {
        let dialect = builder.dialect();
        let mut builders = self.builders.write().unwrap_or_else(|e| e.into_inner());
        if builders.contains_key(&dialect) && !overwrite {
            tracing::warn!(%dialect, "statement builder already registered");
            return Err(Error::config(format!(
                "a statement builder for {dialect} is already registered"
            )));
        }
        let registered = Registered::new(builder);
        tracing::debug!(
            %dialect,
            overwrite,
            revision = registered.revision,
            "registered statement builder"
        );
        builders.insert(dialect, registered);
        Ok(())
    }

    /// The builder for `dialect`.
    pub fn get(&self, dialect: Dialect) -> Result<Arc<dyn StatementBuilder>> {
        self.get_with_revision(dialect).map(|(builder, _)| builder)
    }

    /// The builder for `dialect` and the revision of its registration.
    pub fn get_with_revision(&self, dialect: Dialect) -> Result<(Arc<dyn StatementBuilder>, u64)> {
        let builders = self.builders.read().unwrap_or_else(|e| e.into_inner());
        builders
            .get(&dialect)
            .map(|r| (Arc::clone(&r.builder), r.revision))
            .ok_or_else(|| Error::config(format!("no statement builder is registered for {dialect}")))
    }

    /// Remove the mapping for `dialect`, returning it.
    pub fn remove(&self, dialect: Dialect) -> Option<Arc<dyn StatementBuilder>> {
        self.builders
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&dialect)
            .map(|r| r.builder)
    }

    pub fn contains(&self, dialect: Dialect) -> bool {
        self.builders
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&dialect)
    }
}

impl fmt::Debug for StatementBuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let builders = self.builders.read().unwrap_or_else(|e| e.into_inner());
        let mut dialects: Vec<&'static str> = builders.keys().map(|d| d.name()).collect();
        dialects.sort_unstable();
        f.debug_struct("StatementBuilderRegistry")
            .field("dialects", &dialects)
            .finish()
    }
}
