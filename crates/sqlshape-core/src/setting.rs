//! Dialect identity and per-dialect text settings.

use serde::{Deserialize, Serialize};

use crate::identifiers::{quote_with, unquote_with};

/// SQL dialect a statement is generated for.
///
/// The dialect is part of every request fingerprint and selects the
/// statement builder at dispatch time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// Microsoft SQL Server
    SqlServer,
    /// PostgreSQL
    #[default]
    Postgres,
    /// SQLite
    Sqlite,
    /// MySQL / MariaDB
    Mysql,
}

impl Dialect {
    /// All stock dialects.
    pub const ALL: [Dialect; 4] = [
        Dialect::SqlServer,
        Dialect::Postgres,
        Dialect::Sqlite,
        Dialect::Mysql,
    ];

    /// Human-readable name, used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Dialect::SqlServer => "SQL Server",
            Dialect::Postgres => "PostgreSQL",
            Dialect::Sqlite => "SQLite",
            Dialect::Mysql => "MySQL",
        }
    }

    /// The stock setting for this dialect.
    pub fn setting(self) -> DbSetting {
        match self {
            Dialect::SqlServer => DbSetting::new()
                .quotes("[", "]")
                .table_hints(true)
                .multiple_statements(true),
            Dialect::Postgres => DbSetting::new().quotes("\"", "\""),
            Dialect::Sqlite => DbSetting::new().quotes("[", "]"),
            Dialect::Mysql => DbSetting::new().quotes("`", "`"),
        }
    }

    /// Quote an identifier using this dialect's stock setting.
    pub fn quote_identifier(self, name: &str) -> String {
        self.setting().quote(name)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Text-level configuration of a dialect.
///
/// Builders carry their own setting, so a host can register a builder with a
/// customised setting under a stock dialect id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbSetting {
    /// Opening identifier quote
    pub opening_quote: String,
    /// Closing identifier quote
    pub closing_quote: String,
    /// Prefix written before every parameter name
    pub parameter_prefix: String,
    /// Separator between schema and table name
    pub schema_separator: String,
    /// Whether `WITH (...)` table hints can be rendered
    pub supports_table_hints: bool,
    /// Whether several statements can share one command
    pub supports_multiple_statements: bool,
    /// Terminator appended to every statement
    pub statement_terminator: String,
}

impl Default for DbSetting {
    fn default() -> Self {
        Self {
            opening_quote: "\"".to_string(),
            closing_quote: "\"".to_string(),
            parameter_prefix: "@".to_string(),
            schema_separator: ".".to_string(),
            supports_table_hints: false,
            supports_multiple_statements: true,
            statement_terminator: ";".to_string(),
        }
    }
}

impl DbSetting {
    /// Create a setting with ANSI defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier quote pair.
    pub fn quotes(mut self, opening: impl Into<String>, closing: impl Into<String>) -> Self {
        self.opening_quote = opening.into();
        self.closing_quote = closing.into();
        self
    }

    /// Set the parameter prefix.
    pub fn parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.parameter_prefix = prefix.into();
        self
    }

    /// Set the schema separator.
    pub fn schema_separator(mut self, separator: impl Into<String>) -> Self {
        self.schema_separator = separator.into();
        self
    }

    /// Enable or disable table hints.
    pub fn table_hints(mut self, supported: bool) -> Self {
        self.supports_table_hints = supported;
        self
    }

    /// Enable or disable multiple statements per command.
    pub fn multiple_statements(mut self, supported: bool) -> Self {
        self.supports_multiple_statements = supported;
        self
    }

    /// Set the statement terminator.
    pub fn statement_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.statement_terminator = terminator.into();
        self
    }

    /// Quote a single identifier.
    pub fn quote(&self, name: &str) -> String {
        quote_with(name.trim(), &self.opening_quote, &self.closing_quote)
    }

    /// Remove one level of this setting's quoting.
    pub fn unquote(&self, name: &str) -> String {
        unquote_with(name.trim(), &self.opening_quote, &self.closing_quote)
    }

    /// Quote a possibly schema-qualified table name part by part.
    pub fn quote_table(&self, name: &str) -> String {
        name.split(self.schema_separator.as_str())
            .map(|part| self.quote(part))
            .collect::<Vec<_>>()
            .join(&self.schema_separator)
    }

    /// Render a parameter reference (`@Name`).
    pub fn as_parameter(&self, name: &str) -> String {
        format!("{}{}", self.parameter_prefix, name)
    }
}
