//! SQLite statements: `last_insert_rowid()`, `INSERT OR REPLACE`, and
//! `DELETE FROM` in place of `TRUNCATE`.

use sqlshape_core::{DbSetting, Dialect, Result};

use super::{StatementBuilder, bound_primary, empty_field_set, insertable, merge_qualifiers};
use crate::request::{InsertRequest, MergeRequest, TruncateRequest};

/// Statement builder for SQLite.
#[derive(Debug, Clone)]
pub struct SqliteStatementBuilder {
    setting: DbSetting,
}

impl SqliteStatementBuilder {
    pub fn new() -> Self {
        Self::with_setting(Dialect::Sqlite.setting())
    }

    pub fn with_setting(setting: DbSetting) -> Self {
        Self { setting }
    }

    fn select_result(&self, identity: Option<&str>, primary: Option<&str>) -> String {
        let value = match (identity, primary) {
            (Some(_), _) => "CAST(last_insert_rowid() AS BIGINT)".to_string(),
            (None, Some(primary)) => self.setting.as_parameter(primary),
            (None, None) => "NULL".to_string(),
        };
        format!(
            " SELECT {value} AS {}{}",
            self.setting.quote("Result"),
            self.setting.statement_terminator
        )
    }

    fn insert_text(&self, verb: &str, table: &str, columns: &[&str]) -> String {
        let setting = &self.setting;
        format!(
            "{verb} {} ({}) VALUES ({}){}",
            setting.quote_table(table),
            columns.iter().map(|c| setting.quote(c)).collect::<Vec<_>>().join(", "),
            columns
                .iter()
                .map(|c| setting.as_parameter(c))
                .collect::<Vec<_>>()
                .join(", "),
            setting.statement_terminator
        )
    }
}

impl Default for SqliteStatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementBuilder for SqliteStatementBuilder {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn setting(&self) -> &DbSetting {
        &self.setting
    }

    fn average_expression(&self, column: &str) -> String {
        format!("AVG(CAST({column} AS REAL))")
    }

    fn create_insert(&self, request: &InsertRequest) -> Result<String> {
        let table = request.target.table();
        self.hints_clause(request.hints.as_deref())?;
        let columns = insertable(&request.fields, request.identity.as_deref(), None);
        if columns.is_empty() {
            return Err(empty_field_set(table, "nothing to insert"));
        }
        let mut sql = self.insert_text("INSERT INTO", table, &columns);
        let primary = bound_primary(request.primary.as_deref(), &request.fields);
        sql.push_str(&self.select_result(request.identity.as_deref(), primary));
        Ok(sql)
    }

    /// `INSERT OR REPLACE`; the conflict target comes from the table's
    /// primary key or unique constraints, so qualifiers are only validated.
    fn create_merge(&self, request: &MergeRequest) -> Result<String> {
        let table = request.target.table();
        self.hints_clause(request.hints.as_deref())?;
        let qualifiers = merge_qualifiers(request)?;
        let columns = insertable(
            &request.fields,
            request.identity.as_deref(),
            Some(&qualifiers),
        );
        if columns.is_empty() {
            return Err(empty_field_set(table, "nothing to merge"));
        }
        let mut sql = self.insert_text("INSERT OR REPLACE INTO", table, &columns);
        let primary = bound_primary(request.primary.as_deref(), &request.fields);
        sql.push_str(&self.select_result(request.identity.as_deref(), primary));
        Ok(sql)
    }

    fn create_truncate(&self, request: &TruncateRequest) -> Result<String> {
        Ok(format!(
            "DELETE FROM {}{}",
            self.setting.quote_table(request.target.table()),
            self.setting.statement_terminator
        ))
    }
}
