//! MySQL statements: `LAST_INSERT_ID()` and `ON DUPLICATE KEY UPDATE`.

use sqlshape_core::{DbSetting, Dialect, Result};

use super::{
    StatementBuilder, bound_primary, empty_field_set, insertable, merge_qualifiers, updatable,
};
use crate::request::{InsertRequest, MergeRequest};

/// Statement builder for MySQL and MariaDB.
#[derive(Debug, Clone)]
pub struct MysqlStatementBuilder {
    setting: DbSetting,
}

impl MysqlStatementBuilder {
    pub fn new() -> Self {
        Self::with_setting(Dialect::Mysql.setting())
    }

    pub fn with_setting(setting: DbSetting) -> Self {
        Self { setting }
    }

    /// ` SELECT <value> AS Result;` for the row just written.
    fn select_result(
        &self,
        identity: Option<&str>,
        identity_written: bool,
        primary: Option<&str>,
    ) -> String {
        let value = match (identity, primary) {
            (Some(identity), _) if identity_written => format!(
                "COALESCE({}, LAST_INSERT_ID())",
                self.setting.as_parameter(identity)
            ),
            (Some(_), _) => "LAST_INSERT_ID()".to_string(),
            (None, Some(primary)) => self.setting.as_parameter(primary),
            (None, None) => "NULL".to_string(),
        };
        format!(
            " SELECT {value} AS {}{}",
            self.setting.quote("Result"),
            self.setting.statement_terminator
        )
    }

    fn values(&self, columns: &[&str]) -> (String, String) {
        let setting = &self.setting;
        (
            columns.iter().map(|c| setting.quote(c)).collect::<Vec<_>>().join(", "),
            columns
                .iter()
                .map(|c| setting.as_parameter(c))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

impl Default for MysqlStatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementBuilder for MysqlStatementBuilder {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn setting(&self) -> &DbSetting {
        &self.setting
    }

    fn create_insert(&self, request: &InsertRequest) -> Result<String> {
        let setting = &self.setting;
        let table = request.target.table();
        self.hints_clause(request.hints.as_deref())?;
        let columns = insertable(&request.fields, request.identity.as_deref(), None);
        if columns.is_empty() {
            return Err(empty_field_set(table, "nothing to insert"));
        }
        let (names, params) = self.values(&columns);
        // The identity is never written by a plain insert.
        let result = self.select_result(
            request.identity.as_deref(),
            false,
            bound_primary(request.primary.as_deref(), &request.fields),
        );
        Ok(format!(
            "INSERT INTO {} ({names}) VALUES ({params}){}{result}",
            setting.quote_table(table),
            setting.statement_terminator
        ))
    }

    fn create_merge(&self, request: &MergeRequest) -> Result<String> {
        let setting = &self.setting;
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
        let (names, params) = self.values(&columns);
        let updates = updatable(request, &qualifiers);
        let assignments: Vec<String> = if updates.is_empty() {
            // Keeps the statement valid while leaving the row untouched.
            qualifiers
                .names()
                .iter()
                .take(1)
                .map(|q| format!("{c} = {c}", c = setting.quote(q)))
                .collect()
        } else {
            updates
                .iter()
                .map(|c| format!("{q} = VALUES({q})", q = setting.quote(c)))
                .collect()
        };
        let identity_written = request
            .identity
            .as_deref()
            .is_some_and(|id| columns.iter().any(|c| c.eq_ignore_ascii_case(id)));
        let result = self.select_result(
            request.identity.as_deref(),
            identity_written,
            bound_primary(request.primary.as_deref(), &request.fields),
        );
        Ok(format!(
            "INSERT INTO {} ({names}) VALUES ({params}) ON DUPLICATE KEY UPDATE {}{}{result}",
            setting.quote_table(table),
            assignments.join(", "),
            setting.statement_terminator
        ))
    }
}
