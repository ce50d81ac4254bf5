//! PostgreSQL statements: `RETURNING` and `ON CONFLICT ... DO UPDATE`.

use sqlshape_core::{DbSetting, Dialect, Result};

use super::{
    StatementBuilder, empty_field_set, insertable, merge_qualifiers, result_column, updatable,
};
use crate::request::{InsertRequest, MergeRequest};

/// Statement builder for PostgreSQL.
#[derive(Debug, Clone)]
pub struct PostgresStatementBuilder {
    setting: DbSetting,
}

impl PostgresStatementBuilder {
    pub fn new() -> Self {
        Self::with_setting(Dialect::Postgres.setting())
    }

    pub fn with_setting(setting: DbSetting) -> Self {
        Self { setting }
    }

    fn returning(&self, identity: Option<&str>, primary: Option<&str>) -> String {
        let column = result_column(identity, primary)
            .map_or_else(|| "NULL".to_string(), |c| self.setting.quote(c));
        format!(" RETURNING {column} AS {}", self.setting.quote("Result"))
    }
}

impl Default for PostgresStatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementBuilder for PostgresStatementBuilder {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn setting(&self) -> &DbSetting {
        &self.setting
    }

    fn create_insert(&self, request: &InsertRequest) -> Result<String> {
        let setting = &self.setting;
        let table = request.target.table();
        let columns = insertable(&request.fields, request.identity.as_deref(), None);
        if columns.is_empty() {
            return Err(empty_field_set(table, "nothing to insert"));
        }
        Ok(format!(
            "INSERT INTO {}{} ({}) VALUES ({}){}{}",
            setting.quote_table(table),
            self.hints_clause(request.hints.as_deref())?,
            columns.iter().map(|c| setting.quote(c)).collect::<Vec<_>>().join(", "),
            columns
                .iter()
                .map(|c| setting.as_parameter(c))
                .collect::<Vec<_>>()
                .join(", "),
            self.returning(request.identity.as_deref(), request.primary.as_deref()),
            setting.statement_terminator
        ))
    }

    fn create_merge(&self, request: &MergeRequest) -> Result<String> {
        let setting = &self.setting;
        let table = request.target.table();
        let qualifiers = merge_qualifiers(request)?;
        let columns = insertable(
            &request.fields,
            request.identity.as_deref(),
            Some(&qualifiers),
        );
        if columns.is_empty() {
            return Err(empty_field_set(table, "nothing to merge"));
        }
        let updates = updatable(request, &qualifiers);
        let action = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            let assignments: Vec<String> = updates
                .iter()
                .map(|c| format!("{q} = EXCLUDED.{q}", q = setting.quote(c)))
                .collect();
            format!("DO UPDATE SET {}", assignments.join(", "))
        };
        Ok(format!(
            "INSERT INTO {}{} ({}) VALUES ({}) ON CONFLICT ({}) {action}{}{}",
            setting.quote_table(table),
            self.hints_clause(request.hints.as_deref())?,
            columns.iter().map(|c| setting.quote(c)).collect::<Vec<_>>().join(", "),
            columns
                .iter()
                .map(|c| setting.as_parameter(c))
                .collect::<Vec<_>>()
                .join(", "),
            qualifiers
                .names()
                .iter()
                .map(|q| setting.quote(q))
                .collect::<Vec<_>>()
                .join(", "),
            self.returning(request.identity.as_deref(), request.primary.as_deref()),
            setting.statement_terminator
        ))
    }
}
