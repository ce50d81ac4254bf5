//! SQL Server statements: `TOP`, `OFFSET ... FETCH`, table hints and `MERGE`.

use sqlshape_core::{DbSetting, Dialect, Result};

use super::{
    Paging, Select, StatementBuilder, bound_primary, empty_field_set, insertable,
    merge_qualifiers, order_clause, result_column, updatable, where_clause,
};
use crate::request::{InsertRequest, MergeRequest};

/// Statement builder for Microsoft SQL Server.
#[derive(Debug, Clone)]
pub struct SqlServerStatementBuilder {
    setting: DbSetting,
}

impl SqlServerStatementBuilder {
    pub fn new() -> Self {
        Self::with_setting(Dialect::SqlServer.setting())
    }

    pub fn with_setting(setting: DbSetting) -> Self {
        Self { setting }
    }
}

impl Default for SqlServerStatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementBuilder for SqlServerStatementBuilder {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn setting(&self) -> &DbSetting {
        &self.setting
    }

    fn create_select(&self, select: &Select<'_>) -> Result<String> {
        let setting = &self.setting;
        let top = match select.paging {
            Paging::Top(n) => format!("TOP ({n}) "),
            _ => String::new(),
        };
        let mut sql = format!(
            "SELECT {top}{} FROM {}{}",
            select.columns.join(", "),
            setting.quote_table(select.table),
            self.hints_clause(select.hints)?
        );
        sql.push_str(&where_clause(setting, select.filter));
        sql.push_str(&order_clause(setting, select.order));
        if let Paging::Page { offset, rows } = select.paging {
            sql.push_str(&format!(" OFFSET {offset} ROWS FETCH NEXT {rows} ROWS ONLY"));
        }
        sql.push_str(&setting.statement_terminator);
        Ok(sql)
    }

    fn average_expression(&self, column: &str) -> String {
        format!("AVG(CONVERT(FLOAT, {column}))")
    }

    fn create_insert(&self, request: &InsertRequest) -> Result<String> {
        let setting = &self.setting;
        let table = request.target.table();
        let columns = insertable(&request.fields, request.identity.as_deref(), None);
        if columns.is_empty() {
            return Err(empty_field_set(table, "nothing to insert"));
        }
        let result = setting.quote("Result");
        let primary = bound_primary(request.primary.as_deref(), &request.fields);
        let returning = match (request.identity.as_deref(), primary) {
            (Some(_), _) => "CONVERT(BIGINT, SCOPE_IDENTITY())".to_string(),
            (None, Some(primary)) => setting.as_parameter(primary),
            (None, None) => "NULL".to_string(),
        };
        Ok(format!(
            "INSERT INTO {}{} ({}) VALUES ({}){term} SELECT {returning} AS {result}{term}",
            setting.quote_table(table),
            self.hints_clause(request.hints.as_deref())?,
            columns.iter().map(|c| setting.quote(c)).collect::<Vec<_>>().join(", "),
            columns
                .iter()
                .map(|c| setting.as_parameter(c))
                .collect::<Vec<_>>()
                .join(", "),
            term = setting.statement_terminator,
        ))
    }

    fn create_merge(&self, request: &MergeRequest) -> Result<String> {
        let setting = &self.setting;
        let table = request.target.table();
        let qualifiers = merge_qualifiers(request)?;
        if request.fields.is_empty() {
            return Err(empty_field_set(table, "nothing to merge"));
        }

        let source: Vec<String> = request
            .fields
            .names()
            .iter()
            .map(|n| format!("{} AS {}", setting.as_parameter(n), setting.quote(n)))
            .collect();
        let on: Vec<String> = qualifiers
            .names()
            .iter()
            .map(|q| format!("S.{c} = T.{c}", c = setting.quote(q)))
            .collect();
        let inserts = insertable(&request.fields, request.identity.as_deref(), None);
        let updates = updatable(request, &qualifiers);

        let mut sql = format!(
            "MERGE {}{} AS T USING (SELECT {}) AS S ON ({})",
            setting.quote_table(table),
            self.hints_clause(request.hints.as_deref())?,
            source.join(", "),
            on.join(" AND ")
        );
        if !inserts.is_empty() {
            sql.push_str(&format!(
                " WHEN NOT MATCHED THEN INSERT ({}) VALUES ({})",
                inserts.iter().map(|c| setting.quote(c)).collect::<Vec<_>>().join(", "),
                inserts
                    .iter()
                    .map(|c| format!("S.{}", setting.quote(c)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if !updates.is_empty() {
            let assignments: Vec<String> = updates
                .iter()
                .map(|c| format!("T.{q} = S.{q}", q = setting.quote(c)))
                .collect();
            sql.push_str(&format!(
                " WHEN MATCHED THEN UPDATE SET {}",
                assignments.join(", ")
            ));
        }
        let output = result_column(request.identity.as_deref(), request.primary.as_deref())
            .or_else(|| qualifiers.names().first().map(String::as_str));
        if let Some(column) = output {
            sql.push_str(&format!(
                " OUTPUT INSERTED.{} AS {}",
                setting.quote(column),
                setting.quote("Result")
            ));
        }
        sql.push_str(&setting.statement_terminator);
        Ok(sql)
    }
}
