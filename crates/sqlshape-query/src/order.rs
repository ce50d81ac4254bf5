//! ORDER BY fields.

use serde::{Deserialize, Serialize};
use sqlshape_core::DbSetting;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

impl Order {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Order::Ascending => "ASC",
            Order::Descending => "DESC",
        }
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderField {
    pub name: String,
    #[serde(default)]
    pub order: Order,
}

impl OrderField {
    /// Create an ascending order entry.
    pub fn ascending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: Order::Ascending,
        }
    }

    /// Create a descending order entry.
    pub fn descending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: Order::Descending,
        }
    }

    /// Render `<quoted-name> ASC|DESC`.
    pub fn render(&self, setting: &DbSetting) -> String {
        format!("{} {}", setting.quote(&self.name), self.order.as_sql())
    }

    /// Parse `"Name"`, `"Name DESC"` or `"-Name"`.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if let Some(name) = input.strip_prefix('-') {
            return Self::descending(name.trim());
        }
        match input.rsplit_once(' ') {
            Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => Self::descending(name.trim()),
            Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => Self::ascending(name.trim()),
            _ => Self::ascending(input),
        }
    }
}
