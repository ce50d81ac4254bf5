//! SQL identifier quoting and parameter-name validation.
//!
//! Quoting is always applied to generated column and table names so that
//! keywords, spaces and embedded quote characters stay inert.

use std::sync::OnceLock;

use regex::Regex;

/// Quote `name` between `open` and `close`, doubling any embedded `close`.
///
/// A name that is already wrapped in the same pair is returned unchanged.
///
/// ```
/// use sqlshape_core::identifiers::quote_with;
///
/// assert_eq!(quote_with("Order Details", "[", "]"), "[Order Details]");
/// assert_eq!(quote_with("a]b", "[", "]"), "[a]]b]");
/// assert_eq!(quote_with("[Id]", "[", "]"), "[Id]");
/// ```
pub fn quote_with(name: &str, open: &str, close: &str) -> String {
    if is_quoted_with(name, open, close) {
        return name.to_string();
    }
    let doubled = format!("{close}{close}");
    format!("{open}{}{close}", name.replace(close, &doubled))
}

/// Strip one level of `open`/`close` quoting, undoubling escaped closers.
pub fn unquote_with(name: &str, open: &str, close: &str) -> String {
    if !is_quoted_with(name, open, close) {
        return name.to_string();
    }
    let inner = &name[open.len()..name.len() - close.len()];
    let doubled = format!("{close}{close}");
    inner.replace(&doubled, close)
}

fn is_quoted_with(name: &str, open: &str, close: &str) -> bool {
    name.len() >= open.len() + close.len() && name.starts_with(open) && name.ends_with(close)
}

/// Sanitize a SQL identifier by removing non-alphanumeric/underscore characters.
///
/// Used to derive parameter names from arbitrary column names: parameters
/// cannot be quoted, so anything outside `[A-Za-z0-9_]` is dropped.
///
/// ```
/// use sqlshape_core::sanitize_identifier;
///
/// assert_eq!(sanitize_identifier("user_name"), "user_name");
/// assert_eq!(sanitize_identifier("First Name"), "FirstName");
/// ```
#[inline]
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

fn parameter_name_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| match Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$") {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "Invalid parameter-name pattern, rejecting all names");
            None
        }
    })
    .as_ref()
}

/// Check whether `name` can be used as a bound parameter name.
///
/// Parameter names are emitted verbatim after the dialect's prefix, so they
/// must be plain identifiers.
pub fn is_valid_parameter_name(name: &str) -> bool {
    parameter_name_regex().is_some_and(|re| re.is_match(name))
}

/// Derive a parameter name from a column name.
///
/// Falls back to `p` when nothing usable remains, and prefixes an
/// underscore when the sanitized name starts with a digit.
pub fn parameter_name_for(column: &str) -> String {
    let cleaned = sanitize_identifier(column);
    if cleaned.is_empty() {
        return "p".to_string();
    }
    if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{cleaned}");
    }
    cleaned
}
