use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static NON_KEY_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_]").expect("valid regex"));

/// Canonical comparison key for a column header: trimmed, lower-cased,
/// whitespace runs collapsed to `_`, anything outside `[a-z0-9_]` dropped.
pub fn normalize_column_name(header: &str) -> String {
    let lowered = header.trim().to_lowercase();
    let underscored = WHITESPACE_RE.replace_all(&lowered, "_");
    NON_KEY_CHARS_RE.replace_all(&underscored, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("Name"), "name");
        assert_eq!(normalize_column_name("name "), "name");
        assert_eq!(normalize_column_name(" Price"), "price");
        assert_eq!(normalize_column_name("Sale\tDate"), "sale_date");
        assert_eq!(normalize_column_name("Unit  Price ($)"), "unit_price_");
        assert_eq!(normalize_column_name("Café-Menu #2"), "cafmenu_2");
        assert_eq!(normalize_column_name(""), "");
    }
}
