use std::collections::HashSet;

/// Excel refuses tab names longer than this.
pub const MAX_TAB_NAME_LEN: usize = 31;

const FORBIDDEN_TAB_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

pub fn truncate_tab_name(name: &str) -> String {
    name.chars().take(MAX_TAB_NAME_LEN).collect()
}

/// Replaces characters Excel rejects in tab names and truncates to 31
/// characters. Blank names fall back to `Sheet`.
pub fn clean_tab_name(name: &str) -> String {
    let cleaned = name
        .chars()
        .map(|c| if FORBIDDEN_TAB_CHARS.contains(&c) { '_' } else { c })
        .collect::<String>();
    let cleaned = truncate_tab_name(cleaned.trim());

    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// Returns a tab name not yet in `existing_names`, adding ` (n)` when the
/// truncated name collides. The returned name is recorded as taken.
pub fn unique_tab_name(name: &str, existing_names: &mut HashSet<String>) -> String {
    let base = clean_tab_name(name);
    if existing_names.insert(base.to_lowercase()) {
        return base;
    }

    let mut counter = 1;
    loop {
        let suffix = format!(" ({})", counter);
        let keep = MAX_TAB_NAME_LEN.saturating_sub(suffix.chars().count());
        let candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        if existing_names.insert(candidate.to_lowercase()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Tab name for the `index`-th (0-based) table split out of a sheet.
pub fn split_table_tab_name(sheet_name: &str, index: usize) -> String {
    format!("{}_Table{}", sheet_name, index + 1)
}
