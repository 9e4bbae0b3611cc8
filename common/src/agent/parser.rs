use once_cell::sync::Lazy;
use regex::Regex;

static SQL_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```sql(.*?)```").unwrap()
});

/// pull the first ```sql fenced block out of model output.
/// without a fence the trimmed text is returned as-is; nothing is validated.
pub fn extract_sql(text: &str) -> String {
    match SQL_FENCE_REGEX.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim().to_string(),
        None => text.trim().to_string(),
    }
}
