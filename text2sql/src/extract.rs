//! Pull the SQL statement out of a raw completion.
//!
//! Models wrap their answer in a ```` ```sql ```` fence, sometimes after restating earlier
//! attempts. The last fenced block is taken as the answer; without any fence the trimmed
//! completion is used as-is. Nothing here validates the SQL.

use std::sync::OnceLock;

use regex::Regex;

fn fenced_sql_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```sql(.*?)```").expect("fenced sql regex"))
}

/// Returns the interior of the last ```` ```sql ... ``` ```` block in `raw`, byte-for-byte,
/// or the trimmed input when no block is present.
pub fn extract_sql(raw: &str) -> String {
    let trimmed = raw.trim();
    match fenced_sql_re()
        .captures_iter(trimmed)
        .filter_map(|c| c.get(1))
        .last()
    {
        Some(m) => m.as_str().to_string(),
        None => trimmed.to_string(),
    }
}
