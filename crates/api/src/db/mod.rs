//! Shared database schema, migrations, and query builders.
//!
//! Every builder returns [`Built`]: SQL text plus bound values, executed by
//! the server's rusqlite bridge.

pub mod bookings;
pub mod campaigns;
pub mod matches;
pub mod media_kits;
pub mod migrations;
pub mod pitches;
pub mod podcasts;
pub mod questionnaires;
pub mod stats;
pub mod tables;
pub mod users;

// Re-export tables for convenience
pub use tables::*;

/// A built statement: `(sql, values)`.
pub type Built = (String, sea_query::Values);

/// Encode a list column (keywords, links, talking points, ...) as JSON text.
pub fn encode_list<T: serde::Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a JSON list column. Malformed or NULL values read as empty.
pub fn decode_list<T: serde::de::DeserializeOwned>(raw: Option<&str>) -> Vec<T> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// Decode a JSON object column. Malformed or NULL values read as empty.
pub fn decode_map(raw: Option<&str>) -> std::collections::BTreeMap<String, String> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// SQLite `datetime` text for "now", matching the column defaults.
pub fn now_sqlite() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `LIMIT`/`OFFSET` for a clamped page.
pub fn page_window(page: u32, per_page: u32) -> (u64, u64) {
    let (page, per_page) = crate::clamp_page(page, per_page);
    let (page, per_page) = (u64::from(page), u64::from(per_page));
    (per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_json_columns() {
        assert_eq!(decode_list::<String>(Some("[\"a\",\"b\"]")), vec!["a", "b"]);
        assert!(decode_list::<String>(Some("not json")).is_empty());
        assert!(decode_list::<String>(None).is_empty());
        assert!(decode_map(Some("[]")).is_empty());
        assert_eq!(encode_list(&["x".to_string()]), "[\"x\"]");
    }

    #[test]
    fn page_window_offsets() {
        assert_eq!(page_window(1, 20), (20, 0));
        assert_eq!(page_window(3, 10), (10, 20));
        assert_eq!(page_window(0, 1000), (100, 0));
    }

    #[test]
    fn page_window_does_not_overflow() {
        assert_eq!(page_window(u32::MAX, 100), (100, (u64::from(u32::MAX) - 1) * 100));
        assert_eq!(page_window(50_000_000, 100), (100, 4_999_999_900));
    }
}
