// Common helpers for commands
// All using camelCase for direct JSON compatibility

use std::cmp::Ordering;
use uuid::Uuid;

/// Get current timestamp in milliseconds
pub fn now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate new UUID
pub fn newId() -> String {
    Uuid::new_v4().to_string()
}

/// Collation for display order: case-insensitive first, lowercase before uppercase on ties
pub fn compareNames(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_names_ignores_case_first() {
        let mut names = vec!["beta", "Alpha", "alpha", "Gamma", "delta"];
        names.sort_by(|a, b| compareNames(a, b));
        assert_eq!(names, vec!["alpha", "Alpha", "beta", "delta", "Gamma"]);
    }

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(newId(), newId());
        assert!(now() > 0);
    }
}
