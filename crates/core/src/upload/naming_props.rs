//! Property-based tests for object naming.

use chrono::DateTime;
use proptest::prelude::*;

use super::naming::{object_name, sanitize_filename};

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Sanitized names only contain `[A-Za-z0-9._-]`.
    #[test]
    fn prop_sanitized_charset(name in any::<String>()) {
        let sanitized = sanitize_filename(&name);
        prop_assert!(sanitized.chars().all(is_safe), "unsafe output: {sanitized:?}");
    }

    /// Path separators never survive.
    #[test]
    fn prop_no_separators(name in "[a-z/\\\\. ]{0,40}") {
        let sanitized = sanitize_filename(&name);
        prop_assert!(!sanitized.contains('/'));
        prop_assert!(!sanitized.contains('\\'));
    }

    /// Sanitizing is idempotent.
    #[test]
    fn prop_idempotent(name in any::<String>()) {
        let once = sanitize_filename(&name);
        prop_assert_eq!(sanitize_filename(&once), once.clone());
    }

    /// Object names match `^\d+-[A-Za-z0-9._-]*$`.
    #[test]
    fn prop_object_name_shape(
        name in any::<String>(),
        millis in 0i64..4_102_444_800_000i64,
    ) {
        let at = DateTime::from_timestamp_millis(millis).expect("in range");
        let object = object_name(&name, at);
        let (prefix, rest) = object.split_once('-').expect("has separator");
        prop_assert!(!prefix.is_empty());
        prop_assert!(prefix.chars().all(|c| c.is_ascii_digit()));
        prop_assert_eq!(prefix.parse::<i64>().ok(), Some(millis));
        prop_assert!(rest.chars().all(is_safe));
    }
}
