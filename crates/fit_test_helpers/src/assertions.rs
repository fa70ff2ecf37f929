//! Domain-specific assertions for FitSync tests

use predicates::prelude::*;

/// Assert that stderr does NOT contain any of the given strings
///
/// # Example
///
/// ```rust
/// use fit_test_helpers::assertions::stderr_not_contains;
/// use predicates::prelude::*;
///
/// assert!(stderr_not_contains(&["ERROR", "WARN"]).eval("all good"));
/// ```
pub fn stderr_not_contains(values: &[&str]) -> impl Predicate<str> {
    let owned_values: Vec<String> = values.iter().map(|&s| s.to_string()).collect();
    predicate::function(move |s: &str| !owned_values.iter().any(|v| s.contains(v.as_str())))
}

/// Assert that a string is a JSON array with exactly `len` elements
///
/// # Example
/// ```rust
/// use fit_test_helpers::assertions::json_array_len;
/// use predicates::prelude::*;
///
/// assert!(json_array_len(2).eval(r#"[{"id":"a"},{"id":"b"}]"#));
/// ```
pub fn json_array_len(len: usize) -> impl Predicate<str> {
    predicate::function(move |s: &str| {
        serde_json::from_str::<serde_json::Value>(s.trim())
            .ok()
            .and_then(|v| v.as_array().map(|a| a.len()))
            == Some(len)
    })
}
