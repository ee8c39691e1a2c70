//! core::naming
//!
//! Monitoring-safe identifiers.
//!
//! # Rules
//!
//! - Every character outside `[A-Za-z0-9_]` becomes `_` (one per char)
//! - The result is lowercased
//!
//! The rule is total and idempotent, so keys derived from configuration
//! are stable across runs.

/// Prefix of the per-label sum keys.
const SUM_PREFIX: &str = "sum";

/// Normalize an arbitrary string into a monitoring item identifier.
///
/// # Example
///
/// ```
/// use backlog_metrics::core::naming::normalize;
///
/// assert_eq!(normalize("PRIORITY1_Type_Bug"), "priority1_type_bug");
/// assert_eq!(normalize("Team A/Type-X"), "team_a_type_x");
/// ```
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Key of the entry counting `label` under `category`.
pub fn pair_key(category: &str, label: &str) -> String {
    normalize(&format!("{}_{}", category, label))
}

/// Key of the entry counting `label` across all categories.
pub fn sum_key(label: &str) -> String {
    normalize(&format!("{}_{}", SUM_PREFIX, label))
}
