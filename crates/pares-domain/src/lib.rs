//! Marketplace records and the pure rules the booking service applies to
//! them: catalogue filtering, promotion pricing, commission, scheduling
//! checks, stats aggregation and the demo dataset.

pub mod admin;
pub mod catalog;
pub mod commission;
pub mod messaging;
pub mod model;
pub mod pricing;
pub mod profile;
pub mod scheduling;
pub mod seed;
pub mod settings;
pub mod stats;

pub use model::*;

/// A request value that failed a field-level check.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Rounds a currency amount to two decimals.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn contains_ignore_case(haystack: Option<&str>, needle_lower: &str) -> bool {
    haystack.is_some_and(|value| value.to_lowercase().contains(needle_lower))
}

pub(crate) fn non_empty_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
        .map(ToString::to_string)
}
