//! String conversion utilities.

/// Converts an empty string to `None`, otherwise returns `Some(value)`.
///
/// Metadata written by external generators may carry `""` where a value is absent.
///
/// # Examples
///
/// ```
/// use plotline_domain::common::none_if_empty;
///
/// assert_eq!(none_if_empty("sc-intro"), Some("sc-intro"));
/// assert_eq!(none_if_empty(""), None);
/// assert_eq!(none_if_empty(" "), Some(" ")); // Whitespace is not empty
/// ```
pub fn none_if_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
