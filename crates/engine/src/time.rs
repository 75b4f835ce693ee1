/// Virtual milliseconds since the engine started.
pub type Millis = u64;

/// Formats seconds as minutes with two decimals, e.g. `125.0` → `"2.08"`.
///
/// # Example
/// ```
/// use engine::time::minutes_label;
///
/// assert_eq!(minutes_label(120.0), "2.00");
/// ```
pub fn minutes_label(seconds: f64) -> String {
    format!("{:.2}", seconds / 60.0)
}

/// Returns true for durations a seek history can be built on.
pub fn is_usable_duration(seconds: f64) -> bool {
    seconds.is_finite() && seconds > 0.0
}
