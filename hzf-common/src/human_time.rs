//! Human-readable time formatting
//!
//! Consistent display of session clocks and playback delays.

/// Seconds above which the session clock gains an hour field
const HOUR_FORMAT_MIN: u64 = 3600;

/// Format an elapsed session time as a study clock.
///
/// Sessions under an hour render as `MM:SS`; longer sessions as `H:MM:SS`.
///
/// # Examples
///
/// ```
/// use hzf_common::human_time::format_clock;
///
/// assert_eq!(format_clock(0), "00:00");
/// assert_eq!(format_clock(75), "01:15");
/// assert_eq!(format_clock(3599), "59:59");
/// assert_eq!(format_clock(3661), "1:01:01");
/// ```
pub fn format_clock(seconds: u64) -> String {
    if seconds < HOUR_FORMAT_MIN {
        let mins = seconds / 60;
        let secs = seconds % 60;
        format!("{:02}:{:02}", mins, secs)
    } else {
        let hours = seconds / 3600;
        let mins = (seconds % 3600) / 60;
        let secs = seconds % 60;
        format!("{}:{:02}:{:02}", hours, mins, secs)
    }
}

/// Format a playback delay (language gap, next delay) in seconds.
///
/// Non-finite or negative inputs are shown as `0.00s`, matching how the
/// scheduler clamps them.
///
/// # Examples
///
/// ```
/// use hzf_common::human_time::format_delay;
///
/// assert_eq!(format_delay(1.5), "1.50s");
/// assert_eq!(format_delay(-2.0), "0.00s");
/// ```
pub fn format_delay(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    format!("{:.2}s", seconds)
}
