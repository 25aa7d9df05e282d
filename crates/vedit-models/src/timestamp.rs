//! Time value parsing.
//!
//! Job parameters carry trim points as text. Three forms are accepted:
//! plain seconds (`"120"`, `"1.5"`), `MM:SS` and `HH:MM:SS`, where every
//! component may be fractional.

use thiserror::Error;

/// Human readable list of accepted time forms, used in error messages.
pub const ACCEPTED_TIME_FORMATS: &str = "seconds (SS), MM:SS or HH:MM:SS";

/// Error returned when a time string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unsupported time format '{input}': use {ACCEPTED_TIME_FORMATS}")]
pub struct TimeFormatError {
    /// The rejected input, trimmed.
    pub input: String,
}

impl TimeFormatError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// Parse a time string into seconds.
///
/// # Examples
/// ```
/// use vedit_models::timestamp::parse_time;
/// assert_eq!(parse_time("120").unwrap(), 120.0);
/// assert_eq!(parse_time("2:00").unwrap(), 120.0);
/// assert_eq!(parse_time("00:02:00").unwrap(), 120.0);
/// ```
pub fn parse_time(input: &str) -> Result<f64, TimeFormatError> {
    let ts = input.trim();

    if let Ok(seconds) = ts.parse::<f64>() {
        return non_negative(seconds).ok_or_else(|| TimeFormatError::new(ts));
    }

    let parts = ts
        .split(':')
        .map(|p| p.trim().parse::<f64>().ok().and_then(non_negative))
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| TimeFormatError::new(ts))?;

    match parts.as_slice() {
        [h, m, s] => Ok(h * 3600.0 + m * 60.0 + s),
        [m, s] => Ok(m * 60.0 + s),
        _ => Err(TimeFormatError::new(ts)),
    }
}

fn non_negative(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Format seconds as `HH:MM:SS.mmm` for log output.
pub fn format_seconds(total_secs: f64) -> String {
    let total_ms = (total_secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let mins = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) as f64 / 1000.0;
    format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
}
