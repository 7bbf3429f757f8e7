//! Human-readable byte size parsing for configuration values.

use thiserror::Error;

/// Error returned when a size string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid size {input:?}: {reason}")]
pub struct ParseSizeError {
    /// The original input.
    pub input: String,
    /// What went wrong.
    pub reason: &'static str,
}

impl ParseSizeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Parses a human-readable byte size such as `"4KB"`, `"10MB"`, `"1GB"`, or a
/// plain byte count such as `"4096"`.
///
/// Units are binary (`KB` = 1024 bytes) and case-insensitive; a trailing `B`
/// alone is also accepted.
///
/// # Example
///
/// ```rust
/// use keva_common::parse_size;
///
/// assert_eq!(parse_size("10MB").unwrap(), 10 * 1024 * 1024);
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// ```
pub fn parse_size(input: &str) -> Result<u64, ParseSizeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseSizeError::new(input, "empty string"));
    }

    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    if digits.is_empty() {
        return Err(ParseSizeError::new(input, "missing numeric part"));
    }

    let value: u64 = digits
        .parse()
        .map_err(|_| ParseSizeError::new(input, "numeric part out of range"))?;

    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1024,
        "MB" | "M" => 1024 * 1024,
        "GB" | "G" => 1024 * 1024 * 1024,
        _ => return Err(ParseSizeError::new(input, "unknown unit")),
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| ParseSizeError::new(input, "size overflows u64"))
}
