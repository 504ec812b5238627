//! Byte size parsing and formatting (`512KB`, `5MB`, `1GB`).

use super::ConfigError;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Parses a size such as `5MB`, `4.5 mb`, `2048KB` or `1024`.
pub fn parse_size(value: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidSize {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let normalized = value.trim().to_ascii_uppercase();
    let (number, unit) = match normalized.find(|c: char| c.is_ascii_alphabetic()) {
        Some(index) => normalized.split_at(index),
        None => (normalized.as_str(), "B"),
    };

    let multiplier = match unit.trim() {
        "B" => 1,
        "K" | "KB" => KB,
        "M" | "MB" => MB,
        "G" | "GB" => GB,
        _ => return Err(invalid("unknown unit (use B, KB, MB or GB)")),
    };

    let amount: f64 = number
        .trim()
        .parse()
        .map_err(|_| invalid("not a number"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(invalid("must be a positive number"));
    }

    Ok((amount * multiplier as f64).round() as u64)
}

/// Formats a size in the largest unit that represents it exactly.
pub fn format_size(bytes: u64) -> String {
    match bytes {
        0 => "0".to_string(),
        b if b % GB == 0 => format!("{}GB", b / GB),
        b if b % MB == 0 => format!("{}MB", b / MB),
        b if b % KB == 0 => format!("{}KB", b / KB),
        b => b.to_string(),
    }
}
