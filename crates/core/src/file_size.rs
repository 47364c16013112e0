//! Human-readable file sizes for the "Selected: name (size)" label.

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const STEP: u64 = 1024;

/// Format a byte count using binary units, rounded to two decimals.
///
/// Trailing zeros are dropped (`1536` -> `"1.5 KB"`, `1024` -> `"1 KB"`).
/// Sizes beyond the gigabyte range stay in `GB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit < UNITS.len() - 1 && bytes >= divisor * STEP {
        divisor *= STEP;
        unit += 1;
    }

    let value = (bytes as f64 / divisor as f64 * 100.0).round() / 100.0;
    format!("{value} {}", UNITS[unit])
}
