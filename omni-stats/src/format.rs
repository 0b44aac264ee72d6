//! Display formatters for the dashboard tables and metric tiles.
//!
//! Precisions are intentionally per-view: volumes and OI render at 0 decimals,
//! prices at 4, funding at 4 (top lists) or 6 (full listings) percent decimal
//! places, ratios at 2. FDV uses magnitude suffixes with a dash for unknown.

/// Format FDV with a magnitude suffix (T/B/M at one decimal).
///
/// `None` or a non-positive value renders as "-" (unknown, per the metric
/// engine sentinel); sub-million values keep thousands separators with one
/// decimal of precision.
pub fn format_fdv(fdv: Option<f64>) -> String {
    let value = match fdv {
        Some(value) if value > 0.0 => value,
        _ => return "-".to_string(),
    };

    if value >= 1_000_000_000_000.0 {
        format!("${:.1}T", value / 1_000_000_000_000.0)
    } else if value >= 1_000_000_000.0 {
        format!("${:.1}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else {
        format!("${}", with_thousands(value, 1))
    }
}

/// Currency at 0 decimals (volumes, open interest, global metric tiles).
pub fn format_usd(value: f64) -> String {
    format!("${}", with_thousands(value, 0))
}

/// Currency at 4 decimals (mark price).
pub fn format_usd_precise(value: f64) -> String {
    format!("${}", with_thousands(value, 4))
}

/// Fraction as a percentage with the given decimal places.
pub fn format_pct(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}

/// Ratio column format: thousands separators, 2 decimals.
pub fn format_ratio(value: f64) -> String {
    with_thousands(value, 2)
}

/// Fixed-decimal rendering with `,` thousands separators in the integer part.
fn with_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{value:.decimals$}");
    let (sign, digits) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
