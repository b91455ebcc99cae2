const UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Compact label for a legend value: `950`, `1.2K`, `3.4M`, `2B`.
///
/// Values below 10 keep up to two decimals, larger ones at most one.
/// Trailing zeros are dropped.
pub fn format_legend_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value < 0.0 {
        return format!("-{}", format_legend_value(-value));
    }

    for (index, (unit, suffix)) in UNITS.iter().enumerate() {
        if value >= *unit {
            let scaled = round_to(value / unit, 1);
            // 999.96K rounds up into the next unit
            if scaled >= 1000.0 && index > 0 {
                let (larger, larger_suffix) = UNITS[index - 1];
                return format!("{}{}", trim(round_to(value / larger, 1), 1), larger_suffix);
            }
            return format!("{}{}", trim(scaled, 1), suffix);
        }
    }

    let decimals: usize = if value < 10.0 { 2 } else { 1 };
    let rounded = round_to(value, decimals);
    if rounded >= 1000.0 {
        return format!("{}K", trim(round_to(rounded / 1e3, 1), 1));
    }
    trim(rounded, decimals)
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn trim(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
