//! Display strings for headline metrics.

const NOT_AVAILABLE: &str = "n/a";

/// Rounds half up, as the display texts expect for negative values too.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        format!("{sign}{:.2}M EUR", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}{:.1}k EUR", abs / 1_000.0)
    } else {
        format!("{sign}{} EUR", round_half_up(abs))
    }
}

pub fn format_short(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    if value.abs() >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value.abs() >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        format!("{}", round_half_up(value))
    }
}

/// `value` is already a percentage.
pub fn format_pct(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{value:.1}%")
}

pub fn format_years(months: f64) -> String {
    if !months.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let years = months / 12.0;
    if years < 1.0 {
        format!("{} mo", round_half_up(months))
    } else {
        format!("{years:.1}y")
    }
}
