const NEAR_ZERO_RATE: f64 = 1e-9;

/// Converts an annual rate (decimal) to the equivalent monthly compounding rate.
///
/// Rates below -95% are floored so the fractional power never sees a negative base.
pub fn annual_to_monthly_rate(annual_rate: f64) -> f64 {
    let safe = annual_rate.max(-0.95);
    (1.0 + safe).powf(1.0 / 12.0) - 1.0
}

/// Present value of an ordinary annuity paying `monthly_withdrawal` for
/// `years` at `cagr_percent` annual growth.
pub fn required_capital(monthly_withdrawal: f64, years: f64, cagr_percent: f64) -> f64 {
    let months = (years * 12.0).round().max(0.0);
    if months == 0.0 || monthly_withdrawal <= 0.0 {
        return 0.0;
    }

    let monthly_rate = annual_to_monthly_rate(cagr_percent / 100.0);
    if monthly_rate.abs() < NEAR_ZERO_RATE {
        return monthly_withdrawal * months;
    }

    monthly_withdrawal * (1.0 - (1.0 + monthly_rate).powf(-months)) / monthly_rate
}

/// Months of growth plus contributions needed to lift `start_capital` to
/// `target_capital`. Returns `f64::INFINITY` when the target is never reached.
pub fn months_to_reach(
    start_capital: f64,
    contribution_monthly: f64,
    cagr_percent: f64,
    target_capital: f64,
) -> f64 {
    if target_capital <= start_capital {
        return 0.0;
    }

    let monthly_rate = annual_to_monthly_rate(cagr_percent / 100.0);
    if monthly_rate.abs() < NEAR_ZERO_RATE {
        if contribution_monthly <= 0.0 {
            return f64::INFINITY;
        }
        return (target_capital - start_capital) / contribution_monthly;
    }

    if contribution_monthly <= 0.0 && start_capital <= 0.0 {
        return f64::INFINITY;
    }

    let numerator = target_capital * monthly_rate + contribution_monthly;
    let denominator = start_capital * monthly_rate + contribution_monthly;
    if numerator <= 0.0 || denominator <= 0.0 {
        return f64::INFINITY;
    }

    (numerator / denominator).ln() / (1.0 + monthly_rate).ln()
}
