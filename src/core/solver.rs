use super::annuity::required_capital;
use super::types::{CagrResult, CagrStatus};

/// Ceiling of the modeled growth search, as an annual decimal.
pub const MAX_ANNUAL_CAGR: f64 = 0.35;

const BISECTION_ITERATIONS: u32 = 40;

/// Finds the annual growth (percent) at which `start_capital` exactly funds
/// `monthly_withdrawal` for `years`.
pub fn solve_cagr(start_capital: f64, monthly_withdrawal: f64, years: f64) -> CagrResult {
    if start_capital <= 0.0 || monthly_withdrawal <= 0.0 || years <= 0.0 {
        return CagrResult {
            cagr: 0.0,
            status: CagrStatus::Insufficient,
        };
    }

    let pv_at_zero = required_capital(monthly_withdrawal, years, 0.0);
    if start_capital >= pv_at_zero {
        return CagrResult {
            cagr: 0.0,
            status: CagrStatus::Overfunded,
        };
    }

    let pv_at_max = required_capital(monthly_withdrawal, years, MAX_ANNUAL_CAGR * 100.0);
    if start_capital < pv_at_max {
        return CagrResult {
            cagr: MAX_ANNUAL_CAGR * 100.0,
            status: CagrStatus::Insufficient,
        };
    }

    let mut lo = 0.0;
    let mut hi = MAX_ANNUAL_CAGR;
    for _ in 0..BISECTION_ITERATIONS {
        let mid = (lo + hi) * 0.5;
        let pv = required_capital(monthly_withdrawal, years, mid * 100.0);
        if pv > start_capital {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    CagrResult {
        cagr: (lo + hi) * 0.5 * 100.0,
        status: CagrStatus::Normal,
    }
}
