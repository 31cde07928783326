use super::engine::{MAX_ACCUMULATION_MONTHS, MAX_WITHDRAWAL_MONTHS};
use super::range::{MAX_GRID_POINTS, snap};
use super::types::{PlannerInputs, SimulationParams};

const MIN_RUNS: u32 = 50;
const MAX_RUNS: u32 = 500;
const MAX_WITHDRAWAL_YEARS: f64 = (MAX_WITHDRAWAL_MONTHS / 12) as f64;
const MAX_CONTRIBUTION_YEARS: f64 = (MAX_ACCUMULATION_MONTHS / 12) as f64;

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

struct Bounds {
    min_fallback: f64,
    step_floor: f64,
    lowest: f64,
    highest: f64,
}

const TARGET_BOUNDS: Bounds = Bounds {
    min_fallback: 0.0,
    step_floor: 1.0,
    lowest: f64::NEG_INFINITY,
    highest: f64::INFINITY,
};

const YEARS_BOUNDS: Bounds = Bounds {
    min_fallback: 1.0,
    step_floor: 1.0,
    lowest: 0.0,
    highest: MAX_WITHDRAWAL_YEARS,
};

const CAGR_BOUNDS: Bounds = Bounds {
    min_fallback: 0.0,
    step_floor: 0.5,
    lowest: f64::NEG_INFINITY,
    highest: f64::INFINITY,
};

/// Returns `(min, max, step)` with finite bounds inside
/// `[lowest, highest]`, `min <= max`, `step >= step_floor` and at most
/// `MAX_GRID_POINTS` grid points.
fn sanitize_bounds(min: f64, max: f64, step: f64, bounds: &Bounds) -> (f64, f64, f64) {
    let min = finite_or(min, bounds.min_fallback);
    let max = finite_or(max, min);
    let step = finite_or(step, 1.0).abs().max(bounds.step_floor);
    let (min, max) = if min > max { (max, min) } else { (min, max) };
    let min = min.clamp(bounds.lowest, bounds.highest);
    let max = max.clamp(bounds.lowest, bounds.highest);
    let max = max.min(min + step * (MAX_GRID_POINTS - 1) as f64);
    (min, max, step)
}

impl PlannerInputs {
    /// Brings every field back into its domain without rejecting anything.
    pub fn sanitized(mut self) -> Self {
        let r = &mut self.ranges;
        (r.target_min, r.target_max, r.target_step) =
            sanitize_bounds(r.target_min, r.target_max, r.target_step, &TARGET_BOUNDS);
        (r.years_min, r.years_max, r.years_step) =
            sanitize_bounds(r.years_min, r.years_max, r.years_step, &YEARS_BOUNDS);
        (r.cagr_min, r.cagr_max, r.cagr_step) =
            sanitize_bounds(r.cagr_min, r.cagr_max, r.cagr_step, &CAGR_BOUNDS);

        let r = self.ranges;
        let s = &mut self.selected;
        s.target = snap(s.target, r.target_min, r.target_max, r.target_step);
        s.years = snap(s.years, r.years_min, r.years_max, r.years_step);
        s.cagr = snap(s.cagr, r.cagr_min, r.cagr_max, r.cagr_step);

        let c = &mut self.contribution;
        c.start_capital = finite_or(c.start_capital, 0.0).max(0.0);
        c.amount = finite_or(c.amount, 0.0).max(0.0);
        c.years = finite_or(c.years, 0.0).clamp(0.0, MAX_CONTRIBUTION_YEARS);

        let mc = &mut self.monte_carlo;
        mc.volatility = finite_or(mc.volatility, 0.0).max(0.0);
        mc.runs = mc.runs.clamp(MIN_RUNS, MAX_RUNS);

        self
    }

    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            start_capital: self.contribution.start_capital,
            contribution_monthly: self.contribution.monthly_amount(),
            contribution_mode: self.contribution.mode,
            contribution_years: self.contribution.years,
            target: self.selected.target,
            years: self.selected.years,
            cagr: self.selected.cagr,
            monte_carlo: self.monte_carlo,
        }
    }
}
