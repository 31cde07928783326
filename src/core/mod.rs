mod annuity;
mod engine;
mod format;
mod planner;
mod range;
mod rng;
mod sanitize;
mod solver;
mod summary;
mod types;

pub use annuity::{annual_to_monthly_rate, months_to_reach, required_capital};
pub use engine::{MAX_ACCUMULATION_MONTHS, MAX_WITHDRAWAL_MONTHS, run_simulation};
pub use format::{format_currency, format_pct, format_short, format_years};
pub use planner::{Planner, SimulationSlot, Ticket};
pub use range::{MAX_GRID_POINTS, grid_len, make_range, snap};
pub use rng::{SeededRandom, box_muller};
pub use solver::{MAX_ANNUAL_CAGR, solve_cagr};
pub use summary::{
    CagrSignal, Headline, MatrixBounds, MatrixCell, RequiredCapitalMatrix, build_headline,
    required_capital_matrix,
};
pub use types::{
    AutoStatus, CagrResult, CagrStatus, ContributionConfig, ContributionFrequency,
    ContributionMode, MonteCarloConfig, PlannerInputs, RangeConfig, SelectedScenario,
    SimulationParams, SimulationResult,
};
