use super::annuity::{annual_to_monthly_rate, months_to_reach, required_capital};
use super::rng::SeededRandom;
use super::types::{AutoStatus, ContributionMode, SimulationParams, SimulationResult};

/// Longest accumulation phase the auto mode will schedule (50 years).
pub const MAX_ACCUMULATION_MONTHS: u32 = 600;

/// Longest withdrawal phase that will be simulated (50 years).
pub const MAX_WITHDRAWAL_MONTHS: u32 = 600;

#[derive(Debug, Clone, Copy)]
struct Schedule {
    months_accum: u32,
    months_total: u32,
    contribution_monthly: f64,
    withdrawal_monthly: f64,
}

impl Schedule {
    fn apply_month(self, balance: f64, month: u32) -> f64 {
        if month <= self.months_accum {
            balance + self.contribution_monthly
        } else {
            balance - self.withdrawal_monthly
        }
    }
}

#[derive(Debug)]
struct DeterministicPath {
    balances: Vec<f64>,
    ruin_month: Option<u32>,
}

pub fn run_simulation(params: &SimulationParams) -> SimulationResult {
    let (months_accum, auto_status) = resolve_accumulation(params);
    let schedule = Schedule {
        months_accum,
        months_total: months_accum
            .saturating_add(whole_months(params.years).min(MAX_WITHDRAWAL_MONTHS)),
        contribution_monthly: params.contribution_monthly,
        withdrawal_monthly: params.target,
    };

    let path = simulate_deterministic(params, schedule);

    let (p10, p50, p90) = if params.monte_carlo.enabled {
        simulate_monte_carlo(params, schedule)
    } else {
        (Vec::new(), Vec::new(), Vec::new())
    };

    let acc_line = path
        .balances
        .iter()
        .enumerate()
        .map(|(idx, &v)| (idx as u32 <= months_accum).then_some(v))
        .collect();
    let withdraw_line = path
        .balances
        .iter()
        .enumerate()
        .map(|(idx, &v)| (idx as u32 >= months_accum).then_some(v))
        .collect();
    let labels = (0..path.balances.len() as u32).map(month_label).collect();
    let end_balance = path.balances.last().copied().unwrap_or(0.0);

    SimulationResult {
        labels,
        acc_line,
        withdraw_line,
        p10,
        p50,
        p90,
        months_accum,
        months_total: schedule.months_total,
        end_balance,
        ruin_month: path.ruin_month,
        auto_status,
    }
}

/// Saturates at `u32::MAX`; NaN maps to 0.
fn whole_months(years: f64) -> u32 {
    (years * 12.0).round().max(0.0) as u32
}

fn resolve_accumulation(params: &SimulationParams) -> (u32, AutoStatus) {
    if params.contribution_mode == ContributionMode::Fixed {
        let months = whole_months(params.contribution_years).min(MAX_ACCUMULATION_MONTHS);
        return (months, AutoStatus::Reachable);
    }

    let required_start = required_capital(params.target, params.years, params.cagr);
    let months_needed = months_to_reach(
        params.start_capital,
        params.contribution_monthly,
        params.cagr,
        required_start,
    );

    if !months_needed.is_finite() || months_needed > MAX_ACCUMULATION_MONTHS as f64 {
        (MAX_ACCUMULATION_MONTHS, AutoStatus::Unreachable)
    } else if months_needed <= 0.0 {
        (0, AutoStatus::Overfunded)
    } else {
        (months_needed.ceil() as u32, AutoStatus::Reachable)
    }
}

fn simulate_deterministic(params: &SimulationParams, schedule: Schedule) -> DeterministicPath {
    let monthly_rate = annual_to_monthly_rate(params.cagr / 100.0);
    let mut balance = params.start_capital;
    let mut balances = Vec::with_capacity(schedule.months_total as usize + 1);
    balances.push(balance);
    let mut ruin_month = None;

    for month in 1..=schedule.months_total {
        balance *= 1.0 + monthly_rate;
        balance = schedule.apply_month(balance, month);
        balances.push(balance);
        // Draw-down continues past ruin; only the first shortfall is recorded.
        if ruin_month.is_none() && balance < 0.0 {
            ruin_month = Some(month);
        }
    }

    DeterministicPath {
        balances,
        ruin_month,
    }
}

/// Percentile bands across all runs. Every run draws from one shared
/// generator in sequence, so the bands depend on `seed` and `runs` together.
fn simulate_monte_carlo(
    params: &SimulationParams,
    schedule: Schedule,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let config = params.monte_carlo;
    let mut rng = SeededRandom::new(config.seed);
    let mean_log = (1.0 + params.cagr / 100.0).ln() / 12.0;
    let sigma = config.volatility / 100.0 / 12_f64.sqrt();

    let mut buckets = (0..=schedule.months_total)
        .map(|_| Vec::with_capacity(config.runs as usize))
        .collect::<Vec<Vec<f64>>>();

    for _ in 0..config.runs {
        let mut balance = params.start_capital;
        buckets[0].push(balance);

        for month in 1..=schedule.months_total {
            let z = rng.standard_normal();
            balance *= (mean_log + sigma * z).exp();
            balance = schedule.apply_month(balance, month);
            buckets[month as usize].push(balance);
        }
    }

    let mut p10 = Vec::with_capacity(buckets.len());
    let mut p50 = Vec::with_capacity(buckets.len());
    let mut p90 = Vec::with_capacity(buckets.len());
    for bucket in &mut buckets {
        bucket.sort_by(|a, b| a.total_cmp(b));
        p10.push(nearest_rank(bucket, 0.1));
        p50.push(nearest_rank(bucket, 0.5));
        p90.push(nearest_rank(bucket, 0.9));
    }
    (p10, p50, p90)
}

/// `sorted` must be ascending.
fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * q).floor() as usize;
    sorted[idx]
}

/// Elapsed years with one decimal, rounding halves up. Months never exceed
/// `MAX_ACCUMULATION_MONTHS + MAX_WITHDRAWAL_MONTHS`, far below `u32::MAX / 10`.
fn month_label(month: u32) -> String {
    debug_assert!(month <= MAX_ACCUMULATION_MONTHS + MAX_WITHDRAWAL_MONTHS);
    let tenths = (month * 10 + 6) / 12;
    format!("{}.{}", tenths / 10, tenths % 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MonteCarloConfig;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn assert_rel(actual: f64, expected: f64, rel: f64) {
        assert_close(actual, expected, rel * expected.abs().max(1.0));
    }

    fn fixed_params() -> SimulationParams {
        SimulationParams {
            start_capital: 0.0,
            contribution_monthly: 500.0,
            contribution_mode: ContributionMode::Fixed,
            contribution_years: 5.0,
            target: 2_000.0,
            years: 15.0,
            cagr: 10.0,
            monte_carlo: MonteCarloConfig {
                enabled: false,
                volatility: 12.0,
                runs: 200,
                seed: 42,
            },
        }
    }

    fn with_monte_carlo(mut params: SimulationParams) -> SimulationParams {
        params.monte_carlo.enabled = true;
        params
    }

    #[test]
    fn fixed_five_year_accumulation_runs_out() {
        let result = run_simulation(&fixed_params());
        assert_eq!(result.months_accum, 60);
        assert_eq!(result.months_total, 240);
        assert_eq!(result.auto_status, AutoStatus::Reachable);
        assert_eq!(result.ruin_month, Some(81));
        assert_rel(result.end_balance, -636_980.310_813_843_2, 1e-9);
        assert_rel(
            result.acc_line[60].expect("boundary on acc line"),
            38_280.615_035_765_77,
            1e-9,
        );
    }

    #[test]
    fn lines_split_at_accumulation_boundary() {
        let result = run_simulation(&fixed_params());
        assert_eq!(result.acc_line.len(), 241);
        assert_eq!(result.withdraw_line.len(), 241);
        assert_eq!(result.labels.len(), 241);

        assert!(result.acc_line[..=60].iter().all(Option::is_some));
        assert!(result.acc_line[61..].iter().all(Option::is_none));
        assert!(result.withdraw_line[..60].iter().all(Option::is_none));
        assert!(result.withdraw_line[60..].iter().all(Option::is_some));
        assert_eq!(result.acc_line[60], result.withdraw_line[60]);
        assert_eq!(result.acc_line[0], Some(0.0));
    }

    #[test]
    fn labels_are_year_fractions() {
        let result = run_simulation(&fixed_params());
        assert_eq!(result.labels[0], "0.0");
        assert_eq!(result.labels[1], "0.1");
        assert_eq!(result.labels[3], "0.3");
        assert_eq!(result.labels[12], "1.0");
        assert_eq!(result.labels[18], "1.5");
        assert_eq!(result.labels[240], "20.0");
    }

    #[test]
    fn auto_mode_accumulates_until_target_is_funded() {
        let mut params = fixed_params();
        params.contribution_mode = ContributionMode::Auto;
        let result = run_simulation(&params);
        assert_eq!(result.auto_status, AutoStatus::Reachable);
        assert_eq!(result.months_accum, 176);
        assert_eq!(result.months_total, 356);
        assert_eq!(result.ruin_month, None);
        assert_rel(result.end_balance, 1_097.704_873_271_482, 1e-6);
    }

    #[test]
    fn continue_mode_resolves_like_auto() {
        let mut auto = fixed_params();
        auto.contribution_mode = ContributionMode::Auto;
        let mut cont = auto;
        cont.contribution_mode = ContributionMode::Continue;
        assert_eq!(run_simulation(&auto), run_simulation(&cont));
    }

    #[test]
    fn auto_mode_reports_overfunded_capital() {
        let mut params = fixed_params();
        params.contribution_mode = ContributionMode::Auto;
        params.start_capital = 1_000_000.0;
        let result = run_simulation(&params);
        assert_eq!(result.auto_status, AutoStatus::Overfunded);
        assert_eq!(result.months_accum, 0);
        assert_eq!(result.months_total, 180);
        assert_eq!(result.acc_line[0], Some(1_000_000.0));
        assert!(result.acc_line[1..].iter().all(Option::is_none));
        assert_rel(result.end_balance, 3_380_360.229_519_568_4, 1e-9);
    }

    #[test]
    fn auto_mode_caps_unreachable_targets_and_still_draws_down() {
        let mut params = fixed_params();
        params.contribution_mode = ContributionMode::Auto;
        params.contribution_monthly = 0.0;
        let result = run_simulation(&params);
        assert_eq!(result.auto_status, AutoStatus::Unreachable);
        assert_eq!(result.months_accum, MAX_ACCUMULATION_MONTHS);
        assert_eq!(result.months_total, MAX_ACCUMULATION_MONTHS + 180);
        assert_eq!(result.ruin_month, Some(MAX_ACCUMULATION_MONTHS + 1));

        let rate = annual_to_monthly_rate(0.10);
        let shortfall = 2_000.0 * ((1.0 + rate).powi(180) - 1.0) / rate;
        assert_rel(result.end_balance, -shortfall, 1e-9);
    }

    #[test]
    fn auto_mode_caps_targets_needing_more_than_fifty_years() {
        let mut params = fixed_params();
        params.contribution_mode = ContributionMode::Auto;
        params.contribution_monthly = 10.0;
        params.cagr = 1.0;
        let result = run_simulation(&params);
        assert_eq!(result.auto_status, AutoStatus::Unreachable);
        assert_eq!(result.months_accum, MAX_ACCUMULATION_MONTHS);
    }

    #[test]
    fn zero_growth_is_exactly_linear() {
        let mut params = fixed_params();
        params.cagr = 0.0;
        params.start_capital = 400_000.0;
        let result = run_simulation(&params);
        assert_close(result.end_balance, 400_000.0 + 60.0 * 500.0 - 180.0 * 2_000.0, 1e-6);
        assert_eq!(result.ruin_month, None);
    }

    #[test]
    fn monte_carlo_disabled_leaves_bands_empty() {
        let result = run_simulation(&fixed_params());
        assert!(result.p10.is_empty());
        assert!(result.p50.is_empty());
        assert!(result.p90.is_empty());
    }

    #[test]
    fn monte_carlo_bands_are_ordered_and_cover_every_month() {
        let result = run_simulation(&with_monte_carlo(fixed_params()));
        let expected_len = result.months_total as usize + 1;
        assert_eq!(result.p10.len(), expected_len);
        assert_eq!(result.p50.len(), expected_len);
        assert_eq!(result.p90.len(), expected_len);
        for month in 0..expected_len {
            assert!(result.p10[month] <= result.p50[month]);
            assert!(result.p50[month] <= result.p90[month]);
        }
        assert_eq!(result.p10[0], 0.0);
        assert_eq!(result.p90[0], 0.0);
    }

    #[test]
    fn monte_carlo_bands_match_reference_run() {
        let result = run_simulation(&with_monte_carlo(fixed_params()));
        assert_rel(result.p10[60], 32_150.477_046_031_876, 1e-6);
        assert_rel(result.p50[60], 38_552.786_583_041_53, 1e-6);
        assert_rel(result.p90[60], 48_681.437_927_321_46, 1e-6);
        assert_rel(result.p50[240], -639_655.002_735_710_8, 1e-6);
    }

    #[test]
    fn monte_carlo_is_reproducible_per_seed() {
        let params = with_monte_carlo(fixed_params());
        assert_eq!(run_simulation(&params), run_simulation(&params));

        let mut reseeded = params;
        reseeded.monte_carlo.seed = 7;
        assert_ne!(run_simulation(&params).p50, run_simulation(&reseeded).p50);
    }

    #[test]
    fn monte_carlo_without_volatility_tracks_deterministic_path() {
        let mut params = with_monte_carlo(fixed_params());
        params.monte_carlo.volatility = 0.0;
        params.monte_carlo.runs = 50;
        let result = run_simulation(&params);
        for (month, balance) in result.acc_line.iter().enumerate().take(61) {
            let balance = balance.expect("accumulation balance");
            assert_rel(result.p50[month], balance, 1e-9);
            assert_eq!(result.p10[month], result.p90[month]);
        }
    }

    #[test]
    fn huge_horizons_are_capped_per_phase() {
        let mut params = fixed_params();
        params.years = 1e9;
        params.contribution_years = 1e9;
        let result = run_simulation(&params);
        assert_eq!(result.months_accum, MAX_ACCUMULATION_MONTHS);
        assert_eq!(
            result.months_total,
            MAX_ACCUMULATION_MONTHS + MAX_WITHDRAWAL_MONTHS
        );
        assert_eq!(result.labels.len(), result.months_total as usize + 1);
        assert_eq!(result.labels.last().map(String::as_str), Some("100.0"));
    }

    #[test]
    fn nearest_rank_selects_floor_index() {
        let sorted = (0..11).map(f64::from).collect::<Vec<_>>();
        assert_eq!(nearest_rank(&sorted, 0.1), 1.0);
        assert_eq!(nearest_rank(&sorted, 0.5), 5.0);
        assert_eq!(nearest_rank(&sorted, 0.9), 9.0);
        assert_eq!(nearest_rank(&[3.0, 4.0], 0.9), 3.0);
        assert_eq!(nearest_rank(&[], 0.5), 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_more_start_capital_never_brings_ruin_forward(
            start in 0u32..1_000_000,
            extra in 1u32..1_000_000,
            contribution in 0u32..5_000,
            contribution_years in 0u32..20,
            target in 100u32..10_000,
            years in 1u32..40,
            cagr_tenths in -50i32..200
        ) {
            let mut params = fixed_params();
            params.contribution_monthly = contribution as f64;
            params.contribution_years = contribution_years as f64;
            params.target = target as f64;
            params.years = years as f64;
            params.cagr = cagr_tenths as f64 / 10.0;

            params.start_capital = start as f64;
            let poorer = run_simulation(&params);
            params.start_capital = (start + extra) as f64;
            let richer = run_simulation(&params);

            match (poorer.ruin_month, richer.ruin_month) {
                (_, None) => {}
                (Some(poor), Some(rich)) => prop_assert!(rich >= poor),
                (None, Some(_)) => prop_assert!(false, "extra capital caused ruin"),
            }
            prop_assert!(richer.end_balance >= poorer.end_balance);
        }

        #[test]
        fn prop_monte_carlo_bands_are_monotone(
            seed in 0u32..u32::MAX,
            runs in 50u32..120,
            volatility in 0u32..40,
            start in 0u32..500_000
        ) {
            let mut params = with_monte_carlo(fixed_params());
            params.start_capital = start as f64;
            params.years = 5.0;
            params.monte_carlo.seed = seed;
            params.monte_carlo.runs = runs;
            params.monte_carlo.volatility = volatility as f64;

            let result = run_simulation(&params);
            prop_assert!(result.p10.len() == result.months_total as usize + 1);
            for month in 0..result.p10.len() {
                prop_assert!(result.p10[month] <= result.p50[month]);
                prop_assert!(result.p50[month] <= result.p90[month]);
            }
        }
    }
}
