use serde::Serialize;

use super::annuity::required_capital;
use super::format::{format_pct, format_years};
use super::solver::solve_cagr;
use super::types::{
    AutoStatus, CagrResult, CagrStatus, ContributionMode, PlannerInputs, SimulationResult,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CagrSignal {
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Headline {
    pub required_start: f64,
    pub total_withdrawals: f64,
    pub contribution_monthly: f64,
    pub required_cagr: CagrResult,
    pub required_cagr_text: String,
    pub required_cagr_meta: String,
    pub cagr_signal: CagrSignal,
    pub auto_time_text: String,
    pub runway_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixCell {
    pub target: f64,
    pub years: f64,
    pub required_capital: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatrixBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredCapitalMatrix {
    pub cagr: f64,
    pub cells: Vec<MatrixCell>,
    pub bounds: MatrixBounds,
}

pub fn build_headline(inputs: &PlannerInputs, simulation: &SimulationResult) -> Headline {
    let selected = inputs.selected;
    let start_capital = inputs.contribution.start_capital;
    let required_cagr = solve_cagr(start_capital, selected.target, selected.years);

    let unfunded = required_cagr.status == CagrStatus::Insufficient && start_capital <= 0.0;
    let required_cagr_text = match required_cagr.status {
        _ if unfunded => "n/a".to_string(),
        CagrStatus::Overfunded => "0% (overfunded)".to_string(),
        CagrStatus::Insufficient => format!("> {}", format_pct(required_cagr.cagr)),
        CagrStatus::Normal => format_pct(required_cagr.cagr),
    };
    let required_cagr_meta = match required_cagr.status {
        _ if unfunded => "enter starting capital",
        CagrStatus::Overfunded => "overfunded at 0% growth",
        _ => "if withdrawals started today",
    }
    .to_string();

    let cagr_signal = match required_cagr.status {
        CagrStatus::Overfunded => CagrSignal::Success,
        CagrStatus::Insufficient => CagrSignal::Warning,
        CagrStatus::Normal if required_cagr.cagr <= selected.cagr => CagrSignal::Success,
        CagrStatus::Normal => CagrSignal::Warning,
    };

    let auto_time_text = if inputs.contribution.mode == ContributionMode::Fixed {
        format!("{}y (fixed)", inputs.contribution.years)
    } else if simulation.auto_status == AutoStatus::Unreachable {
        "> 50y (not reached)".to_string()
    } else {
        format_years(simulation.months_accum as f64)
    };

    let runway_text = match simulation.ruin_month {
        None => "survives full horizon".to_string(),
        Some(month) => format!("runs out in {}", format_years(month as f64)),
    };

    Headline {
        required_start: required_capital(selected.target, selected.years, selected.cagr),
        total_withdrawals: selected.target * selected.years * 12.0,
        contribution_monthly: inputs.contribution.monthly_amount(),
        required_cagr,
        required_cagr_text,
        required_cagr_meta,
        cagr_signal,
        auto_time_text,
        runway_text,
    }
}

/// Required capital for every (target, years) pair at one growth rate.
pub fn required_capital_matrix(
    targets: &[f64],
    years: &[f64],
    cagr: f64,
) -> RequiredCapitalMatrix {
    let mut cells = Vec::with_capacity(targets.len() * years.len());
    for &target in targets {
        for &year in years {
            cells.push(MatrixCell {
                target,
                years: year,
                required_capital: required_capital(target, year, cagr),
            });
        }
    }

    let bounds = if cells.is_empty() {
        MatrixBounds { min: 0.0, max: 1.0 }
    } else {
        cells.iter().fold(
            MatrixBounds {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |acc, cell| MatrixBounds {
                min: acc.min.min(cell.required_capital),
                max: acc.max.max(cell.required_capital),
            },
        )
    };

    RequiredCapitalMatrix {
        cagr,
        cells,
        bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::run_simulation;

    fn headline_for(inputs: &PlannerInputs) -> Headline {
        let simulation = run_simulation(&inputs.simulation_params());
        build_headline(inputs, &simulation)
    }

    #[test]
    fn default_scenario_without_capital_asks_for_it() {
        let headline = headline_for(&PlannerInputs::default());
        assert_eq!(headline.required_cagr_text, "n/a");
        assert_eq!(headline.required_cagr_meta, "enter starting capital");
        assert_eq!(headline.cagr_signal, CagrSignal::Warning);
        assert_eq!(headline.auto_time_text, "14.7y");
        assert_eq!(headline.runway_text, "survives full horizon");
        assert_eq!(headline.total_withdrawals, 360_000.0);
        assert!((headline.required_start - 190_768.637_049_297_86).abs() < 1e-4);
    }

    #[test]
    fn overfunded_capital_is_a_success() {
        let mut inputs = PlannerInputs::default();
        inputs.contribution.start_capital = 400_000.0;
        let headline = headline_for(&inputs);
        assert_eq!(headline.required_cagr.status, CagrStatus::Overfunded);
        assert_eq!(headline.required_cagr_text, "0% (overfunded)");
        assert_eq!(headline.required_cagr_meta, "overfunded at 0% growth");
        assert_eq!(headline.cagr_signal, CagrSignal::Success);
        assert_eq!(headline.auto_time_text, "0 mo");
    }

    #[test]
    fn small_capital_reports_ceiling() {
        let mut inputs = PlannerInputs::default();
        inputs.contribution.start_capital = 10_000.0;
        let headline = headline_for(&inputs);
        assert_eq!(headline.required_cagr_text, "> 35.0%");
        assert_eq!(headline.required_cagr_meta, "if withdrawals started today");
        assert_eq!(headline.cagr_signal, CagrSignal::Warning);
    }

    #[test]
    fn signal_compares_required_with_selected_growth() {
        let mut inputs = PlannerInputs::default();
        inputs.contribution.start_capital = 250_000.0;
        let headline = headline_for(&inputs);
        assert_eq!(headline.required_cagr_text, "5.3%");
        assert_eq!(headline.cagr_signal, CagrSignal::Success);

        inputs.selected.cagr = 5.0;
        assert_eq!(headline_for(&inputs).cagr_signal, CagrSignal::Warning);
    }

    #[test]
    fn fixed_mode_reports_configured_years_and_runway() {
        let mut inputs = PlannerInputs::default();
        inputs.contribution.mode = ContributionMode::Fixed;
        let headline = headline_for(&inputs);
        assert_eq!(headline.auto_time_text, "5y (fixed)");
        assert_eq!(headline.runway_text, "runs out in 6.8y");
    }

    #[test]
    fn unreachable_accumulation_is_flagged() {
        let mut inputs = PlannerInputs::default();
        inputs.contribution.amount = 0.0;
        let headline = headline_for(&inputs);
        assert_eq!(headline.auto_time_text, "> 50y (not reached)");
    }

    #[test]
    fn matrix_covers_every_grid_pair() {
        let matrix = required_capital_matrix(&[1_000.0, 2_000.0], &[10.0, 15.0, 20.0], 0.0);
        assert_eq!(matrix.cells.len(), 6);
        assert_eq!(matrix.cells[0].required_capital, 120_000.0);
        assert_eq!(matrix.cells[5].target, 2_000.0);
        assert_eq!(matrix.cells[5].years, 20.0);
        assert_eq!(matrix.bounds.min, 120_000.0);
        assert_eq!(matrix.bounds.max, 480_000.0);
    }

    #[test]
    fn empty_matrix_has_unit_bounds() {
        let matrix = required_capital_matrix(&[], &[10.0], 7.0);
        assert!(matrix.cells.is_empty());
        assert_eq!(matrix.bounds, MatrixBounds { min: 0.0, max: 1.0 });
    }
}
