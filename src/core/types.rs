use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionFrequency {
    Monthly,
    Yearly,
}

/// How long the accumulation phase lasts.
///
/// `Auto` and `Continue` both derive the phase length from the target;
/// `Fixed` uses the configured contribution years.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionMode {
    Auto,
    Continue,
    Fixed,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoStatus {
    Reachable,
    Unreachable,
    Overfunded,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CagrStatus {
    Normal,
    Overfunded,
    Insufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeConfig {
    pub target_min: f64,
    pub target_max: f64,
    pub target_step: f64,
    pub years_min: f64,
    pub years_max: f64,
    pub years_step: f64,
    pub cagr_min: f64,
    pub cagr_max: f64,
    pub cagr_step: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedScenario {
    /// Monthly withdrawal.
    pub target: f64,
    pub years: f64,
    /// Annual growth in percent.
    pub cagr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionConfig {
    pub start_capital: f64,
    pub amount: f64,
    pub frequency: ContributionFrequency,
    pub mode: ContributionMode,
    pub years: f64,
}

impl ContributionConfig {
    pub fn monthly_amount(&self) -> f64 {
        match self.frequency {
            ContributionFrequency::Monthly => self.amount,
            ContributionFrequency::Yearly => self.amount / 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloConfig {
    pub enabled: bool,
    /// Annualized volatility in percent.
    pub volatility: f64,
    pub runs: u32,
    pub seed: u32,
}

/// The four user-editable configuration blocks of one calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerInputs {
    pub ranges: RangeConfig,
    pub selected: SelectedScenario,
    pub contribution: ContributionConfig,
    pub monte_carlo: MonteCarloConfig,
}

impl Default for PlannerInputs {
    fn default() -> Self {
        Self {
            ranges: RangeConfig {
                target_min: 1_000.0,
                target_max: 3_000.0,
                target_step: 500.0,
                years_min: 10.0,
                years_max: 20.0,
                years_step: 5.0,
                cagr_min: 5.0,
                cagr_max: 20.0,
                cagr_step: 5.0,
            },
            selected: SelectedScenario {
                target: 2_000.0,
                years: 15.0,
                cagr: 10.0,
            },
            contribution: ContributionConfig {
                start_capital: 0.0,
                amount: 500.0,
                frequency: ContributionFrequency::Monthly,
                mode: ContributionMode::Auto,
                years: 5.0,
            },
            monte_carlo: MonteCarloConfig {
                enabled: false,
                volatility: 12.0,
                runs: 200,
                seed: 42,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub start_capital: f64,
    pub contribution_monthly: f64,
    pub contribution_mode: ContributionMode,
    pub contribution_years: f64,
    pub target: f64,
    pub years: f64,
    pub cagr: f64,
    pub monte_carlo: MonteCarloConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub labels: Vec<String>,
    pub acc_line: Vec<Option<f64>>,
    pub withdraw_line: Vec<Option<f64>>,
    pub p10: Vec<f64>,
    pub p50: Vec<f64>,
    pub p90: Vec<f64>,
    pub months_accum: u32,
    pub months_total: u32,
    pub end_balance: f64,
    pub ruin_month: Option<u32>,
    pub auto_status: AutoStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CagrResult {
    pub cagr: f64,
    pub status: CagrStatus,
}
