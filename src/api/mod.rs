use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    CagrResult, ContributionConfig, ContributionFrequency, ContributionMode, Headline,
    MAX_GRID_POINTS, MonteCarloConfig, Planner, PlannerInputs, RangeConfig,
    RequiredCapitalMatrix, SelectedScenario, SimulationResult, SimulationSlot, Ticket, grid_len,
    make_range, run_simulation, snap, solve_cagr,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFrequency {
    Monthly,
    Yearly,
}

impl From<CliFrequency> for ContributionFrequency {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Monthly => ContributionFrequency::Monthly,
            CliFrequency::Yearly => ContributionFrequency::Yearly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliContributionMode {
    #[value(alias = "stop")]
    Auto,
    Continue,
    Fixed,
}

impl From<CliContributionMode> for ContributionMode {
    fn from(value: CliContributionMode) -> Self {
        match value {
            CliContributionMode::Auto => ContributionMode::Auto,
            CliContributionMode::Continue => ContributionMode::Continue,
            CliContributionMode::Fixed => ContributionMode::Fixed,
        }
    }
}

impl From<ContributionMode> for CliContributionMode {
    fn from(value: ContributionMode) -> Self {
        match value {
            ContributionMode::Auto => CliContributionMode::Auto,
            ContributionMode::Continue => CliContributionMode::Continue,
            ContributionMode::Fixed => CliContributionMode::Fixed,
        }
    }
}

impl From<ContributionFrequency> for CliFrequency {
    fn from(value: ContributionFrequency) -> Self {
        match value {
            ContributionFrequency::Monthly => CliFrequency::Monthly,
            ContributionFrequency::Yearly => CliFrequency::Yearly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiFrequency {
    #[serde(alias = "month")]
    Monthly,
    #[serde(alias = "year", alias = "annual")]
    Yearly,
}

impl From<ApiFrequency> for CliFrequency {
    fn from(value: ApiFrequency) -> Self {
        match value {
            ApiFrequency::Monthly => CliFrequency::Monthly,
            ApiFrequency::Yearly => CliFrequency::Yearly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiContributionMode {
    #[serde(alias = "stop")]
    Auto,
    Continue,
    Fixed,
}

impl From<ApiContributionMode> for CliContributionMode {
    fn from(value: ApiContributionMode) -> Self {
        match value {
            ApiContributionMode::Auto => CliContributionMode::Auto,
            ApiContributionMode::Continue => CliContributionMode::Continue,
            ApiContributionMode::Fixed => CliContributionMode::Fixed,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    target_min: Option<f64>,
    target_max: Option<f64>,
    target_step: Option<f64>,
    years_min: Option<f64>,
    years_max: Option<f64>,
    years_step: Option<f64>,
    cagr_min: Option<f64>,
    cagr_max: Option<f64>,
    cagr_step: Option<f64>,

    target: Option<f64>,
    years: Option<f64>,
    cagr: Option<f64>,

    start_capital: Option<f64>,
    #[serde(alias = "contribution")]
    amount: Option<f64>,
    frequency: Option<ApiFrequency>,
    mode: Option<ApiContributionMode>,
    contribution_years: Option<f64>,

    monte_carlo: Option<bool>,
    volatility: Option<f64>,
    runs: Option<f64>,
    seed: Option<u64>,
}

#[derive(Parser, Debug, PartialEq)]
#[command(
    name = "roi_headroom",
    about = "Retirement withdrawal headroom: required capital, growth and balance projections"
)]
struct Cli {
    #[arg(long, default_value_t = 1_000.0)]
    target_min: f64,
    #[arg(long, default_value_t = 3_000.0)]
    target_max: f64,
    #[arg(long, default_value_t = 500.0)]
    target_step: f64,
    #[arg(long, default_value_t = 10.0)]
    years_min: f64,
    #[arg(long, default_value_t = 20.0)]
    years_max: f64,
    #[arg(long, default_value_t = 5.0)]
    years_step: f64,
    #[arg(long, default_value_t = 5.0, help = "Lowest growth rate in percent")]
    cagr_min: f64,
    #[arg(long, default_value_t = 20.0, help = "Highest growth rate in percent")]
    cagr_max: f64,
    #[arg(long, default_value_t = 5.0)]
    cagr_step: f64,
    #[arg(long, default_value_t = 2_000.0, help = "Monthly withdrawal")]
    target: f64,
    #[arg(long, default_value_t = 15.0, help = "Withdrawal horizon in years")]
    years: f64,
    #[arg(long, default_value_t = 10.0, help = "Annual growth in percent")]
    cagr: f64,
    #[arg(long, default_value_t = 0.0)]
    start_capital: f64,
    #[arg(long = "contribution", default_value_t = 500.0)]
    amount: f64,
    #[arg(long, value_enum, default_value_t = CliFrequency::Monthly)]
    frequency: CliFrequency,
    #[arg(long, value_enum, default_value_t = CliContributionMode::Auto)]
    mode: CliContributionMode,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Accumulation years, used when --mode fixed"
    )]
    contribution_years: f64,
    #[arg(long, help = "Add Monte Carlo percentile bands")]
    monte_carlo: bool,
    #[arg(
        long,
        default_value_t = 12.0,
        help = "Annualized volatility in percent"
    )]
    volatility: f64,
    #[arg(long, default_value_t = 200, help = "Monte Carlo runs (50-500)")]
    runs: u32,
    #[arg(long, default_value_t = 42)]
    seed: u32,
}

#[derive(Clone)]
struct AppState {
    slot: Arc<SimulationSlot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    inputs: PlannerInputs,
    targets: Vec<f64>,
    years_list: Vec<f64>,
    cagr_list: Vec<f64>,
    headline: Headline,
    simulation: SimulationResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CagrResponse {
    start_capital: f64,
    target: f64,
    years: f64,
    #[serde(flatten)]
    result: CagrResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RangeQuery {
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
    value: Option<f64>,
}

#[derive(Debug, Serialize)]
struct RangeResponse {
    values: Vec<f64>,
    snapped: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> PlannerInputs {
    PlannerInputs {
        ranges: RangeConfig {
            target_min: cli.target_min,
            target_max: cli.target_max,
            target_step: cli.target_step,
            years_min: cli.years_min,
            years_max: cli.years_max,
            years_step: cli.years_step,
            cagr_min: cli.cagr_min,
            cagr_max: cli.cagr_max,
            cagr_step: cli.cagr_step,
        },
        selected: SelectedScenario {
            target: cli.target,
            years: cli.years,
            cagr: cli.cagr,
        },
        contribution: ContributionConfig {
            start_capital: cli.start_capital,
            amount: cli.amount,
            frequency: cli.frequency.into(),
            mode: cli.mode.into(),
            years: cli.contribution_years,
        },
        monte_carlo: MonteCarloConfig {
            enabled: cli.monte_carlo,
            volatility: cli.volatility,
            runs: cli.runs,
            seed: cli.seed,
        },
    }
    .sanitized()
}

/// Parses `simulate` flags and renders the same JSON body `/api/simulate` returns.
pub fn simulate_from_args<I, T>(args: I) -> Result<String, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let planner = Planner::new(build_inputs(cli));
    let simulation = run_simulation(&planner.inputs().simulation_params());
    let response = build_simulate_response(&planner, simulation);
    Ok(serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
        serde_json::json!({ "error": format!("failed to render response: {e}") }).to_string()
    }))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/simulation/latest", get(latest_handler))
        .route("/api/cagr", get(cagr_handler))
        .route("/api/matrix", get(matrix_handler))
        .route("/api/range", get(range_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let state = AppState {
        slot: Arc::new(SimulationSlot::new()),
    };
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    log::info!("ROI headroom HTTP API listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<SimulatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => simulate_handler_impl(state, payload).await,
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

async fn simulate_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => simulate_handler_impl(state, payload).await,
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

async fn simulate_handler_impl(state: AppState, payload: SimulatePayload) -> Response {
    log::debug!("simulate request: {payload:?}");
    let mut planner = Planner::with_slot(inputs_from_payload(payload), state.slot);
    let ticket = planner.begin_refresh();
    finish_simulation(planner, ticket).await
}

async fn finish_simulation(planner: Planner, ticket: Ticket) -> Response {
    let computed = tokio::task::spawn_blocking(move || {
        let published = planner.finish_refresh(ticket);
        (planner, published)
    })
    .await;

    match computed {
        Ok((planner, Some(simulation))) => {
            json_response(StatusCode::OK, build_simulate_response(&planner, simulation))
        }
        Ok((_, None)) => {
            log::warn!("simulation superseded by a newer request before it finished");
            error_response(
                StatusCode::CONFLICT,
                "Superseded by a newer simulation request",
            )
        }
        Err(e) => {
            log::error!("simulation worker failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

async fn latest_handler(State(state): State<AppState>) -> Response {
    match state.slot.current() {
        Some(simulation) => json_response(StatusCode::OK, simulation),
        None => error_response(StatusCode::NOT_FOUND, "No simulation has been published yet"),
    }
}

async fn cagr_handler(payload: Result<Query<SimulatePayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => {
            let inputs = inputs_from_payload(payload);
            json_response(StatusCode::OK, build_cagr_response(&inputs))
        }
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

async fn matrix_handler(payload: Result<Query<SimulatePayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => {
            let planner = Planner::new(inputs_from_payload(payload));
            let matrix: RequiredCapitalMatrix = planner.matrix();
            json_response(StatusCode::OK, matrix)
        }
        Err(rejection) => rejection_response(rejection.body_text()),
    }
}

async fn range_handler(query: Result<Query<RangeQuery>, QueryRejection>) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return rejection_response(rejection.body_text()),
    };
    match range_response(query) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

/// Extractor failures answer 400 with the same JSON error body as every
/// other failure, whatever status axum would pick by default.
fn rejection_response(detail: String) -> Response {
    log::debug!("rejected request: {detail}");
    error_response(StatusCode::BAD_REQUEST, &format!("Invalid request: {detail}"))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<PlannerInputs, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(inputs_from_payload(payload))
}

fn inputs_from_payload(payload: SimulatePayload) -> PlannerInputs {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.target_min {
        cli.target_min = v;
    }
    if let Some(v) = payload.target_max {
        cli.target_max = v;
    }
    if let Some(v) = payload.target_step {
        cli.target_step = v;
    }
    if let Some(v) = payload.years_min {
        cli.years_min = v;
    }
    if let Some(v) = payload.years_max {
        cli.years_max = v;
    }
    if let Some(v) = payload.years_step {
        cli.years_step = v;
    }
    if let Some(v) = payload.cagr_min {
        cli.cagr_min = v;
    }
    if let Some(v) = payload.cagr_max {
        cli.cagr_max = v;
    }
    if let Some(v) = payload.cagr_step {
        cli.cagr_step = v;
    }

    if let Some(v) = payload.target {
        cli.target = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.cagr {
        cli.cagr = v;
    }

    if let Some(v) = payload.start_capital {
        cli.start_capital = v;
    }
    if let Some(v) = payload.amount {
        cli.amount = v;
    }
    if let Some(v) = payload.frequency {
        cli.frequency = v.into();
    }
    if let Some(v) = payload.mode {
        cli.mode = v.into();
    }
    if let Some(v) = payload.contribution_years {
        cli.contribution_years = v;
    }

    if let Some(v) = payload.monte_carlo {
        cli.monte_carlo = v;
    }
    if let Some(v) = payload.volatility {
        cli.volatility = v;
    }
    if let Some(v) = payload.runs {
        cli.runs = runs_from_payload(v);
    }
    if let Some(v) = payload.seed {
        // Seeds wrap to 32 bits like the generator state.
        cli.seed = (v & 0xFFFF_FFFF) as u32;
    }

    build_inputs(cli)
}

fn runs_from_payload(value: f64) -> u32 {
    if value.is_finite() {
        value.round().clamp(0.0, u32::MAX as f64) as u32
    } else {
        default_cli_for_api().runs
    }
}

fn default_cli_for_api() -> Cli {
    let defaults = PlannerInputs::default();
    Cli {
        target_min: defaults.ranges.target_min,
        target_max: defaults.ranges.target_max,
        target_step: defaults.ranges.target_step,
        years_min: defaults.ranges.years_min,
        years_max: defaults.ranges.years_max,
        years_step: defaults.ranges.years_step,
        cagr_min: defaults.ranges.cagr_min,
        cagr_max: defaults.ranges.cagr_max,
        cagr_step: defaults.ranges.cagr_step,
        target: defaults.selected.target,
        years: defaults.selected.years,
        cagr: defaults.selected.cagr,
        start_capital: defaults.contribution.start_capital,
        amount: defaults.contribution.amount,
        frequency: defaults.contribution.frequency.into(),
        mode: defaults.contribution.mode.into(),
        contribution_years: defaults.contribution.years,
        monte_carlo: defaults.monte_carlo.enabled,
        volatility: defaults.monte_carlo.volatility,
        runs: defaults.monte_carlo.runs,
        seed: defaults.monte_carlo.seed,
    }
}

fn build_simulate_response(planner: &Planner, simulation: SimulationResult) -> SimulateResponse {
    SimulateResponse {
        inputs: *planner.inputs(),
        targets: planner.targets(),
        years_list: planner.years_list(),
        cagr_list: planner.cagr_list(),
        headline: planner.headline(&simulation),
        simulation,
    }
}

fn build_cagr_response(inputs: &PlannerInputs) -> CagrResponse {
    let start_capital = inputs.contribution.start_capital;
    let target = inputs.selected.target;
    let years = inputs.selected.years;
    CagrResponse {
        start_capital,
        target,
        years,
        result: solve_cagr(start_capital, target, years),
    }
}

fn range_response(query: RangeQuery) -> Result<RangeResponse, String> {
    let (Some(min), Some(max), Some(step)) = (query.min, query.max, query.step) else {
        return Err("min, max and step are required".to_string());
    };
    if grid_len(min, max, step) > MAX_GRID_POINTS as f64 {
        return Err(format!("range exceeds {MAX_GRID_POINTS} values"));
    }
    Ok(RangeResponse {
        values: make_range(min, max, step),
        snapped: query.value.map(|v| snap(v, min, max, step)),
    })
}
