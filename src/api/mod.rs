use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::Json,
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    AssetAllocation, EmpiricalDistribution, ForecastConfig, ForecastResult, PricePoint,
    PriceSeries, RebalancingPolicy, price_relatives, run_forecast,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRebalancingPolicy {
    None,
    #[serde(alias = "targetWeights", alias = "target_weights")]
    TargetWeights,
}

impl From<ApiRebalancingPolicy> for RebalancingPolicy {
    fn from(value: ApiRebalancingPolicy) -> Self {
        match value {
            ApiRebalancingPolicy::None => RebalancingPolicy::None,
            ApiRebalancingPolicy::TargetWeights => RebalancingPolicy::TargetWeights,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AssetPayload {
    id: Option<String>,
    weight: Option<f64>,
    outflow_split: Option<f64>,
    initial_value: Option<f64>,
    prices: Vec<f64>,
    dates: Option<Vec<NaiveDate>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    assets: Vec<AssetPayload>,
    initial_value: Option<f64>,
    initial_outflow: Option<f64>,
    outflow_growth_rate: Option<f64>,
    outflow_stride: Option<usize>,
    periods: Option<usize>,
    trials: Option<usize>,
    rebalancing: Option<ApiRebalancingPolicy>,
    success_threshold: Option<f64>,
    distribution_bins: Option<usize>,
    histogram_bins: Option<usize>,
    seed: Option<u64>,
    sample_paths: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistogramDto {
    edges: Vec<f64>,
    counts: Vec<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PathDto {
    totals: Vec<Option<f64>>,
    ruined_at: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    success_rate: f64,
    trial_count: usize,
    ruined_count: usize,
    median_terminal: f64,
    p10_terminal: f64,
    histogram: HistogramDto,
    sample_paths: Vec<PathDto>,
}

fn build_request(
    payload: SimulatePayload,
) -> Result<(ForecastConfig, HashMap<String, EmpiricalDistribution>), String> {
    if payload.assets.is_empty() {
        return Err("at least one asset with price history is required".to_string());
    }

    let defaults = ForecastConfig::default();
    let asset_count = payload.assets.len() as f64;
    let initial_total = payload.initial_value.unwrap_or(2_500_000.0);
    let distribution_bins = payload
        .distribution_bins
        .unwrap_or(defaults.distribution_bins);

    let mut allocations = Vec::with_capacity(payload.assets.len());
    let mut distributions = HashMap::with_capacity(payload.assets.len());

    for (index, asset) in payload.assets.iter().enumerate() {
        let id = asset
            .id
            .clone()
            .unwrap_or_else(|| format!("asset-{index}"));
        if distributions.contains_key(&id) {
            return Err(format!("duplicate asset id '{id}'"));
        }

        let weight = asset.weight.unwrap_or(1.0 / asset_count);
        let outflow_split = asset.outflow_split.unwrap_or(weight);
        let initial_value = asset.initial_value.unwrap_or(initial_total * weight);

        let returns = match &asset.dates {
            Some(dates) => {
                if dates.len() != asset.prices.len() {
                    return Err(format!(
                        "asset '{id}': {} dates supplied for {} prices",
                        dates.len(),
                        asset.prices.len()
                    ));
                }
                let points = dates
                    .iter()
                    .zip(&asset.prices)
                    .map(|(&date, &price)| PricePoint { date, price })
                    .collect();
                PriceSeries::new(points)
                    .map_err(|e| format!("asset '{id}': {e}"))?
                    .returns()
            }
            None => price_relatives(&asset.prices).map_err(|e| format!("asset '{id}': {e}"))?,
        };

        let distribution = EmpiricalDistribution::fit(&returns, distribution_bins)
            .map_err(|e| format!("asset '{id}': {e}"))?;
        distributions.insert(id.clone(), distribution);
        allocations.push(AssetAllocation {
            id,
            target_weight: weight,
            outflow_split,
            initial_value,
        });
    }

    let config = ForecastConfig {
        allocations,
        rebalancing: payload
            .rebalancing
            .map(Into::into)
            .unwrap_or(defaults.rebalancing),
        initial_outflow: payload.initial_outflow.unwrap_or(defaults.initial_outflow),
        outflow_growth_rate: payload
            .outflow_growth_rate
            .unwrap_or(defaults.outflow_growth_rate),
        outflow_stride: payload.outflow_stride.unwrap_or(defaults.outflow_stride),
        period_count: payload.periods.unwrap_or(defaults.period_count),
        trial_count: payload.trials.unwrap_or(defaults.trial_count),
        distribution_bins,
        histogram_bins: payload.histogram_bins.unwrap_or(defaults.histogram_bins),
        success_threshold: payload
            .success_threshold
            .unwrap_or(defaults.success_threshold),
        seed: payload.seed.unwrap_or(defaults.seed),
        retained_paths: payload.sample_paths.unwrap_or(0),
    };

    Ok((config, distributions))
}

fn build_simulate_response(result: &ForecastResult) -> SimulateResponse {
    SimulateResponse {
        success_rate: result.aggregate.success_rate,
        trial_count: result.aggregate.trial_count,
        ruined_count: result.aggregate.ruined_count,
        median_terminal: result.aggregate.median_terminal,
        p10_terminal: result.aggregate.p10_terminal,
        histogram: HistogramDto {
            edges: result.aggregate.histogram_edges.clone(),
            counts: result.aggregate.histogram_counts.clone(),
        },
        sample_paths: result
            .sample_paths
            .iter()
            .map(|path| PathDto {
                totals: path.totals(),
                ruined_at: path.ruined_at(),
            })
            .collect(),
    }
}

async fn simulate_handler(
    Json(payload): Json<SimulatePayload>,
) -> Result<Json<SimulateResponse>, (StatusCode, String)> {
    let (config, distributions) =
        build_request(payload).map_err(|msg| (StatusCode::UNPROCESSABLE_ENTITY, msg))?;

    info!(
        trials = config.trial_count,
        periods = config.period_count,
        assets = config.allocations.len(),
        "simulate request"
    );

    let result = tokio::task::spawn_blocking(move || run_forecast(&config, &distributions))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("simulation task failed: {e}"),
            )
        })?
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    Ok(Json(build_simulate_response(&result)))
}

async fn healthz() -> &'static str {
    "ok"
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/simulate", post(simulate_handler));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "drawdown API listening");
    axum::serve(listener, app).await
}
