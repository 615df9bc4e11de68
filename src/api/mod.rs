//! The seam between the analysis code and wherever cost data comes from.
//!
//! `CostSource` is the trait the rest of the app consumes. Two
//! implementations exist: `UpstreamSource`, which talks to an external cost
//! API over HTTP, and `DemoSource`, which serves the built-in seeded dataset
//! and lets the whole app run top-to-bottom without a network.

mod demo;
mod upstream;

use crate::model::{CostRow, DailyCost, Finding, Mover, Resource, Summary, UtilSample, Window};
use crate::{analyzer, movers, summary, Config, Result};
use chrono::{NaiveDate, Utc};

pub use demo::DemoSource;
pub use upstream::UpstreamSource;

/// Environment variable that forces demo mode regardless of configuration.
const DEMO_MODE_ENV: &str = "COSTGUARD_DEMO";

/// Where cost data is sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Use the built-in seeded demo dataset.
    Demo,
    /// Use the configured upstream cost API.
    Upstream,
}

impl Mode {
    /// This allows for running the program without any upstream API. When
    /// `COSTGUARD_DEMO` is set and non-zero in length, the mode will be
    /// `Mode::Demo`, otherwise it will be `Mode::Upstream`.
    pub fn from_env() -> Self {
        match std::env::var(DEMO_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Demo,
            _ => Mode::Upstream,
        }
    }
}

/// Supplies cost-by-service rows, daily costs, resources and utilization for
/// the analysis code. Implementations must be safe to share across request
/// handler tasks.
#[async_trait::async_trait]
pub trait CostSource: Send + Sync {
    /// Cost per service aggregated over the trailing `window`.
    async fn costs_by_service(&self, window: Window) -> Result<Vec<CostRow>>;

    /// Per-product daily spend covering at least the trailing `window`.
    async fn daily_costs(&self, window: Window) -> Result<Vec<DailyCost>>;

    /// The resource inventory.
    async fn resources(&self) -> Result<Vec<Resource>>;

    /// Hourly utilization samples for all resources.
    async fn utilization(&self) -> Result<Vec<UtilSample>>;

    /// The date analyses are anchored at.
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Fetches the current and comparison aggregates and computes the top movers
/// over the trailing `window`.
///
/// The comparison aggregate is the doubled window. When that aggregate is
/// degenerate (it mirrors the current window), the tripled window is fetched
/// and used instead.
pub async fn top_movers(
    source: &dyn CostSource,
    window: Window,
    limit: usize,
) -> Result<Vec<Mover>> {
    let (current, comparison) = tokio::try_join!(
        source.costs_by_service(window),
        source.costs_by_service(window.doubled()),
    )?;
    let fallback = if movers::comparison_is_degenerate(&current, &comparison) {
        Some(source.costs_by_service(window.tripled()).await?)
    } else {
        None
    };
    let comparison = movers::resolve_comparison(&current, &comparison, fallback.as_deref());
    Ok(movers::compute(&current, comparison, window, limit))
}

/// Fetches the inventory, utilization and cost history and runs the full
/// findings analysis over them. Findings come back ranked by estimated
/// savings descending.
pub async fn findings(source: &dyn CostSource) -> Result<Vec<Finding>> {
    let (resources, utilization, daily) = tokio::try_join!(
        source.resources(),
        source.utilization(),
        source.daily_costs(Window::default()),
    )?;
    Ok(analyzer::run(
        &resources,
        &utilization,
        &daily,
        source.today(),
    ))
}

/// Builds the dashboard summary over the trailing `window`. Daily costs are
/// fetched over at least sixty days so the month-over-month comparison has a
/// prior period to work with.
pub async fn build_summary(source: &dyn CostSource, window: Window) -> Result<Summary> {
    let history = Window::new(window.days().max(60))?;
    let (daily, resources, utilization) = tokio::try_join!(
        source.daily_costs(history),
        source.resources(),
        source.utilization(),
    )?;
    let findings = analyzer::run(&resources, &utilization, &daily, source.today());
    Ok(summary::build(window, &daily, &findings, source.today()))
}

/// Everything known about one resource: its inventory record, recent daily
/// costs, utilization samples and any findings against it. Returns `None`
/// when no resource has the given id.
pub async fn resource_detail(
    source: &dyn CostSource,
    id: &str,
) -> Result<Option<serde_json::Value>> {
    let resources = source.resources().await?;
    let Some(resource) = resources.iter().find(|r| r.resource_id == id).cloned() else {
        return Ok(None);
    };

    let (utilization, daily, findings) = tokio::try_join!(
        source.utilization(),
        source.daily_costs(Window::default()),
        findings(source),
    )?;

    let utilization: Vec<_> = utilization
        .into_iter()
        .filter(|u| u.resource_id == id)
        .collect();
    let daily: Vec<_> = daily
        .into_iter()
        .filter(|c| c.resource_id.as_deref() == Some(id))
        .collect();
    let findings: Vec<_> = findings
        .into_iter()
        .filter(|f| f.resource_id.as_deref() == Some(id))
        .collect();

    Ok(Some(serde_json::json!({
        "resource": resource,
        "daily_costs": daily,
        "utilization": utilization,
        "findings": findings,
    })))
}

/// Creates the cost source for `mode`. Without a configured upstream URL the
/// demo source is used regardless of mode.
pub fn source(config: &Config, mode: Mode) -> Result<Box<dyn CostSource>> {
    match (mode, config.upstream_url()) {
        (Mode::Upstream, Some(url)) => Ok(Box::new(UpstreamSource::new(
            url,
            config.request_timeout(),
        )?)),
        (Mode::Upstream, None) => {
            tracing::info!("no upstream cost API configured, serving demo data");
            Ok(Box::new(DemoSource::new(config.demo_seed())))
        }
        (Mode::Demo, _) => Ok(Box::new(DemoSource::new(config.demo_seed()))),
    }
}
