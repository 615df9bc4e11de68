use crate::api::{self, Mode};
use crate::commands::Out;
use crate::model::{Summary, Window};
use crate::{Config, Result};
use std::fmt::Write as _;

/// Builds the dashboard summary and renders its KPIs and product breakdown.
pub async fn summary(
    config: &Config,
    mode: Mode,
    window: Option<Window>,
) -> Result<Out<Summary>> {
    let window = window.unwrap_or_else(|| config.default_window());
    let source = api::source(config, mode)?;
    let summary = api::build_summary(source.as_ref(), window).await?;

    let kpis = &summary.kpis;
    let mut message = format!(
        "Spend over {}: {} (WoW {}%, MoM {}%)",
        summary.window, kpis.total_cost_usd, kpis.wow_percent, kpis.mom_percent
    );
    let _ = write!(
        message,
        "\nSavings ready: {} across {} underutilized and {} orphaned resources",
        kpis.savings_ready_usd, kpis.underutilized_count, kpis.orphans_count
    );
    for product in &summary.top_products {
        let _ = write!(
            message,
            "\n  {:<24} {} ({}%)",
            product.name, product.cost_usd, product.percent_of_total
        );
    }
    Ok(Out::new(message, summary))
}
