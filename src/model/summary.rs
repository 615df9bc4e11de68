//! The `/api/summary` response shape: KPIs, top products and recent findings.

use crate::model::{Finding, Usd, Window};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Headline numbers for the dashboard KPI cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_cost_usd: Usd,
    /// Trailing week spend vs the week before, as a signed percentage.
    #[serde(with = "rust_decimal::serde::float")]
    pub wow_percent: Decimal,
    /// Trailing 30 days vs the 30 before, as a signed percentage.
    #[serde(with = "rust_decimal::serde::float")]
    pub mom_percent: Decimal,
    /// Sum of estimated monthly savings across all findings.
    pub savings_ready_usd: Usd,
    pub underutilized_count: usize,
    pub orphans_count: usize,
}

/// One entry of the cost-by-service breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCost {
    pub service: String,
    pub name: String,
    pub window: Window,
    pub cost_usd: Usd,
    #[serde(with = "rust_decimal::serde::float")]
    pub percent_of_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub window: Window,
    pub kpis: Kpis,
    pub top_products: Vec<ProductCost>,
    pub recent_findings: Vec<Finding>,
    pub generated_at: DateTime<Utc>,
}
