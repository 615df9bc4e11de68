//! Aggregations over daily cost data: cost-by-service rollups, KPI numbers
//! and the dashboard summary response.

use crate::model::{CostRow, DailyCost, Finding, FindingKind, Kpis, ProductCost, Summary, Usd, Window};
use crate::seed::display_name;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// How many products the summary's breakdown carries.
const TOP_PRODUCTS: usize = 10;
/// How many findings the summary's recent list carries.
const RECENT_FINDINGS: usize = 10;

/// Sums daily costs per product over the trailing `window`, producing one
/// `CostRow` per service sorted by spend descending.
pub fn costs_by_service(daily: &[DailyCost], window: Window, today: NaiveDate) -> Vec<CostRow> {
    let start = today - Duration::days(i64::from(window.days()));
    let mut totals: BTreeMap<&str, Usd> = BTreeMap::new();
    for cost in daily.iter().filter(|c| c.date >= start) {
        *totals.entry(cost.product.as_str()).or_insert(Usd::ZERO) += cost.amount_usd;
    }
    let mut rows: Vec<CostRow> = totals
        .into_iter()
        .map(|(service, amount)| CostRow::new(service, display_name(service), amount))
        .collect();
    rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.service.cmp(&b.service)));
    rows
}

/// Total spend over the trailing `days` ending at `today`, optionally offset
/// back by a whole period (offset 0 is the current period, 1 the one before).
fn period_total(daily: &[DailyCost], days: i64, offset: i64, today: NaiveDate) -> Usd {
    let end = today - Duration::days(days * offset);
    let start = end - Duration::days(days);
    daily
        .iter()
        .filter(|c| c.date >= start && c.date < end)
        .map(|c| c.amount_usd)
        .sum()
}

/// Signed percentage change from `prior` to `recent`; zero when there is no
/// prior spend to compare against.
pub fn percent_change(recent: Usd, prior: Usd) -> Decimal {
    if !prior.is_positive() {
        return Decimal::ZERO;
    }
    (((recent - prior).value() / prior.value()) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Attaches each row's share of total spend, producing the per-product
/// breakdown rows. `rows` is expected sorted by spend descending.
pub fn product_breakdown(rows: Vec<CostRow>, window: Window) -> Vec<ProductCost> {
    let total: Usd = rows.iter().map(|r| r.amount).sum();
    rows.into_iter()
        .map(|row| {
            let percent_of_total = if total.is_positive() {
                ((row.amount.value() / total.value()) * Decimal::ONE_HUNDRED).round_dp(2)
            } else {
                Decimal::ZERO
            };
            ProductCost {
                service: row.service,
                name: row.name,
                window,
                cost_usd: row.amount.rounded(),
                percent_of_total,
            }
        })
        .collect()
}

/// Builds the dashboard summary: KPIs, the top-product breakdown and the most
/// significant findings. `findings` is expected ranked by savings descending.
pub fn build(
    window: Window,
    daily: &[DailyCost],
    findings: &[Finding],
    today: NaiveDate,
) -> Summary {
    let rows = costs_by_service(daily, window, today);
    let total: Usd = rows.iter().map(|r| r.amount).sum();

    let wow_percent = percent_change(
        period_total(daily, 7, 0, today),
        period_total(daily, 7, 1, today),
    );
    let mom_percent = percent_change(
        period_total(daily, 30, 0, today),
        period_total(daily, 30, 1, today),
    );

    let savings_ready_usd: Usd = findings.iter().map(|f| f.monthly_savings_usd_est).sum();
    let underutilized_count = findings
        .iter()
        .filter(|f| f.kind == FindingKind::Underutilized)
        .count();
    let orphans_count = findings
        .iter()
        .filter(|f| f.kind == FindingKind::Orphan)
        .count();

    let mut top_products = product_breakdown(rows, window);
    top_products.truncate(TOP_PRODUCTS);

    Summary {
        window,
        kpis: Kpis {
            total_cost_usd: total.rounded(),
            wow_percent,
            mom_percent,
            savings_ready_usd: savings_ready_usd.rounded(),
            underutilized_count,
            orphans_count,
        },
        top_products,
        recent_findings: findings.iter().take(RECENT_FINDINGS).cloned().collect(),
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 27).unwrap()
    }

    fn daily(product: &str, days_ago: i64, amount: i64) -> DailyCost {
        DailyCost {
            account: "123456789012".to_string(),
            product: product.to_string(),
            resource_id: None,
            date: today() - Duration::days(days_ago),
            amount_usd: Usd::from(amount),
        }
    }

    #[test]
    fn test_costs_by_service_sums_window_only() {
        let daily = vec![
            daily("EC2-Instance", 1, 100),
            daily("EC2-Instance", 2, 50),
            daily("EC2-Instance", 40, 999), // outside the 30d window
            daily("S3", 3, 10),
        ];
        let rows = costs_by_service(&daily, Window::default(), today());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].service, "EC2-Instance");
        assert_eq!(rows[0].name, "Compute (EC2)");
        assert_eq!(rows[0].amount, Usd::from(150));
        assert_eq!(rows[1].amount, Usd::from(10));
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(Usd::from(110), Usd::from(100)), Decimal::from(10));
        assert_eq!(percent_change(Usd::from(90), Usd::from(100)), Decimal::from(-10));
        assert_eq!(percent_change(Usd::from(50), Usd::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_build_summary_kpis() {
        // Two weeks of flat spend, then the recent week doubles.
        let mut costs = Vec::new();
        for d in 1..=7 {
            costs.push(daily("EC2-Instance", d, 200));
        }
        for d in 8..=14 {
            costs.push(daily("EC2-Instance", d, 100));
        }
        let findings = vec![
            Finding::new(FindingKind::Underutilized, "a", Severity::High, Usd::from(300)),
            Finding::new(FindingKind::Orphan, "b", Severity::Medium, Usd::from(10)),
        ];
        let summary = build(Window::default(), &costs, &findings, today());

        assert_eq!(summary.kpis.total_cost_usd, Usd::from(2100));
        assert_eq!(summary.kpis.wow_percent, Decimal::from(100));
        assert_eq!(summary.kpis.savings_ready_usd, Usd::from(310));
        assert_eq!(summary.kpis.underutilized_count, 1);
        assert_eq!(summary.kpis.orphans_count, 1);
        assert_eq!(summary.top_products.len(), 1);
        assert_eq!(summary.top_products[0].percent_of_total, Decimal::from(100));
        assert_eq!(summary.recent_findings.len(), 2);
    }
}
