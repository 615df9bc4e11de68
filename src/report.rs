//! Rendering of analysis results as a Markdown report and findings CSV.

use crate::model::{Finding, Mover, Summary};
use crate::{utils, Result};
use anyhow::Context;
use std::fmt::Write as _;
use std::path::Path;

/// Renders the full analysis as a Markdown document: KPIs, the product
/// breakdown, top movers and findings.
pub fn markdown(summary: &Summary, movers: &[Mover], findings: &[Finding]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Cloud Cost Report ({})", summary.window);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated {}",
        summary.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(out);

    let kpis = &summary.kpis;
    let _ = writeln!(out, "## Key Numbers");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Total spend: {}", kpis.total_cost_usd);
    let _ = writeln!(out, "- Week over week: {}%", kpis.wow_percent);
    let _ = writeln!(out, "- Month over month: {}%", kpis.mom_percent);
    let _ = writeln!(out, "- Savings ready: {}", kpis.savings_ready_usd);
    let _ = writeln!(out, "- Underutilized resources: {}", kpis.underutilized_count);
    let _ = writeln!(out, "- Orphaned resources: {}", kpis.orphans_count);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Spend by Product");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Product | Cost | Share |");
    let _ = writeln!(out, "|---|---:|---:|");
    for product in &summary.top_products {
        let _ = writeln!(
            out,
            "| {} | {} | {}% |",
            product.name, product.cost_usd, product.percent_of_total
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Top Movers");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Service | Current | Previous | Delta | Delta % |");
    let _ = writeln!(out, "|---|---:|---:|---:|---:|");
    for mover in movers {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {}% |",
            mover.name, mover.current_usd, mover.prev_usd, mover.delta_usd, mover.delta_pct
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Findings");
    let _ = writeln!(out);
    if findings.is_empty() {
        let _ = writeln!(out, "No findings.");
    }
    for finding in findings {
        let _ = writeln!(
            out,
            "### [{}] {} ({}/mo)",
            finding.severity, finding.title, finding.monthly_savings_usd_est
        );
        let _ = writeln!(out);
        if let Some(resource_id) = &finding.resource_id {
            let _ = writeln!(out, "- Resource: `{resource_id}`");
        }
        if !finding.suggested_action.is_empty() {
            let _ = writeln!(out, "- Suggested action: {}", finding.suggested_action);
        }
        for command in &finding.commands {
            let _ = writeln!(out, "- `{command}`");
        }
        let _ = writeln!(out);
    }
    out
}

/// Writes findings as CSV to `path`. Nested evidence is left out; the CSV
/// carries the flat, spreadsheet-friendly columns.
pub async fn write_findings_csv(findings: &[Finding], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "finding_id",
            "type",
            "severity",
            "resource_id",
            "title",
            "monthly_savings_usd_est",
            "suggested_action",
        ])
        .context("Unable to write the CSV header")?;
    for finding in findings {
        let kind = finding.kind.to_string();
        let severity = finding.severity.to_string();
        let savings = format!("{:.2}", finding.monthly_savings_usd_est.value());
        writer
            .write_record([
                finding.finding_id.as_str(),
                kind.as_str(),
                severity.as_str(),
                finding.resource_id.as_deref().unwrap_or(""),
                finding.title.as_str(),
                savings.as_str(),
                finding.suggested_action.as_str(),
            ])
            .context("Unable to write a CSV record")?;
    }
    let data = writer
        .into_inner()
        .context("Unable to finish writing the CSV data")?;
    utils::write(path, data)
        .await
        .with_context(|| format!("Unable to write findings CSV to '{}'", path.display()))
}
