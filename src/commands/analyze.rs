use crate::api::{self, Mode};
use crate::commands::Out;
use crate::model::Finding;
use crate::{report, utils, Config, Result};
use std::path::Path;

/// Runs the full findings analysis. When `out` is given the Markdown report
/// is written there, otherwise a per-finding summary goes to the log. With
/// `csv` the findings are also written as a spreadsheet-friendly CSV.
pub async fn analyze(
    config: &Config,
    mode: Mode,
    out: Option<&Path>,
    csv: Option<&Path>,
) -> Result<Out<Vec<Finding>>> {
    let source = api::source(config, mode)?;
    let window = config.default_window();

    let findings = api::findings(source.as_ref()).await?;
    if let Some(csv_path) = csv {
        report::write_findings_csv(&findings, csv_path).await?;
    }

    let message = if let Some(out_path) = out {
        let summary = api::build_summary(source.as_ref(), window).await?;
        let movers = api::top_movers(source.as_ref(), window, config.mover_limit()).await?;
        let markdown = report::markdown(&summary, &movers, &findings);
        utils::write(out_path, markdown).await?;
        format!(
            "Found {} findings, report written to '{}'",
            findings.len(),
            out_path.display()
        )
    } else {
        let mut message = format!("Found {} findings:", findings.len());
        for finding in &findings {
            message.push_str(&format!(
                "\n  [{}] {} ({}/mo)",
                finding.severity, finding.title, finding.monthly_savings_usd_est
            ));
        }
        message
    };
    Ok(Out::new(message, findings))
}
