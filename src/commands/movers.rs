use crate::api::{self, Mode};
use crate::commands::Out;
use crate::model::{Mover, Window};
use crate::{Config, Result};
use std::fmt::Write as _;

/// Computes the top cost movers over the trailing window and renders them as
/// a table, one line per service.
pub async fn movers(
    config: &Config,
    mode: Mode,
    window: Option<Window>,
    limit: Option<usize>,
) -> Result<Out<Vec<Mover>>> {
    let window = window.unwrap_or_else(|| config.default_window());
    let limit = limit.unwrap_or_else(|| config.mover_limit());
    let source = api::source(config, mode)?;
    let movers = api::top_movers(source.as_ref(), window, limit).await?;

    let mut message = format!("Top {} movers over {}:", movers.len(), window);
    for mover in &movers {
        let _ = write!(
            message,
            "\n  {:<24} {} -> {} ({}, {}%)",
            mover.name, mover.prev_usd, mover.current_usd, mover.delta_usd, mover.delta_pct
        );
    }
    if movers.is_empty() {
        message.push_str("\n  (no cost data)");
    }
    Ok(Out::new(message, movers))
}
