use crate::api::{self, Mode};
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::bail;
use serde_json::Value;

/// Shows everything known about one resource: its inventory record, recent
/// costs, utilization and findings.
pub async fn resource(config: &Config, mode: Mode, id: &str) -> Result<Out<Value>> {
    let source = api::source(config, mode)?;
    let Some(detail) = api::resource_detail(source.as_ref(), id).await? else {
        bail!("No resource with id '{id}'");
    };
    let rendered = serde_json::to_string_pretty(&detail)?;
    Ok(Out::new(rendered, detail))
}
