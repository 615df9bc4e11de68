use crate::api::Mode;
use crate::commands::Out;
use crate::{server, Config, Result};

/// Runs the HTTP API server until the process is stopped.
pub async fn serve(config: Config, mode: Mode) -> Result<Out<()>> {
    server::run(&config, mode).await?;
    Ok("Server stopped".into())
}
