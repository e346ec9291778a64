use anyhow::Context;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("demex=info")),
        )
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = demex::ExplorerConfig::discover(config_path).context("loading configuration")?;
    tracing::info!(
        "{} panel source(s), {} metadata source(s), {} regions",
        config.panel_sources.len(),
        config.metadata_sources.len(),
        config.regions.len()
    );

    demex::run_gui(config).map_err(|e| anyhow::anyhow!("GUI error: {e}"))
}
