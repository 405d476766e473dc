use anyhow::{Context, Result};
use sales_reports::{
    config::{Config, CONFIG_FILE},
    pipeline,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let base_dir = std::env::current_dir().context("could not resolve working directory")?;
    let config = Config::load(&base_dir)?;
    info!(base_dir = %config.base_dir().display(), "paths resolved against");

    let output = pipeline::clean_export(&config).inspect_err(|err| {
        if err.is_not_found() {
            error!("raw export not found, check the paths in {CONFIG_FILE}");
        }
    })?;
    info!("clean file created: {}", output.display());

    Ok(())
}
