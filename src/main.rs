mod config;
mod data;
mod pipeline;

use anyhow::Result;
use log::info;

use config::CleanConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = CleanConfig::discover(&std::env::current_dir()?)?;
    info!(
        "cleaning {} → {}",
        config.input_path.display(),
        config.output_path.display()
    );

    let report = pipeline::run(&config)?;
    for stage in &report.stages {
        info!(
            "  {:<22} {:>8} → {:>8}",
            stage.stage.name(),
            stage.rows_in,
            stage.rows_out
        );
    }
    Ok(())
}
