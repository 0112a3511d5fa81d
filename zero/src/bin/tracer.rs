use anyhow::{Context, Result};
use clap::Parser;
use evm_tracer::ZkTracer;
use tracing::info;
use zero_tracer::env::load_dotenvy_vars_if_present;
use zero_tracer::fs::read_conflation;

use self::tracer::*;
mod tracer {
    pub mod cli;
}

fn main() -> Result<()> {
    load_dotenvy_vars_if_present();
    zero_tracer::tracing::init();

    let args = cli::Cli::parse();
    let mut tracer = ZkTracer::new(args.tracer_config());

    match args.command {
        cli::Command::Trace { input, output_dir } => {
            let conflation = read_conflation(&input)?;
            tracer
                .replay(&conflation)
                .context("failed to replay the conflation")?;
            let line_counts = tracer
                .write_to(&output_dir)
                .with_context(|| format!("failed to write traces to {}", output_dir.display()))?;
            info!(
                "wrote {} rows in {} modules to {}",
                line_counts.values().sum::<usize>(),
                line_counts.len(),
                output_dir.display()
            );
        }
        cli::Command::Count { input } => {
            let conflation = read_conflation(&input)?;
            tracer
                .replay(&conflation)
                .context("failed to replay the conflation")?;
            println!("{}", serde_json::to_string_pretty(&tracer.line_counts())?);
        }
    }
    Ok(())
}
