mod app;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use app::{Cli, load_plan, open_input, render_plan, run_filter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("CLI: Failed to initialize thread pool")?;
    }

    let plan = load_plan(&cli.plan)?;
    tracing::info!("Plan: {} fields", plan.fields().len());

    if cli.print_plan {
        print!("{}", render_plan(&plan)?);
        if cli.expr.is_none() {
            return Ok(());
        }
    }

    let expr = cli.expr.as_deref().context("CLI: --expr is required")?;
    let tree = Arc::new(
        sieve::parse_expression(&plan, expr)
            .with_context(|| format!("Filter: Failed to parse '{}'", expr))?,
    );

    let input = open_input(&cli.input)?;
    let start = std::time::Instant::now();
    let match_count = run_filter(input, tree, cli.batch_size, cli.explain, cli.progress)?;

    let elapsed = start.elapsed();
    tracing::info!(
        "Done! Matched {} records in {:.2}s",
        match_count,
        elapsed.as_secs_f64()
    );

    Ok(())
}
