use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use crossbeam_channel::bounded;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sieve::config::PlanConfig;
use sieve::convert::ConverterRegistry;
use sieve::{JsonRecord, LogicalNode, Plan, Record};

use crate::utils::{ProgressCounter, unique_labels};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Plan configuration file (YAML)
    #[arg(short, long)]
    pub plan: PathBuf,

    /// Search expression, e.g. 'status:open AND age:18-30'
    #[arg(short, long, required_unless_present = "print_plan")]
    pub expr: Option<String>,

    /// Input JSON-lines file ('-' for stdin)
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Print the matching fields of each record instead of the record
    #[arg(long)]
    pub explain: bool,

    /// Number of threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Records evaluated per parallel batch
    #[arg(long, default_value_t = 4096)]
    pub batch_size: usize,

    /// Report the number of records read on stderr
    #[arg(long)]
    pub progress: bool,

    /// Print the effective plan as YAML and exit
    #[arg(long)]
    pub print_plan: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn load_plan(path: &Path) -> Result<Plan> {
    let config = PlanConfig::load(path)
        .with_context(|| format!("Plan: Failed to load {}", path.display()))?;
    let registry = Arc::new(ConverterRegistry::with_defaults());
    Plan::from_config(&config, registry)
        .with_context(|| format!("Plan: invalid plan in {}", path.display()))
}

pub fn render_plan(plan: &Plan) -> Result<String> {
    serde_yaml::to_string(&plan.to_config()).context("Plan: Failed to serialize plan")
}

pub fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = File::open(path)
        .with_context(|| format!("CLI: Failed to open input {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Output line for one input line, if it matches. Blank lines are skipped.
pub fn evaluate_line(
    tree: &LogicalNode,
    number: u64,
    line: &str,
    explain: bool,
) -> Result<Option<String>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(line)
        .with_context(|| format!("Filter: invalid JSON on line {}", number))?;
    let Some(record) = JsonRecord::from_value(&value) else {
        bail!("Filter: line {} is not a JSON object", number);
    };
    evaluate_record(tree, number, &record, line, explain)
}

fn evaluate_record<R: Record>(
    tree: &LogicalNode,
    number: u64,
    record: &R,
    line: &str,
    explain: bool,
) -> Result<Option<String>> {
    let matched = tree
        .matches(record)
        .with_context(|| format!("Filter: Failed to evaluate line {}", number))?;
    if !matched {
        return Ok(None);
    }
    if !explain {
        return Ok(Some(line.to_string()));
    }

    let scopes = tree
        .matching_fields(record)
        .with_context(|| format!("Filter: Failed to explain line {}", number))?;
    let fields = unique_labels(scopes.iter().map(|scope| scope.label()));
    Ok(Some(
        serde_json::json!({ "line": number, "fields": fields }).to_string(),
    ))
}

/// Filter every input line through the tree, writing matches in input order.
/// Returns the number of matching records.
pub fn run_filter(
    input: Box<dyn BufRead + Send>,
    tree: Arc<LogicalNode>,
    batch_size: usize,
    explain: bool,
    progress: bool,
) -> Result<u64> {
    let (tx, rx) = bounded::<Vec<String>>(16);
    let progress = progress.then(|| Arc::new(ProgressCounter::new("Records", 10_000)));

    let writer = std::thread::spawn(move || -> Result<u64> {
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let mut match_count = 0u64;
        for batch in rx {
            for line in batch {
                writeln!(out, "{}", line).context("Output: Failed to write record")?;
                match_count += 1;
            }
        }
        out.flush().context("Output: Failed to flush output")?;
        Ok(match_count)
    });

    let batch_size = batch_size.max(1);
    let read_result = (|| -> Result<()> {
        let mut lines = input.lines();
        let mut number = 0u64;
        loop {
            let mut batch = Vec::with_capacity(batch_size);
            for line in lines.by_ref().take(batch_size) {
                number += 1;
                let line = line.with_context(|| format!("CLI: Failed to read line {}", number))?;
                batch.push((number, line));
            }
            if batch.is_empty() {
                return Ok(());
            }

            let matches = batch
                .par_iter()
                .map(|(number, line)| evaluate_line(&tree, *number, line, explain))
                .collect::<Result<Vec<_>>>()?;
            if let Some(progress) = &progress {
                progress.inc(batch.len() as u64);
            }

            let matches: Vec<String> = matches.into_iter().flatten().collect();
            if !matches.is_empty() {
                tx.send(matches)
                    .map_err(|err| anyhow!("Filter: Failed to send matches: {}", err))?;
            }
        }
    })();

    drop(tx);

    // The writer's error is the root cause when the channel disconnected
    let match_count = match writer.join() {
        Ok(Ok(count)) => count,
        Ok(Err(writer_err)) => {
            return if read_result.is_err() {
                Err(writer_err.context("Output: Writer thread failed (caused channel disconnect)"))
            } else {
                Err(writer_err)
            };
        }
        Err(panic_payload) => {
            let panic_msg = panic_payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            return Err(anyhow!("Output: Writer thread panicked: {}", panic_msg));
        }
    };

    read_result?;

    if let Some(progress) = &progress {
        progress.finish();
    }
    Ok(match_count)
}
