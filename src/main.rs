use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

mod logging;

use rubrica_batch::{plan, read_workbook, run_batch, write_results};
use rubrica_cli::{collect_inputs, display_banner, render_batch_progress, render_batch_summary, run_form};
use rubrica_core::{Evaluator, GradingProvider, PromptVariant};
use rubrica_lmstudio::{ChatCompletionClient, LmStudioConfig};

#[derive(Parser)]
#[command(name = "rubrica")]
#[command(about = "Grade student summaries against a rubric with a local language model", long_about = None)]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level or filter directive (overrides --verbose)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Overrides for the values read from the environment
#[derive(Args)]
struct ServerArgs {
    /// Base URL of the chat-completion server
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Model identifier sent with every request
    #[arg(long, global = true)]
    model: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Sampling temperature
    #[arg(long, global = true)]
    temperature: Option<f64>,
}

#[derive(Subcommand)]
enum Command {
    /// Grade one summary typed in or read from files
    Evaluate {
        /// Read the original text from this file instead of stdin
        #[arg(long)]
        source_file: Option<PathBuf>,

        /// Read the student summary from this file instead of stdin
        #[arg(long)]
        submission_file: Option<PathBuf>,

        /// Also print the decoded JSON reply
        #[arg(long)]
        raw: bool,

        /// Output schema requested from the model
        #[arg(long, default_value = "flat")]
        variant: PromptVariant,
    },

    /// Grade every summary in a workbook and write a results workbook
    Batch {
        /// Workbook with the `Textos Base` and `Resúmenes` sheets
        #[arg(short, long, default_value = "resúmenes.xlsx")]
        input: PathBuf,

        /// Results workbook (overwritten)
        #[arg(short, long, default_value = "resultados_evaluacion.xlsx")]
        output: PathBuf,

        /// Requests kept in flight at once
        #[arg(short, long, default_value_t = 1)]
        concurrency: usize,

        /// Output schema requested from the model
        #[arg(long, default_value = "nested")]
        variant: PromptVariant,
    },
}

impl ServerArgs {
    /// Flag value standing in for an environment variable
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "RUBRICA_API_URL" => self.api_url.clone(),
            "RUBRICA_MODEL" => self.model.clone(),
            "RUBRICA_TIMEOUT_SECS" => self.timeout.map(|secs| secs.to_string()),
            "RUBRICA_TEMPERATURE" => self.temperature.map(|t| t.to_string()),
            _ => None,
        }
    }

    /// Flags first, then `env`; nothing is validated yet
    fn load_config(&self, env: impl Fn(&str) -> Option<String>) -> Result<LmStudioConfig> {
        let config = LmStudioConfig::from_lookup(|key| self.lookup(key).or_else(|| env(key)))?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.log_level.as_deref())?;

    let config = cli.server.load_config(|key| std::env::var(key).ok())?;
    let client = ChatCompletionClient::new(config)?;
    display_banner(client.model_id(), client.endpoint().as_str());

    match cli.command {
        Command::Evaluate {
            source_file,
            submission_file,
            raw,
            variant,
        } => {
            let evaluator = Evaluator::new(client, variant);
            let inputs = collect_inputs(source_file.as_deref(), submission_file.as_deref())?;
            run_form(&evaluator, inputs, raw).await;
        }
        Command::Batch {
            input,
            output,
            concurrency,
            variant,
        } => {
            let evaluator = Evaluator::new(client, variant);
            run_batch_command(&evaluator, &input, &output, concurrency).await?;
        }
    }

    Ok(())
}

async fn run_batch_command<P: GradingProvider>(
    evaluator: &Evaluator<P>,
    input: &Path,
    output: &Path,
    concurrency: usize,
) -> Result<()> {
    let workbook = read_workbook(input)
        .with_context(|| format!("could not load submissions from {}", input.display()))?;
    let plan = plan(&workbook);

    println!(
        "{} {} resúmenes para evaluar ({} omitidos)",
        "📄".cyan(),
        plan.jobs.len(),
        plan.skipped.len()
    );

    let report = run_batch(evaluator, plan.jobs, concurrency, |job, outcome| {
        render_batch_progress(&job.author, job.id, outcome);
    })
    .await;

    write_results(output, &report.rows)
        .with_context(|| format!("could not save results to {}", output.display()))?;
    render_batch_summary(&report, &plan.skipped, output);

    Ok(())
}
