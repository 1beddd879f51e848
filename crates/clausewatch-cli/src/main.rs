use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use clausewatch_ai::groq::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use clausewatch_ai::pipeline::QUOTA_HINT;
use clausewatch_ai::{GroqClient, GroqConfig, PipelineConfig, RiskPipeline};
use clausewatch_core::{AnalysisResponse, ErrorResponse};
use clausewatch_store::{DuckStore, NewReport, ReportStore};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

mod display;
mod extract;

/// Scan financial documents for risky clauses.
#[derive(Parser)]
#[command(name = "clausewatch", version)]
struct Cli {
    #[command(flatten)]
    reasoning: ReasoningArgs,

    /// DuckDB file holding saved reports.
    #[arg(long, env = "CLAUSEWATCH_DB", default_value = "clausewatch.duckdb")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ReasoningArgs {
    /// Groq API key. Without it analysis is rule-only.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: Option<String>,

    #[arg(long, env = "GROQ_BASE_URL", default_value = DEFAULT_BASE_URL)]
    groq_base_url: String,

    #[arg(long, env = "GROQ_MODEL", default_value = DEFAULT_MODEL)]
    groq_model: String,

    /// Per-request timeout for the reasoning service.
    #[arg(long, env = "CLAUSEWATCH_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Maximum clauses analysed at once (unbounded when unset).
    #[arg(long, env = "CLAUSEWATCH_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,
}

impl ReasoningArgs {
    fn groq_config(&self) -> GroqConfig {
        GroqConfig {
            api_key: self.groq_api_key.clone(),
            base_url: self.groq_base_url.clone(),
            model: self.groq_model.clone(),
            timeout_secs: self.timeout_secs,
            ..GroqConfig::default()
        }
    }
}

#[derive(Args)]
struct InputArgs {
    /// Document to analyse (.txt, .md, .pdf, or an image).
    #[arg(long, short, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Text to analyse. Read from stdin when neither --file nor --text is given.
    #[arg(long, short)]
    text: Option<String>,

    /// Print the JSON response instead of cards.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Detect risky clauses, explained by the reasoning service when configured.
    Scan {
        #[command(flatten)]
        input: InputArgs,

        /// Skip the reasoning service and use rule-based analysis only.
        #[arg(long)]
        rules_only: bool,

        /// Save the result to this user's history.
        #[arg(long, value_name = "USER")]
        save: Option<String>,

        #[arg(long, requires = "save")]
        title: Option<String>,
    },
    /// Whole-document risk summary in a single model call.
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },
    /// List a user's saved reports, newest first.
    History {
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Show one saved report.
    Show {
        user: String,
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Check the reasoning service connection.
    Ping,
}

impl Command {
    fn json(&self) -> bool {
        match self {
            Self::Scan { input, .. } | Self::Summary { input } => input.json,
            Self::History { json, .. } | Self::Show { json, .. } => *json,
            Self::Ping => false,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if let Err(error) = init_tracing() {
        eprintln!("clausewatch: {error:#}");
    }

    let json = cli.command.json();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if json {
                let body = ErrorResponse::new(format!("{error:#}"));
                println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
            } else {
                eprintln!("clausewatch error: {error:#}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so `--json` output stays clean.
fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("clausewatch v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Scan {
            input,
            rules_only,
            save,
            title,
        } => {
            let text = read_input(&input).await?;
            let pipeline = if rules_only {
                RiskPipeline::rule_only()
            } else {
                build_pipeline(&cli.reasoning)
            };
            let response = pipeline.analyze(&text).await;

            if let Some(user_id) = save {
                let store = DuckStore::open_persistent(&cli.db)
                    .with_context(|| format!("failed to open {}", cli.db.display()))?;
                let mut report = NewReport::new(response.clone());
                if let Some(title) = title {
                    report = report.with_title(title);
                }
                let id = store.save_report(&user_id, &report).await?;
                eprintln!("Saved report {id} for {user_id}");
            }
            emit(&response, input.json)
        }
        Command::Summary { input } => {
            let text = read_input(&input).await?;
            let pipeline = build_pipeline(&cli.reasoning);
            let response = pipeline.summarize(&text).await.map_err(|e| {
                if e.is_quota() {
                    anyhow::anyhow!(QUOTA_HINT)
                } else {
                    anyhow::Error::new(e).context("document summary failed")
                }
            })?;
            emit(&response, input.json)
        }
        Command::History { user, json } => {
            let store = DuckStore::open_persistent(&cli.db)?;
            let reports = store.list_reports(&user).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                display::print_history(&user, &reports);
            }
            Ok(())
        }
        Command::Show { user, id, json } => {
            let store = DuckStore::open_persistent(&cli.db)?;
            let report = store.get_report(&user, &id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                display::print_report(&report);
            }
            Ok(())
        }
        Command::Ping => {
            let client = GroqClient::new(cli.reasoning.groq_config())
                .context("GROQ_API_KEY must be set to reach the reasoning service")?;
            let reply = client.ping().await.map_err(|e| {
                if e.is_quota() {
                    anyhow::anyhow!(QUOTA_HINT)
                } else {
                    anyhow::Error::new(e)
                }
            })?;
            println!("Groq connected ({}): {}", client.model(), reply.trim());
            Ok(())
        }
    }
}

/// Per-clause reasoning when a key is configured, rule-only otherwise.
fn build_pipeline(args: &ReasoningArgs) -> RiskPipeline {
    let config = args.groq_config();
    if !config.is_configured() {
        info!("GROQ_API_KEY not set, using rule-based analysis");
        return RiskPipeline::rule_only();
    }
    match GroqClient::new(config) {
        Ok(client) => RiskPipeline::with_reasoner(Arc::new(client)).with_config(PipelineConfig {
            max_concurrency: args.max_concurrency,
        }),
        Err(e) => {
            warn!(error = %e, "reasoning service unavailable, using rule-based analysis");
            RiskPipeline::rule_only()
        }
    }
}

async fn read_input(input: &InputArgs) -> anyhow::Result<String> {
    let text = if let Some(path) = &input.file {
        extract::extract_text(path).await?
    } else if let Some(text) = &input.text {
        text.clone()
    } else {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read stdin")?;
        buf
    };

    if text.trim().is_empty() {
        bail!("No file or text provided.");
    }
    Ok(text)
}

fn emit(response: &AnalysisResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        display::print_response(response);
    }
    Ok(())
}
