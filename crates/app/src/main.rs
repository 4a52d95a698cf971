use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use finrep_core::{
    analyze_folder_best_effort, extract, AnalysisKind, AnalysisOrchestrator, AnalysisResult,
    Configuration, ExtractionCache, GroqClient, ProgressObserver, ReaderKind, TruncationStrategy,
};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "finrep", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// API key for the completion provider.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI-compatible API base URL.
    #[arg(long, default_value = "https://api.groq.com/openai/v1/")]
    api_base: String,

    /// Model identifier.
    #[arg(long, default_value = "openai/gpt-oss-20b")]
    model: String,

    /// Sampling temperature.
    #[arg(long, default_value = "0.2")]
    temperature: f32,

    /// Completion token cap per call.
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Page budget for extraction.
    #[arg(long)]
    max_pages: Option<usize>,

    /// Character budget enforced by truncation.
    #[arg(long, default_value = "40000")]
    max_chars: usize,

    /// How oversized documents are bounded.
    #[arg(long, value_enum, default_value = "head-tail")]
    truncation: TruncationArg,

    /// Words per model-call chunk.
    #[arg(long, default_value = "3000")]
    chunk_words: usize,

    /// Per-call timeout in seconds.
    #[arg(long, default_value = "120")]
    timeout_secs: u64,

    /// Extraction-cache time-to-live in seconds.
    #[arg(long, default_value = "900")]
    cache_ttl_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a single financial-report PDF.
    Analyze {
        /// Path to the PDF.
        #[arg(long)]
        file: String,
        /// Analysis to run.
        #[arg(long, value_enum, default_value = "summary")]
        kind: KindArg,
    },
    /// Analyze every PDF under a folder, best effort.
    Batch {
        /// Folder searched recursively for PDFs.
        #[arg(long)]
        folder: String,
        /// Analysis to run per file.
        #[arg(long, value_enum, default_value = "summary")]
        kind: KindArg,
    },
    /// Extract and print the text that analysis would see, with provenance.
    Extract {
        /// Path to the PDF.
        #[arg(long)]
        file: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Summary,
    Metrics,
    Risks,
}

impl From<KindArg> for AnalysisKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Summary => AnalysisKind::Summary,
            KindArg::Metrics => AnalysisKind::Metrics,
            KindArg::Risks => AnalysisKind::Risks,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TruncationArg {
    HardCutoff,
    HeadTail,
}

impl From<TruncationArg> for TruncationStrategy {
    fn from(value: TruncationArg) -> Self {
        match value {
            TruncationArg::HardCutoff => TruncationStrategy::HardCutoff,
            TruncationArg::HeadTail => TruncationStrategy::HeadTail,
        }
    }
}

struct LogProgress;

impl ProgressObserver for LogProgress {
    fn chunk_completed(&self, completed: usize, total: usize) {
        info!(completed, total, "chunk analyzed");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Configuration {
        max_pages: cli.max_pages,
        max_chars: cli.max_chars,
        truncation: cli.truncation.into(),
        chunk_word_count: cli.chunk_words,
        model: cli.model.clone(),
        temperature: cli.temperature,
        max_tokens: cli.max_tokens,
    };

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        model = %config.model,
        "finrep boot"
    );

    match cli.command {
        Command::Analyze { ref file, kind } => {
            let orchestrator = build_orchestrator(&cli)?;
            let data = tokio::fs::read(file).await?;
            let cache = ExtractionCache::new(Duration::from_secs(cli.cache_ttl_secs));

            let result = finrep_core::run(
                &data,
                kind.into(),
                &config,
                &orchestrator,
                Some(&cache),
                &LogProgress,
            )
            .await
            .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            render_result(file, &result);
        }
        Command::Batch { ref folder, kind } => {
            let orchestrator = build_orchestrator(&cli)?;
            let cache = ExtractionCache::new(Duration::from_secs(cli.cache_ttl_secs));

            let report = analyze_folder_best_effort(
                std::path::Path::new(folder),
                kind.into(),
                &config,
                &orchestrator,
                Some(&cache),
                &LogProgress,
            )
            .await
            .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            if !report.skipped.is_empty() {
                warn!(skipped = report.skipped.len(), folder = %folder, "some files were skipped");
                for skipped in &report.skipped {
                    warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
                }
            }

            for analysis in &report.analyzed {
                println!("==== {} ====", analysis.path.display());
                render_result(&analysis.path.display().to_string(), &analysis.result);
            }

            println!(
                "{} analyzed, {} skipped at {}",
                report.analyzed.len(),
                report.skipped.len(),
                Utc::now().to_rfc3339()
            );
        }
        Command::Extract { ref file } => {
            let data = tokio::fs::read(file).await?;
            let extracted = extract(&data, &config.extract_options())
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!(
                "reader={} pages_consulted={} truncated={}",
                reader_name(extracted.reader),
                extracted.pages_consulted,
                extracted.truncated
            );
            println!("{}", extracted.text);
        }
    }

    Ok(())
}

fn build_orchestrator(cli: &Cli) -> anyhow::Result<AnalysisOrchestrator<GroqClient>> {
    let api_key = cli
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("an API key is required (--api-key or GROQ_API_KEY)"))?;

    let client = GroqClient::with_base(
        &cli.api_base,
        api_key,
        Duration::from_secs(cli.timeout_secs),
    )
    .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    Ok(AnalysisOrchestrator::new(client))
}

fn reader_name(reader: ReaderKind) -> &'static str {
    match reader {
        ReaderKind::Primary => "primary",
        ReaderKind::Fallback => "fallback",
    }
}

fn render_result(source: &str, result: &AnalysisResult) {
    if result.outcome.failed_chunks > 0 {
        warn!(
            failed = result.outcome.failed_chunks,
            total = result.outcome.chunk_count,
            source,
            "some chunks failed; their errors appear in the output"
        );
    }
    if let Some(reason) = &result.outcome.reduce_error {
        warn!(reason = %reason, "merge call failed; showing per-chunk outputs");
    }
    if result.input_truncated {
        info!(source, "input was truncated to fit the analysis budget");
    }

    match &result.table {
        Some(table) => {
            println!("Metric,Current Period,Previous Period,Change");
            for row in &table.rows {
                println!("{},{},{},{}", row.metric, row.current, row.previous, row.change);
            }
        }
        None => {
            if result.outcome.kind == AnalysisKind::Metrics {
                warn!(source, "metrics output did not parse as a table; showing raw text");
            }
            println!("{}", result.outcome.text);
        }
    }
}
