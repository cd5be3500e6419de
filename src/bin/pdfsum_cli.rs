//! Command-line summarizer for local PDFs.
//!
//! `summarize` prints the summary of one file; `batch` walks a directory for `*.pdf` files and
//! summarizes each one, reporting failures per document without stopping the run.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use pdfsum::{
    config::{self, ChunkMode, SummarizationProvider},
    document::Document,
    logging,
    processing::{SummaryOptions, SummaryService},
};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "pdfsum", about = "Summarize PDF files from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a single PDF.
    Summarize {
        file: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Summarize every PDF under a directory.
    Batch {
        dir: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Args)]
struct Overrides {
    /// Sentences kept by the extractive summarizer.
    #[arg(long)]
    sentences: Option<usize>,
    /// Segmentation mode: full, per_page, or semantic.
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ChunkMode>,
    /// Summarization provider override.
    #[arg(long, value_parser = parse_provider)]
    provider: Option<SummarizationProvider>,
}

fn parse_mode(raw: &str) -> Result<ChunkMode, String> {
    raw.parse()
        .map_err(|_| format!("unknown mode '{raw}' (expected full|per_page|semantic)"))
}

fn parse_provider(raw: &str) -> Result<SummarizationProvider, String> {
    raw.parse().map_err(|_| {
        format!("unknown provider '{raw}' (expected extractive|ollama|openai|gemini|vertex)")
    })
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(logging::LogTarget::StderrAndFile);

    match cli.command {
        Command::Summarize { file, overrides } => {
            let service = build_service(&overrides)?;
            let summary = summarize_file(&service, &file, options(&overrides)).await?;
            println!("{summary}");
            Ok(())
        }
        Command::Batch { dir, overrides } => {
            let service = build_service(&overrides)?;
            run_batch(&service, &dir, &overrides).await
        }
    }
}

fn build_service(overrides: &Overrides) -> Result<SummaryService> {
    let mut config = config::load().context("invalid configuration")?;
    if let Some(provider) = overrides.provider {
        config.summarization_provider = provider;
        config.validate().context("invalid provider override")?;
    }
    SummaryService::from_config(Arc::new(config)).context("failed to initialize the summarizer")
}

fn options(overrides: &Overrides) -> SummaryOptions {
    SummaryOptions {
        mode: overrides.mode,
        sentences: overrides.sentences,
        force: false,
    }
}

async fn summarize_file(
    service: &SummaryService,
    path: &Path,
    options: SummaryOptions,
) -> Result<String> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} does not name a file", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    match service
        .summarize_upload(Document::new(filename, bytes), options)
        .await
    {
        Ok(outcome) => Ok(outcome.summary),
        Err(error) => bail!(error.user_message()),
    }
}

async fn run_batch(service: &SummaryService, dir: &Path, overrides: &Overrides) -> Result<()> {
    let files = collect_pdfs(dir)?;
    if files.is_empty() {
        println!("No PDF files found under {}", dir.display());
        return Ok(());
    }

    let mut failures = 0usize;
    for path in &files {
        println!("== {} ==", path.display());
        match summarize_file(service, path, options(overrides)).await {
            Ok(summary) => println!("{summary}\n"),
            Err(err) => {
                failures += 1;
                tracing::warn!(path = %path.display(), error = %err, "Batch summary failed");
                println!("{err}\n");
            }
        }
    }

    println!(
        "Summarized {} of {} PDF files",
        files.len() - failures,
        files.len()
    );
    Ok(())
}

fn collect_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}
