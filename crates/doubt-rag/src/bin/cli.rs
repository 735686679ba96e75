//! doubt-rag command line
//!
//! Run with: cargo run -p doubt-rag --features cli --bin doubt-rag -- ask "what is osmosis?"

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use doubt_rag::{
    config::RagConfig,
    generation::AnswerGenerator,
    ingestion::{FileReader, IngestPipeline, TextChunker},
    providers::build_providers,
    retrieval::Retriever,
    server::RagServer,
    BotMode, Document,
};

/// Study assistant: ask questions, optionally grounded on your documents
#[derive(Parser)]
#[command(name = "doubt-rag")]
#[command(version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,

    /// Answer one question
    Ask {
        /// The question
        question: String,

        /// Persona: normal, career, math
        #[arg(short, long, default_value = "normal")]
        mode: String,

        /// Files or directories to answer from
        #[arg(short, long, num_args = 1..)]
        docs: Vec<PathBuf>,

        /// Number of excerpts to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Print the plain text extracted from a file
    Extract {
        /// File to read
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doubt_rag=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let config = RagConfig::load(cli.config.as_deref())?;
            RagServer::new(config).await?.start().await?;
        }
        Command::Ask {
            question,
            mode,
            docs,
            top_k,
        } => {
            let config = RagConfig::load(cli.config.as_deref())?;
            ask(&config, &question, BotMode::from_tag(&mode), &docs, top_k).await?;
        }
        Command::Extract { file } => {
            let extracted = FileReader::new().read_path(&file)?;
            eprintln!("{} ({})", extracted.filename, extracted.mime);
            println!("{}", extracted.text);
        }
    }

    Ok(())
}

async fn ask(
    config: &RagConfig,
    question: &str,
    mode: BotMode,
    paths: &[PathBuf],
    top_k: Option<usize>,
) -> anyhow::Result<()> {
    let (embedder, llm) = build_providers(config)?;
    let generator = AnswerGenerator::new(llm);

    let answer = if paths.is_empty() {
        generator.answer(question, mode, None).await?
    } else {
        let documents = collect_documents(paths)?;
        let pipeline = IngestPipeline::new(
            FileReader::new(),
            TextChunker::from_config(&config.chunking)?,
            embedder.clone(),
        );

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!("Reading and embedding {} file(s)", documents.len()));

        let outcome = pipeline.build_index(&documents).await?;
        spinner.finish_with_message(format!(
            "Indexed {} chunks from {} file(s)",
            outcome.index.len(),
            outcome.documents.len()
        ));

        for failure in &outcome.failures {
            eprintln!("skipped {}: {}", failure.filename, failure.error);
        }

        let k = top_k
            .unwrap_or(config.retrieval.top_k)
            .clamp(1, config.retrieval.max_top_k.max(1));
        let context = Retriever::new(embedder)
            .retrieve(&outcome.index, question, k)
            .await?;
        generator
            .answer(question, mode, Some(context.as_slice()))
            .await?
    };

    println!("{}", answer.text);
    if !answer.citations.is_empty() {
        println!("\nSources:");
        for (i, citation) in answer.citations.iter().enumerate() {
            println!("  [{}] {}", i + 1, citation.format_inline());
        }
    }
    Ok(())
}

/// Files named directly plus every file below named directories
fn collect_documents(paths: &[PathBuf]) -> anyhow::Result<Vec<Document>> {
    let mut documents = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() {
                    documents.push(load(entry.path())?);
                }
            }
        } else {
            documents.push(load(path)?);
        }
    }
    Ok(documents)
}

fn load(path: &Path) -> anyhow::Result<Document> {
    let data = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Document::new(filename, data))
}
