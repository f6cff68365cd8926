// src/main.rs
mod answering;
mod completion;
mod config;
mod document;
mod extractors;
mod questions;
mod server;
mod storage;
mod utils;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use answering::QuestionAnswerer;
use completion::GeminiClient;
use config::AppConfig;
use document::{converter_for, Document};
use extractors::{outcome_text, SectionExtractor, SectionNumber};
use questions::QuestionCatalog;
use utils::AppError;

/// Section extraction and question answering over reference filings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the text of one or more numbered sections
    Extract {
        /// PDF or page-tagged text file
        #[arg(short, long)]
        file: PathBuf,

        /// Section number such as 7.1 (repeatable)
        #[arg(short, long = "section", required = true)]
        sections: Vec<SectionNumber>,
    },

    /// Answer the question catalog against a document
    Answer {
        #[arg(short, long)]
        file: PathBuf,

        /// Question catalog (defaults to QUESTIONS_PATH)
        #[arg(short, long)]
        questions: Option<PathBuf>,

        /// Write the answers here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the HTTP service
    Serve {
        /// Listen address (defaults to BIND_ADDR)
        #[arg(short, long)]
        bind: Option<std::net::SocketAddr>,

        #[arg(short, long)]
        questions: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Environment and logging (RUST_LOG)
    dotenvy::dotenv().ok();
    utils::logging::setup_logging();

    // 2. Parse CLI arguments and configuration
    let args = Args::parse();
    tracing::debug!("Starting with args: {:?}", args);
    let mut config = AppConfig::from_env()?;

    match args.command {
        Command::Extract { file, sections } => {
            let text = convert(&file).await?;
            let document = Document::split(&text);
            if document.is_empty() {
                return Err(AppError::Config(format!("No text could be read from {}", file.display())));
            }
            tracing::info!("Document has {} pages", document.len());

            let extractor = SectionExtractor::from_config(&config.extraction);
            for section in &sections {
                let outcome = extractor.extract_section(&document, section);
                println!("===== {} =====\n{}\n", section, outcome_text(&outcome));
            }
        }

        Command::Answer { file, questions, output } => {
            let answerer = build_answerer(&config, questions)?;
            let text = convert(&file).await?;

            let answers = answerer
                .run(&text, |current, total| {
                    if current > 0 {
                        tracing::info!("Question {}/{}", current, total);
                    }
                })
                .await?;

            let json = serde_json::to_string_pretty(&answers)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    tracing::info!("Saved {} answers to {}", answers.len(), path.display());
                }
                None => println!("{}", json),
            }
        }

        Command::Serve { bind, questions } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            let answerer = build_answerer(&config, questions)?;
            server::serve(&config, answerer).await?;
        }
    }

    Ok(())
}

fn build_answerer(config: &AppConfig, questions: Option<PathBuf>) -> Result<QuestionAnswerer<GeminiClient>, AppError> {
    let path = questions
        .or_else(|| config.questions_path.clone())
        .ok_or_else(|| AppError::Config("No question catalog given (use --questions or QUESTIONS_PATH)".to_string()))?;

    let catalog = QuestionCatalog::load(&path)?;
    let client = GeminiClient::new(&config.completion)?;
    Ok(QuestionAnswerer::new(SectionExtractor::from_config(&config.extraction), client, Arc::new(catalog)))
}

/// Converts a document to page-tagged text off the async runtime.
async fn convert(path: &Path) -> Result<String, AppError> {
    let path = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || converter_for(&path).convert(&path))
        .await
        .map_err(|e| AppError::Server(format!("Conversion task failed: {}", e)))??;
    Ok(text)
}
