//! Mia command line: ask single questions, chat, or run the server
//!
//! Run with: cargo run -p mia-rag --bin mia-rag -- chat

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mia_rag::{
    config::RagConfig,
    pipeline::QueryPipeline,
    server::{state::AppState, RagServer},
    types::{ChatMessage, QueryRequest, DEFAULT_LANGUAGE},
};

#[derive(Parser)]
#[command(name = "mia-rag", version)]
#[command(about = "Mia medical RAG assistant", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,

    /// Ask a single question
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Answer language tag ("en" or "fa")
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Interactive session with conversation history (default)
    Chat {
        /// Answer language tag ("en" or "fa")
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}

/// One line typed into the chat loop
#[derive(Debug, PartialEq)]
enum ChatInput {
    Empty,
    Exit,
    Clear,
    Question(String),
}

impl ChatInput {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_lowercase().as_str() {
            "" => Self::Empty,
            "exit" | "quit" | "bye" => Self::Exit,
            "clear" => Self::Clear,
            _ => Self::Question(line.to_string()),
        }
    }

    /// Interpret a `Term::read_line` result
    ///
    /// A failed read ends the session, as does an empty read from piped input,
    /// which keeps returning empty lines once exhausted.
    fn from_read(read: std::io::Result<String>, interactive: bool) -> Self {
        match read {
            Ok(line) => match Self::parse(&line) {
                Self::Empty if !interactive => Self::Exit,
                input => input,
            },
            Err(_) => Self::Exit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RagConfig::load(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if config.llm.api_key.is_none() {
        anyhow::bail!("OPENAI_API_KEY not set. Export it with: export OPENAI_API_KEY='your-api-key-here'");
    }

    match cli.command {
        Some(Commands::Serve) => {
            let server = RagServer::new(config).await;
            println!("Mia RAG server on http://{}", server.address());
            server.start().await?;
        }
        Some(Commands::Ask {
            question,
            language,
            top_k,
        }) => {
            let pipeline = connect(config).await?;
            ask(&pipeline, &question.join(" "), &language, top_k).await?;
        }
        Some(Commands::Chat { language, top_k }) => {
            let pipeline = connect(config).await?;
            chat(&pipeline, &language, top_k).await?;
        }
        None => {
            let pipeline = connect(config).await?;
            chat(&pipeline, DEFAULT_LANGUAGE, None).await?;
        }
    }

    Ok(())
}

async fn connect(config: RagConfig) -> Result<QueryPipeline> {
    let spinner = spinner("Loading vector database...");
    let state = AppState::new(config).await;
    spinner.finish_and_clear();

    Ok(state.pipeline()?)
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

async fn ask(
    pipeline: &QueryPipeline,
    question: &str,
    language: &str,
    top_k: Option<usize>,
) -> Result<()> {
    let mut request = QueryRequest::new(question).with_language(language);
    if let Some(k) = top_k {
        request = request.with_top_k(k);
    }

    let spinner = spinner("Querying OpenAI...");
    let result = pipeline.answer(&request).await;
    spinner.finish_and_clear();
    let response = result?;

    print_answer(&response.answer);

    println!("{}", style("Sources used:").bold());
    for (i, source) in response.sources.iter().enumerate() {
        match source.page {
            Some(page) => println!("  {}. {} (page {})", i + 1, source.file, page),
            None => println!("  {}. {}", i + 1, source.file),
        }
    }

    Ok(())
}

async fn chat(pipeline: &QueryPipeline, language: &str, top_k: Option<usize>) -> Result<()> {
    let term = Term::stdout();
    let rule = "=".repeat(60);

    println!("\n{}", rule);
    println!("{}", style("Mia RAG System - Interactive Mode").bold().cyan());
    println!("{}", rule);
    println!("Type 'exit' or 'quit' to end the session");
    println!("Type 'clear' to clear conversation history");
    println!("{}\n", rule);

    let mut history: Vec<ChatMessage> = Vec::new();

    loop {
        term.write_str(&format!("\n{} ", style("Your question:").green().bold()))?;
        let question = match ChatInput::from_read(term.read_line(), term.is_term()) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                println!("\nGoodbye! Stay safe and healthy.");
                break;
            }
            ChatInput::Clear => {
                history.clear();
                println!("Conversation history cleared");
                continue;
            }
            ChatInput::Question(question) => question,
        };

        // Cached answers are keyed without history, so only the opening turn may use them
        let mut request = QueryRequest::new(question.as_str())
            .with_language(language)
            .with_cache(history.is_empty())
            .with_history(history.clone());
        if let Some(k) = top_k {
            request = request.with_top_k(k);
        }

        let spinner = spinner("Querying OpenAI...");
        let result = pipeline.answer(&request).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                history.push(ChatMessage::user(question));
                history.push(ChatMessage::assistant(response.answer.as_str()));
                print_answer(&response.answer);
            }
            Err(e) => println!("\n{} {}", style("Error:").red().bold(), e),
        }
    }

    Ok(())
}

fn print_answer(answer: &str) {
    let rule = "-".repeat(60);
    println!("\n{}", rule);
    println!("{}", style("Mia's Response:").bold().cyan());
    println!("{}", rule);
    println!("{}", answer);
    println!("{}\n", rule);
}
