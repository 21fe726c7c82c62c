use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use websift_common::observability::{init_logging, LogConfig};
use websift_config::{LlmConfig, WebsiftConfigLoader};
use websift_llm::{ensure_llm_ready, LlmSettings};
use websift_retrieve::{answer, Retriever};

#[derive(Parser, Debug)]
#[command(name = "websift", about = "Answer a question from live web pages")]
struct Args {
    /// The question to answer.
    question: String,

    /// Configuration file (YAML).
    #[arg(long, default_value = "websift.yaml")]
    config: PathBuf,

    /// Directory for ephemeral browser session storage.
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Run the browser with a visible window.
    #[arg(long)]
    no_headless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1) Load config (env wins)
    let cfg = WebsiftConfigLoader::new()
        .with_file(&args.config)
        .load()
        .with_context(|| format!("loading {}", args.config.display()))?;

    init_logging(LogConfig::default())?;

    let mut retrieval = cfg.retrieval.resolve();
    if args.no_headless {
        retrieval.headless = false;
    }

    let settings = match cfg.llm {
        LlmConfig::Openai {
            model,
            auth_token,
            endpoint,
            ..
        } => LlmSettings::OpenAi {
            endpoint,
            api_key: auth_token,
            model,
        },
        LlmConfig::Ollama {
            model, endpoint, ..
        } => LlmSettings::Ollama { endpoint, model },
    };
    let llm = ensure_llm_ready(&settings).await?;

    let workspace = args
        .workspace
        .unwrap_or_else(|| std::env::temp_dir().join("websift"));
    std::fs::create_dir_all(&workspace)
        .with_context(|| format!("creating workspace {}", workspace.display()))?;

    let retriever = Retriever::new(llm.clone(), retrieval);
    let pages = retriever.retrieve(&args.question, &workspace).await?;

    if pages.is_empty() {
        println!("No usable web results were found for this question.");
        return Ok(());
    }

    let mut stream = answer::synthesize_answer(llm.as_ref(), &args.question, &pages).await?;
    let mut stdout = std::io::stdout();
    while let Some(delta) = stream.next().await {
        stdout.write_all(delta?.as_bytes())?;
        stdout.flush()?;
    }
    println!();

    Ok(())
}
