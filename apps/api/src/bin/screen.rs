//! Command-line screening: evaluates local resume files against one job
//! description and prints the candidates ranked by match score.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

use screener_api::llm_client::LlmClient;
use screener_api::screening::evaluator::LlmResumeEvaluator;
use screener_api::screening::pipeline::{screen_batch, Upload};
use screener_api::screening::report::{rank, render_ranking};

/// Evaluate resumes against a job description.
#[derive(Parser, Debug)]
#[command(
    name = "screen",
    version,
    about = "Evaluate resumes from the CLI",
    group(ArgGroup::new("job").required(true).args(["job_file", "job_text"]))
)]
struct Cli {
    /// Path to the job description text file.
    #[arg(short = 'f', long)]
    job_file: Option<PathBuf>,

    /// Job description provided as a string.
    #[arg(short = 't', long)]
    job_text: Option<String>,

    /// Paths to resume files (.txt, .pdf, .docx).
    #[arg(short, long, required = true, num_args = 1..)]
    resumes: Vec<PathBuf>,

    /// Chat model to use.
    #[arg(short, long, env = "OPENAI_MODEL", default_value = "gpt-4")]
    model: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    base_url: String,

    /// Resume text beyond this many characters is not sent to the model.
    #[arg(long, env = "MAX_RESUME_CHARS", default_value_t = 20_000)]
    max_resume_chars: usize,

    /// Files evaluated at once.
    #[arg(short, long, env = "EVALUATION_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Print the ranked results as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads env-backed flags
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let job_description = match (&cli.job_text, &cli.job_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Could not read job description {}", path.display()))?,
        (None, None) => bail!("Provide --job-file or --job-text"),
    };

    let llm = LlmClient::new(cli.api_key.clone(), &cli.base_url, cli.model.clone())?;
    let evaluator = LlmResumeEvaluator::new(llm, cli.max_resume_chars);

    let mut uploads = Vec::with_capacity(cli.resumes.len());
    for path in &cli.resumes {
        match Upload::from_path(path).await {
            Ok(upload) => uploads.push(upload),
            Err(e) => eprintln!("Error processing {}: {e:#}", path.display()),
        }
    }

    let mut results = screen_batch(&evaluator, &job_description, uploads, cli.concurrency).await;
    for result in &results {
        if let Some(error) = result.error() {
            eprintln!("Error processing {}: {error}", result.filename);
        }
    }
    rank(&mut results);

    let mut stdout = io::stdout().lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut stdout, &results)?;
        writeln!(stdout)?;
    } else {
        write!(stdout, "{}", render_ranking(&results))?;
    }
    Ok(())
}
