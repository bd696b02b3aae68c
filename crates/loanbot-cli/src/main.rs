use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod prompt;
mod session;

use commands::ask::execute as execute_ask;
use commands::chat::execute as execute_chat;
use commands::eval::execute as execute_eval;
use commands::version::execute as execute_version;
use loanbot::agent::DEFAULT_MAX_TOOL_ROUNDS;

#[derive(Parser)]
#[command(author, version, about = "Answers questions about a borrower's loan", long_about = None)]
struct Cli {
    #[command(flatten)]
    agent: AgentArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

/// How to reach the model and how the agent behaves
#[derive(Args, Clone, Debug)]
pub struct AgentArgs {
    /// Provider option (open-ai or ollama)
    #[arg(short, long, global = true, default_value = "open-ai")]
    #[arg(value_enum)]
    pub provider: CliProviderVariant,

    /// Model to use (defaults to OPENAI_MODEL / OLLAMA_MODEL or the provider default)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// OpenAI API Key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Tool rounds allowed before the answer is forced
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_TOOL_ROUNDS)]
    pub max_tool_rounds: usize,

    /// Read the loan document on first use instead of at startup
    #[arg(long, global = true)]
    pub lazy_load: bool,

    /// Template to render as the system prompt instead of the built-in one
    #[arg(long, global = true)]
    pub system_prompt: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliProviderVariant {
    OpenAi,
    Ollama,
}

#[derive(Subcommand)]
enum Command {
    /// Chat about a loan interactively
    Chat {
        /// Loan application document (XML)
        #[arg(short, long, value_name = "FILE")]
        loan: PathBuf,

        /// Name of the session to resume or start
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Answer a single question and exit
    Ask {
        /// Loan application document (XML)
        #[arg(short, long, value_name = "FILE")]
        loan: PathBuf,

        /// Also report whether the question is off-topic
        #[arg(long)]
        assess: bool,

        /// The question to answer
        query: String,
    },

    /// Replay a table of questions and score the answers
    Eval {
        /// Loan application document (XML)
        #[arg(short, long, value_name = "FILE")]
        loan: PathBuf,

        /// CSV with query and expected_response columns
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Where to write the scored results
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// File rewritten after every answered row
        #[arg(long, value_name = "FILE")]
        checkpoint: Option<PathBuf>,

        /// Classify each question as on- or off-topic
        #[arg(long)]
        classify: bool,
    },

    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Chat { loan, session }) => execute_chat(&cli.agent, loan, session).await,
        Some(Command::Ask {
            loan,
            assess,
            query,
        }) => execute_ask(&cli.agent, loan, &query, assess).await,
        Some(Command::Eval {
            loan,
            input,
            output,
            checkpoint,
            classify,
        }) => execute_eval(&cli.agent, loan, input, output, checkpoint, classify).await,
        Some(Command::Version) => execute_version().await,
        None => {
            println!("No command given, try `loanbot --help`");
            Ok(())
        }
    }
}

/// Logs go to stderr so they never mix with answers; RUST_LOG overrides the level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
