//! Run single CodeAct agent turns from the command line.
//!
//! Histories are JSON arrays of events, as written by the sandbox loop.
//! `step` reads the API key from the `OPENROUTER_KEY` environment variable;
//! `render` and `decode` work offline.
//!
//! # Examples
//!
//! ```sh
//! # One turn over a saved history
//! codeact step --history task.json --iteration 3 --max-iterations 30
//!
//! # Condense pre-emptively once the prompt passes ~100k tokens
//! codeact step --history task.json --max-input-tokens 100000
//!
//! # Inspect the prompt a turn would send
//! codeact render --history task.json --no-github
//!
//! # Decode a saved completion
//! cat reply.txt | codeact decode
//! ```

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use codeact_rs::agent::config::DEFAULT_KERNEL_INIT_CODE;
use codeact_rs::context::CondenserConfig;
use codeact_rs::decode::decode_response;
use codeact_rs::prelude::*;
use codeact_rs::prompt::{DEFAULT_MAX_OBSERVATION_CHARS, PromptRenderer};
use codeact_rs::DEFAULT_MODEL;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run single CodeAct agent turns.
#[derive(Parser)]
#[command(name = "codeact", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one turn over a history file and print the decoded action.
    Step(StepArgs),
    /// Print the prompt messages a turn would send, as JSON.
    Render(HistoryArgs),
    /// Decode a completion read from stdin into an action.
    Decode {
        /// Snippet attached to interpreter actions.
        #[arg(long, default_value = DEFAULT_KERNEL_INIT_CODE)]
        kernel_init_code: String,
    },
}

#[derive(Args)]
struct HistoryArgs {
    /// JSON file holding an array of events.
    #[arg(long)]
    history: PathBuf,

    /// Turns already taken.
    #[arg(long, default_value_t = 0)]
    iteration: u32,

    /// Turn budget for the task.
    #[arg(long, default_value_t = 30)]
    max_iterations: u32,

    /// Per-observation character ceiling.
    #[arg(long, default_value_t = DEFAULT_MAX_OBSERVATION_CHARS)]
    observation_max_chars: usize,

    /// Leave the GitHub instructions out of the system message.
    #[arg(long)]
    no_github: bool,
}

#[derive(Args)]
struct StepArgs {
    #[command(flatten)]
    history: HistoryArgs,

    /// Model to use for completions.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Model to use for condensation. Defaults to --model.
    #[arg(long)]
    summary_model: Option<String>,

    /// Condense before sending once the estimated prompt passes this many tokens.
    #[arg(long)]
    max_input_tokens: Option<usize>,

    /// Maximum tokens per LLM response (0 = service default).
    #[arg(long, default_value_t = 0)]
    max_tokens: u32,

    /// Recent events the condenser never summarises.
    #[arg(long, default_value_t = 4)]
    keep_recent: usize,
}

impl HistoryArgs {
    fn config(&self) -> AgentConfig {
        AgentConfig::default()
            .with_observation_max_chars(self.observation_max_chars)
            .with_github(!self.no_github)
    }

    fn load_state(&self) -> TaskState {
        let history = match History::load_json(&self.history) {
            Ok(h) => h,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        };
        TaskState::new(self.max_iterations)
            .with_history(history)
            .with_iteration(self.iteration)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match cli.command {
        Command::Step(args) => run_step(args).await,
        Command::Render(args) => run_render(&args),
        Command::Decode { kernel_init_code } => run_decode(&kernel_init_code),
    }
}

async fn run_step(args: StepArgs) {
    let api_key = match std::env::var("OPENROUTER_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("Error: OPENROUTER_KEY environment variable is not set");
            process::exit(1);
        }
    };

    let client = match OpenRouterClient::with_headers(
        api_key,
        "https://crates.io/crates/codeact-rs",
        "codeact",
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to create API client: {e}");
            process::exit(1);
        }
    };

    let mut config = args
        .history
        .config()
        .with_max_tokens(args.max_tokens);
    config.model = args.model;
    config.max_input_tokens = args.max_input_tokens;

    let summary_model = args.summary_model.unwrap_or_else(|| config.model.clone());
    let condenser = LlmCondenser::with_config(
        &client,
        summary_model,
        CondenserConfig {
            keep_recent: args.keep_recent,
            observation_max_chars: args.history.observation_max_chars,
            ..CondenserConfig::default()
        },
    );

    let mut state = args.history.load_state();
    let result = CodeActAgent::new(&client, config)
        .with_condenser(&condenser)
        .with_event_handler(&LoggingHandler)
        .step(&mut state)
        .await;

    match result {
        Ok(action) => {
            let output = serde_json::json!({
                "action": action,
                "num_of_chars": state.num_of_chars,
                "live_events": state.history.len(),
            });
            print_json(&output);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_fatal() {
                eprintln!("The task cannot continue and should be moved to an error state.");
            }
            process::exit(1);
        }
    }
}

fn run_render(args: &HistoryArgs) {
    let state = args.load_state();
    let messages = PromptRenderer::from_config(&args.config()).render(
        &state.history,
        state.iteration,
        state.max_iterations,
    );
    print_json(&messages);
}

fn run_decode(kernel_init_code: &str) {
    let mut response = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut response) {
        eprintln!("Error: failed to read stdin: {e}");
        process::exit(1);
    }
    print_json(&decode_response(&response, kernel_init_code));
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: failed to serialize output: {e}");
            process::exit(1);
        }
    }
}
