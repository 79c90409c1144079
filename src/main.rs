//! bulkx worker CLI
//!
//! Entry point for the `bulkx-worker` command-line tool. The encoded task
//! result is the only thing written to stdout; logs go to stderr.

use bulkx_protocol::InputFile;
use bulkx_worker::{run_task, task_metadata, TaskConfig, TaskRequest, TASK_NAME};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bulkx-worker")]
#[command(about = "Run bulk_extractor as a pipeline task", version)]
struct Cli {
    /// Log filter when RUST_LOG is unset (e.g. "debug", "bulkx_worker=trace")
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extraction task and print the encoded result
    Run {
        /// Directory that receives reports and artifacts
        #[arg(long)]
        output_path: PathBuf,

        /// Workflow the task belongs to
        #[arg(long)]
        workflow_id: String,

        /// Base64 result of the previous task
        #[arg(long, conflicts_with = "input_file")]
        pipe_result: Option<String>,

        /// Input file descriptor as JSON, e.g. '{"uuid":"..","display_name":"..","path":".."}' (repeatable)
        #[arg(long, short = 'i', value_parser = parse_input_file)]
        input_file: Vec<InputFile>,

        /// Path to worker config file (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Print the task name and registration metadata as JSON
    Metadata,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Run {
            output_path,
            workflow_id,
            pipe_result,
            input_file,
            config,
        } => run(output_path, workflow_id, pipe_result, input_file, config),
        Commands::Metadata => print_metadata(),
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(
    output_path: PathBuf,
    workflow_id: String,
    pipe_result: Option<String>,
    input_files: Vec<InputFile>,
    config_path: Option<PathBuf>,
) {
    let config = match TaskConfig::load(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(2);
        }
    };

    let request = TaskRequest {
        pipe_result,
        input_files,
        output_path,
        workflow_id,
        task_config: None,
    };

    match run_task(&request, &config) {
        Ok(encoded) => println!("{}", encoded),
        Err(e) => {
            tracing::error!(error = %e, "task failed");
            process::exit(1);
        }
    }
}

fn parse_input_file(s: &str) -> Result<InputFile, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid input file descriptor: {}", e))
}

fn print_metadata() {
    let json = serde_json::json!({
        "task_name": TASK_NAME,
        "metadata": task_metadata(),
    });
    match serde_json::to_string_pretty(&json) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Error serializing metadata: {}", e);
            process::exit(1);
        }
    }
}
