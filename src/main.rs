//! buildsrv - compiler server response tool
//!
//! Encodes, relays and inspects compiler server responses on the command line.

mod commands;

use buildsrv_pipe::{ClientOutcome, Config};
use buildsrv_protocol::ServerResponse;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "buildsrv")]
#[command(about = "Encode, relay and inspect compiler server responses")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a completed response
    Encode {
        /// Compiler exit code
        #[arg(short, long, allow_negative_numbers = true)]
        return_code: i32,

        /// Mark the output as UTF-8
        #[arg(long)]
        utf8: bool,

        /// Captured compiler output
        #[arg(short, long, default_value = "")]
        output: String,

        /// Destination file (defaults to stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Read a response and act on it like a client would
    Relay {
        /// Source file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Decode a response and print it as JSON
    Inspect {
        /// Source file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries response bytes or compiler output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load().map_err(|e| {
        tracing::error!("Failed to load config: {}", e);
        e
    })?;

    match cli.command {
        Commands::Encode {
            return_code,
            utf8,
            output,
            out,
        } => {
            let response = ServerResponse::completed(return_code, utf8, output);
            commands::encode(&config, &response, out.as_deref()).await?;
        }
        Commands::Relay { input } => {
            let response = match commands::read_response(&config, input.as_deref()).await {
                Ok(response) => response,
                Err(e) => {
                    eprintln!("{}: {}", "Error".red(), e);
                    std::process::exit(1);
                }
            };

            let outcome = ClientOutcome::from(response);
            match &outcome {
                ClientOutcome::Fallback { reason } => {
                    eprintln!("{}: {}", "Fallback".yellow(), reason);
                }
                ClientOutcome::ServerShutdown { server_process_id } => {
                    eprintln!(
                        "{} (pid {})",
                        "Server shut down".green(),
                        server_process_id
                    );
                }
                ClientOutcome::Completed { .. } => {}
            }

            outcome.write_output(&mut std::io::stdout().lock())?;
            std::process::exit(outcome.exit_code());
        }
        Commands::Inspect { input } => {
            match commands::read_response(&config, input.as_deref()).await {
                Ok(response) => println!("{}", commands::to_json(&response)?),
                Err(e) => {
                    eprintln!("{}: {}", "Error".red(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
