use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thanatos_cli::commands;
use thanatos_core::config::CONFIG_FILE_NAME;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "thanatos-builder", version, about = "Thanatos payload builder")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build one payload and write it to disk.
    Build {
        /// JSON build request from the payload-parameter layer.
        #[arg(long)]
        request: PathBuf,
        /// Build identifier assigned by the controlling system.
        #[arg(long)]
        build_id: String,
        /// Where to write the built payload.
        #[arg(long)]
        output: PathBuf,
        /// Builder configuration file.
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
        /// Build command (overrides the request's command).
        #[arg(long)]
        command: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(error) = run_cli(cli.command) {
        eprintln!("{:#}", error);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run_cli(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Build {
            request,
            build_id,
            output,
            config,
            command,
        } => {
            let outcome = commands::build::run(commands::build::BuildArgs {
                request,
                build_id,
                output,
                config,
                command,
            })?;
            println!("artifact={}", outcome.artifact_path.display());
            println!("sha256={}", outcome.sha256);
            Ok(())
        }
    }
}
