use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};

fn main() {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("amalgam=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    let result = match &cli.command {
        Commands::New(args) => commands::new::run(args, format),
        Commands::Show(args) => commands::show::run(args, format),
        Commands::History(args) => commands::history::run(args, format),
        Commands::Heads(args) => commands::heads::run(args, format),
        Commands::Merge(args) => commands::merge::run(args, format),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
