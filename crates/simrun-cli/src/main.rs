mod commands;
mod logging;
mod options;

use clap::{Parser, Subcommand};

use crate::options::JobArgs;

#[derive(Parser)]
#[command(
    name = "simrun",
    version,
    about = "Build and run simulation targets locally or through a batch scheduler"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and run targets for a case
    Run(JobArgs),
    /// Validate job options against the selected engine without building
    Check(JobArgs),
    /// List available execution engines
    Engines,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run(args) => commands::run::execute(&args),
        Commands::Check(args) => commands::check::execute(&args),
        Commands::Engines => commands::engines::execute(),
    }
}
