use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use std::path::PathBuf;

use punch::config::PunchConfig;
use punch::run;

/// Punch — automate periodic check-ins with Telegram bots.
#[derive(Parser)]
#[command(name = "punch", version, about)]
struct Cli {
    /// Path to the config file.
    #[arg(short = 'c', long, global = true, default_value = "data/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config skeleton.
    Init,

    /// Run one full check-in sweep.
    Run,

    /// Resolve configured targets against the live roster (no sends).
    Targets,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Command::Init => cmd_init(&cli.config),
        Command::Run => run::run(&cli.config).await,
        Command::Targets => run::targets(&cli.config).await,
    }
}

/// Write the default config skeleton.
fn cmd_init(path: &PathBuf) -> Result<()> {
    PunchConfig::init_at(path)?;
    println!("Config written: {}", path.display());
    println!("Fill in [account] and add your bots under [signin].");
    Ok(())
}
