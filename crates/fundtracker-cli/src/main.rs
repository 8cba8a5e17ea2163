use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod host;

#[derive(Parser)]
#[command(name = "fundtracker", version, about = "Track contributions toward a funding goal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a contribution
    Add {
        /// Amount in the configured currency (e.g. 25 or 12.50)
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Skip the confetti animation
        #[arg(long)]
        no_animation: bool,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove the most recent contribution
    Undo {
        #[arg(long)]
        json: bool,
    },
    /// Clear every contribution
    Reset {
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show funding progress and milestones
    Status {
        #[arg(long)]
        json: bool,
    },
    /// List contributions in the order they were added
    History {
        #[arg(long)]
        json: bool,
    },
    /// Play the confetti
    Celebrate {
        /// Run length in milliseconds (defaults to confetti.duration_ms)
        #[arg(long)]
        duration: Option<u64>,
        #[arg(long)]
        no_animation: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FUNDTRACKER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Add {
            amount,
            no_animation,
            json,
        } => commands::ledger::add(&amount, json, no_animation),
        Commands::Undo { json } => commands::ledger::undo(json),
        Commands::Reset { yes, json } => commands::ledger::reset(yes, json),
        Commands::Status { json } => commands::ledger::status(json),
        Commands::History { json } => commands::ledger::history(json),
        Commands::Celebrate {
            duration,
            no_animation,
        } => commands::ledger::celebrate(duration, no_animation),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
