use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use shrike_cli::commands;
use shrike_cli::commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "shrike")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Collect publicly listed contact emails from channel pages into CSV",
    long_about = "Shrike signs into a Google account through a locally launched Chrome, \
                  visits each channel URL from an input CSV, extracts the first contact \
                  address on the page, and writes results back to CSV incrementally so \
                  an interrupted run can be resumed from its own output."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scrape pipeline over an input table
    Run {
        /// Path to the JSON config file holding EMAIL and PASSWORD
        #[arg(short, long, value_name = "FILE", default_value = "config.json")]
        config: PathBuf,

        /// Input CSV with a channel_url column (email_id optional)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output CSV; pass a previous output as input to resume a run
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Path to the Chrome binary
        #[arg(long)]
        chrome_path: Option<PathBuf>,

        /// Profile directory override (default: a per-account profile)
        #[arg(long)]
        profile_dir: Option<PathBuf>,

        /// Run Chrome headless
        #[arg(long)]
        headless: bool,

        /// Per-row navigation budget in seconds
        #[arg(long, default_value_t = 45)]
        timeout_secs: u64,

        /// Persist the output after this many processed rows
        #[arg(long, default_value_t = 1)]
        flush_every: usize,

        /// Selector clicked after navigation to reveal contact details
        #[arg(long)]
        reveal_selector: Option<String>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report the Chrome binary shrike would use
    Chrome {
        /// Path to the Chrome binary
        #[arg(long)]
        chrome_path: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            input,
            output,
            chrome_path,
            profile_dir,
            headless,
            timeout_secs,
            flush_every,
            reveal_selector,
            json,
        } => {
            commands::run::execute(RunArgs {
                config,
                input,
                output,
                chrome_path,
                profile_dir,
                headless,
                timeout_secs,
                flush_every,
                reveal_selector,
                json,
            })
            .await
        }
        Commands::Chrome { chrome_path } => commands::chrome::execute(chrome_path),
        Commands::Completion { shell } => {
            commands::completion::execute(shell, &mut Cli::command())
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("shrike=debug,shrike_core=debug,shrike_browser=debug")
    } else {
        EnvFilter::new("shrike=info,shrike_core=info,shrike_browser=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
