use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use shrike_browser::{ChromeFinder, ChromeLauncher, GoogleSession, ProfileManager};
use shrike_core::pipeline::{self, RowOutcome, RunOptions, RunSummary};
use shrike_core::{Credentials, Roster};
use std::path::PathBuf;
use std::time::Duration;

pub struct RunArgs {
    pub config: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub chrome_path: Option<PathBuf>,
    pub profile_dir: Option<PathBuf>,
    pub headless: bool,
    pub timeout_secs: u64,
    pub flush_every: usize,
    pub reveal_selector: Option<String>,
    pub json: bool,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    // Config and table problems must surface before any browser starts.
    let credentials = Credentials::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    let mut roster = Roster::load(&args.input)
        .with_context(|| format!("loading input table {}", args.input.display()))?;

    if roster.is_empty() {
        println!(
            "No usable rows in {} (is the channel_url column filled in?)",
            args.input.display()
        );
        return Ok(());
    }

    println!(
        "📋 Loaded {} rows from {} ({} pending)",
        roster.len(),
        args.input.display(),
        roster.pending()
    );

    println!("🔍 Locating Chrome...");
    let chrome_binary = ChromeFinder::new(args.chrome_path.clone()).find()?;
    println!("✅ Found Chrome at: {}", chrome_binary.display());

    let profile = match &args.profile_dir {
        Some(dir) => ProfileManager::persistent(dir.clone())?,
        None => ProfileManager::for_account(&credentials.email)?,
    };
    println!("📁 Using profile: {}", profile.path().display());

    let launcher = ChromeLauncher::new(
        chrome_binary,
        profile.path().to_path_buf(),
        args.headless,
    );

    println!("🚀 Launching Chrome...");
    let mut chrome_process = launcher.launch()?;

    let result = drive(&mut roster, &credentials, &args, launcher.debugging_port()).await;

    // Chrome goes down with the run, success or not.
    let _ = chrome_process.kill();
    let _ = chrome_process.wait();

    let summary = result?;

    if args.json {
        print_json_summary(&summary, &args.output)?;
    } else {
        print_summary(&summary, &args.output);
    }

    Ok(())
}

/// Connect to the launched Chrome and run the pipeline through it.
async fn drive(
    roster: &mut Roster,
    credentials: &Credentials,
    args: &RunArgs,
    debugging_port: u16,
) -> Result<RunSummary> {
    let mut session = GoogleSession::connect(debugging_port)
        .await?
        .with_reveal_selector(args.reveal_selector.clone());

    let options = RunOptions {
        row_timeout: Duration::from_secs(args.timeout_secs),
        flush_every: args.flush_every,
    };

    let bar = ProgressBar::new(roster.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let summary = pipeline::run(
        &mut session,
        credentials,
        roster,
        &args.output,
        &options,
        |_, record, outcome| {
            let message = match outcome {
                RowOutcome::Skipped => format!("skipped {}", record.channel_url),
                RowOutcome::Extracted(email) => format!("{} → {}", record.channel_url, email),
                RowOutcome::Miss => format!("{} → no address", record.channel_url),
                RowOutcome::Failed(reason) => format!("{} failed: {}", record.channel_url, reason),
            };
            bar.set_message(message);
            bar.inc(1);
        },
    )
    .await;

    bar.finish_and_clear();

    // Close the session cleanly even when the run failed partway.
    if let Err(e) = session.close().await {
        tracing::debug!("Session close failed: {}", e);
    }

    Ok(summary?)
}

fn print_summary(summary: &RunSummary, output: &std::path::Path) {
    println!();
    println!("{}", style("Run complete").bold().green());
    println!("  Total rows:   {}", summary.total);
    println!("  Skipped:      {} (already settled)", summary.skipped);
    println!("  Extracted:    {}", style(summary.succeeded).green());
    println!("  Misses:       {}", summary.misses());
    println!("  Failed:       {}", style(summary.failed).red());
    println!("  Elapsed:      {}s", summary.elapsed().num_seconds());
    println!("  Output:       {}", output.display());
}

fn print_json_summary(summary: &RunSummary, output: &std::path::Path) -> Result<()> {
    let value = serde_json::json!({
        "total": summary.total,
        "skipped": summary.skipped,
        "succeeded": summary.succeeded,
        "misses": summary.misses(),
        "failed": summary.failed,
        "started_at": summary.started_at.to_rfc3339(),
        "finished_at": summary.finished_at.to_rfc3339(),
        "output": output.display().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
