use crate::config::Credentials;
use crate::extract;
use crate::roster::{ChannelRecord, Roster};
use crate::session::{SessionDriver, SessionError};
use crate::{Error, Result};
use chrono::{DateTime, Local};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Tunables for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Upper bound on one navigate-and-extract step. A row that blows the
    /// budget is marked failed and the run moves on.
    pub row_timeout: Duration,
    /// Persist the roster after this many processed rows.
    pub flush_every: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            row_timeout: Duration::from_secs(45),
            flush_every: 1,
        }
    }
}

/// What happened to one row, reported to the progress callback as the run
/// advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Already settled on a previous run.
    Skipped,
    Extracted(String),
    /// Page loaded but carried no address. Left empty so a future run
    /// retries it.
    Miss,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub skipped: usize,
    /// Rows with an extracted address. A miss counts as neither success nor
    /// failure.
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunSummary {
    pub fn misses(&self) -> usize {
        self.total - self.skipped - self.succeeded - self.failed
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Drive the full run: authenticate once, visit every pending row in input
/// order, and flush the roster to `output` as results land.
///
/// Config or auth failures abort before any row is processed. Row-level
/// failures mark that row and continue. The roster on disk is always a
/// complete table; an interrupted run resumes from the last flushed state.
pub async fn run(
    driver: &mut dyn SessionDriver,
    credentials: &Credentials,
    roster: &mut Roster,
    output: &Path,
    options: &RunOptions,
    mut progress: impl FnMut(usize, &ChannelRecord, &RowOutcome),
) -> Result<RunSummary> {
    let started_at = Local::now();
    let total = roster.len();

    tracing::info!(
        "Authenticating as {} ({} rows, {} pending)",
        credentials.email,
        total,
        roster.pending()
    );

    driver
        .login(credentials)
        .await
        .map_err(|e| Error::Auth(e.to_string()))?;

    tracing::info!("Session established, processing rows");

    let mut skipped = 0;
    let mut succeeded = 0;
    let mut failed = 0;
    let mut since_flush = 0;

    for idx in 0..total {
        if roster.records()[idx].is_settled() {
            skipped += 1;
            tracing::debug!(
                "Row {}/{} already settled, skipping {}",
                idx + 1,
                total,
                roster.records()[idx].channel_url
            );
            progress(idx, &roster.records()[idx], &RowOutcome::Skipped);
            continue;
        }

        let url = roster.records()[idx].channel_url.clone();
        tracing::info!("Row {}/{}: visiting {}", idx + 1, total, url);

        let outcome = match scrape_row(driver, &url, options.row_timeout).await {
            Ok(Some(email)) => {
                tracing::info!("Extracted {} from {}", email, url);
                roster.record_mut(idx).email_id = Some(email.clone());
                succeeded += 1;
                RowOutcome::Extracted(email)
            }
            Ok(None) => {
                tracing::info!("No address found on {}", url);
                RowOutcome::Miss
            }
            Err(e) if e.is_fatal() => {
                tracing::error!("Session became unusable at row {}: {}", idx + 1, e);
                roster.save(output)?;
                return Err(Error::Auth(e.to_string()));
            }
            Err(e) => {
                tracing::warn!("Row {}/{} failed: {}", idx + 1, total, e);
                roster.record_mut(idx).mark_failed();
                failed += 1;
                RowOutcome::Failed(e.to_string())
            }
        };

        since_flush += 1;
        if since_flush >= options.flush_every {
            roster.save(output)?;
            since_flush = 0;
        }

        progress(idx, &roster.records()[idx], &outcome);
    }

    tracing::info!("Flushing final roster to {}", output.display());
    roster.save(output)?;

    Ok(RunSummary {
        total,
        skipped,
        succeeded,
        failed,
        started_at,
        finished_at: Local::now(),
    })
}

/// Visit one row and extract the first address from its page text. A URL that
/// does not parse fails the row without spending a navigation on it.
async fn scrape_row(
    driver: &mut dyn SessionDriver,
    url: &str,
    timeout: Duration,
) -> std::result::Result<Option<String>, SessionError> {
    if let Err(e) = Url::parse(url) {
        return Err(SessionError::Nav(format!("invalid url {url}: {e}")));
    }

    let text = tokio::time::timeout(timeout, driver.page_text(url))
        .await
        .map_err(|_| SessionError::Timeout(timeout))??;

    Ok(extract::first_email(&text))
}
