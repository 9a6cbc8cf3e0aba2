use crate::fetch::PageFetcher;
use crate::normalize::normalize_term;
use crate::progress::Progress;
use crate::wordlist;
use crate::wordreference::{self, BASE_URL};
use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Url;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::Semaphore;
use wrdict_model::{Checkpoint, EntryRow, LangPair};

/// Settings for a collection run.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub pair: LangPair,
    pub base_url: Url,
    /// Maximum number of terms being fetched at once.
    pub threads: usize,
    /// Words to skip at the start of the word list.
    pub offset: usize,
    /// Maximum number of words to take from the list after `offset`.
    pub nwords: Option<usize>,
    /// Pause before retrying a failed pass.
    pub retry_interval: Duration,
    /// Failed passes tolerated in a row before giving up; `None` retries forever.
    /// A failed pass that still collected terms restarts the count.
    pub max_retries: Option<u32>,
    /// Save the checkpoint after this many completed terms.
    pub checkpoint_every: usize,
    /// Result pages fetched per term at most.
    pub max_pages: usize,
}

impl CollectOptions {
    pub fn new(pair: LangPair) -> Self {
        Self {
            pair,
            base_url: Url::parse(BASE_URL).expect("valid base URL"),
            threads: 100,
            offset: 0,
            nwords: None,
            retry_interval: Duration::from_secs(5),
            max_retries: None,
            checkpoint_every: 500,
            max_pages: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Every term in the window is in the checkpoint.
    Complete,
    /// Stopped by the shutdown signal; collected data was saved.
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct CollectSummary {
    pub outcome: CollectOutcome,
    pub terms_fetched: usize,
    pub rows_written: usize,
    pub passes: u32,
}

/// Fetch every pending term of the word list into the checkpoint at `save_path`.
///
/// Runs collection passes until one completes without error. A failed pass
/// keeps what it collected, waits `retry_interval`, rereads the word list and
/// tries again with whatever is still missing. `shutdown` resolving at any
/// point saves and returns [`CollectOutcome::Interrupted`].
pub async fn collect<F, S>(
    fetcher: &F,
    words_path: &Path,
    save_path: &Path,
    options: &CollectOptions,
    shutdown: S,
) -> Result<CollectSummary>
where
    F: PageFetcher,
    S: Future,
{
    let mut checkpoint = Checkpoint::load_or_new(save_path, &options.pair)
        .context("Failed to open checkpoint")?;
    let mut shutdown = std::pin::pin!(shutdown);
    let mut summary = CollectSummary {
        outcome: CollectOutcome::Complete,
        terms_fetched: 0,
        rows_written: 0,
        passes: 0,
    };
    let mut failures = 0u32;

    loop {
        let words = wordlist::read_words(words_path)?;
        let window = wordlist::select_window(words, options.offset, options.nwords);
        let window_len = window.len();
        let pending = wordlist::pending_terms(window, &checkpoint);

        if pending.is_empty() {
            tracing::info!(words = window_len, "All words already collected");
            return Ok(summary);
        }

        summary.passes += 1;
        tracing::info!(
            pass = summary.passes,
            pending = pending.len(),
            saved = window_len - pending.len(),
            pair = %options.pair,
            "Collecting data"
        );

        let report = collect_pass(
            fetcher,
            &pending,
            options,
            &mut checkpoint,
            save_path,
            shutdown.as_mut(),
        )
        .await?;
        summary.terms_fetched += report.terms;
        summary.rows_written += report.rows;

        tracing::info!(path = %save_path.display(), terms = report.terms, "Saving collected data");
        save_checkpoint(&mut checkpoint, save_path).await?;

        // A pass that collected anything starts a new run of failures.
        if report.terms > 0 {
            failures = 0;
        }

        match report.end {
            PassEnd::Finished => return Ok(summary),
            PassEnd::Interrupted => {
                summary.outcome = CollectOutcome::Interrupted;
                return Ok(summary);
            }
            PassEnd::Failed(err) => {
                failures += 1;
                if options.max_retries.is_some_and(|max| failures > max) {
                    return Err(err.context(format!("Giving up after {failures} failed passes")));
                }
                tracing::warn!(
                    error = %format!("{err:#}"),
                    failures,
                    retry_in = ?options.retry_interval,
                    "An error was found, retrying"
                );
                tokio::select! {
                    biased;
                    _ = shutdown.as_mut() => {
                        summary.outcome = CollectOutcome::Interrupted;
                        return Ok(summary);
                    }
                    _ = tokio::time::sleep(options.retry_interval) => {}
                }
            }
        }
    }
}

/// Look up a single term outside of any checkpoint.
pub async fn lookup_one<F: PageFetcher>(
    fetcher: &F,
    term: &str,
    options: &CollectOptions,
) -> Result<Vec<EntryRow>> {
    let term = normalize_term(term);
    anyhow::ensure!(!term.is_empty(), "Cannot look up an empty term");
    wordreference::lookup(fetcher, &options.base_url, &options.pair, &term, options.max_pages).await
}

enum PassEnd {
    Finished,
    Failed(anyhow::Error),
    Interrupted,
}

struct PassReport {
    end: PassEnd,
    terms: usize,
    rows: usize,
}

/// One pass over `terms`, at most `options.threads` lookups in flight.
///
/// All lookups are scheduled up front and wait on the semaphore. The first
/// failure ends the pass; dropping the remaining lookups cancels them.
async fn collect_pass<F, S>(
    fetcher: &F,
    terms: &[String],
    options: &CollectOptions,
    checkpoint: &mut Checkpoint,
    save_path: &Path,
    mut shutdown: Pin<&mut S>,
) -> Result<PassReport>
where
    F: PageFetcher,
    S: Future,
{
    let semaphore = Semaphore::new(options.threads.max(1));
    let semaphore = &semaphore;

    let mut jobs: FuturesUnordered<_> = terms
        .iter()
        .map(move |term| async move { (term, fetch_term(fetcher, semaphore, term, options).await) })
        .collect();

    let mut progress = Progress::new(terms.len());
    let mut report = PassReport {
        end: PassEnd::Finished,
        terms: 0,
        rows: 0,
    };
    let checkpoint_every = options.checkpoint_every.max(1);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.as_mut() => {
                tracing::info!(done = progress.done(), "Interrupted");
                report.end = PassEnd::Interrupted;
                break;
            }
            next = jobs.next() => match next {
                None => break,
                Some((term, Ok(rows))) => {
                    tracing::debug!(term = %term, rows = rows.len(), "Fetched term");
                    report.terms += 1;
                    report.rows += rows.len();
                    checkpoint.append(rows);
                    progress.tick();
                    if report.terms % checkpoint_every == 0 {
                        save_checkpoint(checkpoint, save_path).await?;
                    }
                }
                Some((term, Err(err))) => {
                    tracing::warn!(term = %term, error = %format!("{err:#}"), "Lookup failed");
                    report.end = PassEnd::Failed(err);
                    break;
                }
            },
        }
    }

    let cancelled = jobs.len();
    if cancelled > 0 {
        tracing::debug!(cancelled, "Cancelling outstanding lookups");
    }
    Ok(report)
}

/// Save without blocking the runtime on file I/O.
async fn save_checkpoint(checkpoint: &mut Checkpoint, save_path: &Path) -> Result<()> {
    let json = checkpoint.snapshot(save_path)?;
    let path = save_path.to_path_buf();
    tokio::task::spawn_blocking(move || Checkpoint::write_snapshot(&path, &json))
        .await
        .context("Checkpoint writer panicked")??;
    Ok(())
}

async fn fetch_term<F: PageFetcher>(
    fetcher: &F,
    semaphore: &Semaphore,
    term: &str,
    options: &CollectOptions,
) -> Result<Vec<EntryRow>> {
    let _permit = semaphore.acquire().await?;
    wordreference::lookup(fetcher, &options.base_url, &options.pair, term, options.max_pages).await
}
