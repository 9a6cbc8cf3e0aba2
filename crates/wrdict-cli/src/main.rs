use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use wrdict_acquire::wordreference::BASE_URL;
use wrdict_acquire::{wordlist, CollectOptions, CollectOutcome, HttpFetcher, Url};
use wrdict_acquire::fetch::DEFAULT_TIMEOUT;
use wrdict_build::{BuildOptions, FrequencySource, Package};
use wrdict_model::LangPair;

#[derive(Parser)]
#[command(name = "wrdict")]
#[command(about = "Build Migaku dictionaries from WordReference entries")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect entries for every word of a word list, resuming from the save file
    Collect {
        #[command(flatten)]
        langs: LangArgs,

        /// Path to the word list (one term per line)
        #[arg(short, long)]
        words: PathBuf,

        /// Number of terms to fetch concurrently
        #[arg(short, long, default_value_t = 100)]
        threads: usize,

        /// Number of words to skip at the start of the word list
        #[arg(short, long, default_value_t = 0)]
        offset: usize,

        /// Number of words to translate after the offset
        #[arg(short, long)]
        nwords: Option<usize>,

        /// Path to a rotating proxy list (one proxy URL per line)
        #[arg(short, long)]
        proxies: Option<PathBuf>,

        /// Save file where collected data is stored and resumed from
        #[arg(short, long, default_value = "wrdict.save.json")]
        save: PathBuf,

        /// Seconds to wait before retrying after an error
        #[arg(short, long, default_value_t = 5)]
        interval: u64,

        /// Give up after this many consecutive failed passes (default: retry forever)
        #[arg(long)]
        max_retries: Option<u32>,

        /// Save the collected data every N terms
        #[arg(long, default_value_t = 500)]
        checkpoint_every: usize,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Look up a single word and print its entries as JSON
    Get {
        #[command(flatten)]
        langs: LangArgs,

        /// The word to look up
        word: String,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Generate a Migaku dictionary from collected data
    Build {
        /// Save file written by `collect`
        #[arg(short, long, default_value = "wrdict.save.json")]
        save: PathBuf,

        /// Frequency list ("word count" per line), as a path or an http(s) URL;
        /// defaults to the FrequencyWords list of the source language
        #[arg(short, long)]
        freq: Option<String>,

        /// Keep terms in collection order instead of ranking them
        #[arg(long, conflicts_with = "freq")]
        no_freq: bool,

        /// Output name; ".zip" is appended unless --dir is given
        #[arg(short, long, default_value = "wrdict")]
        output: PathBuf,

        /// Write the dictionary files into a directory instead of a zip archive
        #[arg(long)]
        dir: bool,

        /// Leave the examples column empty
        #[arg(long)]
        no_examples: bool,
    },

    /// Check a save file for duplicate or inconsistent rows
    Validate {
        /// Path to the save file
        file: PathBuf,
    },
}

#[derive(Args)]
struct LangArgs {
    /// Language to translate from (e.g. "en")
    #[arg(long)]
    from: String,

    /// Language to translate to (e.g. "fr")
    #[arg(long)]
    to: String,
}

impl LangArgs {
    fn pair(&self) -> Result<LangPair> {
        Ok(LangPair::new(&self.from, &self.to)?)
    }
}

#[derive(Args)]
struct FetchArgs {
    /// Dictionary site to fetch from
    #[arg(long, default_value = BASE_URL)]
    base_url: Url,

    /// Maximum result pages to follow per term
    #[arg(long, default_value_t = 50)]
    max_pages: usize,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map log level, suppressing noisy HTML-parsing crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn  => "warn",
        LogLevel::Info  => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn,hyper_util=info",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn,hyper_util=info",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    if cli.utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }

    match cli.command {
        Commands::Collect {
            langs,
            words,
            threads,
            offset,
            nwords,
            proxies,
            save,
            interval,
            max_retries,
            checkpoint_every,
            fetch,
        } => {
            let pair = langs.pair()?;
            let proxies = match &proxies {
                Some(path) => wordlist::read_proxies(path)?,
                None => Vec::new(),
            };
            let fetcher = HttpFetcher::new(&proxies, Duration::from_secs(fetch.timeout))?;
            let options = CollectOptions {
                base_url: fetch.base_url,
                threads,
                offset,
                nwords,
                retry_interval: Duration::from_secs(interval),
                max_retries,
                checkpoint_every,
                max_pages: fetch.max_pages,
                ..CollectOptions::new(pair)
            };

            tracing::info!(
                words = %words.display(),
                save = %save.display(),
                pair = %options.pair,
                threads,
                proxies = proxies.len(),
                "Collecting dictionary entries"
            );
            let summary =
                wrdict_acquire::collect(&fetcher, &words, &save, &options, tokio::signal::ctrl_c())
                    .await?;

            match summary.outcome {
                CollectOutcome::Complete => tracing::info!(
                    terms = summary.terms_fetched,
                    rows = summary.rows_written,
                    passes = summary.passes,
                    path = %save.display(),
                    "Collection complete"
                ),
                CollectOutcome::Interrupted => tracing::warn!(
                    terms = summary.terms_fetched,
                    path = %save.display(),
                    "Interrupted; rerun the same command to resume"
                ),
            }
        }
        Commands::Get { langs, word, fetch } => {
            let options = CollectOptions {
                base_url: fetch.base_url,
                max_pages: fetch.max_pages,
                ..CollectOptions::new(langs.pair()?)
            };
            let fetcher = HttpFetcher::new(&[], Duration::from_secs(fetch.timeout))?;
            tracing::info!(word = %word, pair = %options.pair, "Looking up word");
            let rows = wrdict_acquire::lookup_one(&fetcher, &word, &options).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Commands::Build {
            save,
            freq,
            no_freq,
            output,
            dir,
            no_examples,
        } => {
            let frequency = match freq {
                Some(value) => FrequencySource::parse(&value)?,
                None if no_freq => FrequencySource::Unranked,
                None => FrequencySource::FrequencyWords,
            };
            let options = BuildOptions {
                include_examples: !no_examples,
                package: if dir { Package::Directory } else { Package::Zip },
            };
            tracing::info!(save = %save.display(), output = %output.display(), "Building dictionary");
            wrdict_build::build(&save, &frequency, &output, &options).await?;
        }
        Commands::Validate { file } => {
            tracing::info!(file = %file.display(), "Validating");
            wrdict_validate::validate(&file)?;
        }
    }

    Ok(())
}
