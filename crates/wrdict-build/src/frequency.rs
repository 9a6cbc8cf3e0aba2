use anyhow::{Context, Result};
use reqwest::{Client, Url};
use std::fs;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Word frequency lists from OpenSubtitles, one per language.
const FREQUENCY_WORDS_URL: &str =
    "https://raw.githubusercontent.com/hermitdave/FrequencyWords/master/content/2018";

/// A word and how often it occurs; higher is more frequent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyItem {
    pub word: String,
    pub frequency: u64,
}

/// Where word frequencies come from when building a dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrequencySource {
    /// The FrequencyWords list of the checkpoint's source language.
    FrequencyWords,
    Url(Url),
    File(PathBuf),
    /// No list; terms keep the order they were collected in.
    Unranked,
}

impl FrequencySource {
    /// A value starting with `http` is a URL, anything else a local path.
    pub fn parse(value: &str) -> Result<Self> {
        if value.starts_with("http") {
            let url = Url::parse(value).with_context(|| format!("Invalid frequency list URL {value}"))?;
            Ok(Self::Url(url))
        } else {
            Ok(Self::File(PathBuf::from(value)))
        }
    }

    pub async fn load(&self, lang: &str) -> Result<Vec<FrequencyItem>> {
        match self {
            Self::FrequencyWords => {
                let url = frequency_words_url(lang)?;
                download_frequency_list(&Client::new(), &url).await
            }
            Self::Url(url) => download_frequency_list(&Client::new(), url).await,
            Self::File(path) => read_frequency_list(path),
            Self::Unranked => Ok(Vec::new()),
        }
    }
}

/// `{FREQUENCY_WORDS_URL}/{lang}/{lang}_full.txt`
pub fn frequency_words_url(lang: &str) -> Result<Url> {
    let url = format!("{FREQUENCY_WORDS_URL}/{lang}/{lang}_full.txt");
    Url::parse(&url).with_context(|| format!("Invalid frequency list URL {url}"))
}

pub async fn download_frequency_list(client: &Client, url: &Url) -> Result<Vec<FrequencyItem>> {
    tracing::info!(%url, "Downloading frequency list");
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to fetch frequency list {url}"))?;
    let status = response.status();
    anyhow::ensure!(status.is_success(), "HTTP {status} for {url}");

    let text = response.text().await.context("Failed to read frequency list")?;
    let items = parse_frequency_list(&text);
    tracing::info!(%url, words = items.len(), "Loaded frequency list");
    Ok(items)
}

pub fn read_frequency_list(path: &Path) -> Result<Vec<FrequencyItem>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read frequency list {}", path.display()))?;
    let items = parse_frequency_list(&text);
    tracing::info!(path = %path.display(), words = items.len(), "Loaded frequency list");
    Ok(items)
}

/// Parse a frequency list of `word count` lines.
///
/// Lines without a numeric count (a bare ranked word list) are scored by
/// position: the first of `n` lines gets `n`, the last gets 1.
pub fn parse_frequency_list(text: &str) -> Vec<FrequencyItem> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let len = lines.len();

    lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let word: String = tokens.first()?.nfc().collect();
            let count = if tokens.len() > 1 {
                tokens.last().and_then(|t| t.parse::<u64>().ok())
            } else {
                None
            };
            Some(FrequencyItem {
                word,
                frequency: count.unwrap_or((len - i) as u64),
            })
        })
        .collect()
}
