use crate::normalize::normalize_term;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use wrdict_model::Checkpoint;

/// Read a word list: one term per line.
pub fn read_words(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read word list {}", path.display()))?;
    let words = parse_words(&text);
    tracing::debug!(path = %path.display(), words = words.len(), "Read word list");
    Ok(words)
}

/// Normalize each line, dropping blanks and later duplicates.
pub fn parse_words(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(normalize_term)
        .filter(|w| !w.is_empty())
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Skip `offset` words, then keep at most `nwords`.
///
/// Applied to the full word list before checkpointed terms are removed, so
/// every retry of a run works through the same window.
pub fn select_window(words: Vec<String>, offset: usize, nwords: Option<usize>) -> Vec<String> {
    words
        .into_iter()
        .skip(offset)
        .take(nwords.unwrap_or(usize::MAX))
        .collect()
}

/// Terms from `words` that the checkpoint has not recorded yet.
pub fn pending_terms(words: Vec<String>, checkpoint: &Checkpoint) -> Vec<String> {
    let fetched = checkpoint.fetched_terms();
    words
        .into_iter()
        .filter(|w| !fetched.contains(w.as_str()))
        .collect()
}

/// Read a rotating proxy list: one proxy URL per line.
pub fn read_proxies(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read proxy list {}", path.display()))?;
    let proxies = parse_proxies(&text);
    tracing::info!(path = %path.display(), proxies = proxies.len(), "Loaded proxy list");
    Ok(proxies)
}

pub fn parse_proxies(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}
