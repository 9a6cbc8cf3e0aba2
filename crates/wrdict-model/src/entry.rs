use serde::{Deserialize, Serialize};

/// One row of extracted dictionary data for a looked-up term.
///
/// A term usually produces several rows, one per translation found on its
/// WordReference pages. A term that produced nothing is still recorded, as a
/// single placeholder row (see [`EntryRow::empty`]), so that it counts as
/// fetched when a collection run resumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryRow {
    /// The term as it appears in the word list.
    pub term: String,
    /// Headword of the translation row (may differ from `term`, e.g. a phrase).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altterm: Option<String>,
    /// Pronunciations from the page header, shared by all rows of a term.
    #[serde(default)]
    pub pronunciations: Vec<String>,
    /// Target-language translation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Part of speech of the source headword (e.g. "n", "vtr").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    /// Sense note from the middle column (e.g. "(greeting)").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sense: Option<String>,
    /// Example sentences, source and target interleaved as they appear.
    #[serde(default)]
    pub examples: Vec<String>,
    /// Absolute URLs of pronunciation audio files.
    #[serde(default)]
    pub audios: Vec<String>,
}

impl EntryRow {
    /// Placeholder row for a term that was fetched but yielded no entries.
    pub fn empty(term: &str) -> Self {
        Self {
            term: term.to_string(),
            altterm: None,
            pronunciations: Vec::new(),
            definition: None,
            pos: None,
            sense: None,
            examples: Vec::new(),
            audios: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.altterm.is_none() && self.definition.is_none()
    }
}
