use serde::{Deserialize, Serialize};

/// Column header Migaku expects in `header.csv`.
pub const MIGAKU_HEADER: &str = "term,altterm,pronunciation,definition,pos,examples,audio";

/// A Migaku dictionary: the three files of a dictionary package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigakuDictionary {
    pub header: String,
    /// Terms ordered from most to least frequent.
    pub frequency: Vec<String>,
    pub dictionary: Vec<MigakuItem>,
}

/// One dictionary row. Every field is a plain string; missing values are "".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MigakuItem {
    pub term: String,
    pub altterm: String,
    pub pronunciation: String,
    pub definition: String,
    pub pos: String,
    pub examples: String,
    pub audio: String,
}

impl MigakuDictionary {
    pub fn new(frequency: Vec<String>, dictionary: Vec<MigakuItem>) -> Self {
        Self {
            header: MIGAKU_HEADER.to_string(),
            frequency,
            dictionary,
        }
    }
}
