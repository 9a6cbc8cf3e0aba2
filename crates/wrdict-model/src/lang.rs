use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A source/target language pair, e.g. `en` -> `fr`.
///
/// WordReference keys both its URLs (`/enfr/word`) and its translation row
/// ids (`enfr:12345`) on the concatenated codes, see [`LangPair::path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LangPair {
    pub from: String,
    pub to: String,
}

impl LangPair {
    pub fn new(from: &str, to: &str) -> Result<Self> {
        let from = parse_code(from)?;
        let to = parse_code(to)?;
        if from == to {
            return Err(ModelError::SameLanguage(from));
        }
        Ok(Self { from, to })
    }

    /// The dictionary path segment, e.g. "enfr".
    pub fn path(&self) -> String {
        format!("{}{}", self.from, self.to)
    }
}

impl fmt::Display for LangPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

fn parse_code(code: &str) -> Result<String> {
    let code = code.trim().to_ascii_lowercase();
    let valid = (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic());
    if !valid {
        return Err(ModelError::InvalidLanguage(code));
    }
    Ok(code)
}
