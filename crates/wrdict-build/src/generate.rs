use crate::frequency::FrequencyItem;
use std::cmp::Reverse;
use std::collections::HashMap;
use wrdict_model::{Checkpoint, EntryRow, MigakuDictionary, MigakuItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Package {
    /// A `.zip` archive, the form Migaku imports.
    Zip,
    /// The package files written into a plain directory.
    Directory,
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Include example sentences in the `examples` column.
    pub include_examples: bool,
    pub package: Package,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            include_examples: true,
            package: Package::Zip,
        }
    }
}

/// Build a Migaku dictionary from collected rows.
///
/// Placeholder rows (terms with no entries) get no dictionary row but still
/// appear in the frequency list. Terms missing from `frequencies` rank last,
/// in checkpoint order.
pub fn generate(
    checkpoint: &Checkpoint,
    frequencies: &[FrequencyItem],
    options: &BuildOptions,
) -> MigakuDictionary {
    let mut scores: HashMap<&str, u64> = HashMap::new();
    for item in frequencies {
        scores.entry(item.word.as_str()).or_insert(item.frequency);
    }

    let mut terms = checkpoint.terms_in_order();
    terms.sort_by_key(|t| Reverse(scores.get(t).copied().unwrap_or(0)));
    let frequency = terms.into_iter().map(String::from).collect();

    let dictionary = checkpoint
        .rows
        .iter()
        .filter(|row| !row.is_placeholder())
        .map(|row| to_item(row, options))
        .collect();

    MigakuDictionary::new(frequency, dictionary)
}

fn to_item(row: &EntryRow, options: &BuildOptions) -> MigakuItem {
    let altterm = row
        .altterm
        .as_deref()
        .filter(|alt| *alt != row.term)
        .unwrap_or_default();
    let examples = if options.include_examples {
        row.examples.join("\n")
    } else {
        String::new()
    };

    MigakuItem {
        term: row.term.clone(),
        altterm: altterm.to_string(),
        pronunciation: row.pronunciations.join(", "),
        definition: row.definition.clone().unwrap_or_default(),
        pos: row.pos.clone().unwrap_or_default(),
        examples,
        audio: row.audios.first().cloned().unwrap_or_default(),
    }
}
