use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use wrdict_model::Checkpoint;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("row {0} has an empty term")]
    EmptyTerm(usize),

    #[error("duplicate row for '{term}': {altterm} -> {definition}")]
    DuplicateRow {
        term: String,
        altterm: String,
        definition: String,
    },

    #[error("term '{0}' has both a placeholder row and real entries")]
    MixedPlaceholder(String),

    #[error("entry '{altterm}' of term '{term}' has no definition")]
    MissingDefinition { term: String, altterm: String },

    #[error("placeholder row for '{0}' carries examples")]
    UnknownExampleOwner(String),
}

/// Validate a checkpoint file, logging every problem found.
pub fn validate(path: &Path) -> Result<()> {
    let checkpoint = Checkpoint::load(path)
        .with_context(|| format!("Failed to load checkpoint {}", path.display()))?;

    let errors = validate_checkpoint(&checkpoint);
    let placeholders = checkpoint.rows.iter().filter(|r| r.is_placeholder()).count();
    tracing::info!(
        pair = %checkpoint.pair,
        rows = checkpoint.rows.len(),
        terms = checkpoint.term_count(),
        empty_terms = placeholders,
        updated_at = %checkpoint.updated_at,
        "Checkpoint summary"
    );

    if !errors.is_empty() {
        anyhow::bail!("{} validation errors in {}", errors.len(), path.display());
    }
    tracing::info!("Checkpoint is valid");
    Ok(())
}

/// Check a checkpoint for internal consistency.
pub fn validate_checkpoint(checkpoint: &Checkpoint) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen_rows = HashSet::new();
    // term -> (has placeholder, has entries)
    let mut kinds: HashMap<&str, (bool, bool)> = HashMap::new();

    for (index, row) in checkpoint.rows.iter().enumerate() {
        if row.term.trim().is_empty() {
            errors.push(ValidationError::EmptyTerm(index));
            continue;
        }

        let kind = kinds.entry(row.term.as_str()).or_default();
        if row.is_placeholder() {
            kind.0 = true;
            if !row.examples.is_empty() {
                errors.push(ValidationError::UnknownExampleOwner(row.term.clone()));
            }
            continue;
        }
        kind.1 = true;

        let altterm = row.altterm.clone().unwrap_or_default();
        let Some(definition) = row.definition.clone() else {
            errors.push(ValidationError::MissingDefinition {
                term: row.term.clone(),
                altterm,
            });
            continue;
        };

        let key = (row.term.as_str(), altterm.clone(), definition.clone(), row.pos.clone(), row.sense.clone());
        if !seen_rows.insert(key) {
            errors.push(ValidationError::DuplicateRow {
                term: row.term.clone(),
                altterm,
                definition,
            });
        }
    }

    let mut mixed: Vec<&str> = kinds
        .iter()
        .filter(|(_, (placeholder, entries))| *placeholder && *entries)
        .map(|(term, _)| *term)
        .collect();
    mixed.sort();
    for term in mixed {
        errors.push(ValidationError::MixedPlaceholder(term.to_string()));
    }

    for e in &errors {
        tracing::warn!("{e}");
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrdict_model::{EntryRow, LangPair};

    fn entry(term: &str, altterm: &str, definition: &str) -> EntryRow {
        EntryRow {
            altterm: Some(altterm.to_string()),
            definition: Some(definition.to_string()),
            ..EntryRow::empty(term)
        }
    }

    fn checkpoint(rows: Vec<EntryRow>) -> Checkpoint {
        let mut checkpoint = Checkpoint::new(LangPair::new("en", "fr").unwrap());
        checkpoint.append(rows);
        checkpoint
    }

    #[test]
    fn test_valid_checkpoint() {
        let checkpoint = checkpoint(vec![
            entry("hello", "hello", "bonjour"),
            entry("hello", "hello", "salut"),
            EntryRow::empty("zzyzx"),
        ]);
        assert!(validate_checkpoint(&checkpoint).is_empty());
    }

    #[test]
    fn test_duplicate_rows() {
        let checkpoint = checkpoint(vec![
            entry("cat", "cat", "chat"),
            entry("cat", "cat", "chat"),
        ]);
        let errors = validate_checkpoint(&checkpoint);
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateRow {
                term: "cat".into(),
                altterm: "cat".into(),
                definition: "chat".into(),
            }]
        );
    }

    #[test]
    fn test_same_translation_in_two_senses_is_not_a_duplicate() {
        let mut noun = entry("run", "run", "course");
        noun.sense = Some("(jog)".into());
        let mut other = entry("run", "run", "course");
        other.sense = Some("(series)".into());
        assert!(validate_checkpoint(&checkpoint(vec![noun, other])).is_empty());
    }

    #[test]
    fn test_mixed_placeholder() {
        let checkpoint = checkpoint(vec![entry("dog", "dog", "chien"), EntryRow::empty("dog")]);
        let errors = validate_checkpoint(&checkpoint);
        assert_eq!(errors, vec![ValidationError::MixedPlaceholder("dog".into())]);
    }

    #[test]
    fn test_row_problems() {
        let headword_only = EntryRow {
            altterm: Some("ice cream".into()),
            ..EntryRow::empty("ice")
        };
        let orphan_examples = EntryRow {
            examples: vec!["An example.".into()],
            ..EntryRow::empty("zzyzx")
        };
        let checkpoint = checkpoint(vec![EntryRow::empty("  "), headword_only, orphan_examples]);
        let errors = validate_checkpoint(&checkpoint);

        assert!(errors.contains(&ValidationError::EmptyTerm(0)));
        assert!(errors.contains(&ValidationError::MissingDefinition {
            term: "ice".into(),
            altterm: "ice cream".into(),
        }));
        assert!(errors.contains(&ValidationError::UnknownExampleOwner("zzyzx".into())));
    }

    #[test]
    fn test_validate_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let mut bad = checkpoint(vec![entry("cat", "cat", "chat"), entry("cat", "cat", "chat")]);
        bad.save(&path).unwrap();
        assert!(validate(&path).is_err());

        let mut good = checkpoint(vec![entry("cat", "cat", "chat")]);
        good.save(&path).unwrap();
        assert!(validate(&path).is_ok());
    }
}
