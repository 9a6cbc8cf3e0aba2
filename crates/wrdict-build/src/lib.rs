use anyhow::{Context, Result};
use std::path::Path;
use wrdict_model::Checkpoint;

pub mod frequency;
pub mod generate;
pub mod output;

pub use frequency::FrequencySource;
pub use generate::{BuildOptions, Package};

/// Build a Migaku dictionary from a collection checkpoint.
///
/// Reads the checkpoint at `save_path`, ranks its terms with the frequency
/// list from `frequency`, then writes the package to `output` (as
/// `output.zip` or into the directory `output`, per `options.package`).
pub async fn build(
    save_path: &Path,
    frequency: &FrequencySource,
    output: &Path,
    options: &BuildOptions,
) -> Result<()> {
    let checkpoint = Checkpoint::load(save_path)
        .with_context(|| format!("Failed to load checkpoint {}", save_path.display()))?;
    tracing::info!(
        pair = %checkpoint.pair,
        rows = checkpoint.rows.len(),
        terms = checkpoint.term_count(),
        "Loaded collected data"
    );

    let frequencies = frequency.load(&checkpoint.pair.from).await?;

    let dict = generate::generate(&checkpoint, &frequencies, options);
    let skipped = checkpoint.rows.len() - dict.dictionary.len();
    tracing::info!(
        entries = dict.dictionary.len(),
        skipped_empty = skipped,
        "Generated dictionary"
    );

    match options.package {
        Package::Zip => output::zip_dictionary(&dict, output).map(|_| ()),
        Package::Directory => output::write_dictionary(&dict, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrdict_model::{EntryRow, LangPair};

    #[tokio::test]
    async fn test_build_zip_from_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let save = dir.path().join("save.json");
        let mut checkpoint = Checkpoint::new(LangPair::new("fr", "en").unwrap());
        checkpoint.append(vec![EntryRow {
            altterm: Some("chat".into()),
            definition: Some("cat".into()),
            ..EntryRow::empty("chat")
        }]);
        checkpoint.save(&save).unwrap();

        let output = dir.path().join("fr-en");
        build(&save, &FrequencySource::Unranked, &output, &BuildOptions::default())
            .await
            .unwrap();
        assert!(dir.path().join("fr-en.zip").exists());

        let options = BuildOptions {
            package: Package::Directory,
            ..BuildOptions::default()
        };
        build(&save, &FrequencySource::Unranked, &output, &options).await.unwrap();
        assert!(output.join("dictionary.json").exists());
    }
}
