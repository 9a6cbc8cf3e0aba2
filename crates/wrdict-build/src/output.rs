use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use wrdict_model::MigakuDictionary;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// The three files of a Migaku dictionary package:
/// - `dictionary.json`: the dictionary rows
/// - `frequency.json`: terms from most to least frequent
/// - `header.csv`: column layout of the dictionary rows
fn package_files(dict: &MigakuDictionary) -> Result<[(&'static str, Vec<u8>); 3]> {
    Ok([
        ("dictionary.json", serde_json::to_vec(&dict.dictionary)?),
        ("frequency.json", serde_json::to_vec(&dict.frequency)?),
        ("header.csv", dict.header.as_bytes().to_vec()),
    ])
}

/// Write a Migaku dictionary package to the given directory, creating it
/// if it doesn't exist.
pub fn write_dictionary(dict: &MigakuDictionary, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    for (name, contents) in package_files(dict)? {
        let path = output_dir.join(name);
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    tracing::info!(
        path = %output_dir.display(),
        rows = dict.dictionary.len(),
        terms = dict.frequency.len(),
        "Wrote dictionary"
    );
    Ok(())
}

/// Write the package as the zip archive Migaku imports.
///
/// `.zip` is appended to `path` unless already there. Inside the archive the
/// files sit in a folder named after the archive, up to its first dot
/// (`out/es-en.v2.zip` holds `es-en/dictionary.json`, ...). Returns the path
/// actually written.
pub fn zip_dictionary(dict: &MigakuDictionary, path: &Path) -> Result<PathBuf> {
    let path = zip_path(path);
    let folder = package_name(&path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, contents) in package_files(dict)? {
        zip.start_file(format!("{folder}/{name}"), options)?;
        zip.write_all(&contents)?;
    }
    zip.finish()
        .with_context(|| format!("Failed to finish {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        rows = dict.dictionary.len(),
        terms = dict.frequency.len(),
        "Wrote dictionary archive"
    );
    Ok(path)
}

fn zip_path(path: &Path) -> PathBuf {
    if path.to_string_lossy().ends_with(".zip") {
        return path.to_path_buf();
    }
    let mut zipped = path.as_os_str().to_owned();
    zipped.push(".zip");
    PathBuf::from(zipped)
}

fn package_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(String::from))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "dictionary".to_string())
}
