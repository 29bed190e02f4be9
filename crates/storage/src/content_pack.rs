//! Loading language content bundles from JSON files on disk.
//!
//! A content directory holds one `<language-id>.json` file per language,
//! each shaped like [`LanguageModule`].

use std::fs;
use std::path::{Path, PathBuf};

use lingo_core::InMemoryContentProvider;
use lingo_core::model::{LanguageId, LanguageModule};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentPackError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid content pack {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a single content pack file.
///
/// # Errors
///
/// Returns `ContentPackError` if the file cannot be read or parsed.
pub fn load_content_file(path: &Path) -> Result<LanguageModule, ContentPackError> {
    let raw = fs::read_to_string(path).map_err(|source| ContentPackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ContentPackError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every `*.json` pack in `dir`, keyed by file stem.
///
/// Other files are skipped.
///
/// # Errors
///
/// Returns `ContentPackError` if the directory or any pack cannot be read or parsed.
pub fn load_content_dir(dir: impl AsRef<Path>) -> Result<InMemoryContentProvider, ContentPackError> {
    let dir = dir.as_ref();
    let io_err = |source| ContentPackError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut provider = InMemoryContentProvider::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let module = load_content_file(&path)?;
        tracing::debug!(
            language = stem,
            grammar = module.grammar.len(),
            vocab = module.vocab.len(),
            verbs = module.verbs.len(),
            "loaded content pack"
        );
        provider.insert(LanguageId::new(stem), module);
    }

    Ok(provider)
}
