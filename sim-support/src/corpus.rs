//! Builds a numbered text corpus from one large document.
//!
//! The source is split on whitespace and re-joined into `count` files of
//! `words_per_text` words each, named the way [`TextLoader`] expects. Files
//! past the end of the source are written empty so every id stays loadable.
//!
//! [`TextLoader`]: crate::loader::TextLoader

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub const DEFAULT_WORDS_PER_TEXT: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("words per text must be greater than zero")]
    ZeroWords,

    #[error("failed to read source `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What [`split_into_texts`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusSummary {
    pub files: u64,
    pub words_written: usize,
    /// Files that received fewer than `words_per_text` words.
    pub short_files: u64,
}

/// Path of text `id` inside `dir`.
pub fn text_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("texto_{id}.txt"))
}

/// Splits `source` into `count` numbered files under `out_dir`.
pub fn split_into_texts(
    source: &Path,
    out_dir: &Path,
    words_per_text: usize,
    count: u64,
) -> Result<CorpusSummary, CorpusError> {
    if words_per_text == 0 {
        return Err(CorpusError::ZeroWords);
    }
    let text = fs::read_to_string(source).map_err(|source_err| CorpusError::Read {
        path: source.to_path_buf(),
        source: source_err,
    })?;
    fs::create_dir_all(out_dir).map_err(|source| CorpusError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = words.chunks(words_per_text);
    let mut summary = CorpusSummary {
        files: 0,
        words_written: 0,
        short_files: 0,
    };

    for id in 1..=count {
        let chunk = chunks.next().unwrap_or(&[]);
        let path = text_path(out_dir, id);
        fs::write(&path, chunk.join(" ")).map_err(|source| CorpusError::Write {
            path: path.clone(),
            source,
        })?;
        summary.files += 1;
        summary.words_written += chunk.len();
        if chunk.len() < words_per_text {
            summary.short_files += 1;
        }
    }

    if summary.short_files > 0 {
        warn!(
            short_files = summary.short_files,
            available = words.len(),
            "source ran out of words before the last text"
        );
    }
    info!(files = summary.files, dir = %out_dir.display(), "wrote text corpus");
    Ok(summary)
}
