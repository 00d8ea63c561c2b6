//! Content sources for simulations.
//!
//! Items are numbered `1..=total`. [`TextLoader`] reads `texto_{n}.txt` from a
//! directory and reports real read time; [`SyntheticLoader`] fabricates the
//! content in memory with an optional fixed delay standing in for the disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use cachelab::loader::Loader;
use tracing::{debug, warn};

use crate::corpus::text_path;

/// Number of items in the default corpus.
pub const DEFAULT_TOTAL: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("texts directory `{}` does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("item {id} is outside 1..={total}")]
    InvalidId { id: u64, total: u64 },

    #[error("text file `{}` not found", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn check_id(id: u64, total: u64) -> Result<(), LoadError> {
    if (1..=total).contains(&id) {
        Ok(())
    } else {
        Err(LoadError::InvalidId { id, total })
    }
}

/// Reads numbered text files from a directory.
#[derive(Debug, Clone)]
pub struct TextLoader {
    dir: PathBuf,
    total: u64,
}

impl TextLoader {
    /// Opens `dir`, which must already exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(LoadError::MissingDirectory(dir));
        }
        Ok(Self {
            dir,
            total: DEFAULT_TOTAL,
        })
    }

    /// Overrides the number of valid ids.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = total;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Path of the file backing `id`.
    pub fn path_for(&self, id: u64) -> PathBuf {
        text_path(&self.dir, id)
    }
}

impl Loader<u64, String> for TextLoader {
    type Error = LoadError;

    fn load(&mut self, id: &u64) -> Result<(String, Duration), LoadError> {
        check_id(*id, self.total)?;
        let path = self.path_for(*id);

        let start = Instant::now();
        match fs::read_to_string(&path) {
            Ok(content) => {
                let elapsed = start.elapsed();
                debug!(id, bytes = content.len(), ?elapsed, "loaded text from disk");
                Ok((content, elapsed))
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "text file missing");
                Err(LoadError::NotFound { path })
            },
            Err(source) => Err(LoadError::Io { path, source }),
        }
    }
}

/// Fabricates item content in memory.
///
/// Each load sleeps for `latency` so that miss costs stay visible in the
/// metrics without needing a corpus on disk.
#[derive(Debug, Clone)]
pub struct SyntheticLoader {
    total: u64,
    latency: Duration,
    loads: u64,
}

impl SyntheticLoader {
    pub fn new(total: u64, latency: Duration) -> Self {
        Self {
            total,
            latency,
            loads: 0,
        }
    }

    /// Number of successful loads so far.
    pub fn loads(&self) -> u64 {
        self.loads
    }

    /// The content produced for `id`.
    pub fn content_for(id: u64) -> String {
        format!("Simulated content of text {id}")
    }
}

impl Default for SyntheticLoader {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL, Duration::ZERO)
    }
}

impl Loader<u64, String> for SyntheticLoader {
    type Error = LoadError;

    fn load(&mut self, id: &u64) -> Result<(String, Duration), LoadError> {
        check_id(*id, self.total)?;
        let start = Instant::now();
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        self.loads += 1;
        Ok((Self::content_for(*id), start.elapsed()))
    }
}

/// Either source, chosen at runtime.
#[derive(Debug, Clone)]
pub enum ContentSource {
    Disk(TextLoader),
    Synthetic(SyntheticLoader),
}

impl ContentSource {
    pub fn total(&self) -> u64 {
        match self {
            ContentSource::Disk(loader) => loader.total(),
            ContentSource::Synthetic(loader) => loader.total,
        }
    }
}

impl Loader<u64, String> for ContentSource {
    type Error = LoadError;

    fn load(&mut self, id: &u64) -> Result<(String, Duration), LoadError> {
        match self {
            ContentSource::Disk(loader) => loader.load(id),
            ContentSource::Synthetic(loader) => loader.load(id),
        }
    }
}
