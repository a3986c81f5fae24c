//! Source loading
//!
//! The compiler never touches the filesystem directly; it asks a
//! [`SourceLoader`] for file contents. The CLI uses [`FsLoader`], tests and
//! benchmarks use [`MemoryLoader`] to describe whole projects in memory.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::trace;

use crate::{resolver::normalize_path, types::FxIndexMap};

/// Supplies the full source text for a module path
pub trait SourceLoader {
    fn load(&self, path: &Path) -> io::Result<String>;
}

impl<L: SourceLoader + ?Sized> SourceLoader for &L {
    fn load(&self, path: &Path) -> io::Result<String> {
        (**self).load(path)
    }
}

/// Reads sources from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        trace!("Reading {}", path.display());
        fs::read_to_string(path)
    }
}

/// In-memory project keyed by normalized absolute path
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: FxIndexMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: impl AsRef<Path>, source: impl Into<String>) -> &mut Self {
        self.files
            .insert(normalize_path(path.as_ref()), source.into());
        self
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such file: {}", path.display()),
                )
            })
    }
}
