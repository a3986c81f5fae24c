//! Asset compilation
//!
//! An asset is one source file after transformation: its id, where it came
//! from, what it depends on and the code that goes into the bundle.

use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::{
    error::BundleError,
    loader::SourceLoader,
    transform::SourceTransformer,
    types::{ModuleId, SpecifierMap},
};

/// Hands out module ids for a single build
///
/// Every build owns its allocator, so ids always start at zero and two builds
/// never observe each other's counters.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id
    pub fn allocate(&mut self) -> ModuleId {
        let id = ModuleId::new(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> usize {
        self.next as usize
    }
}

/// One compiled module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleAsset {
    id: ModuleId,
    filename: PathBuf,
    dependencies: Vec<String>,
    code: String,
    mapping: SpecifierMap,
}

impl ModuleAsset {
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Absolute path of the source file
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Specifiers in declaration order, duplicates preserved
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Transformed code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Specifier to child id; empty until the builder has compiled every
    /// dependency of this asset
    pub fn mapping(&self) -> &SpecifierMap {
        &self.mapping
    }

    /// Resolve a specifier written in this module to the child's id
    pub fn resolve(&self, specifier: &str) -> Option<ModuleId> {
        self.mapping.get(specifier).copied()
    }

    pub(crate) fn attach_mapping(&mut self, mapping: SpecifierMap) {
        debug_assert!(self.mapping.is_empty(), "mapping attached twice");
        self.mapping = mapping;
    }
}

/// Turns a path into a [`ModuleAsset`]
#[derive(Debug)]
pub struct AssetCompiler<L, T> {
    loader: L,
    transformer: T,
}

impl<L: SourceLoader, T: SourceTransformer> AssetCompiler<L, T> {
    pub fn new(loader: L, transformer: T) -> Self {
        Self {
            loader,
            transformer,
        }
    }

    /// Read, transform and number one module
    ///
    /// Unreadable sources surface as [`BundleError::SourceUnreadable`]; the
    /// builder rewraps that for modules reached through a specifier.
    pub fn compile(&self, path: &Path, ids: &mut IdAllocator) -> Result<ModuleAsset, BundleError> {
        let source = self
            .loader
            .load(path)
            .map_err(|source| BundleError::SourceUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let output = self
            .transformer
            .transform(path, &source)
            .map_err(|source| BundleError::TransformFailure {
                path: path.to_path_buf(),
                source,
            })?;

        let id = ids.allocate();
        debug!(
            "Compiled module {} from {} with {} dependencies",
            id,
            path.display(),
            output.specifiers.len()
        );

        Ok(ModuleAsset {
            id,
            filename: path.to_path_buf(),
            dependencies: output.specifiers,
            code: output.code,
            mapping: SpecifierMap::default(),
        })
    }
}
