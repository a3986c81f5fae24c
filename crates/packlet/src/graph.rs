//! Module graph construction
//!
//! The builder walks specifiers breadth-first from the entry module. Every
//! specifier occurrence is compiled on its own and gets a fresh id; two
//! imports of the same file yield two independent modules in the graph.

use std::path::{Path, PathBuf};

use log::{debug, info, trace};
use serde::Serialize;

use crate::{
    asset::{AssetCompiler, IdAllocator, ModuleAsset},
    error::BundleError,
    loader::SourceLoader,
    resolver::{join_specifier, normalize_path, resolve_specifier},
    transform::SourceTransformer,
    types::{ModuleId, SpecifierMap},
};

/// All modules discovered for one build, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModuleGraph {
    modules: Vec<ModuleAsset>,
}

impl ModuleGraph {
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The entry module, if the graph is non-empty
    pub fn entry(&self) -> Option<&ModuleAsset> {
        self.modules.first()
    }

    pub fn get(&self, id: ModuleId) -> Option<&ModuleAsset> {
        self.modules.get(id.index()).filter(|asset| asset.id() == id)
    }

    pub fn modules(&self) -> &[ModuleAsset] {
        &self.modules
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleAsset> {
        self.modules.iter()
    }
}

impl<'a> IntoIterator for &'a ModuleGraph {
    type Item = &'a ModuleAsset;
    type IntoIter = std::slice::Iter<'a, ModuleAsset>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}

/// Breadth-first graph builder
///
/// Holds the compiler and the project base directory; each call to
/// [`GraphBuilder::build`] starts a fresh id sequence.
#[derive(Debug)]
pub struct GraphBuilder<L, T> {
    compiler: AssetCompiler<L, T>,
    base_dir: PathBuf,
}

impl<L: SourceLoader, T: SourceTransformer> GraphBuilder<L, T> {
    pub fn new(base_dir: impl Into<PathBuf>, loader: L, transformer: T) -> Self {
        Self {
            compiler: AssetCompiler::new(loader, transformer),
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute path the entry refers to; relative entries resolve against
    /// the base directory
    pub fn entry_path(&self, entry: &str) -> PathBuf {
        if Path::new(entry).is_absolute() {
            normalize_path(Path::new(entry))
        } else {
            join_specifier(&self.base_dir, entry)
        }
    }

    /// Discover and compile every module reachable from `entry`
    ///
    /// `entry` is resolved against the base directory. The returned graph
    /// has the entry at id 0 and every mapping filled in. A module that
    /// imports one of its own importers fails the build with
    /// [`BundleError::CyclicDependency`]; modules reached along different
    /// branches are not cycles and are compiled once per occurrence.
    pub fn build(&self, entry: &str) -> Result<ModuleGraph, BundleError> {
        let entry_path = self.entry_path(entry);
        info!("Building module graph from {}", entry_path.display());

        let mut ids = IdAllocator::new();
        let entry_asset = self.compiler.compile(&entry_path, &mut ids)?;

        // importers[i] is the queue position of the module that pulled in
        // module i; the entry has none
        let mut queue = vec![entry_asset];
        let mut importers: Vec<Option<usize>> = vec![None];
        let mut cursor = 0;

        while cursor < queue.len() {
            let filename = queue[cursor].filename().to_path_buf();
            let dependencies = queue[cursor].dependencies().to_vec();
            let mut mapping = SpecifierMap::default();

            for specifier in dependencies {
                let resolved = resolve_specifier(&filename, &specifier);
                self.check_cycle(&queue, &importers, cursor, &resolved)?;

                let child = self
                    .compiler
                    .compile(&resolved, &mut ids)
                    .map_err(|err| match err {
                        BundleError::SourceUnreadable { path, source } => {
                            BundleError::UnresolvedSpecifier {
                                specifier: specifier.clone(),
                                importer: filename.clone(),
                                resolved: path,
                                source,
                            }
                        }
                        other => other,
                    })?;

                trace!(
                    "Module {} maps '{}' to module {}",
                    queue[cursor].id(),
                    specifier,
                    child.id()
                );
                // A repeated specifier keeps its first position but points
                // at the most recent compile
                mapping.insert(specifier, child.id());
                queue.push(child);
                importers.push(Some(cursor));
            }

            queue[cursor].attach_mapping(mapping);
            cursor += 1;
        }

        debug!("Module graph complete with {} modules", queue.len());
        Ok(ModuleGraph { modules: queue })
    }

    /// Fail if `resolved` is already on the import chain leading to `current`
    fn check_cycle(
        &self,
        queue: &[ModuleAsset],
        importers: &[Option<usize>],
        current: usize,
        resolved: &Path,
    ) -> Result<(), BundleError> {
        let mut chain = Vec::new();
        let mut position = Some(current);
        while let Some(index) = position {
            let filename = queue[index].filename();
            chain.push(filename.to_path_buf());
            if filename == resolved {
                chain.reverse();
                chain.push(resolved.to_path_buf());
                return Err(BundleError::CyclicDependency { chain });
            }
            position = importers[index];
        }
        Ok(())
    }
}
