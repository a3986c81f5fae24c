//! Intermediate representation of the bundle's module registry

use std::path::Path;

use crate::{
    graph::ModuleGraph,
    resolver::display_path,
    transform::js_string,
    types::{ModuleId, SpecifierMap},
};

/// One module as it appears in the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub id: ModuleId,
    /// Module path relative to the project base directory
    pub source: String,
    /// Code run inside `function (require, module, exports) { ... }`
    pub factory_body: String,
    pub mapping: SpecifierMap,
}

impl RegistryEntry {
    /// The mapping as a JavaScript object literal, e.g. `{"./b.js":1}`
    pub fn mapping_literal(&self) -> String {
        let pairs = self
            .mapping
            .iter()
            .map(|(specifier, id)| format!("{}:{}", js_string(specifier), id))
            .collect::<Vec<_>>();
        format!("{{{}}}", pairs.join(","))
    }
}

/// Ordered registry entries, one per graph module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleRegistry {
    entries: Vec<RegistryEntry>,
}

impl BundleRegistry {
    pub fn from_graph(graph: &ModuleGraph, base_dir: &Path) -> Self {
        let entries = graph
            .iter()
            .map(|asset| RegistryEntry {
                id: asset.id(),
                source: display_path(asset.filename(), base_dir),
                factory_body: asset.code().to_owned(),
                mapping: asset.mapping().clone(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<RegistryEntry> for BundleRegistry {
    fn from_iter<I: IntoIterator<Item = RegistryEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
