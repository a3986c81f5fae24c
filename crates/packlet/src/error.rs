//! Error types for graph construction
//!
//! Every variant is fatal: the builder never retries, skips or stubs a
//! module, and no partial graph or artifact is produced once one is raised.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::transform::TransformError;

/// Errors raised while compiling modules and building the module graph
#[derive(Debug, Error)]
pub enum BundleError {
    /// The entry file could not be read
    #[error("cannot read source file {}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The source transformer rejected the file's content
    #[error("failed to transform {}", path.display())]
    TransformFailure {
        path: PathBuf,
        #[source]
        source: TransformError,
    },

    /// A specifier resolved to a path whose source could not be read
    #[error(
        "cannot resolve '{specifier}' imported from {}: {} is unreadable",
        importer.display(),
        resolved.display()
    )]
    UnresolvedSpecifier {
        specifier: String,
        importer: PathBuf,
        resolved: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A module transitively imports itself
    #[error("circular import detected: {}", format_chain(chain))]
    CyclicDependency {
        /// Import chain from the first module on the cycle back to itself
        chain: Vec<PathBuf>,
    },
}

impl BundleError {
    /// Path of the module the error is about
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::SourceUnreadable { path, .. } | Self::TransformFailure { path, .. } => Some(path),
            Self::UnresolvedSpecifier { resolved, .. } => Some(resolved),
            Self::CyclicDependency { chain } => chain.last(),
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
