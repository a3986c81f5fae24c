//! Drives one bundling run: build the graph, lower it, emit the script

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result, anyhow};
use log::{debug, info};

use crate::{
    config::Config,
    emit::{BundleRegistry, EmitOptions, emit},
    graph::{GraphBuilder, ModuleGraph},
    loader::{FsLoader, SourceLoader},
    transform::ModuleSyntaxTransformer,
};

/// A finished bundle together with the graph it was built from
#[derive(Debug)]
pub struct BundleOutput {
    pub code: String,
    pub graph: ModuleGraph,
}

#[derive(Debug)]
pub struct BundleOrchestrator {
    config: Config,
    base_dir: PathBuf,
}

impl BundleOrchestrator {
    /// `cwd` anchors a relative or missing `base_dir`
    pub fn new(config: Config, cwd: &Path) -> Self {
        let base_dir = config.base_dir_or(cwd);
        Self { config, base_dir }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Entry from the configuration
    pub fn entry(&self) -> Result<&str> {
        self.config
            .entry
            .as_deref()
            .ok_or_else(|| anyhow!("no entry module given on the command line or in packlet.toml"))
    }

    /// Bundle the configured entry from disk
    pub fn bundle(&self) -> Result<BundleOutput> {
        self.bundle_with(self.entry()?, FsLoader)
    }

    /// Bundle `entry` reading sources through `loader`
    pub fn bundle_with<L: SourceLoader>(&self, entry: &str, loader: L) -> Result<BundleOutput> {
        let started = Instant::now();
        let transformer = ModuleSyntaxTransformer::new(self.config.dialect);
        let builder = GraphBuilder::new(&self.base_dir, loader, transformer);

        let graph = builder
            .build(entry)
            .with_context(|| format!("failed to bundle entry '{entry}'"))?;
        debug!("Graph built in {:.2?}", started.elapsed());

        let registry = BundleRegistry::from_graph(&graph, &self.base_dir);
        let code = emit(
            &registry,
            EmitOptions {
                annotate: self.config.annotate,
            },
        );

        info!(
            "Bundled {} modules from {} in {:.2?}",
            graph.len(),
            entry,
            started.elapsed()
        );
        Ok(BundleOutput { code, graph })
    }

    /// Write the bundle to the configured output file
    ///
    /// Returns the path written, or `None` when no output is configured.
    pub fn write_output(&self, output: &BundleOutput) -> Result<Option<PathBuf>> {
        let Some(path) = &self.config.output else {
            return Ok(None);
        };
        write_file(path, output.code.as_bytes())?;
        info!("Wrote bundle to {}", path.display());
        Ok(Some(path.clone()))
    }

    /// Write the module graph as pretty-printed JSON
    pub fn write_graph(&self, output: &BundleOutput, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&output.graph)
            .context("failed to serialize module graph")?;
        write_file(path, json.as_bytes())?;
        info!("Wrote module graph to {}", path.display());
        Ok(())
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
