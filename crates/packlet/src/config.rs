//! Layered configuration
//!
//! Layers, lowest precedence first: built-in defaults, the user config file,
//! `packlet.toml` in the working directory, an explicit `--config` file and
//! finally command-line flags. A relative `base_dir` or `output` in a file is
//! taken relative to that file's directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use crate::{dirs, transform::Dialect};

/// Effective configuration for one bundling run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Directory relative entries are resolved against; the working
    /// directory when unset
    pub base_dir: Option<PathBuf>,
    /// Entry module, relative to `base_dir` unless absolute
    pub entry: Option<String>,
    /// Where to write the bundle; stdout when unset
    pub output: Option<PathBuf>,
    /// Module syntax of the sources
    pub dialect: Dialect,
    /// Annotate registry entries with their source path
    pub annotate: bool,
}

/// One configuration file; every field is optional so layers can overlay
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConfigLayer {
    pub base_dir: Option<PathBuf>,
    pub entry: Option<String>,
    pub output: Option<PathBuf>,
    pub dialect: Option<Dialect>,
    pub annotate: Option<bool>,
}

impl ConfigLayer {
    /// Parse a layer from TOML text; relative paths are anchored at `origin`
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut layer: Self = toml::from_str(text).context("invalid packlet configuration")?;
        layer.base_dir = layer.base_dir.map(|dir| origin.join(dir));
        layer.output = layer.output.map(|out| origin.join(out));
        Ok(layer)
    }

    /// Read a layer from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let origin = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, origin)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

impl Config {
    /// Overlay `layer` on top of this configuration
    pub fn apply(&mut self, layer: ConfigLayer) {
        if let Some(base_dir) = layer.base_dir {
            self.base_dir = Some(base_dir);
        }
        if let Some(entry) = layer.entry {
            self.entry = Some(entry);
        }
        if let Some(output) = layer.output {
            self.output = Some(output);
        }
        if let Some(dialect) = layer.dialect {
            self.dialect = dialect;
        }
        if let Some(annotate) = layer.annotate {
            self.annotate = annotate;
        }
    }

    /// Load defaults, the user file, the project file in `cwd` and an
    /// optional explicit file, in that order
    pub fn load(cwd: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let discovered = [
            dirs::user_config_file(),
            Some(cwd.join(dirs::CONFIG_FILE_NAME)),
        ];
        for path in discovered.into_iter().flatten() {
            if path.is_file() {
                debug!("Loading configuration from {}", path.display());
                config.apply(ConfigLayer::from_file(&path)?);
            }
        }

        if let Some(path) = explicit {
            debug!("Loading explicit configuration from {}", path.display());
            config.apply(ConfigLayer::from_file(&cwd.join(path))?);
        }

        Ok(config)
    }

    /// The base directory, falling back to `cwd`
    pub fn base_dir_or(&self, cwd: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) => cwd.join(dir),
            None => cwd.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_layers_override_in_order() {
        let mut config = Config::default();
        config.apply(
            ConfigLayer::parse(
                "base-dir = \"src\"\nentry = \"main.js\"\nannotate = true",
                Path::new("/project"),
            )
            .unwrap(),
        );
        config.apply(
            ConfigLayer::parse("entry = \"app.js\"\ndialect = \"commonjs\"", Path::new("/x"))
                .unwrap(),
        );

        assert_eq!(
            config,
            Config {
                base_dir: Some(PathBuf::from("/project/src")),
                entry: Some("app.js".to_owned()),
                output: None,
                dialect: Dialect::CommonJs,
                annotate: true,
            }
        );
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let layer = ConfigLayer::parse("output = \"/tmp/out.js\"", Path::new("/project")).unwrap();
        assert_eq!(layer.output, Some(PathBuf::from("/tmp/out.js")));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = ConfigLayer::parse("minify = true", Path::new("/")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"));
    }

    #[test]
    fn test_load_project_and_explicit_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("packlet.toml"),
            "entry = \"index.js\"\nannotate = true",
        )
        .unwrap();
        fs::write(dir.path().join("release.toml"), "annotate = false\noutput = \"dist/app.js\"")
            .unwrap();

        let config = Config::load(dir.path(), Some(Path::new("release.toml"))).unwrap();
        assert_eq!(config.entry.as_deref(), Some("index.js"));
        assert!(!config.annotate);
        assert_eq!(config.output, Some(dir.path().join("dist/app.js")));
        assert_eq!(config.base_dir_or(dir.path()), dir.path());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path(), Some(Path::new("nope.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }
}
