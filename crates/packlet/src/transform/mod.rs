//! Source transformation
//!
//! The bundler core treats transformation as an opaque step: given a file's
//! text it needs the ordered list of specifiers the file depends on and code
//! that runs with CommonJS-style `require`, `module` and `exports` bindings
//! in scope. [`SourceTransformer`] is that seam.
//!
//! [`ModuleSyntaxTransformer`] is the transformer used by the CLI. It is line
//! oriented rather than a full parser: one import or export statement per
//! line (multi-line binding lists are fine), no imports hidden inside template
//! literals.

mod commonjs;
mod esm;

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of transforming one module
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformOutput {
    /// Specifiers in declaration order, duplicates preserved
    pub specifiers: Vec<String>,
    /// Code expecting `require`, `module` and `exports` in scope
    pub code: String,
}

/// The transformer could not make sense of a module
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct TransformError {
    /// 1-based line the offending statement starts on
    pub line: usize,
    pub message: String,
}

impl TransformError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

pub trait SourceTransformer {
    /// Extract dependencies from `source` and lower it to CommonJS form
    ///
    /// `path` is only used for diagnostics.
    fn transform(&self, path: &Path, source: &str) -> Result<TransformOutput, TransformError>;
}

impl<T: SourceTransformer + ?Sized> SourceTransformer for &T {
    fn transform(&self, path: &Path, source: &str) -> Result<TransformOutput, TransformError> {
        (**self).transform(path, source)
    }
}

/// Module syntax the input files are written in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// ECMAScript modules (`import` / `export`)
    #[default]
    Module,
    /// CommonJS (`require` / `module.exports`), passed through unchanged
    #[value(name = "commonjs")]
    CommonJs,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module => write!(f, "module"),
            Self::CommonJs => write!(f, "commonjs"),
        }
    }
}

/// Default transformer for ES module and CommonJS sources
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleSyntaxTransformer {
    dialect: Dialect,
}

impl ModuleSyntaxTransformer {
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }
}

impl SourceTransformer for ModuleSyntaxTransformer {
    fn transform(&self, path: &Path, source: &str) -> Result<TransformOutput, TransformError> {
        let output = match self.dialect {
            Dialect::Module => esm::lower_to_commonjs(source)?,
            Dialect::CommonJs => commonjs::scan(source),
        };
        debug!(
            "Transformed {} as {} ({} dependencies)",
            path.display(),
            self.dialect,
            output.specifiers.len()
        );
        Ok(output)
    }
}

/// Render `value` as a double-quoted JavaScript string literal
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Identifier pattern shared by the dialect scanners
const IDENT: &str = r"[A-Za-z_$][\w$]*";

/// Quoted specifier pattern; the text lands in either `dq` or `sq`
const QUOTED_SPECIFIER: &str = r#"(?:"(?P<dq>[^"\n]*)"|'(?P<sq>[^'\n]*)')"#;

fn quoted_specifier(caps: &regex::Captures<'_>) -> String {
    caps.name("dq")
        .or_else(|| caps.name("sq"))
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default()
}
