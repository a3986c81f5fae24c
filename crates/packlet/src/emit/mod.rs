//! Bundle emission
//!
//! The bundle is a single immediately-invoked function. Its argument is the
//! module registry, an object keyed by module id whose values are
//! `[factory, mapping]` pairs. Its body is a tiny loader:
//!
//! - `require(id)` runs the factory for `id` with a fresh
//!   `module = { exports: {} }` and returns `module.exports`;
//! - the `require` each factory receives is a local one that turns the
//!   specifier text back into an id through that module's mapping.
//!
//! Nothing is memoized. Every `require` call runs the factory again, which
//! matches the graph handing out one id per import occurrence.

mod registry;
mod writer;

use log::debug;

pub use self::registry::{BundleRegistry, RegistryEntry};
use self::writer::CodeWriter;
use crate::types::ModuleId;

/// Knobs for the emitted text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Precede each registry entry with a `// <path>` comment
    pub annotate: bool,
}

/// Serialize a registry and the loader runtime into one script
pub fn emit(registry: &BundleRegistry, options: EmitOptions) -> String {
    let mut w = CodeWriter::new();

    w.line("(function (modules) {");
    w.indent();
    write_runtime(&mut w);
    w.line(&format!("require({});", ModuleId::ENTRY));
    w.dedent();
    w.line("})({");
    w.indent();
    for entry in registry.entries() {
        write_entry(&mut w, entry, options);
    }
    w.dedent();
    w.line("});");

    let bundle = w.finish();
    debug!(
        "Emitted bundle with {} modules ({} bytes)",
        registry.len(),
        bundle.len()
    );
    bundle
}

fn write_runtime(w: &mut CodeWriter) {
    w.line("function require(id) {");
    w.indent();
    w.line("const [factory, mapping] = modules[id];");
    w.line("function localRequire(specifier) {");
    w.indent();
    w.line("if (!Object.prototype.hasOwnProperty.call(mapping, specifier)) {");
    w.indent();
    w.line("throw new Error(\"Cannot find module '\" + specifier + \"'\");");
    w.dedent();
    w.line("}");
    w.line("return require(mapping[specifier]);");
    w.dedent();
    w.line("}");
    w.line("const module = { exports: {} };");
    w.line("factory(localRequire, module, module.exports);");
    w.line("return module.exports;");
    w.dedent();
    w.line("}");
}

fn write_entry(w: &mut CodeWriter, entry: &RegistryEntry, options: EmitOptions) {
    if options.annotate {
        w.line(&format!("// {}", comment_safe(&entry.source)));
    }
    w.line(&format!("{}: [", entry.id));
    w.indent();
    w.line("function (require, module, exports) {");
    w.verbatim(&entry.factory_body);
    w.line("},");
    w.line(&format!("{},", entry.mapping_literal()));
    w.dedent();
    w.line("],");
}

/// Replace every character that ends a JS line comment
fn comment_safe(text: &str) -> String {
    text.replace(['\n', '\r', '\u{2028}', '\u{2029}'], " ")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        graph::GraphBuilder,
        loader::MemoryLoader,
        transform::{Dialect, ModuleSyntaxTransformer},
        types::SpecifierMap,
    };

    const RUNTIME: &str = r#"(function (modules) {
  function require(id) {
    const [factory, mapping] = modules[id];
    function localRequire(specifier) {
      if (!Object.prototype.hasOwnProperty.call(mapping, specifier)) {
        throw new Error("Cannot find module '" + specifier + "'");
      }
      return require(mapping[specifier]);
    }
    const module = { exports: {} };
    factory(localRequire, module, module.exports);
    return module.exports;
  }
  require(0);
})({
"#;

    fn entry(id: u32, body: &str, mapping: &[(&str, u32)]) -> RegistryEntry {
        RegistryEntry {
            id: ModuleId::new(id),
            source: format!("m{id}.js"),
            factory_body: body.to_owned(),
            mapping: mapping
                .iter()
                .map(|(s, id)| ((*s).to_owned(), ModuleId::new(*id)))
                .collect::<SpecifierMap>(),
        }
    }

    #[test]
    fn test_emit_two_modules() {
        let registry: BundleRegistry = [
            entry(0, "const b = require(\"./b.js\");\nconsole.log(b);", &[("./b.js", 1)]),
            entry(1, "module.exports = 'b';", &[]),
        ]
        .into_iter()
        .collect();

        let expected = format!(
            "{RUNTIME}  0: [
    function (require, module, exports) {{
const b = require(\"./b.js\");
console.log(b);
    }},
    {{\"./b.js\":1}},
  ],
  1: [
    function (require, module, exports) {{
module.exports = 'b';
    }},
    {{}},
  ],
}});
"
        );
        assert_eq!(emit(&registry, EmitOptions::default()), expected);
    }

    #[test]
    fn test_annotations() {
        let registry: BundleRegistry = [entry(0, "", &[])].into_iter().collect();
        let bundle = emit(&registry, EmitOptions { annotate: true });
        assert!(bundle.contains("  // m0.js\n  0: [\n"));
        assert!(!emit(&registry, EmitOptions::default()).contains("// m0.js"));
    }

    #[test]
    fn test_annotation_cannot_break_out_of_comment() {
        let mut hostile = entry(0, "", &[]);
        hostile.source = "a\rb\u{2028}c\u{2029}d\ne.js".to_owned();
        let registry: BundleRegistry = [hostile].into_iter().collect();
        let bundle = emit(&registry, EmitOptions { annotate: true });
        assert!(bundle.contains("  // a b c d e.js\n  0: [\n"));
        assert!(!bundle.contains(['\r', '\u{2028}', '\u{2029}']));
    }

    #[test]
    fn test_runtime_bootstraps_entry_once() {
        let bundle = emit(&BundleRegistry::default(), EmitOptions::default());
        assert_eq!(bundle.matches("require(0);").count(), 1);
        assert!(bundle.starts_with(RUNTIME));
    }

    #[test]
    fn test_dependency_free_entry_embeds_code_unchanged() {
        let source = "const greeting = `hello\n  world`;\nconsole.log(greeting);";
        let graph = GraphBuilder::new(
            "/p",
            MemoryLoader::new().with_file("/p/solo.js", source),
            ModuleSyntaxTransformer::new(Dialect::Module),
        )
        .build("solo.js")
        .unwrap();
        let code = graph.entry().unwrap().code().to_owned();

        let registry = BundleRegistry::from_graph(&graph, Path::new("/p"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].factory_body, code);
        assert_eq!(registry.entries()[0].source, "solo.js");

        let bundle = emit(&registry, EmitOptions::default());
        let factory = format!("function (require, module, exports) {{\n{code}\n    }},");
        assert!(bundle.contains(&factory));
    }

    #[test]
    fn test_duplicate_file_emits_independent_factories() {
        let graph = GraphBuilder::new(
            "/p",
            MemoryLoader::new()
                .with_file("/p/a.js", "import x from './b.js';\nimport * as y from './lib/../b.js';")
                .with_file("/p/b.js", "export default 42;"),
            ModuleSyntaxTransformer::new(Dialect::Module),
        )
        .build("a.js")
        .unwrap();
        let registry = BundleRegistry::from_graph(&graph, Path::new("/p"));
        let bundle = emit(&registry, EmitOptions::default());

        assert!(bundle.contains(r#"{"./b.js":1,"./lib/../b.js":2},"#));
        assert!(bundle.contains("\n  1: [\n"));
        assert!(bundle.contains("\n  2: [\n"));
        assert_eq!(bundle.matches("exports.default = 42;").count(), 2);
    }
}
