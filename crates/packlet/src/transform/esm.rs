//! Lowering of ECMAScript module syntax to CommonJS
//!
//! Imports become `require` calls bound to a per-statement temporary, local
//! exports become `exports.name = name;` assignments appended after the
//! module body, and re-exports read straight from the required module.

use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{IDENT, QUOTED_SPECIFIER, TransformError, TransformOutput, js_string, quoted_specifier};

static IMPORT_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^import(?:\s|[{*"'])"#).expect("import start pattern is valid"));

static EXPORT_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^export(?:\s|[{*])").expect("export start pattern is valid"));

static IMPORT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?s)^import\s*(?:(?P<clause>[^'";]*?)\s*from\s*)?{QUOTED_SPECIFIER}\s*;?(?P<rest>.*)$"#
    ))
    .expect("import declaration pattern is valid")
});

static IMPORT_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?s)^(?:(?P<default>{IDENT})(?:\s*,\s*|\s*$))?(?:\*\s*as\s+(?P<namespace>{IDENT})|\{{(?P<named>[^{{}}]*)\}})?$"
    ))
    .expect("import clause pattern is valid")
});

static NAMED_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?s)^(?P<imported>{IDENT})(?:\s+as\s+(?P<local>{IDENT}))?$"
    ))
    .expect("named binding pattern is valid")
});

static EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?s)^export\s*(?:(?P<star>\*)\s*(?:as\s+(?P<namespace>{IDENT})\s*)?|\{{(?P<named>[^{{}}]*)\}}\s*)from\s*{QUOTED_SPECIFIER}\s*;?(?P<rest>.*)$"
    ))
    .expect("re-export pattern is valid")
});

static EXPORT_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^export\s*\{(?P<named>[^{}]*)\}\s*(?P<semi>;)?(?P<rest>.*)$")
        .expect("export list pattern is valid")
});

static EXPORT_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^export\s+default\b\s*(?P<rest>.*)$").expect("export default pattern is valid")
});

static NAMED_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:(?:async\s+)?function\b\s*\*?\s*(?P<fname>{IDENT})|class\s+(?P<cname>{IDENT}))"
    ))
    .expect("declaration pattern is valid")
});

static EXPORT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^export\s+(?:(?:async\s+)?function\b\s*\*?\s*(?P<fname>{IDENT})|class\s+(?P<cname>{IDENT})|(?:const|let|var)\s+(?P<vname>{IDENT})\s*(?:[=,;]|$))"
    ))
    .expect("export declaration pattern is valid")
});

static DECLARATOR_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?P<name>{IDENT})")).expect("declarator pattern is valid")
});

fn starts_module_statement(text: &str) -> bool {
    IMPORT_START.is_match(text) || EXPORT_START.is_match(text)
}

/// Lower one ES module to CommonJS form
pub(super) fn lower_to_commonjs(source: &str) -> Result<TransformOutput, TransformError> {
    ModuleLowering::new(source).run()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImportBinding {
    Default(String),
    Namespace(String),
    Named { imported: String, local: String },
}

impl ImportBinding {
    fn declaration(&self, module: &str) -> String {
        match self {
            Self::Default(local) => format!(
                "const {local} = {module} && {module}.__esModule ? {module}.default : {module};"
            ),
            Self::Namespace(local) => format!("const {local} = {module};"),
            Self::Named { imported, local } => format!("const {local} = {module}.{imported};"),
        }
    }
}

struct ModuleLowering<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
    specifiers: Vec<String>,
    body: Vec<String>,
    /// (exported name, local binding) pairs assigned after the body runs
    deferred_exports: Vec<(String, String)>,
    has_exports: bool,
    temporaries: usize,
}

impl<'a> ModuleLowering<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
            cursor: 0,
            specifiers: Vec::new(),
            body: Vec::new(),
            deferred_exports: Vec::new(),
            has_exports: false,
            temporaries: 0,
        }
    }

    fn run(mut self) -> Result<TransformOutput, TransformError> {
        let mut in_block_comment = false;
        while let Some(&line) = self.lines.get(self.cursor) {
            let trimmed = line.trim_start();
            if in_block_comment || trimmed.starts_with("/*") {
                let search_from = if in_block_comment {
                    0
                } else {
                    line.len() - trimmed.len() + 2
                };
                match line[search_from..].find("*/") {
                    None => in_block_comment = true,
                    Some(offset) => {
                        in_block_comment = false;
                        let close = search_from + offset + 2;
                        // Code after the comment on the same line is read again
                        if starts_module_statement(line[close..].trim_start()) {
                            self.body.push(line[..close].to_owned());
                            self.lines[self.cursor] = &line[close..];
                            continue;
                        }
                    }
                }
            } else if IMPORT_START.is_match(trimmed) {
                self.lower_import()?;
                continue;
            } else if EXPORT_START.is_match(trimmed) {
                self.lower_export()?;
                continue;
            }
            self.body.push(line.to_owned());
            self.cursor += 1;
        }
        Ok(self.finish())
    }

    /// Consume lines from the cursor until `complete` accepts the statement
    ///
    /// `complete` sees the statement so far (leading indentation stripped)
    /// and the next unread line, if any.
    fn take_statement(
        &mut self,
        what: &str,
        complete: impl Fn(&str, Option<&str>) -> bool,
    ) -> Result<(String, String), TransformError> {
        let start = self.cursor;
        let first = self.lines[start];
        let indent = first[..first.len() - first.trim_start().len()].to_owned();
        let mut statement = String::new();
        for (offset, line) in self.lines[start..].iter().enumerate() {
            if offset == 0 {
                statement.push_str(line.trim_start());
            } else {
                statement.push('\n');
                statement.push_str(line);
            }
            let next = self.lines.get(start + offset + 1).copied();
            if complete(&statement, next) {
                self.cursor = start + offset + 1;
                return Ok((statement, indent));
            }
        }
        Err(TransformError::new(start + 1, format!("unterminated {what}")))
    }

    fn next_temporary(&mut self) -> String {
        let name = format!("_packlet_module{}", self.temporaries);
        self.temporaries += 1;
        name
    }

    /// Hand `rest` back to the main loop if it opens another module statement
    ///
    /// `rest` must be a suffix of the line just before the cursor.
    fn requeue_tail(&mut self, rest: &str) -> bool {
        let tail = rest.trim_start();
        if !starts_module_statement(tail) {
            return false;
        }
        self.cursor -= 1;
        let line = self.lines[self.cursor];
        self.lines[self.cursor] = &line[line.len() - tail.len()..];
        true
    }

    fn push_lowered(&mut self, indent: &str, code: &str, rest: &str) {
        if self.requeue_tail(rest) {
            self.body.push(format!("{indent}{code}"));
            return;
        }
        let rest = rest.trim();
        if rest.is_empty() {
            self.body.push(format!("{indent}{code}"));
        } else {
            self.body.push(format!("{indent}{code} {rest}"));
        }
    }

    fn lower_import(&mut self) -> Result<(), TransformError> {
        let line = self.cursor + 1;
        let (statement, indent) =
            self.take_statement("import declaration", |s, _| IMPORT_DECL.is_match(s))?;
        let caps = IMPORT_DECL
            .captures(&statement)
            .ok_or_else(|| TransformError::new(line, "malformed import declaration"))?;
        let specifier = quoted_specifier(&caps);
        if specifier.is_empty() {
            return Err(TransformError::new(line, "empty module specifier"));
        }
        let rest = caps.name("rest").map_or("", |m| m.as_str());
        let required = format!("require({})", js_string(&specifier));

        let code = match caps.name("clause").map(|m| m.as_str().trim()) {
            None => format!("{required};"),
            Some("") => {
                return Err(TransformError::new(line, "import declaration has no bindings"));
            }
            Some(clause) => {
                let bindings = parse_import_clause(clause).ok_or_else(|| {
                    TransformError::new(line, format!("malformed import clause `{clause}`"))
                })?;
                let module = self.next_temporary();
                let mut code = format!("const {module} = {required};");
                for binding in &bindings {
                    code.push(' ');
                    code.push_str(&binding.declaration(&module));
                }
                code
            }
        };

        self.specifiers.push(specifier);
        self.push_lowered(&indent, &code, rest);
        Ok(())
    }

    fn lower_export(&mut self) -> Result<(), TransformError> {
        let line_no = self.cursor + 1;
        let line = self.lines[self.cursor];
        let trimmed = line.trim_start();
        let indent = &line[..line.len() - trimmed.len()];
        self.has_exports = true;

        if EXPORT_DEFAULT.is_match(trimmed) {
            return self.lower_export_default(line_no);
        }

        if let Some(caps) = EXPORT_DECL.captures(trimmed) {
            if let Some(vname) = caps.name("vname") {
                return self.lower_exported_variables(trimmed, indent, vname.start(), line_no);
            }
            let name = caps
                .name("fname")
                .or_else(|| caps.name("cname"))
                .map_or("", |m| m.as_str())
                .to_owned();
            let declaration = trimmed["export".len()..].trim_start();
            self.body.push(format!("{indent}{declaration}"));
            self.deferred_exports.push((name.clone(), name));
            self.cursor += 1;
            return Ok(());
        }

        let bracketed = trimmed["export".len()..].trim_start();
        if !(bracketed.starts_with('{') || bracketed.starts_with('*')) {
            return Err(TransformError::new(line_no, "unsupported export statement"));
        }

        let (statement, indent) = self.take_statement("export statement", |s, next| {
            EXPORT_FROM.is_match(s)
                || EXPORT_LIST.captures(s).is_some_and(|caps| {
                    let rest = caps.name("rest").map_or("", |m| m.as_str()).trim();
                    let continues_with_from = caps.name("semi").is_none()
                        && (rest.starts_with("from")
                            || (rest.is_empty()
                                && next.is_some_and(|n| n.trim_start().starts_with("from"))));
                    !continues_with_from
                })
        })?;

        if let Some(caps) = EXPORT_FROM.captures(&statement) {
            return self.lower_reexport(&caps, &indent, line_no);
        }

        let caps = EXPORT_LIST
            .captures(&statement)
            .ok_or_else(|| TransformError::new(line_no, "malformed export list"))?;
        let named = parse_named_list(caps.name("named").map_or("", |m| m.as_str()))
            .ok_or_else(|| TransformError::new(line_no, "malformed export list"))?;
        for (local, exported) in named {
            self.deferred_exports.push((exported, local));
        }
        let rest = caps.name("rest").map_or("", |m| m.as_str());
        if !self.requeue_tail(rest) && !rest.trim().is_empty() {
            self.body.push(format!("{indent}{}", rest.trim()));
        }
        Ok(())
    }

    /// `export default <value>`; the value may start on a later line
    fn lower_export_default(&mut self, line_no: usize) -> Result<(), TransformError> {
        let (statement, indent) = self.take_statement("export default", |s, _| {
            EXPORT_DEFAULT
                .captures(s)
                .is_some_and(|caps| !caps["rest"].trim().is_empty())
        })?;
        let caps = EXPORT_DEFAULT
            .captures(&statement)
            .ok_or_else(|| TransformError::new(line_no, "malformed export default"))?;
        let rest = caps.name("rest").map_or("", |m| m.as_str());
        if rest.starts_with(';') {
            return Err(TransformError::new(line_no, "export default without a value"));
        }

        // `class extends Base {}` is an anonymous class expression
        let declared = NAMED_DECL
            .captures(rest)
            .and_then(|decl| decl.name("fname").or_else(|| decl.name("cname")))
            .map(|m| m.as_str())
            .filter(|name| *name != "extends");
        let statement = match declared {
            Some(name) => {
                self.deferred_exports
                    .push(("default".to_owned(), name.to_owned()));
                format!("{indent}{rest}")
            }
            None => format!("{indent}exports.default = {rest}"),
        };
        self.body.push(statement);
        Ok(())
    }

    /// `export const|let|var` with one or more declarators
    ///
    /// `start` is the offset in `trimmed` of the first declared name.
    fn lower_exported_variables(
        &mut self,
        trimmed: &'a str,
        indent: &str,
        start: usize,
        line_no: usize,
    ) -> Result<(), TransformError> {
        let first_line = &trimmed[start..];
        let mut text = first_line.to_owned();
        let mut following = self.lines[self.cursor + 1..].iter();
        let list = loop {
            match scan_declarators(&text) {
                DeclaratorScan::Complete(list) => break list,
                DeclaratorScan::Unsupported => {
                    return Err(TransformError::new(line_no, "unsupported export statement"));
                }
                DeclaratorScan::Incomplete => {
                    let Some(next) = following.next() else {
                        return Err(TransformError::new(line_no, "unterminated export declaration"));
                    };
                    text.push('\n');
                    text.push_str(next);
                }
            }
        };

        let declaration = trimmed["export".len()..].trim_start();
        self.cursor += 1;
        if list.end < first_line.len() && self.requeue_tail(&first_line[list.end..]) {
            let kept = &declaration[..declaration.len() - (first_line.len() - list.end)];
            self.body.push(format!("{indent}{kept}"));
        } else {
            self.body.push(format!("{indent}{declaration}"));
        }
        for name in list.names {
            self.deferred_exports.push((name.clone(), name));
        }
        Ok(())
    }

    fn lower_reexport(
        &mut self,
        caps: &Captures<'_>,
        indent: &str,
        line_no: usize,
    ) -> Result<(), TransformError> {
        let specifier = quoted_specifier(caps);
        if specifier.is_empty() {
            return Err(TransformError::new(line_no, "empty module specifier"));
        }
        let required = format!("require({})", js_string(&specifier));
        let rest = caps.name("rest").map_or("", |m| m.as_str());

        let code = if let Some(namespace) = caps.name("namespace") {
            format!("exports.{} = {required};", namespace.as_str())
        } else if caps.name("star").is_some() {
            let module = self.next_temporary();
            format!(
                "const {module} = {required}; Object.keys({module}).forEach(function (key) {{ if \
                 (key !== \"default\" && !Object.prototype.hasOwnProperty.call(exports, key)) \
                 exports[key] = {module}[key]; }});"
            )
        } else {
            let named = parse_named_list(caps.name("named").map_or("", |m| m.as_str()))
                .ok_or_else(|| TransformError::new(line_no, "malformed re-export list"))?;
            let module = self.next_temporary();
            let mut code = format!("const {module} = {required};");
            for (imported, exported) in named {
                let _ = write!(code, " exports.{exported} = {module}.{imported};");
            }
            code
        };

        self.specifiers.push(specifier);
        self.push_lowered(indent, &code, rest);
        Ok(())
    }

    fn finish(self) -> TransformOutput {
        let mut code = String::from("\"use strict\";\n");
        if self.has_exports {
            code.push_str("Object.defineProperty(exports, \"__esModule\", { value: true });\n");
        }
        code.push_str(&self.body.join("\n"));
        for (exported, local) in &self.deferred_exports {
            let _ = write!(code, "\nexports.{exported} = {local};");
        }
        TransformOutput {
            specifiers: self.specifiers,
            code,
        }
    }
}

/// Names bound by a declarator list and where the list ends
#[derive(Debug, PartialEq, Eq)]
struct DeclaratorList {
    names: Vec<String>,
    /// Byte offset just past the terminating `;`, or of the line break or
    /// end of text that closes the list
    end: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum DeclaratorScan {
    Complete(DeclaratorList),
    /// The list continues past the end of the text
    Incomplete,
    /// A destructuring pattern or something else that is not a plain name
    Unsupported,
}

/// Split `a = f(1, 2), b, c = [3]` into its declared names
///
/// Brackets, string literals and comments are skipped. A line break at the
/// top level ends the list unless the text before it asks for more.
fn scan_declarators(text: &str) -> DeclaratorScan {
    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut expect_name = true;
    let mut continues = false;
    let mut pos = 0;

    while let Some(ch) = text[pos..].chars().next() {
        let at = pos;
        pos += ch.len_utf8();

        if let Some(open) = quote {
            if ch == '\\' {
                pos += text[pos..].chars().next().map_or(0, char::len_utf8);
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        if ch.is_whitespace() {
            if ch == '\n' && depth == 0 && !expect_name && !continues {
                return DeclaratorScan::Complete(DeclaratorList { names, end: at });
            }
            continue;
        }
        if text[at..].starts_with("//") {
            pos = text[at..].find('\n').map_or(text.len(), |n| at + n);
            continue;
        }
        if text[at..].starts_with("/*") {
            match text[at + 2..].find("*/") {
                Some(n) => pos = at + 2 + n + 2,
                None => return DeclaratorScan::Incomplete,
            }
            continue;
        }
        if expect_name {
            let Some(caps) = DECLARATOR_NAME.captures(&text[at..]) else {
                return DeclaratorScan::Unsupported;
            };
            let name = &caps["name"];
            names.push(name.to_owned());
            pos = at + name.len();
            expect_name = false;
            continues = false;
            continue;
        }

        continues = false;
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => expect_name = true,
            ';' if depth == 0 => {
                return DeclaratorScan::Complete(DeclaratorList { names, end: pos });
            }
            '=' | '+' | '-' | '*' | '/' | '%' | '?' | ':' | '&' | '|' | '.' | '<' | '>'
            | '!' | '^' => continues = true,
            _ => {}
        }
    }

    if quote.is_none() && depth == 0 && !expect_name && !continues {
        DeclaratorScan::Complete(DeclaratorList {
            names,
            end: text.len(),
        })
    } else {
        DeclaratorScan::Incomplete
    }
}

fn parse_import_clause(clause: &str) -> Option<Vec<ImportBinding>> {
    let caps = IMPORT_CLAUSE.captures(clause)?;
    let mut bindings = Vec::new();
    if let Some(default) = caps.name("default") {
        bindings.push(ImportBinding::Default(default.as_str().to_owned()));
    }
    if let Some(namespace) = caps.name("namespace") {
        bindings.push(ImportBinding::Namespace(namespace.as_str().to_owned()));
    }
    if let Some(named) = caps.name("named") {
        bindings.extend(
            parse_named_list(named.as_str())?
                .into_iter()
                .map(|(imported, local)| ImportBinding::Named { imported, local }),
        );
    } else if bindings.is_empty() {
        return None;
    }
    Some(bindings)
}

/// Parse `a, b as c` into (source name, bound name) pairs
fn parse_named_list(list: &str) -> Option<Vec<(String, String)>> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let caps = NAMED_ITEM.captures(item)?;
            let imported = caps["imported"].to_owned();
            let local = caps
                .name("local")
                .map_or_else(|| imported.clone(), |m| m.as_str().to_owned());
            Some((imported, local))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lower(source: &str) -> TransformOutput {
        lower_to_commonjs(source).unwrap()
    }

    #[test]
    fn test_module_without_imports_is_only_prefixed() {
        let output = lower("const x = 1;\nconsole.log(x);");
        assert!(output.specifiers.is_empty());
        assert_eq!(output.code, "\"use strict\";\nconst x = 1;\nconsole.log(x);");
    }

    #[test]
    fn test_import_forms() {
        let output = lower(
            r#"import message from './message.js';
import { name, version as v } from "./meta.js";
import * as util from './util.js';
import './polyfill.js';
import def, { other } from './mixed.js';"#,
        );
        assert_eq!(
            output.specifiers,
            vec![
                "./message.js",
                "./meta.js",
                "./util.js",
                "./polyfill.js",
                "./mixed.js"
            ]
        );
        let expected = [
            "\"use strict\";",
            "const _packlet_module0 = require(\"./message.js\"); const message = \
             _packlet_module0 && _packlet_module0.__esModule ? _packlet_module0.default : \
             _packlet_module0;",
            "const _packlet_module1 = require(\"./meta.js\"); const name = \
             _packlet_module1.name; const v = _packlet_module1.version;",
            "const _packlet_module2 = require(\"./util.js\"); const util = _packlet_module2;",
            "require(\"./polyfill.js\");",
            "const _packlet_module3 = require(\"./mixed.js\"); const def = _packlet_module3 && \
             _packlet_module3.__esModule ? _packlet_module3.default : _packlet_module3; const \
             other = _packlet_module3.other;",
        ]
        .join("\n");
        assert_eq!(output.code, expected);
    }

    #[test]
    fn test_multiline_import_and_trailing_code() {
        let output = lower("import {\n  a,\n  b as c,\n} from './ab.js'; run(a, c);\nafter();");
        assert_eq!(output.specifiers, vec!["./ab.js"]);
        assert_eq!(
            output.code,
            "\"use strict\";\nconst _packlet_module0 = require(\"./ab.js\"); const a = \
             _packlet_module0.a; const c = _packlet_module0.b; run(a, c);\nafter();"
        );
    }

    #[test]
    fn test_duplicate_imports_are_preserved() {
        let output = lower("import { a } from './b.js';\nimport { b } from './b.js';");
        assert_eq!(output.specifiers, vec!["./b.js", "./b.js"]);
    }

    #[test]
    fn test_exports_are_deferred_to_the_end() {
        let output = lower(
            "export const answer = 42;\nexport function greet(who) {\n  return `hi ${who}`;\n}\nconst hidden = 1;\nexport { hidden as visible };\nexport default greet;",
        );
        assert!(output.specifiers.is_empty());
        let expected = [
            "\"use strict\";",
            "Object.defineProperty(exports, \"__esModule\", { value: true });",
            "const answer = 42;",
            "function greet(who) {",
            "  return `hi ${who}`;",
            "}",
            "const hidden = 1;",
            "exports.default = greet;",
            "exports.answer = answer;",
            "exports.greet = greet;",
            "exports.visible = hidden;",
        ]
        .join("\n");
        assert_eq!(output.code, expected);
    }

    #[test]
    fn test_export_default_declaration_keeps_name() {
        let output = lower("export default class Widget {}\n");
        assert_eq!(
            output.code,
            "\"use strict\";\nObject.defineProperty(exports, \"__esModule\", { value: true \
             });\nclass Widget {}\nexports.default = Widget;"
        );
    }

    #[test]
    fn test_reexports_are_dependencies() {
        let output = lower(
            "export { a, b as c } from './ab.js';\nexport * from './all.js';\nexport * as ns from './ns.js';\nimport x from './x.js';",
        );
        assert_eq!(
            output.specifiers,
            vec!["./ab.js", "./all.js", "./ns.js", "./x.js"]
        );
        assert!(output.code.contains(
            "const _packlet_module0 = require(\"./ab.js\"); exports.a = _packlet_module0.a; \
             exports.c = _packlet_module0.b;"
        ));
        assert!(output.code.contains("exports.ns = require(\"./ns.js\");"));
        assert!(output.code.contains("Object.keys(_packlet_module1).forEach"));
    }

    #[test]
    fn test_export_list_continued_on_next_line() {
        let output = lower("export { a }\n  from './a.js';");
        assert_eq!(output.specifiers, vec!["./a.js"]);
    }

    #[test]
    fn test_import_inside_block_comment_is_ignored() {
        let output = lower("/*\nimport x from './x.js';\n*/\nimport('./lazy.js');");
        assert!(output.specifiers.is_empty());
        assert!(output.code.contains("import x from './x.js';"));
        assert!(output.code.contains("import('./lazy.js');"));
    }

    #[test]
    fn test_unterminated_import_fails() {
        let err = lower_to_commonjs("const a = 1;\nimport { a, b\nconsole.log(a);").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.message, "unterminated import declaration");
    }

    #[test]
    fn test_malformed_clause_fails() {
        let err = lower_to_commonjs("import a b from './a.js';").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.starts_with("malformed import clause"));
    }

    #[test]
    fn test_unsupported_export_fails() {
        let err = lower_to_commonjs("export const { a } = obj;").unwrap_err();
        assert_eq!(err, TransformError::new(1, "unsupported export statement"));
        let err = lower_to_commonjs("export const a = 1, { b } = obj;").unwrap_err();
        assert_eq!(err, TransformError::new(1, "unsupported export statement"));
    }

    #[test]
    fn test_export_default_anonymous_class_extends() {
        let output = lower("export default class extends Base {}");
        assert_eq!(
            output.code,
            "\"use strict\";\nObject.defineProperty(exports, \"__esModule\", { value: true \
             });\nexports.default = class extends Base {}"
        );
    }

    #[test]
    fn test_every_declarator_is_exported() {
        let output = lower("export const a = 1, b = f(2, 3);\nexport let c, d;");
        let expected = [
            "\"use strict\";",
            "Object.defineProperty(exports, \"__esModule\", { value: true });",
            "const a = 1, b = f(2, 3);",
            "let c, d;",
            "exports.a = a;",
            "exports.b = b;",
            "exports.c = c;",
            "exports.d = d;",
        ]
        .join("\n");
        assert_eq!(output.code, expected);
    }

    #[test]
    fn test_multiline_exported_initializer() {
        let output = lower(
            "export const config = {\n  a: 1,\n  b: [2, 3],\n}, label = 'x';\nexport var after = 4;",
        );
        assert_eq!(
            output.code,
            "\"use strict\";\nObject.defineProperty(exports, \"__esModule\", { value: true \
             });\nconst config = {\n  a: 1,\n  b: [2, 3],\n}, label = 'x';\nvar after = \
             4;\nexports.config = config;\nexports.label = label;\nexports.after = after;"
        );
        let err = lower_to_commonjs("export const pending =").unwrap_err();
        assert_eq!(err, TransformError::new(1, "unterminated export declaration"));
    }

    #[test]
    fn test_statements_sharing_a_line_are_all_lowered() {
        let output = lower("import a from './a.js'; import b from './b.js';");
        assert_eq!(output.specifiers, vec!["./a.js", "./b.js"]);
        assert_eq!(
            output.code,
            "\"use strict\";\nconst _packlet_module0 = require(\"./a.js\"); const a = \
             _packlet_module0 && _packlet_module0.__esModule ? _packlet_module0.default : \
             _packlet_module0;\nconst _packlet_module1 = require(\"./b.js\"); const b = \
             _packlet_module1 && _packlet_module1.__esModule ? _packlet_module1.default : \
             _packlet_module1;"
        );

        let output = lower("export const x = 1; import { y } from './y.js'; export { y };");
        assert_eq!(output.specifiers, vec!["./y.js"]);
        assert_eq!(
            output.code,
            "\"use strict\";\nObject.defineProperty(exports, \"__esModule\", { value: true \
             });\nconst x = 1;\nconst _packlet_module0 = require(\"./y.js\"); const y = \
             _packlet_module0.y;\nexports.x = x;\nexports.y = y;"
        );

        let output = lower("export { a }; export * from './all.js'; const a = 1;");
        assert_eq!(output.specifiers, vec!["./all.js"]);
        assert!(!output.code.contains("export "));
        assert!(output.code.contains("}); const a = 1;"));
    }

    #[test]
    fn test_export_default_value_on_next_line() {
        let output = lower("export default\n\n  42;");
        assert_eq!(
            output.code,
            "\"use strict\";\nObject.defineProperty(exports, \"__esModule\", { value: true \
             });\nexports.default = 42;"
        );
        let err = lower_to_commonjs("export default;").unwrap_err();
        assert_eq!(err, TransformError::new(1, "export default without a value"));
        let err = lower_to_commonjs("export default").unwrap_err();
        assert_eq!(err, TransformError::new(1, "unterminated export default"));
    }

    #[test]
    fn test_import_after_closing_block_comment() {
        let output = lower("/* header\n*/ import x from './x.js';\nuse(x);");
        assert_eq!(output.specifiers, vec!["./x.js"]);
        assert!(!output.code.contains("import "));
        assert!(output.code.starts_with("\"use strict\";\n/* header\n*/\n"));
        assert!(output.code.ends_with("_packlet_module0;\nuse(x);"));

        let output = lower("/* banner */ import './setup.js';");
        assert_eq!(output.specifiers, vec!["./setup.js"]);
        assert_eq!(
            output.code,
            "\"use strict\";\n/* banner */\n require(\"./setup.js\");"
        );
    }
}
