//! CommonJS dependency scanning

use once_cell::sync::Lazy;
use regex::Regex;

use super::{QUOTED_SPECIFIER, TransformOutput, quoted_specifier};

/// `require("...")` with a literal argument, not preceded by a member access
static REQUIRE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:^|[^.\w$])require\s*\(\s*{QUOTED_SPECIFIER}\s*\)"
    ))
    .expect("require pattern is valid")
});

/// Collect every literal `require` call; the code itself is already in the
/// shape the bundle runtime expects
pub(super) fn scan(source: &str) -> TransformOutput {
    let specifiers = source
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .flat_map(|line| REQUIRE_CALL.captures_iter(line).map(|caps| quoted_specifier(&caps)))
        .collect();

    TransformOutput {
        specifiers,
        code: source.to_owned(),
    }
}
