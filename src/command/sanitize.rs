//! Character allow-list applied to untrusted text before parsing.

use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.:,]").expect("static pattern"));

/// Trim surrounding whitespace and drop every character outside
/// word characters, whitespace, `.`, `:` and `,`.
///
/// This is not validation; the grammar check happens afterwards.
pub fn sanitize(raw: &str) -> String {
    DISALLOWED.replace_all(raw.trim(), "").into_owned()
}
