use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};

use crate::params::ParamMap;

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern compiles"));

/// Everything `encodeURIComponent` escapes: all but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes one path segment the way browsers' `encodeURIComponent` does.
pub fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

/// Rewrites every `{name}` placeholder in `template` from `params`.
///
/// A matched key is percent-encoded into the path and removed from `params`,
/// so whatever is left over belongs in the query string. Each key is used at
/// most once: a second `{name}` referring to an already consumed key sees it
/// as absent. Absent keys collapse to an empty segment and leave `params`
/// untouched. A `Null` value is present and renders as `null`.
pub fn expand_template(template: &str, params: &mut ParamMap) -> String {
    PLACEHOLDER
        .replace_all(template, |captures: &Captures<'_>| {
            let key = &captures[1];
            params
                .remove(key)
                .map(|value| encode_segment(&value.to_path_string()))
                .unwrap_or_default()
        })
        .into_owned()
}

/// Placeholder names in `template`, left to right, duplicates included.
pub fn placeholder_names(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|captures| captures.get(1).map(|name| name.as_str()))
        .collect()
}
