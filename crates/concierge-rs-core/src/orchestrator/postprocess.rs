//! Cosmetic normalization of the delivered response text.

use log::warn;
use regex::Regex;
use std::sync::LazyLock;

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|err| warn!("post-processing pattern rejected (pattern={pattern}, error={err})"))
        .ok()
}

// Three or more line breaks, allowing whitespace-only lines between them.
static BLANK_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"\n(?:[ \t]*\n){2,}"));
static ORDERED_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?m)^([ \t]*)\d+\. "));

/// Collapse runs of blank lines to a single blank line.
pub(crate) fn collapse_blank_lines(text: &str) -> String {
    match BLANK_RUN.as_ref() {
        Some(pattern) => pattern.replace_all(text, "\n\n").into_owned(),
        None => text.to_string(),
    }
}

/// Rewrite `1. ` style line prefixes to `- ` bullets, keeping indentation.
pub(crate) fn bulletize_ordered_lists(text: &str) -> String {
    match ORDERED_MARKER.as_ref() {
        Some(pattern) => pattern.replace_all(text, "${1}- ").into_owned(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_runs_collapse_to_one_blank_line() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n  \n\t\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb\nc"), "a\n\nb\nc");
    }

    #[test]
    fn ordered_markers_become_bullets() {
        let text = "Options:\n1. Trail Boot\n  2. City Boot\nOrder 3. is late";
        assert_eq!(
            bulletize_ordered_lists(text),
            "Options:\n- Trail Boot\n  - City Boot\nOrder 3. is late"
        );
    }
}
