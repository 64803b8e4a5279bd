//! Reference extraction from a root document.
//!
//! Links and section markers are matched by one combined pattern in a single
//! pass. Matches never overlap and the leftmost one wins, so text covered by a
//! link (including its label) is never reread as a marker, and vice versa.

use std::fmt;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::error::Error;

pub const DEFAULT_SECTION_MARKER: &str = "➢";

/// A file reference found in a root document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `[label](path)`: the target with fragment and query removed.
    Link { target: String },
    /// `➢ 1-appendix`: every Markdown file under the named subdirectory.
    Section { dir: String },
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Link { target } => write!(f, "link `{}`", target),
            Reference::Section { dir } => write!(f, "section marker `{}`", dir),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceGrammar {
    pattern: Regex,
}

impl ReferenceGrammar {
    /// Build the combined pattern for the given section marker glyph.
    pub fn new(marker: &str) -> Result<Self, Error> {
        if marker.trim().is_empty() {
            return Err(Error::Config("section marker must not be empty".to_string()));
        }

        // Images are matched so their `[alt](src)` is not taken for a link.
        // A link whose label is an image comes first so the outer target wins.
        let source = format!(
            r#"\[!\[[^\]\n]*\]\([^)\n]*\)\]\((?P<wrapped><[^>\n]+>|[^)\s]+)(?:\s+"[^"\n]*")?\)|(?P<image>!)?\[[^\]\n]*\]\((?P<link><[^>\n]+>|[^)\s]+)(?:\s+"[^"\n]*")?\)|{}[ \t]*(?P<section>\w[\w.\-]*(?:/\w[\w.\-]*)*)"#,
            regex::escape(marker.trim())
        );
        let pattern = Regex::new(&source).map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self { pattern })
    }

    /// Scan `text` and return references in document order.
    pub fn scan(&self, text: &str) -> Vec<Reference> {
        let mut refs = Vec::new();

        for caps in self.pattern.captures_iter(text) {
            if let Some(link) = caps.name("wrapped").or_else(|| caps.name("link")) {
                if caps.name("image").is_some() {
                    continue;
                }
                if let Some(target) = clean_link_target(link.as_str()) {
                    refs.push(Reference::Link { target });
                }
            } else if let Some(section) = caps.name("section") {
                // A marker at the end of a sentence should not swallow the period
                let dir = section.as_str().trim_end_matches('.');
                if !dir.is_empty() {
                    refs.push(Reference::Section {
                        dir: dir.to_string(),
                    });
                }
            }
        }

        refs
    }
}

/// Turn a raw link destination into a filesystem-relative target.
///
/// Returns `None` for URLs, `mailto:` and friends, and in-page anchors.
fn clean_link_target(raw: &str) -> Option<String> {
    let raw = raw
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(raw);

    if has_scheme(raw) {
        return None;
    }

    let path = raw.split(['#', '?']).next().unwrap_or_default();
    if path.is_empty() {
        return None;
    }

    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string());
    Some(decoded)
}

/// `scheme:` per RFC 3986. Single letters are left alone so `C:\docs` stays a path.
pub(crate) fn has_scheme(target: &str) -> bool {
    match target.split_once(':') {
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> ReferenceGrammar {
        ReferenceGrammar::new(DEFAULT_SECTION_MARKER).unwrap()
    }

    fn link(target: &str) -> Reference {
        Reference::Link {
            target: target.to_string(),
        }
    }

    fn section(dir: &str) -> Reference {
        Reference::Section {
            dir: dir.to_string(),
        }
    }

    #[test]
    fn links_and_markers_in_document_order() {
        let text = "# Guide\n\nSee [intro](intro.md).\n\n➢ 1-appendix\n\n[setup](docs/setup.md)\n";
        assert_eq!(
            grammar().scan(text),
            vec![link("intro.md"), section("1-appendix"), link("docs/setup.md")]
        );
    }

    #[test]
    fn plain_text_has_no_references() {
        assert!(grammar()
            .scan("Just words, [brackets] and (parens).")
            .is_empty());
    }

    #[test]
    fn images_are_not_links() {
        assert_eq!(
            grammar().scan("![diagram](img/arch.md) and [a](a.md)"),
            vec![link("a.md")]
        );
    }

    #[test]
    fn image_wrapped_link_yields_the_outer_target() {
        let scanner = grammar();
        assert_eq!(
            scanner.scan("[![cover](cover.png)](chapter1.md)"),
            vec![link("chapter1.md")]
        );
        assert_eq!(
            scanner.scan(r#"[![badge](b.svg "CI")](<ci notes.md> "Status") ![x](x.md)"#),
            vec![link("ci notes.md")]
        );
    }

    #[test]
    fn link_wins_over_marker_inside_its_label() {
        assert_eq!(
            grammar().scan("[➢ appendix](appendix.md)"),
            vec![link("appendix.md")]
        );
    }

    #[test]
    fn marker_and_link_on_one_line_are_each_read_once() {
        assert_eq!(
            grammar().scan("➢ 2-reference see [intro](intro.md)"),
            vec![section("2-reference"), link("intro.md")]
        );
    }

    #[test]
    fn marker_followed_by_link_yields_only_the_link() {
        // No directory token directly after the glyph.
        assert_eq!(
            grammar().scan("➢ [intro](intro.md)"),
            vec![link("intro.md")]
        );
    }

    #[test]
    fn marker_token_variants() {
        let scanner = grammar();
        assert_eq!(scanner.scan("➢1-appendix"), vec![section("1-appendix")]);
        assert_eq!(scanner.scan("- ➢ guides/advanced."), vec![section("guides/advanced")]);
        assert!(scanner.scan("➢ ").is_empty());
    }

    #[test]
    fn custom_marker_glyph_is_escaped() {
        let grammar = ReferenceGrammar::new("*").unwrap();
        assert_eq!(grammar.scan("* chapters"), vec![section("chapters")]);
        assert!(grammar.scan("➢ chapters").is_empty());
    }

    #[test]
    fn empty_marker_is_rejected() {
        assert!(matches!(ReferenceGrammar::new("  "), Err(Error::Config(_))));
    }

    #[test]
    fn link_targets_are_cleaned() {
        let scanner = grammar();
        assert_eq!(
            scanner.scan("[a](guide.md#install) [b](<my notes.md>) [c](my%20file.md?raw=1)"),
            vec![link("guide.md"), link("my notes.md"), link("my file.md")]
        );
    }

    #[test]
    fn link_titles_are_ignored() {
        assert_eq!(
            grammar().scan(r#"[a](a.md "The A chapter")"#),
            vec![link("a.md")]
        );
    }

    #[test]
    fn urls_and_anchors_are_skipped() {
        let scanner = grammar();
        assert!(scanner
            .scan("[web](https://example.com/x.md) [mail](mailto:a@b.c) [top](#top)")
            .is_empty());
    }
}
