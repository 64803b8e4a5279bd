use std::fs;
use std::path::Path;

use pulldown_cmark::{Event, Options, Parser, Tag};

use crate::config::MergeConfig;
use crate::error::Error;
use crate::paths::absolutize;
use crate::reference::has_scheme;
use crate::resolver::ResolvedFileSet;

/// Concatenate the resolved files into one Markdown document.
///
/// Only the root keeps its front matter, so the converter sees a single
/// metadata block. Image paths are made absolute against each file's own
/// directory when `rewrite_images` is set.
pub fn merge_files(files: &ResolvedFileSet, options: &MergeConfig) -> Result<String, Error> {
    let mut merged = String::new();

    for (index, path) in files.iter().enumerate() {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let body = if index == 0 {
            text.as_str()
        } else {
            strip_front_matter(&text)
        };

        if index > 0 {
            merged.push_str(&options.separator);
        }

        if options.rewrite_images {
            let dir = path.parent().unwrap_or(Path::new("/"));
            merged.push_str(&rewrite_image_paths(body, dir));
        } else {
            merged.push_str(body);
        }

        if !merged.ends_with('\n') {
            merged.push('\n');
        }
    }

    Ok(merged)
}

/// Strip YAML front matter from the beginning of markdown content
pub fn strip_front_matter(markdown: &str) -> &str {
    if !markdown.starts_with("---") {
        return markdown;
    }
    // Find the closing ---
    if let Some(end) = markdown[3..].find("\n---") {
        // Skip past the closing --- and any trailing newline
        let after = &markdown[3 + end + 4..];
        after.trim_start_matches(['\r', '\n'])
    } else {
        markdown
    }
}

/// Rewrite relative inline image destinations to absolute paths under `dir`.
///
/// Images are located with the Markdown parser so that code spans and
/// fenced blocks are left alone. Reference-style images keep their
/// definition untouched.
pub fn rewrite_image_paths(markdown: &str, dir: &Path) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut copied = 0;

    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES).into_offset_iter();
    for (event, range) in parser {
        let Event::Start(Tag::Image { dest_url, .. }) = event else {
            continue;
        };
        if range.start < copied || !is_relative(&dest_url) {
            continue;
        }
        let Some((start, end, bracketed)) = locate_destination(&markdown[range.clone()], &dest_url)
        else {
            continue;
        };

        let absolute = absolutize(Path::new(&*dest_url), dir);
        let absolute = absolute.display().to_string();

        out.push_str(&markdown[copied..range.start + start]);
        if !bracketed && absolute.contains(char::is_whitespace) {
            out.push('<');
            out.push_str(&absolute);
            out.push('>');
        } else {
            out.push_str(&absolute);
        }
        copied = range.start + end;
    }

    out.push_str(&markdown[copied..]);
    out
}

fn is_relative(dest: &str) -> bool {
    !dest.is_empty()
        && !dest.starts_with(['/', '\\', '#'])
        && !has_scheme(dest)
}

/// Byte span of `dest` inside an inline image's source text, and whether it
/// sits inside `<...>`.
fn locate_destination(source: &str, dest: &str) -> Option<(usize, usize, bool)> {
    let mut search_from = 0;
    while let Some(found) = source[search_from..].find("](") {
        let open = search_from + found + 2;
        let rest = &source[open..];
        let trimmed = rest.trim_start();
        let skipped = rest.len() - trimmed.len();

        let (bracketed, candidate) = match trimmed.strip_prefix('<') {
            Some(inner) => (true, inner),
            None => (false, trimmed),
        };
        if candidate.starts_with(dest) {
            let start = open + skipped + usize::from(bracketed);
            return Some((start, start + dest.len(), bracketed));
        }
        search_from = open;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn relative_image_becomes_absolute() {
        assert_eq!(
            rewrite_image_paths("Intro\n\n![arch](img/arch.png)\n", Path::new("/doc/guide")),
            "Intro\n\n![arch](/doc/guide/img/arch.png)\n"
        );
    }

    #[test]
    fn parent_segments_are_normalized() {
        assert_eq!(
            rewrite_image_paths("![x](../assets/x.svg \"Figure\")", Path::new("/doc/guide")),
            "![x](/doc/assets/x.svg \"Figure\")"
        );
    }

    #[test]
    fn urls_and_absolute_paths_are_kept() {
        let text = "![a](https://example.com/a.png) ![b](/srv/b.png) ![c](data:image/png;base64,AAAA)";
        assert_eq!(rewrite_image_paths(text, Path::new("/doc")), text);
    }

    #[test]
    fn images_in_code_are_kept() {
        let text = "```md\n![a](a.png)\n```\n\nInline `![b](b.png)` too.\n";
        assert_eq!(rewrite_image_paths(text, Path::new("/doc")), text);
    }

    #[test]
    fn several_images_on_one_line() {
        assert_eq!(
            rewrite_image_paths("![a](a.png) and ![b](<b c.png>)", Path::new("/doc")),
            "![a](/doc/a.png) and ![b](</doc/b c.png>)"
        );
    }

    #[test]
    fn alt_text_matching_the_path_is_not_touched() {
        assert_eq!(
            rewrite_image_paths("![a.png](a.png)", Path::new("/doc")),
            "![a.png](/doc/a.png)"
        );
    }

    #[test]
    fn image_inside_link_is_rewritten() {
        assert_eq!(
            rewrite_image_paths("[![badge](badge.svg)](https://ci.example.com)", Path::new("/doc")),
            "[![badge](/doc/badge.svg)](https://ci.example.com)"
        );
    }

    #[test]
    fn front_matter_is_stripped() {
        assert_eq!(
            strip_front_matter("---\ntitle: A\n---\n\n# A\n"),
            "# A\n"
        );
        assert_eq!(strip_front_matter("# No front matter\n"), "# No front matter\n");
        assert_eq!(strip_front_matter("---\nunterminated"), "---\nunterminated");
    }

    fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn merges_in_order_keeping_only_root_front_matter() {
        let tmp = TempDir::new().unwrap();
        let root = write(tmp.path(), "README.md", "---\ntitle: Book\n---\n# Book\n");
        let chapter = write(
            tmp.path(),
            "ch/one.md",
            "---\ntitle: One\n---\n# One\n\n![fig](fig.png)",
        );

        let mut files = ResolvedFileSet::new(&root);
        files.insert(&chapter);

        let merged = merge_files(&files, &MergeConfig::default()).unwrap();
        let figure = tmp.path().join("ch").join("fig.png");
        assert_eq!(
            merged,
            format!(
                "---\ntitle: Book\n---\n# Book\n\n\n# One\n\n![fig]({})\n",
                figure.display()
            )
        );
    }

    #[test]
    fn merge_without_rewriting_keeps_image_paths() {
        let tmp = TempDir::new().unwrap();
        let root = write(tmp.path(), "README.md", "![logo](logo.png)\n");
        let files = ResolvedFileSet::new(&root);
        let options = MergeConfig {
            rewrite_images: false,
            ..MergeConfig::default()
        };
        assert_eq!(merge_files(&files, &options).unwrap(), "![logo](logo.png)\n");
    }

    #[test]
    fn unreadable_file_fails_the_merge() {
        let tmp = TempDir::new().unwrap();
        let root = write(tmp.path(), "README.md", "# Root\n");
        let mut files = ResolvedFileSet::new(&root);
        files.insert(&tmp.path().join("vanished.md"));
        assert!(matches!(
            merge_files(&files, &MergeConfig::default()),
            Err(Error::Read { .. })
        ));
    }
}
