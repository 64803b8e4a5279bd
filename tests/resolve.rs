use std::fs;
use std::path::{Path, PathBuf};

use mdbind::{DEFAULT_SECTION_MARKER, ReferenceGrammar, RootDocument, normalize, resolve, resolve_files};
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    normalize(&path)
}

#[test]
fn readme_with_link_and_section_marker() {
    let tmp = TempDir::new().unwrap();
    let doc = tmp.path().join("doc");
    let readme = write(&doc, "README.md", "# Doc\n\n[intro](intro.md)\n\n➢ 1-appendix\n");
    let intro = write(&doc, "intro.md", "# Intro\n");
    let b = write(&doc, "1-appendix/b.md", "# B\n");
    let a = write(&doc, "1-appendix/a.md", "# A\n");

    let files = resolve_files(&readme).unwrap();
    assert_eq!(files.into_vec(), vec![readme, intro, a, b]);
}

#[test]
fn root_is_first_even_when_referenced_late() {
    let tmp = TempDir::new().unwrap();
    let chapter = write(tmp.path(), "chapter.md", "# Chapter\n");
    let readme = write(
        tmp.path(),
        "README.md",
        "[chapter](chapter.md)\n\n[home](README.md)\n",
    );

    let files = resolve_files(&readme).unwrap();
    assert_eq!(files.root(), readme.as_path());
    assert_eq!(files.into_vec(), vec![readme, chapter]);
}

#[test]
fn broken_and_foreign_links_degrade_to_omission() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "data.txt", "plain\n");
    let readme = write(
        tmp.path(),
        "README.md",
        "[data](data.txt)\n[gone](gone.md)\n[site](https://example.com/index.md)\n➢ 2-missing\n",
    );

    let document = RootDocument::read(&readme).unwrap();
    let grammar = ReferenceGrammar::new(DEFAULT_SECTION_MARKER).unwrap();
    let resolution = resolve(&document, None, &grammar);

    assert_eq!(resolution.files.into_vec(), vec![readme]);
    assert_eq!(resolution.unresolved.len(), 2);
}

#[test]
fn every_resolved_path_exists() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "guide/one.md", "# One\n");
    write(tmp.path(), "guide/deeper/two.md", "# Two\n");
    write(tmp.path(), "guide/deeper/image.png", "");
    let readme = write(
        tmp.path(),
        "README.md",
        "➢ guide\n[one again](guide/one.md)\n[missing](guide/three.md)\n",
    );

    let files = resolve_files(&readme).unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(Path::is_file));
}

#[test]
fn link_wrapped_around_an_image_pulls_in_its_target() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "cover.png", "");
    let chapter = write(tmp.path(), "chapter1.md", "# One\n");
    let readme = write(
        tmp.path(),
        "README.md",
        "[![cover](cover.png)](chapter1.md)\n",
    );

    let files = resolve_files(&readme).unwrap();
    assert_eq!(files.into_vec(), vec![readme, chapter]);
}
