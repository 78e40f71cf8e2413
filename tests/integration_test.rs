//! Integration tests for the wikicorpus splitting and extraction pipeline.
//!
//! Tests cover the data flow from an on-disk dump (plain or BZ2-compressed)
//! through splitting, classification and the two output pipelines:
//!
//! - **Splitter Tests** -- fragments read from files, split boundaries
//! - **Classifier Tests** -- page types over a realistic sample dump
//! - **Plain-text Pipeline** -- part files, content formats, counters.json
//! - **Redirect Pipeline** -- redirect rows, missing targets
//!
//! All tests share the `sample_xml()` fixture: a small dump with articles, a
//! stub, redirects, a disambiguation page, an empty page, special pages and one
//! malformed record.

use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use wikicorpus::classify::PageClassifier;
use wikicorpus::extract::{run_plain_text, run_redirects, JobConfig};
use wikicorpus::language;
use wikicorpus::models::{ContentFormat, PageType, SplitRange};
use wikicorpus::splitter::{open_split, PageSplitter};
use wikicorpus::stats::CounterSnapshot;

fn sample_xml() -> &'static str {
    r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/" version="0.10">
  <siteinfo>
    <sitename>Wikipedia</sitename>
  </siteinfo>
  <page>
    <title>Rust (programming language)</title>
    <ns>0</ns>
    <id>1</id>
    <revision>
      <id>100</id>
      <contributor><username>Alice</username><id>77</id></contributor>
      <text bytes="120" xml:space="preserve">'''Rust''' is a [[systems programming|systems]] language.
== History ==
It was announced in 2010.&lt;ref&gt;Announcement&lt;/ref&gt;
[[Category:Programming languages]]</text>
    </revision>
  </page>
  <page>
    <title>Tiny village</title>
    <ns>0</ns>
    <id>2</id>
    <revision>
      <id>200</id>
      <text xml:space="preserve">A tiny village. {{Geo-stub}}</text>
    </revision>
  </page>
  <page>
    <title>Rust</title>
    <ns>0</ns>
    <id>3</id>
    <redirect title="Rust (programming language)" />
    <revision>
      <id>300</id>
      <text xml:space="preserve">#REDIRECT [[Rust (programming language)]]</text>
    </revision>
  </page>
  <page>
    <title>Rustlang</title>
    <ns>0</ns>
    <id>4</id>
    <revision>
      <id>400</id>
      <text xml:space="preserve">#redirect [[Rust (programming language)]]</text>
    </revision>
  </page>
  <page>
    <title>Mercury</title>
    <ns>0</ns>
    <id>5</id>
    <revision>
      <id>500</id>
      <text xml:space="preserve">'''Mercury''' may refer to:
* [[Mercury (planet)]]
{{disambiguation}}</text>
    </revision>
  </page>
  <page>
    <title>Blank</title>
    <ns>0</ns>
    <id>6</id>
    <revision>
      <id>600</id>
      <text bytes="0" xml:space="preserve" />
    </revision>
  </page>
  <page>
    <title>Talk:Rust (programming language)</title>
    <ns>1</ns>
    <id>7</id>
    <revision>
      <id>700</id>
      <text xml:space="preserve">Discussion.</text>
    </revision>
  </page>
  <page>
    <ns>0</ns>
    <id>8</id>
    <revision>
      <text xml:space="preserve">Missing title.</text>
    </revision>
  </page>
  <page>
    <title>AT&amp;T</title>
    <ns>0</ns>
    <id>9</id>
    <revision>
      <id>900</id>
      <text xml:space="preserve">AT&amp;T is a company.</text>
    </revision>
  </page>
</mediawiki>
"#
}

fn create_xml(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(xml.as_bytes()).unwrap();
    tmp.flush().unwrap();
    tmp
}

/// BZ2 fixture; the `.bz2` suffix selects the decompressing reader.
fn create_bz2_xml(xml: &str) -> NamedTempFile {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(xml.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut tmp = tempfile::Builder::new().suffix(".xml.bz2").tempfile().unwrap();
    tmp.write_all(&compressed).unwrap();
    tmp.flush().unwrap();
    tmp
}

/// Multistream BZ2 fixture: each chunk is compressed as its own stream and the
/// streams are concatenated, as in `pages-articles-multistream` dumps.
fn create_multistream_bz2(chunks: &[&str]) -> NamedTempFile {
    let mut compressed = Vec::new();
    for chunk in chunks {
        let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(chunk.as_bytes()).unwrap();
        compressed.extend(encoder.finish().unwrap());
    }

    let mut tmp = tempfile::Builder::new().suffix(".xml.bz2").tempfile().unwrap();
    tmp.write_all(&compressed).unwrap();
    tmp.flush().unwrap();
    tmp
}

fn read_parts(dir: &Path) -> Vec<String> {
    let mut parts: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("part-"))
        })
        .collect();
    parts.sort();
    parts
        .iter()
        .flat_map(|p| {
            fs::read_to_string(p)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn expected_counters() -> CounterSnapshot {
    CounterSnapshot {
        total: 9,
        redirect: 2,
        disambiguation: 1,
        empty: 1,
        article: 3,
        stub: 1,
        other: 2,
        malformed: 1,
        redirect_target_missing: 0,
    }
}

// ---------------------------------------------------------------------------
// Splitter tests
// ---------------------------------------------------------------------------

#[test]
fn splitter_reads_all_pages_from_file() {
    let tmp = create_xml(sample_xml());
    let len = sample_xml().len() as u64;
    let frags: Vec<_> = open_split(tmp.path(), SplitRange::new(0, len))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(frags.len(), 9);
    assert!(frags.iter().all(|f| f.xml.starts_with("<page>") && f.xml.ends_with("</page>")));
}

#[test]
fn splitter_skips_siteinfo_and_wrapper() {
    let frags: Vec<_> = PageSplitter::whole(sample_xml().as_bytes())
        .map(|f| f.unwrap())
        .collect();
    assert!(frags.iter().all(|f| !f.xml.contains("siteinfo")));
}

#[test]
fn straddling_page_attributed_to_split_with_start_tag() {
    let xml = sample_xml();
    let len = xml.len() as u64;
    let mercury = xml.find("<page>\n    <title>Mercury").unwrap() as u64;
    let cut = mercury + 40;

    let tmp = create_xml(xml);
    let first: Vec<_> = open_split(tmp.path(), SplitRange::new(0, cut))
        .unwrap()
        .map(|f| f.unwrap())
        .collect();
    let second: Vec<_> = open_split(tmp.path(), SplitRange::new(cut, len))
        .unwrap()
        .map(|f| f.unwrap())
        .collect();

    let in_first = first.iter().filter(|f| f.start == mercury).count();
    let in_second = second.iter().filter(|f| f.start == mercury).count();
    assert_eq!(in_first, 1);
    assert_eq!(in_second, 0);
    assert_eq!(first.len() + second.len(), 9);
    assert!(first.last().unwrap().end > cut);
}

// ---------------------------------------------------------------------------
// Classifier tests
// ---------------------------------------------------------------------------

#[test]
fn classifier_types_sample_pages() {
    let classifier = PageClassifier::new(language::english());
    let frags: Vec<_> = PageSplitter::whole(sample_xml().as_bytes())
        .map(|f| f.unwrap())
        .collect();
    let types: Vec<_> = frags
        .iter()
        .map(|f| classifier.classify_fragment(f).map(|p| p.page_type).ok())
        .collect();

    assert_eq!(
        types,
        vec![
            Some(PageType::Article { stub: false }),
            Some(PageType::Article { stub: true }),
            Some(PageType::Redirect),
            Some(PageType::Redirect),
            Some(PageType::Disambiguation),
            Some(PageType::Empty),
            Some(PageType::Other),
            None,
            Some(PageType::Article { stub: false }),
        ]
    );
}

#[test]
fn classifier_uses_page_id_not_revision_or_contributor_id() {
    let classifier = PageClassifier::new(language::english());
    let frag = PageSplitter::whole(sample_xml().as_bytes())
        .next()
        .unwrap()
        .unwrap();
    let page = classifier.classify_fragment(&frag).unwrap();
    assert_eq!(page.id, "1");
    assert_eq!(page.title, "Rust (programming language)");
}

#[test]
fn classifier_unescapes_title() {
    let classifier = PageClassifier::new(language::english());
    let last = PageSplitter::whole(sample_xml().as_bytes())
        .last()
        .unwrap()
        .unwrap();
    assert_eq!(classifier.classify_fragment(&last).unwrap().title, "AT&T");
}

// ---------------------------------------------------------------------------
// Plain-text pipeline
// ---------------------------------------------------------------------------

#[test]
fn plain_text_writes_articles_only() {
    let tmp = create_xml(sample_xml());
    let out = TempDir::new().unwrap();
    let config = JobConfig::new(tmp.path(), out.path().join("text"));

    let counters = run_plain_text(&config).unwrap();
    assert_eq!(counters, expected_counters());

    let lines = read_parts(&out.path().join("text"));
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "1\tRust (programming language)\tRust is a systems language. History It was announced in 2010."
    );
    assert_eq!(lines[1], "2\tTiny village\tA tiny village.");
    assert_eq!(lines[2], "9\tAT&T\tAT&T is a company.");
}

#[test]
fn plain_text_wiki_format() {
    let tmp = create_xml(sample_xml());
    let out = TempDir::new().unwrap();
    let mut config = JobConfig::new(tmp.path(), out.path().join("wiki"));
    config.content_format = ContentFormat::Wiki;

    run_plain_text(&config).unwrap();
    let lines = read_parts(&out.path().join("wiki"));
    assert_eq!(
        lines[1],
        "2\tA tiny village. {{Geo-stub}} {{Wiki Title|Tiny village}} {{Wiki Page Id|2}}"
    );
}

#[test]
fn plain_text_writes_counters_json() {
    let tmp = create_xml(sample_xml());
    let out = TempDir::new().unwrap();
    let dir = out.path().join("text");
    run_plain_text(&JobConfig::new(tmp.path(), &dir)).unwrap();

    let json = fs::read_to_string(dir.join("counters.json")).unwrap();
    let counters: CounterSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(counters, expected_counters());
}

#[test]
fn plain_text_same_output_with_many_splits() {
    let tmp = create_xml(sample_xml());
    let out = TempDir::new().unwrap();

    let whole = JobConfig::new(tmp.path(), out.path().join("whole"));
    let mut split = JobConfig::new(tmp.path(), out.path().join("split"));
    split.split_size = 97;
    split.threads = Some(4);

    let a = run_plain_text(&whole).unwrap();
    let b = run_plain_text(&split).unwrap();
    assert_eq!(a, b);

    let mut whole_lines = read_parts(&out.path().join("whole"));
    let mut split_lines = read_parts(&out.path().join("split"));
    whole_lines.sort();
    split_lines.sort();
    assert_eq!(whole_lines, split_lines);
}

#[test]
fn plain_text_replaces_existing_output() {
    let tmp = create_xml(sample_xml());
    let out = TempDir::new().unwrap();
    let dir = out.path().join("text");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("stale.txt"), "old").unwrap();

    run_plain_text(&JobConfig::new(tmp.path(), &dir)).unwrap();
    assert!(!dir.join("stale.txt").exists());
}

#[test]
fn plain_text_from_bz2() {
    let tmp = create_bz2_xml(sample_xml());
    let out = TempDir::new().unwrap();
    let dir = out.path().join("text");

    let counters = run_plain_text(&JobConfig::new(tmp.path(), &dir)).unwrap();
    assert_eq!(counters, expected_counters());
    assert_eq!(read_parts(&dir).len(), 3);
}

#[test]
fn plain_text_from_multistream_bz2() {
    let xml = sample_xml();
    let cut = xml.find("  <page>\n    <title>Mercury").unwrap();
    let tmp = create_multistream_bz2(&[&xml[..cut], &xml[cut..]]);
    let out = TempDir::new().unwrap();
    let dir = out.path().join("text");

    let counters = run_plain_text(&JobConfig::new(tmp.path(), &dir)).unwrap();
    assert_eq!(counters, expected_counters());
    assert_eq!(read_parts(&dir).len(), 3);
}

#[test]
fn redirects_from_multistream_bz2() {
    let xml = sample_xml();
    let cut = xml.find("  <page>\n    <title>Rustlang").unwrap();
    let tmp = create_multistream_bz2(&[&xml[..cut], &xml[cut..]]);
    let out = TempDir::new().unwrap();
    let dir = out.path().join("redirects");

    let counters = run_redirects(&JobConfig::new(tmp.path(), &dir)).unwrap();
    assert_eq!(counters.total, 9);
    assert_eq!(counters.redirect, 2);
    assert_eq!(read_parts(&dir), vec!["Rust\tRust (programming language)".to_string()]);
}

// ---------------------------------------------------------------------------
// Redirect pipeline
// ---------------------------------------------------------------------------

#[test]
fn redirects_written_with_target() {
    let tmp = create_xml(sample_xml());
    let out = TempDir::new().unwrap();
    let dir = out.path().join("redirects");

    let counters = run_redirects(&JobConfig::new(tmp.path(), &dir)).unwrap();
    assert_eq!(counters.redirect, 2);
    assert_eq!(counters.redirect_target_missing, 1);

    let lines = read_parts(&dir);
    assert_eq!(lines, vec!["Rust\tRust (programming language)".to_string()]);
}

#[test]
fn redirects_respect_language() {
    let xml = "<page><title>Berlin (Stadt)</title><ns>0</ns><id>1</id>\
<redirect title=\"Berlin\" /><text>#WEITERLEITUNG [[Berlin]]</text></page>";
    let tmp = create_xml(xml);
    let out = TempDir::new().unwrap();

    let mut german = JobConfig::new(tmp.path(), out.path().join("de"));
    german.language = Some("de".to_string());
    assert_eq!(run_redirects(&german).unwrap().redirect, 1);

    let english = JobConfig::new(tmp.path(), out.path().join("en"));
    let counters = run_redirects(&english).unwrap();
    assert_eq!(counters.redirect, 0);
    assert_eq!(counters.article, 1);
}

#[test]
fn unknown_language_falls_back_to_english() {
    let tmp = create_xml(sample_xml());
    let out = TempDir::new().unwrap();
    let mut config = JobConfig::new(tmp.path(), out.path().join("xx"));
    config.language = Some("xx".to_string());
    config.dry_run = true;

    let counters = run_redirects(&config).unwrap();
    assert_eq!(counters.redirect, 2);
}

#[test]
fn truncated_dump_is_not_an_error() {
    let xml = sample_xml();
    let cut = xml.find("<title>AT&amp;T").unwrap();
    let tmp = create_xml(&xml[..cut]);
    let out = TempDir::new().unwrap();

    let counters = run_plain_text(&JobConfig::new(tmp.path(), out.path().join("t"))).unwrap();
    assert_eq!(counters.total, 8);
}
