use crate::config::REDIRECT_TITLE_START;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Half-open byte range `[start, end)` of the dump owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitRange {
    pub start: u64,
    pub end: u64,
}

impl SplitRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// A range covering a stream of unknown length.
    pub fn unbounded() -> Self {
        Self {
            start: 0,
            end: u64::MAX,
        }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, offset: u64) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Partitions `[0, len)` into contiguous ranges of at most `split_size` bytes.
pub fn plan_splits(len: u64, split_size: u64) -> Vec<SplitRange> {
    let split_size = split_size.max(1);
    let mut splits = Vec::with_capacity((len / split_size + 1) as usize);
    let mut start = 0;
    while start < len {
        let end = start.saturating_add(split_size).min(len);
        splits.push(SplitRange::new(start, end));
        start = end;
    }
    splits
}

/// One `<page>...</page>` record, tags included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPageFragment {
    /// Absolute offset of the `<` of `<page>`
    pub start: u64,
    /// Absolute offset one past the `>` of `</page>`
    pub end: u64,
    pub xml: String,
}

impl RawPageFragment {
    pub fn as_str(&self) -> &str {
        &self.xml
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageType {
    Redirect,
    Disambiguation,
    Empty,
    Article { stub: bool },
    Other,
}

/// Classification result for one fragment. Borrows the fragment, so the text
/// payload is only materialised when a pipeline asks for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub id: &'a str,
    pub title: String,
    pub namespace: &'a str,
    pub is_article: bool,
    /// Payload offsets within `raw`, `None` when the page has no text element
    pub text_span: Option<Range<usize>>,
    pub page_type: PageType,
    pub language: &'static str,
    pub raw: &'a str,
}

impl<'a> Page<'a> {
    /// Raw (still XML-escaped) text payload.
    pub fn text(&self) -> &'a str {
        match &self.text_span {
            Some(span) => &self.raw[span.clone()],
            None => "",
        }
    }

    pub fn numeric_id(&self) -> Option<i64> {
        self.id.trim().parse().ok()
    }

    pub fn is_redirect(&self) -> bool {
        self.page_type == PageType::Redirect
    }

    pub fn is_disambiguation(&self) -> bool {
        self.page_type == PageType::Disambiguation
    }

    pub fn is_empty(&self) -> bool {
        self.page_type == PageType::Empty
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.page_type, PageType::Article { stub: true })
    }

    /// Target of a redirect, read from the `<redirect title="...">` element
    /// rather than from the text body.
    pub fn redirect_target(&self) -> Option<String> {
        let start = self.raw.find(REDIRECT_TITLE_START)? + REDIRECT_TITLE_START.len();
        let len = self.raw[start..].find('"')?;
        let value = self.raw[start..start + len].trim();
        Some(unescape_or_raw(value).into_owned())
    }
}

/// Decodes XML and HTML5 entities, keeping the input untouched when an
/// entity cannot be resolved.
pub fn unescape_or_raw(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Output flavour of the plain-text pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ContentFormat {
    #[default]
    Text,
    Html,
    Wiki,
}

impl FromStr for ContentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEXT" => Ok(Self::Text),
            "HTML" => Ok(Self::Html),
            "WIKI" => Ok(Self::Wiki),
            other => Err(format!("\"{other}\" unknown content type (expected TEXT, HTML or WIKI)")),
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "TEXT",
            Self::Html => "HTML",
            Self::Wiki => "WIKI",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_splits_covers_range_without_gaps() {
        let splits = plan_splits(25, 10);
        assert_eq!(
            splits,
            vec![
                SplitRange::new(0, 10),
                SplitRange::new(10, 20),
                SplitRange::new(20, 25)
            ]
        );
    }

    #[test]
    fn plan_splits_empty_input() {
        assert!(plan_splits(0, 10).is_empty());
    }

    #[test]
    fn plan_splits_zero_size_is_clamped() {
        assert_eq!(plan_splits(3, 0).len(), 3);
    }

    #[test]
    fn split_range_contains_is_half_open() {
        let range = SplitRange::new(5, 8);
        assert!(range.contains(5));
        assert!(range.contains(7));
        assert!(!range.contains(8));
        assert!(!range.contains(4));
    }

    #[test]
    fn content_format_parses_exact_names() {
        assert_eq!("TEXT".parse::<ContentFormat>(), Ok(ContentFormat::Text));
        assert_eq!("HTML".parse::<ContentFormat>(), Ok(ContentFormat::Html));
        assert_eq!("WIKI".parse::<ContentFormat>(), Ok(ContentFormat::Wiki));
        assert!("text".parse::<ContentFormat>().is_err());
    }

    #[test]
    fn unescape_keeps_unknown_entities() {
        assert_eq!(unescape_or_raw("A &amp; B"), "A & B");
        assert_eq!(unescape_or_raw("caf&eacute;"), "café");
        assert_eq!(unescape_or_raw("&bogus; x"), "&bogus; x");
    }
}
