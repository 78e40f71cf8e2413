//! Offset-scanning classifier for one page fragment.
//!
//! Fields are located by literal substring search rather than an XML parser.
//! The first `<id>` after `<page>` is the page id because it precedes the
//! revision block in every dump.

use crate::config::{
    ID_END_TAG, ID_START_TAG, NS_END_TAG, NS_START_TAG, STUB_CATEGORY_MARKER,
    STUB_TEMPLATE_MARKER, TEXT_END_TAG, TEXT_START_TAG, TITLE_END_TAG, TITLE_START_TAG,
};
use crate::error::PageError;
use crate::language::PatternTable;
use crate::models::{unescape_or_raw, Page, PageType, RawPageFragment};
use memchr::memmem::Finder;
use once_cell::sync::Lazy;
use std::ops::Range;

static TITLE_START: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(TITLE_START_TAG));
static TITLE_END: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(TITLE_END_TAG));
static NS_START: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(NS_START_TAG));
static NS_END: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(NS_END_TAG));
static ID_START: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(ID_START_TAG));
static ID_END: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(ID_END_TAG));
static TEXT_START: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(TEXT_START_TAG));
static TEXT_END: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(TEXT_END_TAG));
static STUB_TEMPLATE: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(STUB_TEMPLATE_MARKER));
static STUB_CATEGORY: Lazy<Finder<'static>> = Lazy::new(|| Finder::new(STUB_CATEGORY_MARKER));

fn find_from(finder: &Finder<'_>, hay: &str, from: usize) -> Option<usize> {
    finder.find(&hay.as_bytes()[from..]).map(|i| from + i)
}

/// Inner range of the first `open ... close` pair at or after `from`.
fn element(hay: &str, open: &Finder<'_>, close: &Finder<'_>, from: usize) -> Option<Range<usize>> {
    let start = find_from(open, hay, from)? + open.needle().len();
    let end = find_from(close, hay, start)?;
    Some(start..end)
}

/// Locates the payload of the first `<text ...>...</text>` element. Returns
/// the offset of the opening tag and the payload span; the span is `None` for
/// a self-closing `<text ... />`.
fn text_element(hay: &str) -> Option<(usize, Option<Range<usize>>)> {
    let bytes = hay.as_bytes();
    let mut from = 0;
    loop {
        let tag_start = find_from(&TEXT_START, hay, from)?;
        let after_name = tag_start + TEXT_START_TAG.len();
        match bytes.get(after_name) {
            Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(b'/') => {}
            Some(_) => {
                from = after_name;
                continue;
            }
            None => return None,
        }
        let tag_end = memchr::memchr(b'>', &bytes[after_name..])? + after_name;
        if bytes[tag_end - 1] == b'/' {
            return Some((tag_start, None));
        }
        let payload_start = tag_end + 1;
        let payload_end = find_from(&TEXT_END, hay, payload_start)?;
        return Some((tag_start, Some(payload_start..payload_end)));
    }
}

/// Stateless classifier bound to one pattern table for the lifetime of a job.
#[derive(Debug, Clone, Copy)]
pub struct PageClassifier {
    table: &'static PatternTable,
}

impl PageClassifier {
    pub fn new(table: &'static PatternTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'static PatternTable {
        self.table
    }

    pub fn classify_fragment<'a>(&self, fragment: &'a RawPageFragment) -> Result<Page<'a>, PageError> {
        self.classify_at(fragment.as_str(), fragment.start)
    }

    pub fn classify<'a>(&self, xml: &'a str) -> Result<Page<'a>, PageError> {
        self.classify_at(xml, 0)
    }

    fn classify_at<'a>(&self, xml: &'a str, offset: u64) -> Result<Page<'a>, PageError> {
        let missing = |tag| PageError::MalformedFragment {
            offset,
            missing: tag,
        };

        let title_span = element(xml, &TITLE_START, &TITLE_END, 0).ok_or_else(|| missing("title"))?;
        let ns_span = element(xml, &NS_START, &NS_END, 0).ok_or_else(|| missing("ns"))?;
        let id_span = element(xml, &ID_START, &ID_END, 0).ok_or_else(|| missing("id"))?;

        let title = unescape_or_raw(&xml[title_span]).into_owned();
        let namespace = xml[ns_span].trim();
        let is_article = namespace == "0";
        let id = &xml[id_span];

        let (text_tag, text_span) = match text_element(xml) {
            Some((tag, span)) => (Some(tag), span),
            None => (None, None),
        };

        let page_type = self.page_type(xml, is_article, text_tag, text_span.as_ref());

        Ok(Page {
            id,
            title,
            namespace,
            is_article,
            text_span,
            page_type,
            language: self.table.code(),
            raw: xml,
        })
    }

    /// First match wins: Empty, Redirect, Disambiguation, Article, Other.
    fn page_type(
        &self,
        xml: &str,
        is_article: bool,
        text_tag: Option<usize>,
        text_span: Option<&Range<usize>>,
    ) -> PageType {
        let (text_tag, span) = match (text_tag, text_span) {
            (Some(tag), Some(span)) if !span.is_empty() => (tag, span),
            _ => return PageType::Empty,
        };

        if self.table.is_redirect_text(&xml[span.clone()]) {
            return PageType::Redirect;
        }

        if self.table.disambiguation().is_match(xml) {
            return PageType::Disambiguation;
        }

        if is_article {
            let stub = find_from(&STUB_TEMPLATE, xml, text_tag).is_some()
                || STUB_CATEGORY.find(xml.as_bytes()).is_some();
            return PageType::Article { stub };
        }

        PageType::Other
    }
}
