use crate::models::{unescape_or_raw, ContentFormat, Page};
use once_cell::sync::Lazy;
use regex::Regex;

static HTML_COMMENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static REF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<ref[^>/]*/>|<ref[^>]*>.*?</ref>").unwrap()
});

static LANG_LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[[a-z\-]+:[^\]]+\]\]").unwrap());

static FILE_LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\[(?:File|Image|Category):[^\]]*\]\]").unwrap());

static LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(?:[^|\]]+\|)?([^\]]+)\]\]").unwrap());

static EXTERNAL_LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[https?://\S+\s([^\]]+)\]").unwrap());

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^ <\]]+").unwrap());

static HTML_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^!][^>]*>").unwrap());

static EMPHASIS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"'{2,}").unwrap());

static HEADING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^={2,}\s*(.+?)\s*={2,}\s*$").unwrap());

static NEWLINES_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());

static LINE_BREAKS_AND_TABS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n\t]+").unwrap());

static SPACES_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());

/// Collapses runs of line breaks into one space so the value fits on one line.
pub fn single_line(s: &str) -> String {
    NEWLINES_REGEX.replace_all(s, " ").into_owned()
}

/// Like [`single_line`] but tabs are folded too, for fields that share a line
/// with tab-separated keys.
pub fn single_line_no_tabs(s: &str) -> String {
    LINE_BREAKS_AND_TABS_REGEX.replace_all(s, " ").into_owned()
}

/// Best-effort plain text of a wikitext payload (still XML-escaped as it
/// appears in the dump).
pub fn plain_text(markup: &str) -> String {
    let text = unescape_or_raw(markup);
    let text = HTML_COMMENT_REGEX.replace_all(&text, "");
    let text = REF_REGEX.replace_all(&text, "");
    let text = strip_templates(&text);
    let text = FILE_LINK_REGEX.replace_all(&text, "");
    let text = LANG_LINK_REGEX.replace_all(&text, "");
    let text = LINK_REGEX.replace_all(&text, "$1");
    let text = EXTERNAL_LINK_REGEX.replace_all(&text, "$1");
    let text = URL_REGEX.replace_all(&text, "");
    let text = HTML_TAG_REGEX.replace_all(&text, "");
    let text = HEADING_REGEX.replace_all(&text, "$1");
    let text = EMPHASIS_REGEX.replace_all(&text, "");

    let text = single_line_no_tabs(&text);
    SPACES_REGEX.replace_all(text.trim(), " ").into_owned()
}

/// Value emitted by the plain-text pipeline for an article, keyed by page id.
pub fn render(page: &Page<'_>, format: ContentFormat) -> String {
    match format {
        ContentFormat::Text => {
            let mut out = single_line(&page.title);
            out.push('\t');
            out.push_str(&plain_text(page.text()));
            out
        }
        ContentFormat::Html => {
            let mut out = single_line(&page.title);
            out.push('\t');
            out.push_str(&single_line_no_tabs(&unescape_or_raw(page.text())));
            out
        }
        ContentFormat::Wiki => format!(
            "{} {{{{Wiki Title|{}}}}} {{{{Wiki Page Id|{}}}}}",
            single_line_no_tabs(&unescape_or_raw(page.text())),
            single_line(&page.title),
            page.id
        ),
    }
}

/// Removes `{{...}}` templates, nested ones included. An unclosed template
/// swallows the rest of the text.
fn strip_templates(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut run_start = 0;

    while i < bytes.len() {
        if i + 1 < bytes.len() && bytes[i] == b'{' && bytes[i + 1] == b'{' {
            if run_start < i {
                result.push_str(&text[run_start..i]);
            }
            let mut depth: i32 = 0;
            while i + 1 < bytes.len() {
                if bytes[i] == b'{' && bytes[i + 1] == b'{' {
                    depth += 1;
                    i += 2;
                } else if bytes[i] == b'}' && bytes[i + 1] == b'}' {
                    depth -= 1;
                    i += 2;
                    if depth == 0 {
                        break;
                    }
                } else {
                    i += 1;
                }
            }
            if depth != 0 {
                i = bytes.len();
            }
            run_start = i;
        } else {
            i += 1;
        }
    }

    if run_start < bytes.len() {
        result.push_str(&text[run_start..]);
    }

    result
}
