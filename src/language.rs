//! Per-language redirect markers and disambiguation patterns.
//!
//! Every language is plain data: a code, the lower-cased redirect keywords
//! used in its dumps and one case-insensitive regex recognising its
//! disambiguation template. The registry is built once on first use and is
//! read-only afterwards, so it can be shared by reference across workers.

use crate::config::{DEFAULT_LANGUAGE, GENERIC_DISAMBIGUATION_PATTERN, UNIVERSAL_REDIRECT_MARKER};
use crate::error::UnknownLanguage;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;
use tracing::warn;

const GENERIC: &str = GENERIC_DISAMBIGUATION_PATTERN;

/// (code, redirect markers, disambiguation pattern)
const LANGUAGES: &[(&str, &[&str], &str)] = &[
    ("ar", &["#تحويل"], r"\{\{توضيح\}\}"),
    ("be", &["#перанакіраваньне", "#перанакіраванне"], GENERIC),
    ("bg", &["#пренасочване", "#виж"], GENERIC),
    ("ca", &["#redirecciona"], GENERIC),
    ("ceb", &["#redirect"], GENERIC),
    ("cs", &["#přesměruj"], GENERIC),
    ("de", &["#weiterleitung"], r"\{\{begriffsklärung\}\}"),
    ("el", &["#ανακατευθυνση", "#ανακατεύθυνση"], GENERIC),
    ("en", &[], r"\{\{disambig\w*\}\}"),
    ("es", &["#redirección"], GENERIC),
    ("fa", &["#تغییرمسیر", "#تغییر_مسیر"], r"\{\{ابهام‌زدایی\}\}"),
    ("fi", &["#ohjaus", "#uudelleenohjaus"], GENERIC),
    ("fr", &["#redirection"], GENERIC),
    ("gl", &["#redirección"], GENERIC),
    ("he", &["#הפניה"], GENERIC),
    ("hi", &["#अनुप्रेषित"], GENERIC),
    ("hr", &["#preusmjeri"], GENERIC),
    ("hu", &["#átirányítás"], GENERIC),
    ("hy", &["#վերահղում"], GENERIC),
    ("id", &["#alih"], GENERIC),
    ("it", &["#rinvia"], r"\{\{disambigua\}\}"),
    ("ja", &["#転送"], GENERIC),
    ("ka", &["#გადამისამართება"], GENERIC),
    ("ko", &["#넘겨주기"], r"\{\{동음이의어|disambig\}\}"),
    ("nl", &["#doorverwijzing"], GENERIC),
    ("no", &["#omdirigering"], r"\{\{peker\}\}"),
    ("pl", &["#patrz", "#przekieruj", "#tam"], GENERIC),
    ("pt", &["#redirecionamento"], GENERIC),
    ("ru", &["#перенаправление"], r"\{\{Неоднозначность|многозначность\}\}"),
    ("sh", &["#preusmjeri", "#преусмјери"], GENERIC),
    ("simple", &[], r"\{\{disambig\w*\}\}"),
    ("sk", &["#presmeruj"], GENERIC),
    ("sl", &["#preusmeritev"], GENERIC),
    ("sr", &["#преусмери", "#preusmeri"], GENERIC),
    ("sv", &["#omdirigering"], r"\{\{förgrening\}\}"),
    (
        "th",
        &["#เปลี่ยนทาง"],
        r"\{\{ความหมายอื่น|ข้อความแก้กำกวม\}\}",
    ),
    ("tr", &["#yönlendirme"], GENERIC),
    ("uk", &["#перенаправлення", "#перенаправление"], GENERIC),
    ("ur", &["#رجوع_مکرر"], GENERIC),
    ("vi", &["#đổi"], r"\{\{trang định hướng\}\}"),
    ("war", &["#redirect"], GENERIC),
    ("zh", &["#重定向"], r"\{\{disambig.+Cat=.+\}\}"),
    ("zh_yue", &["#重定向", "#跳轉"], GENERIC),
];

/// Immutable pattern configuration bound to a classifier for a whole job.
#[derive(Debug)]
pub struct PatternTable {
    code: &'static str,
    redirect_markers: Vec<String>,
    disambiguation: Regex,
}

impl PatternTable {
    /// Markers are lower-cased and trimmed; the universal `#redirect` marker is
    /// always added. The pattern is compiled case-insensitively.
    pub fn new(
        code: &'static str,
        markers: &[&str],
        disambiguation_pattern: &str,
    ) -> Result<Self, regex::Error> {
        let disambiguation = RegexBuilder::new(disambiguation_pattern)
            .case_insensitive(true)
            .build()?;

        let mut redirect_markers: Vec<String> = markers
            .iter()
            .map(|m| m.to_lowercase().trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        redirect_markers.push(UNIVERSAL_REDIRECT_MARKER.to_string());
        redirect_markers.sort();
        redirect_markers.dedup();

        Ok(Self {
            code,
            redirect_markers,
            disambiguation,
        })
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn redirect_markers(&self) -> &[String] {
        &self.redirect_markers
    }

    pub fn disambiguation(&self) -> &Regex {
        &self.disambiguation
    }

    /// True if `text` starts with a configured marker. Each marker is compared
    /// against exactly its own length of leading characters, lower-cased and
    /// trimmed, so leading whitespace or markup defeats the match.
    pub fn is_redirect_text(&self, text: &str) -> bool {
        self.redirect_markers.iter().any(|marker| {
            let n = marker.chars().count();
            let prefix_end = text
                .char_indices()
                .nth(n)
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            let candidate = text[..prefix_end].to_lowercase();
            let candidate = candidate.trim();
            candidate == marker || candidate == UNIVERSAL_REDIRECT_MARKER
        })
    }
}

static REGISTRY: Lazy<FxHashMap<&'static str, PatternTable>> = Lazy::new(|| {
    LANGUAGES
        .iter()
        .map(|(code, markers, pattern)| {
            let table = PatternTable::new(*code, markers, pattern)
                .unwrap_or_else(|e| panic!("invalid disambiguation pattern for {code}: {e}"));
            (*code, table)
        })
        .collect()
});

/// Case-insensitive lookup of a registered language.
pub fn lookup(code: &str) -> Result<&'static PatternTable, UnknownLanguage> {
    let key = code.trim().to_ascii_lowercase();
    REGISTRY
        .get(key.as_str())
        .ok_or_else(|| UnknownLanguage(code.to_string()))
}

/// Resolves the table for a job. An absent code selects English silently; an
/// unknown code also selects English but is logged so the fallback can be told
/// apart from a real English run.
pub fn table_for(code: Option<&str>) -> &'static PatternTable {
    let Some(code) = code else {
        return english();
    };
    match lookup(code) {
        Ok(table) => table,
        Err(e) => {
            warn!(error = %e, fallback = DEFAULT_LANGUAGE, "Falling back to default language");
            english()
        }
    }
}

pub fn english() -> &'static PatternTable {
    &REGISTRY[DEFAULT_LANGUAGE]
}

/// Registered language codes in sorted order.
pub fn supported_languages() -> Vec<&'static str> {
    let mut codes: Vec<_> = REGISTRY.keys().copied().collect();
    codes.sort_unstable();
    codes
}
