use crate::error::PageError;
use crate::models::{Page, PageType};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide page tallies, shared by reference across split workers.
#[derive(Default)]
pub struct PageCounters {
    pub total: AtomicU64,
    pub redirect: AtomicU64,
    pub disambiguation: AtomicU64,
    pub empty: AtomicU64,
    pub article: AtomicU64,
    pub stub: AtomicU64,
    pub other: AtomicU64,
    pub malformed: AtomicU64,
    pub redirect_target_missing: AtomicU64,
}

/// Plain copy of the counters, written as `counters.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub total: u64,
    pub redirect: u64,
    pub disambiguation: u64,
    pub empty: u64,
    pub article: u64,
    pub stub: u64,
    pub other: u64,
    pub malformed: u64,
    pub redirect_target_missing: u64,
}

impl PageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one classified page: Total plus exactly one category. Stubs are
    /// counted in Stub as well as Article; malformed pages in Other as well as
    /// Malformed.
    pub fn record(&self, result: &Result<Page<'_>, PageError>) {
        self.total.fetch_add(1, Ordering::Relaxed);
        let counter = match result {
            Ok(page) => match page.page_type {
                PageType::Redirect => &self.redirect,
                PageType::Disambiguation => &self.disambiguation,
                PageType::Empty => &self.empty,
                PageType::Article { stub } => {
                    if stub {
                        self.stub.fetch_add(1, Ordering::Relaxed);
                    }
                    &self.article
                }
                PageType::Other => &self.other,
            },
            Err(_) => {
                self.malformed.fetch_add(1, Ordering::Relaxed);
                &self.other
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_redirect_target_missing(&self) {
        self.redirect_target_missing.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total: self.total(),
            redirect: self.redirect.load(Ordering::Relaxed),
            disambiguation: self.disambiguation.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            article: self.article.load(Ordering::Relaxed),
            stub: self.stub.load(Ordering::Relaxed),
            other: self.other.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            redirect_target_missing: self.redirect_target_missing.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::PageClassifier;
    use crate::language::english;

    fn page_xml(ns: &str, text: &str) -> String {
        format!("<page><title>T</title><ns>{ns}</ns><id>1</id><text>{text}</text></page>")
    }

    #[test]
    fn default_values_are_zero() {
        let counters = PageCounters::new();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn records_each_category() {
        let classifier = PageClassifier::new(english());
        let counters = PageCounters::new();
        let pages = [
            page_xml("0", "Plain article"),
            page_xml("0", "Small {{stub}}"),
            page_xml("0", "#REDIRECT [[X]]"),
            page_xml("0", "{{disambig}}"),
            page_xml("0", ""),
            page_xml("1", "Talk"),
            "<page><ns>0</ns></page>".to_string(),
        ];
        for xml in &pages {
            counters.record(&classifier.classify(xml));
        }

        let snap = counters.snapshot();
        assert_eq!(snap.total, 7);
        assert_eq!(snap.article, 2);
        assert_eq!(snap.stub, 1);
        assert_eq!(snap.redirect, 1);
        assert_eq!(snap.disambiguation, 1);
        assert_eq!(snap.empty, 1);
        assert_eq!(snap.other, 2);
        assert_eq!(snap.malformed, 1);
    }

    #[test]
    fn category_counts_sum_to_total() {
        let classifier = PageClassifier::new(english());
        let counters = PageCounters::new();
        for text in ["a", "#redirect b", "", "{{disambig}}"] {
            counters.record(&classifier.classify(&page_xml("0", text)));
        }
        let s = counters.snapshot();
        assert_eq!(s.redirect + s.disambiguation + s.empty + s.article + s.other, s.total);
    }

    #[test]
    fn redirect_target_missing_is_separate() {
        let counters = PageCounters::new();
        counters.inc_redirect_target_missing();
        counters.inc_redirect_target_missing();
        assert_eq!(counters.snapshot().redirect_target_missing, 2);
        assert_eq!(counters.total(), 0);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let counters = PageCounters::new();
        counters.inc_redirect_target_missing();
        let json = serde_json::to_string(&counters.snapshot()).unwrap();
        let back: CounterSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.redirect_target_missing, 1);
    }
}
