//! Wikicorpus: Wikipedia dump splitting and page classification
//!
//! This crate turns a Wikipedia XML dump into a stream of classified pages and
//! feeds two extraction pipelines:
//!
//! 1. **Splitting** -- The dump is cut into byte ranges; each range yields the
//!    `<page>...</page>` records whose start tag it contains, reading past its
//!    end to finish the last one
//! 2. **Classification** -- Each fragment is scanned by literal substring search
//!    for id, title, namespace and text span, then typed as redirect,
//!    disambiguation, empty, article (optionally stub) or other using a
//!    per-language pattern table
//! 3. **Extraction** -- Articles are written as plain text, HTML-ish or wiki
//!    markup lines; redirects are written as `title \t target` rows
//!
//! # Architecture
//!
//! - **Streaming splits** -- Only the fragment being assembled is buffered; tags
//!   are located with `memchr`
//! - **Parallel splits** -- Uses rayon to process byte ranges concurrently, one
//!   output part file per split
//! - **Data-driven languages** -- One classifier parameterised by an immutable
//!   [`language::PatternTable`] looked up from a static registry
//! - **Page-local failures** -- Malformed pages and unrecoverable redirect
//!   targets are counted, never fatal
//! - **Atomic counters** -- Lock-free tallies shared by all workers
//!
//! # Key Modules
//!
//! - [`splitter`] -- Range-bounded `<page>` record splitter
//! - [`classify`] -- Offset-scanning page classifier
//! - [`language`] -- Per-language pattern tables and registry
//! - [`extract`] -- Plain-text and redirect pipelines, local job runner
//! - [`content`] -- Text normalisation for emitted records
//! - [`models`] -- Core data types (SplitRange, RawPageFragment, Page, PageType)
//! - [`stats`] -- Thread-safe atomic page counters
//! - [`error`] -- Page-local error types
//! - [`config`] -- Tag literals and tuning constants
//!
//! # Example Usage
//!
//! ```bash
//! # German articles as plain text, 8 worker threads
//! wikicorpus plain-text -i dewiki-latest-pages-articles.xml -o out/ --language de --threads 8
//!
//! # Redirect table
//! wikicorpus redirects -i enwiki-latest-pages-articles.xml.bz2 -o redirects/
//! ```

pub mod classify;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod language;
pub mod models;
pub mod splitter;
pub mod stats;
