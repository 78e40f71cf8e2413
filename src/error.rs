use thiserror::Error;

/// Failures local to a single page. None of them abort a job; they are
/// absorbed into [`crate::stats::PageCounters`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("malformed page at byte {offset}: missing <{missing}>")]
    MalformedFragment { offset: u64, missing: &'static str },

    #[error("redirect page {title:?} has no <redirect title=\"...\"> attribute")]
    RedirectTargetMissing { title: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown language code: {0:?}")]
pub struct UnknownLanguage(pub String);
