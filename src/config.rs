/// Language used when none is configured or the requested one is unknown
pub const DEFAULT_LANGUAGE: &str = "en";

/// Size of one processing split for uncompressed dumps (64 MiB)
pub const DEFAULT_SPLIT_SIZE: u64 = 64 * 1024 * 1024;

/// Read buffer per split
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Write buffer per output part file
pub const WRITE_BUFFER_SIZE: usize = 128 * 1024;

/// Progress update interval (tick every N pages)
pub const PROGRESS_INTERVAL: u64 = 1000;

pub const PAGE_START_TAG: &[u8] = b"<page>";
pub const PAGE_END_TAG: &[u8] = b"</page>";

pub const TITLE_START_TAG: &str = "<title>";
pub const TITLE_END_TAG: &str = "</title>";
pub const NS_START_TAG: &str = "<ns>";
pub const NS_END_TAG: &str = "</ns>";
pub const ID_START_TAG: &str = "<id>";
pub const ID_END_TAG: &str = "</id>";

/// Opening of the text element; attributes such as `xml:space` may follow
pub const TEXT_START_TAG: &str = "<text";
pub const TEXT_END_TAG: &str = "</text>";

pub const REDIRECT_TITLE_START: &str = "<redirect title=\"";

/// Redirect marker present in every pattern table regardless of language
pub const UNIVERSAL_REDIRECT_MARKER: &str = "#redirect";

pub const STUB_TEMPLATE_MARKER: &str = "stub}}";
pub const STUB_CATEGORY_MARKER: &str = "Wikipedia:Stub";

/// English template pattern used for languages without a documented
/// disambiguation template. Known to miss most non-English disambiguation pages.
pub const GENERIC_DISAMBIGUATION_PATTERN: &str = r"\{\{disambig\s*\|?\s*.*?\}\}";

/// Name of the counter summary written next to the part files
pub const COUNTERS_FILE: &str = "counters.json";
