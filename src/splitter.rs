//! Carves a byte stream into `<page>...</page>` fragments.
//!
//! A splitter owns the pages whose `<page>` tag *starts* inside its range.
//! It skips whatever partial record sits at the front of the range (that one
//! belongs to the previous split) and reads past the end of the range to
//! finish the last page it owns. Run over contiguous, non-overlapping ranges
//! this yields every record of the dump exactly once.

use crate::config::{PAGE_END_TAG, PAGE_START_TAG, READ_BUFFER_SIZE};
use crate::models::{RawPageFragment, SplitRange};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Outcome of feeding one buffered chunk to a [`TagMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Tag completed; value is the index just past its last byte.
    Found(usize),
    /// Whole chunk consumed without completing the tag.
    Exhausted(usize),
    /// Reached the byte limit with no tag in progress.
    Boundary(usize),
}

/// Streaming matcher for a literal tag whose first byte (`<`) occurs nowhere
/// else in the tag. Partial matches survive across buffer refills.
#[derive(Debug)]
struct TagMatcher {
    tag: &'static [u8],
    matched: usize,
}

impl TagMatcher {
    fn new(tag: &'static [u8]) -> Self {
        debug_assert!(tag.len() > 1 && !tag[1..].contains(&tag[0]));
        Self { tag, matched: 0 }
    }

    /// Scans `hay`. With `limit`, a new match may only begin before byte
    /// `limit`; a match already in progress is always allowed to finish.
    fn feed(&mut self, hay: &[u8], limit: Option<usize>) -> Scan {
        let mut i = 0;
        loop {
            if self.matched == 0 {
                if let Some(limit) = limit {
                    if i >= limit {
                        return Scan::Boundary(i);
                    }
                }
                let window_end = limit.map_or(hay.len(), |l| l.min(hay.len()));
                match memchr::memchr(self.tag[0], &hay[i..window_end]) {
                    Some(off) => {
                        i += off + 1;
                        self.matched = 1;
                    }
                    None => {
                        i = window_end;
                        if limit.is_some_and(|l| i >= l) {
                            return Scan::Boundary(i);
                        }
                        return Scan::Exhausted(i);
                    }
                }
            } else {
                if i >= hay.len() {
                    return Scan::Exhausted(i);
                }
                let b = hay[i];
                i += 1;
                if b == self.tag[self.matched] {
                    self.matched += 1;
                    if self.matched == self.tag.len() {
                        self.matched = 0;
                        return Scan::Found(i);
                    }
                } else if b == self.tag[0] {
                    if limit.is_some_and(|l| i > l) {
                        self.matched = 0;
                        return Scan::Boundary(i - 1);
                    }
                    self.matched = 1;
                } else {
                    self.matched = 0;
                }
            }
        }
    }
}

/// Lazy sequence of the fragments owned by one split.
///
/// The reader must be positioned at `range.start`. Only the fragment being
/// assembled is buffered.
pub struct PageSplitter<R> {
    reader: R,
    range: SplitRange,
    pos: u64,
    start_tag: TagMatcher,
    end_tag: TagMatcher,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> PageSplitter<R> {
    pub fn new(reader: R, range: SplitRange) -> Self {
        Self {
            reader,
            range,
            pos: range.start,
            start_tag: TagMatcher::new(PAGE_START_TAG),
            end_tag: TagMatcher::new(PAGE_END_TAG),
            buf: Vec::new(),
            done: false,
        }
    }

    /// Splitter over a whole stream, e.g. a decompressed dump that cannot be
    /// addressed by offset.
    pub fn whole(reader: R) -> Self {
        Self::new(reader, SplitRange::unbounded())
    }

    pub fn range(&self) -> SplitRange {
        self.range
    }

    /// Advances to the next owned `<page>` tag. Returns the absolute offset of
    /// its first byte, or `None` once no further page starts inside the range.
    fn seek_start(&mut self) -> io::Result<Option<u64>> {
        if self.range.is_empty() {
            return Ok(None);
        }
        loop {
            let remaining = self.range.end.saturating_sub(self.pos);
            let limit = usize::try_from(remaining).unwrap_or(usize::MAX);
            let (scan, consumed) = {
                let avail = match self.reader.fill_buf() {
                    Ok(avail) => avail,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                if avail.is_empty() {
                    return Ok(None);
                }
                let scan = self.start_tag.feed(avail, Some(limit));
                let consumed = match scan {
                    Scan::Found(n) | Scan::Exhausted(n) | Scan::Boundary(n) => n,
                };
                (scan, consumed)
            };
            self.reader.consume(consumed);
            self.pos += consumed as u64;
            match scan {
                Scan::Found(_) => return Ok(Some(self.pos - PAGE_START_TAG.len() as u64)),
                Scan::Boundary(_) => return Ok(None),
                Scan::Exhausted(_) => {}
            }
        }
    }

    /// Collects bytes up to and including `</page>`. Returns `false` if the
    /// stream ends first.
    fn read_to_end_tag(&mut self) -> io::Result<bool> {
        loop {
            let (found, consumed) = {
                let avail = match self.reader.fill_buf() {
                    Ok(avail) => avail,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                if avail.is_empty() {
                    return Ok(false);
                }
                match self.end_tag.feed(avail, None) {
                    Scan::Found(n) => {
                        self.buf.extend_from_slice(&avail[..n]);
                        (true, n)
                    }
                    Scan::Exhausted(n) | Scan::Boundary(n) => {
                        self.buf.extend_from_slice(&avail[..n]);
                        (false, n)
                    }
                }
            };
            self.reader.consume(consumed);
            self.pos += consumed as u64;
            if found {
                return Ok(true);
            }
        }
    }

    fn next_fragment(&mut self) -> io::Result<Option<RawPageFragment>> {
        let Some(start) = self.seek_start()? else {
            return Ok(None);
        };

        self.buf.clear();
        self.buf.extend_from_slice(PAGE_START_TAG);

        if !self.read_to_end_tag()? {
            debug!(
                offset = start,
                buffered = self.buf.len(),
                "Input ended inside an unterminated page record"
            );
            self.buf.clear();
            return Ok(None);
        }

        let bytes = std::mem::take(&mut self.buf);
        let xml = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };

        Ok(Some(RawPageFragment {
            start,
            end: self.pos,
            xml,
        }))
    }
}

impl<R: BufRead> Iterator for PageSplitter<R> {
    type Item = io::Result<RawPageFragment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_fragment() {
            Ok(Some(fragment)) => Some(Ok(fragment)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Opens `path` positioned at the start of `range`.
pub fn open_split(path: &Path, range: SplitRange) -> io::Result<PageSplitter<BufReader<File>>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(range.start))?;
    let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    Ok(PageSplitter::new(reader, range))
}
