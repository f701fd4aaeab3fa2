//! Annex B start-code scanner
//!
//! Walks a byte span and yields the NAL units delimited by `00 00 01` /
//! `00 00 00 01` start codes. Units are reported as [`NalSpan`] offsets into
//! the scanned slice rather than borrowed sub-slices, so callers can keep
//! the positions while mutating or re-homing the underlying buffer.

use memchr::memmem;
use std::sync::OnceLock;

const START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

fn finder() -> &'static memmem::Finder<'static> {
    static FINDER: OnceLock<memmem::Finder<'static>> = OnceLock::new();
    FINDER.get_or_init(|| memmem::Finder::new(&START_CODE))
}

/// Position of one NAL unit inside a scanned buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalSpan {
    /// First byte after the start code (the NAL header)
    pub start: usize,
    /// Zero bytes preceding the `01` of the start code (2 = short, 3+ = long)
    pub zero_count: usize,
    /// One past the last payload byte: the first zero of the next start
    /// code, or the end of the buffer
    pub end: usize,
}

impl NalSpan {
    /// Offset of the first zero byte of this unit's start code
    pub fn start_code_pos(&self) -> usize {
        self.start - 1 - self.zero_count
    }

    /// Payload length including the NAL header
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Zero-length unit (two start codes back to back)
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Whether the start code is the three-byte form
    pub fn is_short_start_code(&self) -> bool {
        self.zero_count < 3
    }

    /// The unit's bytes, header included, start code excluded
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.start..self.end]
    }

    /// The unit's bytes with its start code
    pub fn with_start_code<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.start_code_pos()..self.end]
    }
}

/// Locate the next start code at or after `from`
///
/// Returns `(first_zero, payload_start)`. Zero bytes are counted backwards
/// from the `00 00 01` match but never before `from`.
fn find_start_code(data: &[u8], from: usize) -> Option<(usize, usize)> {
    if from >= data.len() {
        return None;
    }

    let idx = from + finder().find(&data[from..])?;

    let mut first_zero = idx;
    while first_zero > from && data[first_zero - 1] == 0x00 {
        first_zero -= 1;
    }

    Some((first_zero, idx + START_CODE.len()))
}

/// Find the NAL unit whose start code begins at or after `from`
///
/// Returns `None` when no further start code exists. A start code sitting
/// at the very end of the buffer yields a zero-length unit.
pub fn next_nal(data: &[u8], from: usize) -> Option<NalSpan> {
    let (first_zero, start) = find_start_code(data, from)?;
    let zero_count = start - 1 - first_zero;

    let end = match find_start_code(data, start) {
        Some((next_zero, _)) => next_zero,
        None => data.len(),
    };

    Some(NalSpan {
        start,
        zero_count,
        end,
    })
}

/// Iterator over every NAL unit in a buffer
#[derive(Debug, Clone)]
pub struct NalIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> NalIter<'a> {
    /// Iterate over `data` from the beginning
    pub fn new(data: &'a [u8]) -> Self {
        NalIter { data, pos: 0 }
    }
}

impl Iterator for NalIter<'_> {
    type Item = NalSpan;

    fn next(&mut self) -> Option<NalSpan> {
        let nal = next_nal(self.data, self.pos)?;
        self.pos = nal.end;
        Some(nal)
    }
}

/// Convenience wrapper over [`NalIter`]
pub fn iter_nals(data: &[u8]) -> NalIter<'_> {
    NalIter::new(data)
}

/// Whether `data` begins with a start code
pub fn starts_with_start_code(data: &[u8]) -> bool {
    data.starts_with(&START_CODE) || data.starts_with(&[0x00, 0x00, 0x00, 0x01])
}
