//! Internal accumulation buffer
//!
//! Holds data the constructor cannot hand out zero-copy: partial access
//! units, leftovers the decoder did not consume, and frames that need bytes
//! prepended (cached headers, start codes).

use super::bitstream::{Bitstream, BitstreamData};
use crate::error::{Error, Result};
use crate::util::buffer::try_alloc;
use crate::util::{BufferStats, GrowthPolicy, Timestamp};
use tracing::trace;

#[derive(Debug)]
pub struct BstBuf {
    bst: Bitstream,
    limit: Option<usize>,
    growth: GrowthPolicy,
    stats: BufferStats,
}

impl BstBuf {
    /// Unallocated buffer; call [`malloc`](Self::malloc) before use
    pub fn new(limit: Option<usize>, growth: GrowthPolicy) -> Self {
        BstBuf {
            bst: Bitstream::empty(),
            limit,
            growth,
            stats: BufferStats::default(),
        }
    }

    pub fn bitstream(&self) -> &Bitstream {
        &self.bst
    }

    pub fn bitstream_mut(&mut self) -> &mut Bitstream {
        &mut self.bst
    }

    pub fn stats(&self) -> BufferStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.bst.data_length()
    }

    pub fn is_empty(&self) -> bool {
        self.bst.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bst.max_length()
    }

    /// Replace the storage with `size` fresh bytes, discarding content
    pub fn malloc(&mut self, size: usize) -> Result<()> {
        let storage = try_alloc(size, self.limit)?;
        self.bst = Bitstream::with_storage(storage);
        self.stats.reallocs += 1;
        Ok(())
    }

    /// Make room for `add` more bytes after the window, keeping content
    ///
    /// Compacts in place when the consumed prefix frees enough space,
    /// otherwise moves to larger storage. On failure nothing changes.
    pub fn realloc(&mut self, add: usize) -> Result<()> {
        let offset = self.bst.data_offset();
        let length = self.bst.data_length();
        let capacity = self.capacity();
        let needed = length
            .checked_add(add)
            .ok_or_else(|| Error::memory_alloc(usize::MAX, self.limit))?;

        if offset.saturating_add(needed) <= capacity {
            return Ok(());
        }

        if needed <= capacity {
            return self.sync();
        }

        let mut size = self.growth.next_size(capacity, needed);
        if let Some(max) = self.limit {
            // Geometric growth may overshoot a ceiling the need itself fits under
            if needed <= max {
                size = size.min(max);
            }
        }

        let mut storage = try_alloc(size, self.limit)?;
        storage[..length].copy_from_slice(self.bst.data());

        trace!(from = capacity, to = size, "growing internal buffer");
        self.bst.replace_storage(BitstreamData::Owned(storage), 0, length);
        self.stats.reallocs += 1;
        Ok(())
    }

    /// Drop the consumed prefix, moving the window to offset 0
    pub fn sync(&mut self) -> Result<()> {
        let offset = self.bst.data_offset();
        let length = self.bst.data_length();
        if offset == 0 {
            return Ok(());
        }

        if length > 0 {
            if let Some(storage) = self.bst.owned_storage_mut() {
                storage.copy_within(offset..offset + length, 0);
            }
        }
        self.bst.set_window(0, length)
    }

    /// Append caller bytes after the window
    ///
    /// The buffer takes `ts` when it was empty; otherwise it keeps the
    /// timestamp of the data already held unless that one is unset.
    pub fn append(&mut self, data: &[u8], ts: Timestamp) -> Result<()> {
        self.push(data, ts)?;
        self.stats.copied_bytes += data.len() as u64;
        Ok(())
    }

    /// Append bytes the constructor synthesises itself (headers, start codes)
    pub fn append_internal(&mut self, data: &[u8], ts: Timestamp) -> Result<()> {
        self.push(data, ts)
    }

    fn push(&mut self, data: &[u8], ts: Timestamp) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        self.realloc(data.len())?;

        let was_empty = self.bst.is_empty();
        let offset = self.bst.data_offset();
        let length = self.bst.data_length();
        let end = offset + length;

        let storage = self
            .bst
            .owned_storage_mut()
            .ok_or_else(|| Error::undefined_behavior("Internal buffer has no owned storage"))?;
        storage[end..end + data.len()].copy_from_slice(data);
        self.bst.set_window(offset, length + data.len())?;

        if was_empty || !self.bst.time_stamp.is_valid() {
            self.bst.time_stamp = ts;
        }
        Ok(())
    }

    /// Forget all content, keeping the storage
    pub fn clear(&mut self) {
        self.bst.clear();
    }
}
