//! Decoder-facing bitstream window

use crate::codec::{FrameType, PicStruct};
use crate::error::{Error, Result};
use crate::util::Timestamp;
use bytes::Bytes;

/// Backing storage of a [`Bitstream`]
#[derive(Debug, Clone, Default)]
pub enum BitstreamData {
    /// No storage attached
    #[default]
    Empty,
    /// Caller-owned bytes, shared without copying
    Borrowed(Bytes),
    /// Storage owned by the constructor; the whole vector is usable capacity
    Owned(Vec<u8>),
}

impl BitstreamData {
    fn as_slice(&self) -> &[u8] {
        match self {
            BitstreamData::Empty => &[],
            BitstreamData::Borrowed(b) => b,
            BitstreamData::Owned(v) => v,
        }
    }
}

/// Bitstream flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataFlags {
    /// The window holds exactly one whole access unit
    pub complete_frame: bool,
    /// The window holds only parameter sets / sequence headers
    pub header_only: bool,
    /// Last data before end of stream
    pub end_of_stream: bool,
}

/// A window `[data_offset, data_offset + data_length)` over byte storage
///
/// The decoder reads [`data()`](Self::data) and reports what it used with
/// [`consume()`](Self::consume). The window never wraps.
#[derive(Debug, Clone, Default)]
pub struct Bitstream {
    storage: BitstreamData,
    data_offset: usize,
    data_length: usize,
    /// Decode timestamp in the 90 kHz decoder time base
    pub time_stamp: Timestamp,
    pub pic_struct: PicStruct,
    pub frame_type: FrameType,
    pub data_flag: DataFlags,
}

impl Bitstream {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Window over the whole of a caller buffer
    pub fn borrowed(data: Bytes) -> Self {
        let data_length = data.len();
        Bitstream {
            storage: BitstreamData::Borrowed(data),
            data_length,
            ..Default::default()
        }
    }

    /// Window over the whole of an owned vector
    pub fn owned(data: Vec<u8>) -> Self {
        let data_length = data.len();
        Bitstream {
            storage: BitstreamData::Owned(data),
            data_length,
            ..Default::default()
        }
    }

    /// Owned storage of `capacity` bytes with an empty window
    pub(crate) fn with_storage(storage: Vec<u8>) -> Self {
        Bitstream {
            storage: BitstreamData::Owned(storage),
            ..Default::default()
        }
    }

    /// Bytes inside the window
    pub fn data(&self) -> &[u8] {
        &self.storage.as_slice()[self.data_offset..self.data_offset + self.data_length]
    }

    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    pub fn data_length(&self) -> usize {
        self.data_length
    }

    /// Size of the backing storage
    pub fn max_length(&self) -> usize {
        self.storage.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_length == 0
    }

    /// Whether the storage is a caller buffer
    pub fn is_borrowed(&self) -> bool {
        matches!(self.storage, BitstreamData::Borrowed(_))
    }

    pub fn storage(&self) -> &BitstreamData {
        &self.storage
    }

    /// Mark `n` bytes at the front of the window as used by the decoder
    pub fn consume(&mut self, n: usize) -> Result<()> {
        if n > self.data_length {
            return Err(Error::invalid_input(format!(
                "Cannot consume {} bytes from a {} byte bitstream",
                n, self.data_length
            )));
        }
        self.data_offset += n;
        self.data_length -= n;
        Ok(())
    }

    /// Reposition the window inside the existing storage
    pub(crate) fn set_window(&mut self, offset: usize, length: usize) -> Result<()> {
        offset
            .checked_add(length)
            .filter(|&e| e <= self.max_length())
            .ok_or_else(|| {
                Error::undefined_behavior(format!(
                    "Window {}+{} exceeds storage of {} bytes",
                    offset,
                    length,
                    self.max_length()
                ))
            })?;
        self.data_offset = offset;
        self.data_length = length;
        Ok(())
    }

    pub(crate) fn owned_storage_mut(&mut self) -> Option<&mut Vec<u8>> {
        match &mut self.storage {
            BitstreamData::Owned(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn replace_storage(&mut self, storage: BitstreamData, offset: usize, length: usize) {
        self.storage = storage;
        self.data_offset = offset;
        self.data_length = length;
    }

    /// Drop the storage and all metadata
    pub(crate) fn release(&mut self) {
        *self = Bitstream::empty();
    }

    /// Reset metadata, keeping the storage
    pub(crate) fn clear(&mut self) {
        self.data_offset = 0;
        self.data_length = 0;
        self.time_stamp = Timestamp::none();
        self.pic_struct = PicStruct::Unknown;
        self.frame_type = FrameType::default();
        self.data_flag = DataFlags::default();
    }
}
