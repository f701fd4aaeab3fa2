//! Encoder output post-processing
//!
//! Encoders emit parameter sets in front of keyframes. When those travel
//! separately (codec-config buffers), the sample itself should start at the
//! first coded slice with a four-byte start code.

use crate::codec::startcode::iter_nals;
use crate::codec::vc1::{self, START_CODE_FRAME};
use crate::codec::{self, vp8, vp9, CodecKind};
use crate::constructor::{Bitstream, BitstreamData};
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

const LONG_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// What an output buffer carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Parameter sets / sequence header only
    CodecConfig,
    /// A frame decoding can start at
    SyncFrame,
    Frame,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::CodecConfig => write!(f, "codec-config"),
            OutputKind::SyncFrame => write!(f, "sync-frame"),
            OutputKind::Frame => write!(f, "frame"),
        }
    }
}

/// Strip everything ahead of the first coded slice
///
/// The window ends up at offset 0 and begins with `00 00 00 01`; a short
/// start code is widened by one zero byte. Bitstreams without a slice, and
/// non-NAL codecs, are left alone. Applying it twice changes nothing.
pub fn remove_headers(bst: &mut Bitstream, kind: CodecKind) -> Result<()> {
    if !kind.is_nal_based() {
        return Ok(());
    }

    let data = bst.data();
    let slice = iter_nals(data)
        .filter(|n| !n.is_empty())
        .find(|n| codec::classify_nal(kind, n.payload(data)).is_slice());
    let span = match slice {
        Some(span) => span,
        None => return Ok(()),
    };

    // Absolute positions in the storage
    let payload = bst.data_offset() + span.start;
    let end = bst.data_offset() + bst.data_length();
    let new_len = end - payload + LONG_START_CODE.len();

    if let BitstreamData::Borrowed(bytes) = bst.storage() {
        let bytes = bytes.clone();
        let window = if payload >= 4 && bytes[payload - 4..payload] == LONG_START_CODE {
            BitstreamData::Borrowed(bytes.slice(payload - 4..end))
        } else {
            let mut out = Vec::new();
            out.try_reserve_exact(new_len)
                .map_err(|_| Error::memory_alloc(new_len, None))?;
            out.extend_from_slice(&LONG_START_CODE);
            out.extend_from_slice(&bytes[payload..end]);
            BitstreamData::Owned(out)
        };
        bst.replace_storage(window, 0, new_len);
        return Ok(());
    }

    let storage = match bst.owned_storage_mut() {
        Some(storage) => storage,
        None => return Ok(()),
    };
    if storage.len() < new_len {
        storage
            .try_reserve_exact(new_len - storage.len())
            .map_err(|_| Error::memory_alloc(new_len, None))?;
        storage.resize(new_len, 0);
    }
    storage.copy_within(payload..end, LONG_START_CODE.len());
    storage[..LONG_START_CODE.len()].copy_from_slice(&LONG_START_CODE);
    bst.set_window(0, new_len)
}

/// Classify one encoded output buffer
pub fn classify_output(data: &[u8], kind: CodecKind) -> OutputKind {
    match kind {
        CodecKind::Avc | CodecKind::Hevc => classify_nal_output(data, kind),
        CodecKind::Vc1 => match vc1::start_code_suffix(data) {
            Some(suffix) if vc1::is_header_start_code(suffix) => {
                let has_frame = iter_nals(data).any(|n| data.get(n.start) == Some(&START_CODE_FRAME));
                if has_frame {
                    OutputKind::SyncFrame
                } else {
                    OutputKind::CodecConfig
                }
            }
            _ => OutputKind::Frame,
        },
        CodecKind::Vp8 => sync_if(vp8::is_key_frame(data)),
        CodecKind::Vp9 => sync_if(vp9::is_key_frame(data)),
    }
}

fn classify_nal_output(data: &[u8], kind: CodecKind) -> OutputKind {
    let mut parameter_sets = false;
    for span in iter_nals(data).filter(|n| !n.is_empty()) {
        let class = codec::classify_nal(kind, span.payload(data));
        if class.is_slice() {
            return sync_if(class.is_idr() || class.is_irap());
        }
        parameter_sets |= class.is_parameter_set();
    }
    if parameter_sets {
        OutputKind::CodecConfig
    } else {
        OutputKind::Frame
    }
}

fn sync_if(sync: bool) -> OutputKind {
    if sync {
        OutputKind::SyncFrame
    } else {
        OutputKind::Frame
    }
}
