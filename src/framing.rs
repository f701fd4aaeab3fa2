//! Splitting elementary-stream files into input units
//!
//! The frame constructor expects one access unit (or a piece of one) per
//! `load()`. Files on disk come as:
//!
//! - AVC / HEVC: raw Annex B, split at access unit boundaries
//! - VC-1: advanced profile elementary stream, split at frame start codes
//!   with the leading sequence header reported as header data
//! - VP8 / VP9: IVF, one frame per IVF frame record

use crate::codec::startcode::iter_nals;
use crate::codec::vc1::{self, START_CODE_FRAME};
use crate::codec::{self, h265, CodecKind, NalClass};
use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::ops::Range;
use tracing::debug;

/// IVF file signature
pub const IVF_SIGNATURE: &[u8; 4] = b"DKIF";
const IVF_FRAME_HEADER_LEN: usize = 12;

/// One unit to feed to a constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Byte range inside the file
    pub range: Range<usize>,
    /// Presentation time in microseconds, -1 when unknown
    pub pts: i64,
    /// Codec configuration data rather than a frame
    pub is_header: bool,
}

impl Unit {
    fn frame(range: Range<usize>, pts: i64) -> Self {
        Unit {
            range,
            pts,
            is_header: false,
        }
    }
}

/// Split a whole file for `kind`
pub fn split(kind: CodecKind, data: &[u8]) -> Result<Vec<Unit>> {
    let units = match kind {
        CodecKind::Avc | CodecKind::Hevc => split_access_units(kind, data)
            .into_iter()
            .map(|r| Unit::frame(r, -1))
            .collect(),
        CodecKind::Vc1 => split_vc1(data)?,
        CodecKind::Vp8 | CodecKind::Vp9 => split_ivf(data)?,
    };
    debug!(codec = %kind, units = units.len(), "split input");
    Ok(units)
}

/// Access unit ranges of an Annex B stream
///
/// A new access unit starts at a delimiter, parameter set or prefix SEI
/// following a slice, or at a slice that is the first of its picture.
/// Bytes ahead of the first NAL unit stay with the first access unit.
pub fn split_access_units(kind: CodecKind, data: &[u8]) -> Vec<Range<usize>> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut seen_slice = false;

    for span in iter_nals(data).filter(|n| !n.is_empty()) {
        let nal = span.payload(data);
        let class = codec::classify_nal(kind, nal);

        let boundary = seen_slice
            && match class {
                NalClass::Delimiter | NalClass::Vps | NalClass::Sps | NalClass::Pps => true,
                NalClass::Sei => !is_suffix_sei(kind, nal),
                NalClass::Slice { .. } => first_slice_of_picture(kind, nal),
                _ => false,
            };

        if boundary {
            let pos = span.start_code_pos();
            units.push(start..pos);
            start = pos;
            seen_slice = false;
        }
        seen_slice |= class.is_slice();
    }

    if start < data.len() {
        units.push(start..data.len());
    }
    units
}

fn is_suffix_sei(kind: CodecKind, nal: &[u8]) -> bool {
    kind == CodecKind::Hevc
        && h265::nal_unit_type(nal) == Some(h265::NalUnitType::SuffixSeiNut as u8)
}

/// first_mb_in_slice == 0 (AVC) or first_slice_segment_in_pic_flag (HEVC)
fn first_slice_of_picture(kind: CodecKind, nal: &[u8]) -> bool {
    let header_len = kind.info().nal_header_len;
    nal.get(header_len).map(|b| b & 0x80 != 0).unwrap_or(false)
}

/// Advanced profile VC-1: sequence header, then one unit per frame
pub fn split_vc1(data: &[u8]) -> Result<Vec<Unit>> {
    if vc1::start_code_suffix(data).is_none() {
        return Err(Error::invalid_input(
            "VC-1 input must be an advanced profile elementary stream",
        ));
    }

    let frames: Vec<usize> = iter_nals(data)
        .filter(|n| data.get(n.start) == Some(&START_CODE_FRAME))
        .map(|n| n.start_code_pos())
        .collect();

    let mut units = Vec::with_capacity(frames.len() + 1);
    let first = frames.first().copied().unwrap_or(data.len());
    if first > 0 {
        units.push(Unit {
            range: 0..first,
            pts: -1,
            is_header: true,
        });
    }
    for (i, &pos) in frames.iter().enumerate() {
        let end = frames.get(i + 1).copied().unwrap_or(data.len());
        units.push(Unit::frame(pos..end, -1));
    }
    Ok(units)
}

/// Frames of an IVF file
pub fn split_ivf(data: &[u8]) -> Result<Vec<Unit>> {
    if data.len() < 32 || &data[..4] != IVF_SIGNATURE {
        return Err(Error::invalid_input("Not an IVF file"));
    }

    let header_len = LittleEndian::read_u16(&data[6..8]) as usize;
    let rate = LittleEndian::read_u32(&data[16..20]) as i128;
    let scale = LittleEndian::read_u32(&data[20..24]) as i128;
    if header_len < 32 || header_len > data.len() {
        return Err(Error::invalid_input(format!(
            "Bad IVF header size {}",
            header_len
        )));
    }

    let mut units = Vec::new();
    let mut pos = header_len;
    while pos + IVF_FRAME_HEADER_LEN <= data.len() {
        let size = LittleEndian::read_u32(&data[pos..pos + 4]) as usize;
        let pts = LittleEndian::read_u64(&data[pos + 4..pos + 12]) as i128;
        let start = pos + IVF_FRAME_HEADER_LEN;
        let end = start
            .checked_add(size)
            .filter(|&e| e <= data.len())
            .ok_or_else(|| Error::invalid_input(format!("IVF frame at {} is truncated", pos)))?;

        let micros = if rate > 0 {
            i64::try_from(pts * scale * 1_000_000 / rate).unwrap_or(-1)
        } else {
            -1
        };
        units.push(Unit::frame(start..end, micros));
        pos = end;
    }
    Ok(units)
}
