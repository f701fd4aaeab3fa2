//! NAL (Network Abstraction Layer) unit classification for H.264/AVC
//!
//! ## NAL Unit Types
//!
//! Common NAL unit types:
//! - Type 1: Non-IDR slice (P/B frame)
//! - Type 5: IDR slice (keyframe)
//! - Type 6: SEI (Supplemental Enhancement Information)
//! - Type 7: SPS (Sequence Parameter Set)
//! - Type 8: PPS (Picture Parameter Set)
//! - Type 9: AUD (Access Unit Delimiter)
//!
//! The type lives in the low five bits of the single header byte.

use crate::codec::bitreader::{unescape_rbsp, RbspReader};
use crate::codec::frame::{FrameType, PictureType};
use crate::codec::startcode::iter_nals;
use crate::codec::NalClass;
use crate::error::{Error, Result};

// NAL unit type constants
pub const NAL_TYPE_SLICE: u8 = 1;
pub const NAL_TYPE_DPA: u8 = 2;
pub const NAL_TYPE_DPB: u8 = 3;
pub const NAL_TYPE_DPC: u8 = 4;
pub const NAL_TYPE_IDR: u8 = 5;
pub const NAL_TYPE_SEI: u8 = 6;
pub const NAL_TYPE_SPS: u8 = 7;
pub const NAL_TYPE_PPS: u8 = 8;
pub const NAL_TYPE_AUD: u8 = 9;
pub const NAL_TYPE_END_SEQ: u8 = 10;
pub const NAL_TYPE_END_STREAM: u8 = 11;
pub const NAL_TYPE_FILLER: u8 = 12;

/// Mask selecting the type field of the header byte
pub const NAL_TYPE_MASK: u8 = 0x1F;

/// Size of the NAL unit header in bytes
pub const NAL_HEADER_LEN: usize = 1;

/// Extract the NAL unit type from a unit's first byte(s)
pub fn nal_unit_type(nal: &[u8]) -> Option<u8> {
    nal.first().map(|b| b & NAL_TYPE_MASK)
}

/// NAL reference IDC (bits 5-6 of the header byte)
pub fn nal_ref_idc(nal: &[u8]) -> Option<u8> {
    nal.first().map(|b| (b >> 5) & 0x03)
}

/// Map an AVC NAL unit type onto the codec-neutral classes
pub fn classify(nal_type: u8) -> NalClass {
    match nal_type {
        NAL_TYPE_SPS => NalClass::Sps,
        NAL_TYPE_PPS => NalClass::Pps,
        NAL_TYPE_SEI => NalClass::Sei,
        NAL_TYPE_IDR => NalClass::Slice {
            idr: true,
            irap: true,
        },
        NAL_TYPE_SLICE | NAL_TYPE_DPA => NalClass::Slice {
            idr: false,
            irap: false,
        },
        NAL_TYPE_AUD => NalClass::Delimiter,
        NAL_TYPE_END_SEQ | NAL_TYPE_END_STREAM => NalClass::EndOfSequence,
        _ => NalClass::Other,
    }
}

/// Frame type of a slice NAL unit (header byte included)
///
/// Reads `first_mb_in_slice` and `slice_type` from the slice header.
pub fn slice_frame_type(nal: &[u8]) -> Result<FrameType> {
    let nal_type = nal_unit_type(nal).ok_or_else(|| Error::bitstream("Empty slice NAL unit"))?;
    if !classify(nal_type).is_slice() {
        return Err(Error::bitstream(format!(
            "NAL unit type {} is not a slice",
            nal_type
        )));
    }

    // The two fields fit in the first few bytes; avoid unescaping the slice
    let head = &nal[NAL_HEADER_LEN..nal.len().min(NAL_HEADER_LEN + 16)];
    let rbsp = unescape_rbsp(head);
    let mut reader = RbspReader::new(&rbsp);

    let _first_mb_in_slice = reader.read_ue()?;
    let slice_type = reader.read_ue()?;

    let picture = match slice_type % 5 {
        0 | 3 => PictureType::P,
        1 => PictureType::B,
        _ => PictureType::I,
    };
    let reference = nal_ref_idc(nal).unwrap_or(0) != 0;

    if nal_type == NAL_TYPE_IDR {
        return Ok(FrameType {
            picture,
            idr: true,
            reference,
        });
    }

    Ok(FrameType::new(picture, reference))
}

/// Extract the first SPS and PPS from an Annex B buffer
///
/// Returned units exclude the start code and include the header byte.
pub fn extract_sps_pps(data: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let mut sps = None;
    let mut pps = None;

    for nal in iter_nals(data).filter(|n| !n.is_empty()) {
        let payload = nal.payload(data);
        match nal_unit_type(payload) {
            Some(NAL_TYPE_SPS) if sps.is_none() => sps = Some(payload.to_vec()),
            Some(NAL_TYPE_PPS) if pps.is_none() => pps = Some(payload.to_vec()),
            _ => {}
        }

        if sps.is_some() && pps.is_some() {
            break;
        }
    }

    match (sps, pps) {
        (Some(s), Some(p)) => Some((s, p)),
        _ => None,
    }
}

/// Check if Annex B data contains a keyframe (IDR NAL unit)
pub fn contains_keyframe(data: &[u8]) -> bool {
    iter_nals(data)
        .filter(|n| !n.is_empty())
        .any(|n| nal_unit_type(n.payload(data)) == Some(NAL_TYPE_IDR))
}
