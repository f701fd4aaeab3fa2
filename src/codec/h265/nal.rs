//! H.265/HEVC NAL unit classification
//!
//! ## NAL Unit Header
//!
//! ```text
//! NAL Header (16 bits):
//! +---+------+---------+-----+
//! | F | Type | LayerID | TID |
//! +---+------+---------+-----+
//!   1    6       6        3
//! ```
//!
//! The type is `(byte0 & 0x7E) >> 1`, against AVC's `byte0 & 0x1F`.

use crate::codec::frame::{FrameType, PictureType};
use crate::codec::NalClass;

/// Mask selecting the type field of the first header byte
pub const NAL_TYPE_MASK: u8 = 0x7E;

/// Size of the NAL unit header in bytes
pub const NAL_HEADER_LEN: usize = 2;

/// HEVC NAL unit types the constructor cares about
///
/// Reserved values (10-15, 22-31, 41-47) and unspecified ones collapse into
/// `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NalUnitType {
    // Trailing / leading pictures, N = sub-layer non-reference
    TrailN = 0,
    TrailR = 1,
    TsaN = 2,
    TsaR = 3,
    StsaN = 4,
    StsaR = 5,
    RadlN = 6,
    RadlR = 7,
    RaslN = 8,
    RaslR = 9,
    // IRAP
    BlaWLp = 16,
    BlaWRadl = 17,
    BlaNLp = 18,
    IdrWRadl = 19,
    IdrNLp = 20,
    CraNut = 21,
    // Non-VCL
    VpsNut = 32,
    SpsNut = 33,
    PpsNut = 34,
    AudNut = 35,
    EosNut = 36,
    EobNut = 37,
    FdNut = 38,
    PrefixSeiNut = 39,
    SuffixSeiNut = 40,
    Unknown = 255,
}

/// Indexed by raw type value
const TYPE_TABLE: [NalUnitType; 41] = {
    use NalUnitType::*;
    [
        TrailN, TrailR, TsaN, TsaR, StsaN, StsaR, RadlN, RadlR, RaslN, RaslR, Unknown, Unknown,
        Unknown, Unknown, Unknown, Unknown, BlaWLp, BlaWRadl, BlaNLp, IdrWRadl, IdrNLp, CraNut,
        Unknown, Unknown, Unknown, Unknown, Unknown, Unknown, Unknown, Unknown, Unknown, Unknown,
        VpsNut, SpsNut, PpsNut, AudNut, EosNut, EobNut, FdNut, PrefixSeiNut, SuffixSeiNut,
    ]
};

impl NalUnitType {
    pub fn from_u8(value: u8) -> Self {
        TYPE_TABLE
            .get(value as usize)
            .copied()
            .unwrap_or(NalUnitType::Unknown)
    }

    /// VCL types 0-9 and 16-21
    pub fn is_slice(&self) -> bool {
        matches!(*self as u8, 0..=9 | 16..=21)
    }

    pub fn is_idr(&self) -> bool {
        matches!(self, Self::IdrWRadl | Self::IdrNLp)
    }

    /// BLA, IDR or CRA
    pub fn is_irap(&self) -> bool {
        matches!(*self as u8, 16..=21)
    }

    pub fn is_parameter_set(&self) -> bool {
        matches!(self, Self::VpsNut | Self::SpsNut | Self::PpsNut)
    }

    /// Even types below 16
    pub fn is_sub_layer_non_reference(&self) -> bool {
        let t = *self as u8;
        t < 16 && t % 2 == 0
    }
}

/// Extract the raw NAL unit type from a unit's first byte(s)
pub fn nal_unit_type(nal: &[u8]) -> Option<u8> {
    nal.first().map(|b| (b & NAL_TYPE_MASK) >> 1)
}

/// Map an HEVC NAL unit type onto the codec-neutral classes
pub fn classify(nal_type: u8) -> NalClass {
    let t = NalUnitType::from_u8(nal_type);
    match t {
        NalUnitType::VpsNut => NalClass::Vps,
        NalUnitType::SpsNut => NalClass::Sps,
        NalUnitType::PpsNut => NalClass::Pps,
        NalUnitType::PrefixSeiNut | NalUnitType::SuffixSeiNut => NalClass::Sei,
        NalUnitType::AudNut => NalClass::Delimiter,
        NalUnitType::EosNut | NalUnitType::EobNut => NalClass::EndOfSequence,
        _ if t.is_slice() => NalClass::Slice {
            idr: t.is_idr(),
            irap: t.is_irap(),
        },
        _ => NalClass::Other,
    }
}

/// Frame type of a slice NAL unit
///
/// HEVC slice headers put `slice_type` behind PPS-dependent fields, so the
/// type is inferred from the NAL unit type alone: IRAP pictures are intra,
/// everything else is reported as P.
pub fn slice_frame_type(nal: &[u8]) -> Option<FrameType> {
    let t = NalUnitType::from_u8(nal_unit_type(nal)?);
    if !t.is_slice() {
        return None;
    }

    if t.is_idr() {
        return Some(FrameType::idr());
    }

    let picture = if t.is_irap() {
        PictureType::I
    } else {
        PictureType::P
    };
    Some(FrameType::new(picture, !t.is_sub_layer_non_reference()))
}
