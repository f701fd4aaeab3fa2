//! Per-codec bitstream parsing helpers
//!
//! Nothing here decodes pictures. The modules extract just enough from
//! elementary streams to frame them: NAL unit boundaries and types, parameter
//! set fields, SEI payloads and VPx/VC-1 frame headers.

pub mod bitreader;
pub mod frame;
pub mod h264;
pub mod h265;
pub mod startcode;
pub mod vc1;
pub mod vp8;
pub mod vp9;

pub use frame::{FrameType, PicStruct, PictureType};
pub use startcode::{iter_nals, next_nal, NalIter, NalSpan};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compressed video formats handled by the frame constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// H.264 / AVC
    Avc,
    /// H.265 / HEVC
    Hevc,
    /// SMPTE VC-1
    Vc1,
    /// On2 VP8
    Vp8,
    /// Google VP9
    Vp9,
}

impl CodecKind {
    /// Every supported kind
    pub const ALL: [CodecKind; 5] = [
        CodecKind::Avc,
        CodecKind::Hevc,
        CodecKind::Vc1,
        CodecKind::Vp8,
        CodecKind::Vp9,
    ];

    /// Short identifier used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            CodecKind::Avc => "h264",
            CodecKind::Hevc => "h265",
            CodecKind::Vc1 => "vc1",
            CodecKind::Vp8 => "vp8",
            CodecKind::Vp9 => "vp9",
        }
    }

    /// Annex B NAL unit stream
    pub fn is_nal_based(&self) -> bool {
        matches!(self, CodecKind::Avc | CodecKind::Hevc)
    }

    /// Static description of the codec
    pub fn info(&self) -> CodecInfo {
        match self {
            CodecKind::Avc => CodecInfo {
                kind: *self,
                name: "H.264",
                long_name: "H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10",
                nal_header_len: h264::nal::NAL_HEADER_LEN,
            },
            CodecKind::Hevc => CodecInfo {
                kind: *self,
                name: "H.265",
                long_name: "H.265 / HEVC / High Efficiency Video Coding",
                nal_header_len: h265::nal::NAL_HEADER_LEN,
            },
            CodecKind::Vc1 => CodecInfo {
                kind: *self,
                name: "VC-1",
                long_name: "SMPTE 421M VC-1",
                nal_header_len: 0,
            },
            CodecKind::Vp8 => CodecInfo {
                kind: *self,
                name: "VP8",
                long_name: "On2 VP8",
                nal_header_len: 0,
            },
            CodecKind::Vp9 => CodecInfo {
                kind: *self,
                name: "VP9",
                long_name: "Google VP9",
                nal_header_len: 0,
            },
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CodecKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "h264" | "avc" => Ok(CodecKind::Avc),
            "h265" | "hevc" => Ok(CodecKind::Hevc),
            "vc1" | "wvc1" => Ok(CodecKind::Vc1),
            "vp8" => Ok(CodecKind::Vp8),
            "vp9" => Ok(CodecKind::Vp9),
            other => Err(Error::not_found(format!("Unknown codec: {}", other))),
        }
    }
}

/// Codec information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecInfo {
    /// Codec kind
    pub kind: CodecKind,
    /// Codec name
    pub name: &'static str,
    /// Long descriptive name
    pub long_name: &'static str,
    /// NAL unit header size, 0 for non-NAL codecs
    pub nal_header_len: usize,
}

/// Get codec information by identifier
pub fn get_codec_info(id: &str) -> Option<CodecInfo> {
    id.parse::<CodecKind>().ok().map(|k| k.info())
}

/// Codec-neutral classification of a NAL unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalClass {
    /// Video parameter set (HEVC only)
    Vps,
    /// Sequence parameter set
    Sps,
    /// Picture parameter set
    Pps,
    /// Supplemental enhancement information
    Sei,
    /// Coded slice
    Slice {
        /// Instantaneous decoder refresh
        idr: bool,
        /// Intra random access point
        irap: bool,
    },
    /// Access unit delimiter
    Delimiter,
    /// End of sequence or stream
    EndOfSequence,
    /// Anything else (filler, reserved, extensions)
    Other,
}

impl NalClass {
    /// Coded slice of any kind
    pub fn is_slice(&self) -> bool {
        matches!(self, NalClass::Slice { .. })
    }

    /// IDR slice
    pub fn is_idr(&self) -> bool {
        matches!(self, NalClass::Slice { idr: true, .. })
    }

    /// Random access slice (IDR, plus CRA/BLA for HEVC)
    pub fn is_irap(&self) -> bool {
        matches!(self, NalClass::Slice { irap: true, .. })
    }

    /// VPS, SPS or PPS
    pub fn is_parameter_set(&self) -> bool {
        matches!(self, NalClass::Vps | NalClass::Sps | NalClass::Pps)
    }
}

/// Fields decoded from a sequence parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SpsInfo {
    /// profile_idc (general_profile_idc for HEVC)
    pub profile_idc: u8,
    /// level_idc (general_level_idc for HEVC)
    pub level_idc: u8,
    /// Parameter set id
    pub sps_id: u8,
    /// 0 = monochrome, 1 = 4:2:0, 2 = 4:2:2, 3 = 4:4:4
    pub chroma_format_idc: u8,
    /// Luma bit depth
    pub bit_depth_luma: u8,
    /// Chroma bit depth
    pub bit_depth_chroma: u8,
    /// Display width after cropping
    pub width: u32,
    /// Display height after cropping
    pub height: u32,
    /// Stream may carry field pictures
    pub interlaced: bool,
}

impl SpsInfo {
    /// Whether switching from `self` to `other` needs decoder reconfiguration
    pub fn differs_in_format(&self, other: &SpsInfo) -> bool {
        self.width != other.width
            || self.height != other.height
            || self.chroma_format_idc != other.chroma_format_idc
            || self.bit_depth_luma != other.bit_depth_luma
            || self.bit_depth_chroma != other.bit_depth_chroma
            || self.interlaced != other.interlaced
    }
}

/// NAL unit type of `nal` (start code excluded) for the given codec
pub fn nal_unit_type(kind: CodecKind, nal: &[u8]) -> Option<u8> {
    match kind {
        CodecKind::Avc => h264::nal_unit_type(nal),
        CodecKind::Hevc => h265::nal_unit_type(nal),
        _ => None,
    }
}

/// Classify a NAL unit (start code excluded) for the given codec
pub fn classify_nal(kind: CodecKind, nal: &[u8]) -> NalClass {
    match nal_unit_type(kind, nal) {
        Some(t) if kind == CodecKind::Avc => h264::classify(t),
        Some(t) if kind == CodecKind::Hevc => h265::classify(t),
        _ => NalClass::Other,
    }
}

/// Parse an SPS NAL unit for the given codec
pub fn parse_sps(kind: CodecKind, nal: &[u8]) -> Result<SpsInfo> {
    match kind {
        CodecKind::Avc => h264::parse_sps(nal),
        CodecKind::Hevc => h265::parse_sps(nal),
        other => Err(Error::invalid_input(format!(
            "{} has no sequence parameter sets",
            other
        ))),
    }
}

/// Frame type of a slice NAL unit for the given codec
pub fn slice_frame_type(kind: CodecKind, nal: &[u8]) -> Option<FrameType> {
    match kind {
        CodecKind::Avc => h264::slice_frame_type(nal).ok(),
        CodecKind::Hevc => h265::slice_frame_type(nal),
        _ => None,
    }
}
