//! VC-1 start codes and profile detection
//!
//! Advanced profile streams are byte-stream formatted with `00 00 01 xx`
//! start codes (SMPTE 421M Annex E). Simple and Main profile frames are raw
//! and never carry start codes.

use crate::codec::startcode::starts_with_start_code;

pub const START_CODE_END_OF_SEQUENCE: u8 = 0x0A;
pub const START_CODE_SLICE: u8 = 0x0B;
pub const START_CODE_FIELD: u8 = 0x0C;
pub const START_CODE_FRAME: u8 = 0x0D;
pub const START_CODE_ENTRY_POINT: u8 = 0x0E;
pub const START_CODE_SEQUENCE_HEADER: u8 = 0x0F;

/// Prefix inserted before advanced-profile frames that arrive bare
pub const FRAME_START_CODE: [u8; 4] = [0x00, 0x00, 0x01, START_CODE_FRAME];

/// VC-1 profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Vc1Profile {
    #[default]
    Simple,
    Main,
    Advanced,
}

impl Vc1Profile {
    /// From the 2-bit PROFILE field (0 simple, 1 main, 3 advanced)
    pub fn from_u32(profile: u32) -> Self {
        match profile {
            1 => Vc1Profile::Main,
            3 => Vc1Profile::Advanced,
            _ => Vc1Profile::Simple,
        }
    }

    /// Detect the profile from codec-private data
    ///
    /// Advanced profile private data is a start-code delimited sequence
    /// header; simple/main carry STRUCT_C, whose top two bits are the profile.
    pub fn detect(header: &[u8]) -> Self {
        if start_code_suffix(header) == Some(START_CODE_SEQUENCE_HEADER) {
            return Vc1Profile::Advanced;
        }
        match header.first() {
            Some(b) => Vc1Profile::from_u32((b >> 6) as u32),
            None => Vc1Profile::Simple,
        }
    }
}

/// Suffix byte of a leading `00 00 01 xx` start code
pub fn start_code_suffix(data: &[u8]) -> Option<u8> {
    if data.len() >= 4 && data[..3] == [0x00, 0x00, 0x01] {
        Some(data[3])
    } else {
        None
    }
}

/// Sequence header or entry point
pub fn is_header_start_code(suffix: u8) -> bool {
    matches!(suffix, START_CODE_SEQUENCE_HEADER | START_CODE_ENTRY_POINT)
}

/// Whether an advanced-profile frame needs `00 00 01 0D` prepended
pub fn needs_frame_start_code(frame: &[u8]) -> bool {
    !starts_with_start_code(frame)
}
