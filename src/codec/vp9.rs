//! VP9 uncompressed header parsing
//!
//! Only the leading fields of `uncompressed_header()` are read: frame marker,
//! profile, `show_existing_frame`, frame type and, for key frames, the sync
//! code, bit depth and frame size.

use crate::codec::bitreader::RbspReader;
use crate::codec::frame::{FrameType, PictureType};
use crate::error::{Error, Result};

/// Key frame sync code
pub const SYNC_CODE: u32 = 0x498342;

const FRAME_MARKER: u32 = 2;
const CS_RGB: u32 = 7;

/// Leading fields of a VP9 frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameHeader {
    pub profile: u8,
    pub show_existing_frame: bool,
    pub key_frame: bool,
    pub show_frame: bool,
    pub error_resilient_mode: bool,
    /// Key frames only
    pub bit_depth: u8,
    pub width: u32,
    pub height: u32,
}

impl FrameHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = RbspReader::new(data);
        let mut header = FrameHeader::default();

        let marker = r.read_bits(2)?;
        if marker != FRAME_MARKER {
            return Err(Error::bitstream(format!(
                "Invalid VP9 frame marker: {} (expected 2)",
                marker
            )));
        }

        let profile_low = r.read_bits(1)?;
        let profile_high = r.read_bits(1)?;
        header.profile = ((profile_high << 1) | profile_low) as u8;
        if header.profile == 3 && r.read_bool()? {
            return Err(Error::bitstream("Invalid VP9 profile reserved bit"));
        }

        header.show_existing_frame = r.read_bool()?;
        if header.show_existing_frame {
            let _frame_to_show_map_idx = r.read_bits(3)?;
            return Ok(header);
        }

        header.key_frame = !r.read_bool()?;
        header.show_frame = r.read_bool()?;
        header.error_resilient_mode = r.read_bool()?;

        if header.key_frame {
            let sync = r.read_bits(24)?;
            if sync != SYNC_CODE {
                return Err(Error::bitstream(format!(
                    "Invalid VP9 sync code: 0x{:06X} (expected 0x{:06X})",
                    sync, SYNC_CODE
                )));
            }

            header.bit_depth = if header.profile >= 2 {
                if r.read_bool()? {
                    12
                } else {
                    10
                }
            } else {
                8
            };

            let color_space = r.read_bits(3)?;
            if color_space != CS_RGB {
                let _color_range = r.read_bool()?;
                if header.profile == 1 || header.profile == 3 {
                    r.skip_bits(3)?;
                }
            } else if header.profile == 1 || header.profile == 3 {
                r.skip_bits(1)?;
            } else {
                return Err(Error::bitstream("sRGB not allowed in profile 0 or 2"));
            }

            header.width = r.read_bits(16)? + 1;
            header.height = r.read_bits(16)? + 1;
        }

        Ok(header)
    }

    pub fn frame_type(&self) -> FrameType {
        if self.key_frame {
            FrameType::idr()
        } else {
            FrameType::new(PictureType::P, true)
        }
    }
}

/// Quick key frame check without full validation
pub fn is_key_frame(data: &[u8]) -> bool {
    FrameHeader::parse(data)
        .map(|h| h.key_frame)
        .unwrap_or(false)
}
