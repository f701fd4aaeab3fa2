//! VP8 frame tag parsing
//!
//! Every VP8 frame starts with a 3-byte little-endian frame tag:
//!
//! ```text
//! bit 0      frame type (0 = key frame)
//! bits 1-3   version
//! bit 4      show_frame
//! bits 5-23  first partition size
//! ```
//!
//! Key frames follow the tag with the start code `9D 01 2A` and two 16-bit
//! little-endian words holding a 14-bit dimension and a 2-bit scale.

use crate::codec::frame::{FrameType, PictureType};
use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Key frame start code
pub const KEY_FRAME_START_CODE: [u8; 3] = [0x9D, 0x01, 0x2A];

/// Uncompressed part of a VP8 frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTag {
    pub key_frame: bool,
    pub version: u8,
    pub show_frame: bool,
    pub first_partition_size: u32,
    /// Key frames only
    pub width: u16,
    pub horizontal_scale: u8,
    pub height: u16,
    pub vertical_scale: u8,
}

impl FrameTag {
    /// Parse the frame tag (and key frame dimensions) from a frame
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 3 {
            return Err(Error::bitstream("VP8 frame too small for header"));
        }

        let tag = LittleEndian::read_u24(&data[..3]);
        let key_frame = tag & 1 == 0;

        let mut frame = FrameTag {
            key_frame,
            version: ((tag >> 1) & 0x7) as u8,
            show_frame: (tag >> 4) & 1 != 0,
            first_partition_size: tag >> 5,
            width: 0,
            horizontal_scale: 0,
            height: 0,
            vertical_scale: 0,
        };

        if key_frame {
            if data.len() < 10 || data[3..6] != KEY_FRAME_START_CODE {
                return Err(Error::bitstream("Invalid VP8 key frame signature"));
            }

            let w = LittleEndian::read_u16(&data[6..8]);
            let h = LittleEndian::read_u16(&data[8..10]);
            frame.width = w & 0x3FFF;
            frame.horizontal_scale = (w >> 14) as u8;
            frame.height = h & 0x3FFF;
            frame.vertical_scale = (h >> 14) as u8;
        }

        Ok(frame)
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
    FrameTag::parse(data).map(|t| t.key_frame).unwrap_or(false)
}
