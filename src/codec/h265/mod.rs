//! H.265/HEVC bitstream helpers
//!
//! HEVC framing differs from AVC in three places the constructor cares
//! about: the two-byte NAL header (`type = (b0 & 0x7E) >> 1`), the extra
//! video parameter set, and prefix/suffix SEI units that may carry HDR
//! static metadata.

pub mod nal;
pub mod sei;
pub mod sps;

pub use nal::{classify, nal_unit_type, slice_frame_type, NalUnitType};
pub use sei::{
    parse_sei_messages, ContentLightLevel, HdrStaticInfo, MasteringDisplay, SeiMap, SeiMessage,
};
pub use sps::parse_sps;
