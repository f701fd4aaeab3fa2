//! H.264/AVC bitstream helpers
//!
//! NAL classification, slice-type probing and SPS parsing used by the AVC
//! frame constructor and the encoder-output post-filter.

pub mod nal;
pub mod sps;

pub use nal::{classify, nal_unit_type, slice_frame_type};
pub use sps::parse_sps;
