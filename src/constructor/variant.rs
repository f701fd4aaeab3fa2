//! Per-codec behaviour tables
//!
//! Each codec kind maps to one static table chosen at construction; the
//! constructor calls through it instead of matching on the kind everywhere.

use super::{nal, vc1, vpx, BstState, FrameConstructor};
use crate::codec::{CodecKind, FrameType};
use crate::error::Result;
use crate::util::Timestamp;
use bytes::Bytes;
use std::fmt;

pub(super) type LoadFn = fn(&mut FrameConstructor, Bytes, Timestamp, bool, bool) -> Result<()>;
pub(super) type LoadHeaderFn = fn(&mut FrameConstructor, Bytes, bool) -> Result<()>;
pub(super) type SaveHeadersFn = fn(&mut FrameConstructor, &[u8], &[u8], bool) -> Result<()>;

pub(crate) struct CodecVariant {
    pub kind: CodecKind,
    pub initial_state: BstState,
    /// Prefix the first frame after `reset()` with the cached headers
    pub reinject_headers: bool,
    pub load: LoadFn,
    pub load_header: LoadHeaderFn,
    pub save_headers: SaveHeadersFn,
    /// Close an unfinished header collection at end of stream
    pub finish_headers: fn(&mut FrameConstructor),
    pub frame_type: fn(&[u8]) -> FrameType,
    pub header_only: fn(&[u8]) -> bool,
}

impl fmt::Debug for CodecVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecVariant")
            .field("kind", &self.kind)
            .field("initial_state", &self.initial_state)
            .field("reinject_headers", &self.reinject_headers)
            .finish_non_exhaustive()
    }
}

static AVC: CodecVariant = CodecVariant {
    kind: CodecKind::Avc,
    initial_state: BstState::HeaderAwaiting,
    reinject_headers: true,
    load: nal::load,
    load_header: nal::load_header,
    save_headers: nal::save_headers,
    finish_headers: nal::finish_headers,
    frame_type: nal::avc_frame_type,
    header_only: nal::avc_header_only,
};

static HEVC: CodecVariant = CodecVariant {
    kind: CodecKind::Hevc,
    initial_state: BstState::HeaderAwaiting,
    reinject_headers: true,
    load: nal::load,
    load_header: nal::load_header,
    save_headers: nal::save_headers,
    finish_headers: nal::finish_headers,
    frame_type: nal::hevc_frame_type,
    header_only: nal::hevc_header_only,
};

static VC1: CodecVariant = CodecVariant {
    kind: CodecKind::Vc1,
    initial_state: BstState::HeaderObtained,
    reinject_headers: true,
    load: vc1::load,
    load_header: ignore_header,
    save_headers: ignore_save_headers,
    finish_headers: ignore_finish,
    frame_type: unknown_frame_type,
    header_only: never_header_only,
};

static VP8: CodecVariant = CodecVariant {
    kind: CodecKind::Vp8,
    initial_state: BstState::HeaderObtained,
    reinject_headers: false,
    load: vpx::load,
    load_header: ignore_header,
    save_headers: ignore_save_headers,
    finish_headers: ignore_finish,
    frame_type: vpx::vp8_frame_type,
    header_only: never_header_only,
};

static VP9: CodecVariant = CodecVariant {
    kind: CodecKind::Vp9,
    initial_state: BstState::HeaderObtained,
    reinject_headers: false,
    load: vpx::load,
    load_header: ignore_header,
    save_headers: ignore_save_headers,
    finish_headers: ignore_finish,
    frame_type: vpx::vp9_frame_type,
    header_only: never_header_only,
};

pub(super) fn for_kind(kind: CodecKind) -> &'static CodecVariant {
    match kind {
        CodecKind::Avc => &AVC,
        CodecKind::Hevc => &HEVC,
        CodecKind::Vc1 => &VC1,
        CodecKind::Vp8 => &VP8,
        CodecKind::Vp9 => &VP9,
    }
}

fn ignore_header(_: &mut FrameConstructor, _: Bytes, _: bool) -> Result<()> {
    Ok(())
}

fn ignore_save_headers(_: &mut FrameConstructor, _: &[u8], _: &[u8], _: bool) -> Result<()> {
    Ok(())
}

fn ignore_finish(_: &mut FrameConstructor) {}

fn unknown_frame_type(_: &[u8]) -> FrameType {
    FrameType::default()
}

fn never_header_only(_: &[u8]) -> bool {
    false
}
