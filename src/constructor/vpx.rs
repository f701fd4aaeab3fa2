//! VP8 / VP9 loading
//!
//! No header phase; frames pass through as they come. Until the first key
//! frame has been delivered, inter frames are dropped since a decoder
//! cannot start on them.

use super::{Active, FrameConstructor};
use crate::codec::{vp8, vp9, CodecKind, FrameType};
use crate::error::Result;
use crate::util::Timestamp;
use bytes::Bytes;
use tracing::debug;

pub(super) fn load(
    c: &mut FrameConstructor,
    data: Bytes,
    ts: Timestamp,
    is_header: bool,
    is_complete_frame: bool,
) -> Result<()> {
    if is_header {
        c.header.set_opaque(&data);
        return Ok(());
    }
    if !c.first_sample {
        return c.deliver(data, ts, is_complete_frame, &[]);
    }

    let is_key = key_frame_check(c.kind());
    if is_complete_frame && c.bst_buf.is_empty() {
        if !is_key(&data) {
            debug!(len = data.len(), "dropping inter frame ahead of first key frame");
            return Ok(());
        }
        c.first_sample = false;
        return c.deliver(data, ts, true, &[]);
    }

    c.deliver(data, ts, is_complete_frame, &[])?;
    if is_complete_frame {
        if is_key(c.bst_buf.bitstream().data()) {
            c.first_sample = false;
        } else {
            debug!(len = c.bst_buf.len(), "dropping inter frame ahead of first key frame");
            c.bst_buf.clear();
            c.active = Active::None;
        }
    }
    Ok(())
}

fn key_frame_check(kind: CodecKind) -> fn(&[u8]) -> bool {
    match kind {
        CodecKind::Vp9 => vp9::is_key_frame,
        _ => vp8::is_key_frame,
    }
}

pub(super) fn vp8_frame_type(data: &[u8]) -> FrameType {
    vp8::FrameTag::parse(data)
        .map(|t| t.frame_type())
        .unwrap_or_default()
}

pub(super) fn vp9_frame_type(data: &[u8]) -> FrameType {
    vp9::FrameHeader::parse(data)
        .map(|h| h.frame_type())
        .unwrap_or_default()
}
