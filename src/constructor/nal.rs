//! AVC / HEVC loading
//!
//! Until both an SPS and a PPS have been seen, input accumulates in the
//! internal buffer and is scanned for parameter sets; anything ahead of the
//! first parameter set is dropped. A NAL unit counts as complete once
//! another start code follows it, or when the buffer holding it was flagged
//! as header or complete-frame data.
//!
//! With `hdr_sei` on HEVC streams the collection stays open until the first
//! coded slice, so prefix SEI sent between the headers and the first picture
//! is cached as well.

use super::header::HeaderCache;
use super::{Active, BstState, FrameConstructor};
use crate::codec::h265::NalUnitType;
use crate::codec::startcode::{iter_nals, starts_with_start_code};
use crate::codec::{self, h265, CodecKind, FrameType, NalClass};
use crate::error::{Error, Result};
use crate::util::Timestamp;
use bytes::Bytes;
use tracing::{debug, trace, warn};

/// Bytes kept while awaiting a parameter set, enough for a split start code
const START_CODE_TAIL: usize = 3;

pub(super) fn load(
    c: &mut FrameConstructor,
    data: Bytes,
    ts: Timestamp,
    is_header: bool,
    is_complete_frame: bool,
) -> Result<()> {
    let complete = is_header || is_complete_frame;

    if c.state.is_collecting() {
        collect(c, &data, ts, complete)?;
        if c.state == BstState::HeaderObtained && complete {
            c.expose_buffer();
        }
        return Ok(());
    }

    // The first piece of an access unit decides whether injection is needed
    if c.bst_buf.is_empty() {
        refresh_headers(c, &data, complete);
    }
    c.deliver(data, ts, complete, &[])?;

    // Units split across loads are only whole once assembled
    if complete && c.active == Active::Buffer {
        refresh_assembled(c);
    }
    Ok(())
}

pub(super) fn load_header(c: &mut FrameConstructor, data: Bytes, is_header: bool) -> Result<()> {
    if c.state.is_collecting() {
        // Collected bytes go out in front of the next frame
        return collect(c, &data, Timestamp::none(), is_header);
    }

    let before = c.header.bytes().to_vec();
    refresh_headers(c, &data, is_header);
    if c.header.bytes() != before.as_slice() {
        debug!("headers replaced out of band, re-injecting");
        c.inject_headers = true;
    }
    Ok(())
}

pub(super) fn save_headers(
    c: &mut FrameConstructor,
    sps: &[u8],
    pps: &[u8],
    is_reset: bool,
) -> Result<()> {
    if sps.is_empty() {
        return Err(Error::null_pointer("SPS buffer is empty"));
    }
    if pps.is_empty() {
        return Err(Error::null_pointer("PPS buffer is empty"));
    }

    let kind = c.variant.kind;
    let sps_units = split_units(sps);
    let pps_units = split_units(pps);

    // Validate everything before touching the cache
    let mut have_sps = false;
    for unit in &sps_units {
        match codec::classify_nal(kind, unit) {
            NalClass::Sps => have_sps = true,
            NalClass::Vps => {}
            other => {
                return Err(Error::invalid_input(format!(
                    "Unexpected {:?} NAL unit in SPS buffer",
                    other
                )))
            }
        }
    }
    if !have_sps {
        return Err(Error::invalid_input("SPS buffer holds no SPS"));
    }
    if pps_units.is_empty() {
        return Err(Error::invalid_input("PPS buffer holds no PPS"));
    }
    for unit in &pps_units {
        let class = codec::classify_nal(kind, unit);
        if class != NalClass::Pps {
            return Err(Error::invalid_input(format!(
                "Unexpected {:?} NAL unit in PPS buffer",
                class
            )));
        }
    }

    if is_reset {
        c.header.clear();
    }
    for unit in &sps_units {
        if codec::classify_nal(kind, unit) == NalClass::Vps {
            c.header.set_vps(unit);
        } else if c.header.set_sps(kind, unit) {
            c.format_change = true;
        }
    }
    for unit in &pps_units {
        c.header.set_pps(unit);
    }

    // A half-collected parameter set must not end up ahead of the cache
    if c.state.is_collecting() {
        c.bst_buf.clear();
    }
    c.state = BstState::HeaderObtained;
    c.inject_headers = true;
    debug!(is_reset, len = c.header.bytes().len(), "headers saved");
    Ok(())
}

/// End of stream during collection: the last NAL unit is complete by now
pub(super) fn finish_headers(c: &mut FrameConstructor) {
    scan_collected(c, true);
    if c.state == BstState::HeaderWaitSei && c.header.is_complete() {
        debug!("no slice before end of stream, headers obtained");
        c.state = BstState::HeaderObtained;
        c.inject_headers = false;
    }
}

fn collect(c: &mut FrameConstructor, data: &[u8], ts: Timestamp, complete: bool) -> Result<()> {
    c.bst_buf.append(data, ts)?;
    scan_collected(c, complete);
    Ok(())
}

fn scan_collected(c: &mut FrameConstructor, complete: bool) {
    let kind = c.variant.kind;

    if c.state == BstState::HeaderAwaiting {
        let data = c.bst_buf.bitstream().data();
        let first = iter_nals(data)
            .filter(|n| !n.is_empty())
            .find(|n| codec::classify_nal(kind, n.payload(data)).is_parameter_set());

        let drop = match first {
            Some(n) => n.start_code_pos(),
            None => data.len().saturating_sub(START_CODE_TAIL),
        };
        if drop > 0 {
            trace!(drop, "dropping data ahead of parameter sets");
            if let Err(e) = c.bst_buf.bitstream_mut().consume(drop) {
                warn!("Failed to drop leading data: {}", e);
            }
        }
        if first.is_none() {
            return;
        }
        c.state = BstState::HeaderCollecting;
        debug!("parameter set found, collecting headers");
    }

    let hdr_sei = c.config.hdr_sei && kind == CodecKind::Hevc;
    let found = scan_headers(&mut c.header, kind, hdr_sei, c.bst_buf.bitstream().data(), complete);
    c.format_change |= found.format_change;
    let saw_slice = found.slice;

    if !c.header.is_complete() {
        return;
    }

    let next = if hdr_sei && !saw_slice {
        BstState::HeaderWaitSei
    } else {
        BstState::HeaderObtained
    };
    if next != c.state {
        debug!(from = %c.state, to = %next, "header state");
        c.state = next;
    }
    if next == BstState::HeaderObtained {
        // The collected bytes carry the headers themselves
        c.inject_headers = false;
    }
}

/// What a pass over the units ahead of the first slice found
#[derive(Debug, Default)]
struct HeaderScan {
    sps: bool,
    pps: bool,
    slice: bool,
    format_change: bool,
}

/// Cache parameter sets (and HDR SEI) found ahead of the first slice
///
/// The last unit only counts when `complete`, it may still be cut short.
fn scan_headers(
    header: &mut HeaderCache,
    kind: CodecKind,
    hdr_sei: bool,
    data: &[u8],
    complete: bool,
) -> HeaderScan {
    let mut found = HeaderScan::default();

    for span in iter_nals(data).filter(|n| !n.is_empty()) {
        let unit = span.payload(data);
        let class = codec::classify_nal(kind, unit);
        if class.is_slice() {
            found.slice = true;
            break;
        }
        if span.end == data.len() && !complete {
            break;
        }

        match class {
            NalClass::Vps => header.set_vps(unit),
            NalClass::Sps => {
                found.sps = true;
                if header.set_sps(kind, unit) {
                    debug!("SPS changes picture format");
                    found.format_change = true;
                }
            }
            NalClass::Pps => {
                found.pps = true;
                header.set_pps(unit);
            }
            NalClass::Sei if hdr_sei && is_prefix_sei(unit) => {
                if let Err(e) = header.store_hdr_sei(unit) {
                    warn!("Ignoring malformed SEI: {}", e);
                }
            }
            _ => {}
        }
    }
    found
}

/// Track parameter sets and HDR SEI re-sent in one input buffer
fn refresh_headers(c: &mut FrameConstructor, data: &[u8], complete: bool) {
    let kind = c.variant.kind;
    let hdr_sei = c.config.hdr_sei && kind == CodecKind::Hevc;
    let found = scan_headers(&mut c.header, kind, hdr_sei, data, complete);
    c.format_change |= found.format_change;

    if found.sps && found.pps && c.inject_headers {
        trace!("input carries its own headers");
        c.inject_headers = false;
    }
}

/// Same, over an access unit completed in the internal buffer
fn refresh_assembled(c: &mut FrameConstructor) {
    let kind = c.variant.kind;
    let hdr_sei = c.config.hdr_sei && kind == CodecKind::Hevc;
    let found = scan_headers(&mut c.header, kind, hdr_sei, c.bst_buf.bitstream().data(), true);
    c.format_change |= found.format_change;
}

fn is_prefix_sei(unit: &[u8]) -> bool {
    h265::nal_unit_type(unit) == Some(NalUnitType::PrefixSeiNut as u8)
}

/// NAL units of a header argument: Annex B data, or one bare unit
fn split_units(data: &[u8]) -> Vec<&[u8]> {
    if starts_with_start_code(data) {
        iter_nals(data)
            .filter(|n| !n.is_empty())
            .map(|n| n.payload(data))
            .collect()
    } else {
        vec![data]
    }
}

fn first_slice_type(kind: CodecKind, data: &[u8]) -> FrameType {
    iter_nals(data)
        .filter(|n| !n.is_empty())
        .map(|n| n.payload(data))
        .find(|unit| codec::classify_nal(kind, unit).is_slice())
        .and_then(|unit| codec::slice_frame_type(kind, unit))
        .unwrap_or_default()
}

fn parameter_sets_only(kind: CodecKind, data: &[u8]) -> bool {
    let mut any = false;
    for span in iter_nals(data).filter(|n| !n.is_empty()) {
        let class = codec::classify_nal(kind, span.payload(data));
        if class.is_slice() {
            return false;
        }
        any |= class.is_parameter_set();
    }
    any
}

pub(super) fn avc_frame_type(data: &[u8]) -> FrameType {
    first_slice_type(CodecKind::Avc, data)
}

pub(super) fn hevc_frame_type(data: &[u8]) -> FrameType {
    first_slice_type(CodecKind::Hevc, data)
}

pub(super) fn avc_header_only(data: &[u8]) -> bool {
    parameter_sets_only(CodecKind::Avc, data)
}

pub(super) fn hevc_header_only(data: &[u8]) -> bool {
    parameter_sets_only(CodecKind::Hevc, data)
}
