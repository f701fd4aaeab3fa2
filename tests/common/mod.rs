//! Common test utilities for VFC integration tests
//!
//! Synthetic streams: a small Exp-Golomb bit writer for parameter sets,
//! NAL unit builders for AVC/HEVC, and helpers to drive a constructor the
//! way a decoder would.

#![allow(dead_code)]

use bytes::Bytes;
use vfc_lib::codec::CodecKind;
use vfc_lib::constructor::{ConstructorConfig, FrameConstructor, LogContext, StreamInfo};

// ============================================================================
// Bit writer
// ============================================================================

/// MSB-first bit writer producing RBSP bytes
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_bit(&mut self, bit: bool) {
        if self.used == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> self.used;
        }
        self.used = (self.used + 1) % 8;
    }

    pub fn put_bits(&mut self, value: u32, n: u32) {
        for i in (0..n).rev() {
            self.put_bit((value >> i) & 1 == 1);
        }
    }

    /// Unsigned Exp-Golomb
    pub fn put_ue(&mut self, value: u32) {
        let v = value + 1;
        let len = 32 - v.leading_zeros();
        self.put_bits(0, len - 1);
        self.put_bits(v, len);
    }

    /// rbsp_trailing_bits, then emulation prevention
    pub fn finish(mut self) -> Vec<u8> {
        self.put_bit(true);
        while self.used != 0 {
            self.put_bit(false);
        }
        escape(&self.bytes)
    }
}

/// Insert emulation prevention bytes
pub fn escape(rbsp: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rbsp.len() + rbsp.len() / 64);
    let mut zeros = 0;
    for &b in rbsp {
        if zeros >= 2 && b <= 3 {
            out.push(0x03);
            zeros = 0;
        }
        out.push(b);
        zeros = if b == 0 { zeros + 1 } else { 0 };
    }
    out
}

// ============================================================================
// Annex B assembly
// ============================================================================

/// Join NAL units with four-byte start codes
pub fn annexb(units: &[&[u8]]) -> Vec<u8> {
    join(units, &[0, 0, 0, 1])
}

/// Join NAL units with three-byte start codes
pub fn annexb_short(units: &[&[u8]]) -> Vec<u8> {
    join(units, &[0, 0, 1])
}

fn join(units: &[&[u8]], start_code: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for unit in units {
        out.extend_from_slice(start_code);
        out.extend_from_slice(unit);
    }
    out
}

/// Payload bytes that never form a start code
fn filler(len: usize) -> impl Iterator<Item = u8> {
    (0..len).map(|i| 0xA0 | (i as u8 & 0x0F))
}

// ============================================================================
// AVC
// ============================================================================

/// Baseline SPS for the given display size
pub fn avc_sps(width: u32, height: u32, interlaced: bool) -> Vec<u8> {
    let field_factor = if interlaced { 2 } else { 1 };
    let width_mbs = width.div_ceil(16);
    let map_units = height.div_ceil(16 * field_factor);

    let mut w = BitWriter::new();
    w.put_bits(66, 8); // profile_idc
    w.put_bits(0xC0, 8); // constraint flags
    w.put_bits(31, 8); // level_idc
    w.put_ue(0); // seq_parameter_set_id
    w.put_ue(0); // log2_max_frame_num_minus4
    w.put_ue(0); // pic_order_cnt_type
    w.put_ue(2); // log2_max_pic_order_cnt_lsb_minus4
    w.put_ue(1); // max_num_ref_frames
    w.put_bit(false); // gaps_in_frame_num_value_allowed_flag
    w.put_ue(width_mbs - 1);
    w.put_ue(map_units - 1);
    w.put_bit(!interlaced); // frame_mbs_only_flag
    if interlaced {
        w.put_bit(false); // mb_adaptive_frame_field_flag
    }
    w.put_bit(true); // direct_8x8_inference_flag

    let crop_right = (width_mbs * 16 - width) / 2;
    let crop_bottom = (map_units * 16 * field_factor - height) / (2 * field_factor);
    if crop_right > 0 || crop_bottom > 0 {
        w.put_bit(true);
        w.put_ue(0);
        w.put_ue(crop_right);
        w.put_ue(0);
        w.put_ue(crop_bottom);
    } else {
        w.put_bit(false);
    }
    w.put_bit(false); // vui_parameters_present_flag

    let mut nal = vec![0x67];
    nal.extend(w.finish());
    nal
}

pub fn avc_pps() -> Vec<u8> {
    vec![0x68, 0xCE, 0x3C, 0x80]
}

pub fn avc_sei() -> Vec<u8> {
    vec![0x06, 0x05, 0x01, 0xAA, 0x80]
}

pub fn avc_aud() -> Vec<u8> {
    vec![0x09, 0xF0]
}

/// IDR I slice, first_mb_in_slice 0
pub fn avc_idr(len: usize) -> Vec<u8> {
    let mut nal = vec![0x65, 0x88, 0x84];
    nal.extend(filler(len.saturating_sub(3)));
    nal
}

/// Non-IDR P slice, first_mb_in_slice 0
pub fn avc_p_slice(len: usize) -> Vec<u8> {
    let mut nal = vec![0x41, 0x9A];
    nal.extend(filler(len.saturating_sub(2)));
    nal
}

/// SPS PPS IDR access unit
pub fn avc_keyframe(slice_len: usize) -> Vec<u8> {
    annexb(&[&avc_sps(1280, 720, false), &avc_pps(), &avc_idr(slice_len)])
}

// ============================================================================
// HEVC
// ============================================================================

pub fn hevc_vps() -> Vec<u8> {
    vec![0x40, 0x01, 0x0C, 0x01, 0xFF, 0xFF, 0x01, 0x60]
}

/// Main profile, level 4, 1920x1080
pub fn hevc_sps() -> Vec<u8> {
    vec![
        0x42, 0x01, 0x01, 0x01, 0x60, 0x00, 0x00, 0x03, 0x00, 0x90, 0x00, 0x00, 0x03, 0x00, 0x00,
        0x03, 0x00, 0x78, 0xA0, 0x03, 0xC0, 0x80, 0x11, 0x07, 0xCB, 0x96, 0x5E,
    ]
}

/// Same as [`hevc_sps`] with general_interlaced_source_flag, 1920x540 fields
pub fn hevc_sps_interlaced() -> Vec<u8> {
    vec![
        0x42, 0x01, 0x01, 0x01, 0x60, 0x00, 0x00, 0x03, 0x00, 0x50, 0x00, 0x00, 0x03, 0x00, 0x00,
        0x03, 0x00, 0x78, 0xA0, 0x03, 0xC0, 0x80, 0x22, 0x1F, 0x79, 0x65, 0xE0,
    ]
}

pub fn hevc_pps() -> Vec<u8> {
    vec![0x44, 0x01, 0xC1, 0x72, 0xB4, 0x62, 0x40]
}

/// IDR_W_RADL slice, first in picture
pub fn hevc_idr(len: usize) -> Vec<u8> {
    let mut nal = vec![0x26, 0x01, 0xAF];
    nal.extend(filler(len.saturating_sub(3)));
    nal
}

/// TRAIL_R slice, first in picture
pub fn hevc_trail(len: usize) -> Vec<u8> {
    let mut nal = vec![0x02, 0x01, 0xD0];
    nal.extend(filler(len.saturating_sub(3)));
    nal
}

/// ST 2086 payload: BT.2020 primaries, D65, 1000 / 0.005 nits
pub fn mdcv_payload() -> Vec<u8> {
    let mut p = Vec::new();
    for v in [8500u16, 39850, 6550, 2300, 35400, 14600, 15635, 16450] {
        p.extend_from_slice(&v.to_be_bytes());
    }
    p.extend_from_slice(&10_000_000u32.to_be_bytes());
    p.extend_from_slice(&50u32.to_be_bytes());
    p
}

/// MaxCLL 1000, MaxFALL 400
pub fn cll_payload() -> Vec<u8> {
    vec![0x03, 0xE8, 0x01, 0x90]
}

/// Prefix SEI NAL unit holding the given messages
pub fn hevc_prefix_sei(messages: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut rbsp = Vec::new();
    for (payload_type, payload) in messages {
        push_ff_coded(&mut rbsp, *payload_type as usize);
        push_ff_coded(&mut rbsp, payload.len());
        rbsp.extend_from_slice(payload);
    }
    rbsp.push(0x80);

    let mut nal = vec![0x4E, 0x01];
    nal.extend(escape(&rbsp));
    nal
}

fn push_ff_coded(out: &mut Vec<u8>, mut value: usize) {
    while value >= 0xFF {
        out.push(0xFF);
        value -= 0xFF;
    }
    out.push(value as u8);
}

// ============================================================================
// VPx
// ============================================================================

/// VP8 key frame, 16x16
pub fn vp8_key_frame() -> Vec<u8> {
    vec![0x10, 0x02, 0x00, 0x9D, 0x01, 0x2A, 0x10, 0x00, 0x10, 0x00, 0xA1, 0xA2]
}

pub fn vp8_inter_frame() -> Vec<u8> {
    vec![0x31, 0x02, 0x00, 0xAA, 0xBB]
}

/// VP9 profile 0 key frame, 352x288
pub fn vp9_key_frame() -> Vec<u8> {
    vec![0x82, 0x49, 0x83, 0x42, 0x20, 0x15, 0xF0, 0x11, 0xF0, 0x00]
}

pub fn vp9_inter_frame() -> Vec<u8> {
    vec![0x86, 0x00, 0xA5]
}

/// Wrap frames in an IVF file
pub fn ivf(fourcc: &[u8; 4], frames: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![0u8; 32];
    out[..4].copy_from_slice(b"DKIF");
    out[6..8].copy_from_slice(&32u16.to_le_bytes());
    out[8..12].copy_from_slice(fourcc);
    out[16..20].copy_from_slice(&30u32.to_le_bytes());
    out[20..24].copy_from_slice(&1u32.to_le_bytes());
    out[24..28].copy_from_slice(&(frames.len() as u32).to_le_bytes());
    for (pts, frame) in frames.iter().enumerate() {
        out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
        out.extend_from_slice(&(pts as u64).to_le_bytes());
        out.extend_from_slice(frame);
    }
    out
}

// ============================================================================
// Constructor helpers
// ============================================================================

/// Initialized constructor with a small internal buffer and no logging
pub fn constructor(kind: CodecKind) -> FrameConstructor {
    constructor_with(kind, test_config())
}

pub fn constructor_with(kind: CodecKind, config: ConstructorConfig) -> FrameConstructor {
    let mut fc = FrameConstructor::new(kind, config, LogContext::disabled());
    fc.init(StreamInfo::default())
        .expect("Failed to initialize constructor");
    fc
}

pub fn test_config() -> ConstructorConfig {
    ConstructorConfig {
        initial_buffer_size: 256,
        ..Default::default()
    }
}

/// Take whatever is exposed, consume all of it and unload
pub fn take_all(fc: &mut FrameConstructor) -> Option<Vec<u8>> {
    let data = fc.bitstream().map(|bst| {
        let data = bst.data().to_vec();
        let len = bst.data_length();
        bst.consume(len).expect("consume within window");
        data
    });
    fc.unload().expect("unload");
    data
}

pub fn load_frame(fc: &mut FrameConstructor, data: &[u8], pts: i64) {
    fc.load(Bytes::copy_from_slice(data), pts, false, true)
        .expect("Failed to load frame");
}
