//! H.264 sequence parameter set parsing
//!
//! Only the fields the frame constructor needs are decoded: profile/level,
//! chroma format, bit depth, coded size (after cropping) and
//! `frame_mbs_only_flag`, which tells whether the stream may carry fields.

use super::nal::{nal_unit_type, NAL_HEADER_LEN, NAL_TYPE_SPS};
use crate::codec::bitreader::{unescape_rbsp, RbspReader};
use crate::codec::SpsInfo;
use crate::error::{Error, Result};

/// Profiles whose SPS carries the chroma/bit-depth/scaling extension
const HIGH_PROFILES: [u32; 13] = [100, 110, 122, 244, 44, 83, 86, 118, 128, 138, 139, 134, 135];

/// Parse an SPS NAL unit (header byte included, start code excluded)
pub fn parse_sps(nal: &[u8]) -> Result<SpsInfo> {
    match nal_unit_type(nal) {
        Some(NAL_TYPE_SPS) => {}
        Some(t) => {
            return Err(Error::bitstream(format!(
                "Expected SPS NAL unit, got type {}",
                t
            )))
        }
        None => return Err(Error::bitstream("Empty SPS NAL unit")),
    }

    let rbsp = unescape_rbsp(&nal[NAL_HEADER_LEN..]);
    let mut r = RbspReader::new(&rbsp);

    let profile_idc = r.read_bits(8)?;
    let _constraint_flags = r.read_bits(8)?;
    let level_idc = r.read_bits(8)?;
    let sps_id = r.read_ue()?;
    if sps_id > 31 {
        return Err(Error::bitstream(format!("Invalid seq_parameter_set_id {}", sps_id)));
    }

    let mut chroma_format_idc = 1;
    let mut separate_colour_plane = false;
    let mut bit_depth_luma = 8;
    let mut bit_depth_chroma = 8;

    if HIGH_PROFILES.contains(&profile_idc) {
        chroma_format_idc = r.read_ue()?;
        if chroma_format_idc > 3 {
            return Err(Error::bitstream(format!(
                "Invalid chroma_format_idc {}",
                chroma_format_idc
            )));
        }
        if chroma_format_idc == 3 {
            separate_colour_plane = r.read_bool()?;
        }
        bit_depth_luma = r.read_ue()?.saturating_add(8);
        bit_depth_chroma = r.read_ue()?.saturating_add(8);
        let _qpprime_y_zero_transform_bypass = r.read_bool()?;

        if r.read_bool()? {
            let lists = if chroma_format_idc != 3 { 8 } else { 12 };
            for i in 0..lists {
                if r.read_bool()? {
                    skip_scaling_list(&mut r, if i < 6 { 16 } else { 64 })?;
                }
            }
        }
    }

    let _log2_max_frame_num_minus4 = r.read_ue()?;
    match r.read_ue()? {
        0 => {
            let _log2_max_poc_lsb_minus4 = r.read_ue()?;
        }
        1 => {
            let _delta_pic_order_always_zero = r.read_bool()?;
            let _offset_for_non_ref_pic = r.read_se()?;
            let _offset_for_top_to_bottom_field = r.read_se()?;
            let cycle = r.read_ue()?;
            if cycle > 255 {
                return Err(Error::bitstream("Too many ref frames in POC cycle"));
            }
            for _ in 0..cycle {
                r.read_se()?;
            }
        }
        _ => {}
    }

    let _max_num_ref_frames = r.read_ue()?;
    let _gaps_in_frame_num_allowed = r.read_bool()?;
    let width_in_mbs = r.read_ue()?.saturating_add(1);
    let height_in_map_units = r.read_ue()?.saturating_add(1);

    let frame_mbs_only = r.read_bool()?;
    if !frame_mbs_only {
        let _mb_adaptive_frame_field = r.read_bool()?;
    }
    let _direct_8x8_inference = r.read_bool()?;

    let field_factor = if frame_mbs_only { 1 } else { 2 };
    let mut width = width_in_mbs.saturating_mul(16);
    let mut height = height_in_map_units.saturating_mul(16 * field_factor);

    if r.read_bool()? {
        let left = r.read_ue()?;
        let right = r.read_ue()?;
        let top = r.read_ue()?;
        let bottom = r.read_ue()?;

        let (crop_x, crop_y) = if chroma_format_idc == 0 || separate_colour_plane {
            (1, field_factor)
        } else {
            let sub_width = if chroma_format_idc == 3 { 1 } else { 2 };
            let sub_height = if chroma_format_idc == 1 { 2 } else { 1 };
            (sub_width, sub_height * field_factor)
        };

        width = width.saturating_sub(left.saturating_add(right).saturating_mul(crop_x));
        height = height.saturating_sub(top.saturating_add(bottom).saturating_mul(crop_y));
    }

    Ok(SpsInfo {
        profile_idc: profile_idc as u8,
        level_idc: level_idc as u8,
        sps_id: sps_id as u8,
        chroma_format_idc: chroma_format_idc as u8,
        bit_depth_luma: bit_depth_luma.min(u8::MAX as u32) as u8,
        bit_depth_chroma: bit_depth_chroma.min(u8::MAX as u32) as u8,
        width,
        height,
        interlaced: !frame_mbs_only,
    })
}

fn skip_scaling_list(r: &mut RbspReader, size: usize) -> Result<()> {
    let mut last_scale = 8i32;
    let mut next_scale = 8i32;

    for _ in 0..size {
        if next_scale != 0 {
            let delta = r.read_se()?;
            next_scale = (last_scale + delta + 256) % 256;
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_baseline_sps() {
        // Baseline 3.1, 1280x720, progressive
        let sps = [0x67, 0x42, 0xC0, 0x1F, 0xEC, 0x80, 0x28, 0x02, 0xDC, 0x80];

        let info = parse_sps(&sps).unwrap();
        assert_eq!(info.profile_idc, 66);
        assert_eq!(info.level_idc, 31);
        assert_eq!(info.width, 1280);
        assert_eq!(info.height, 720);
        assert_eq!(info.chroma_format_idc, 1);
        assert_eq!(info.bit_depth_luma, 8);
        assert!(!info.interlaced);
    }

    #[test]
    fn test_parse_cropped_1080p() {
        let sps = [0x67, 0x42, 0xC0, 0x1F, 0xEC, 0x80, 0x3C, 0x01, 0x13, 0xF2, 0xA0];

        let info = parse_sps(&sps).unwrap();
        assert_eq!((info.width, info.height), (1920, 1080));
        assert!(!info.interlaced);
    }

    #[test]
    fn test_parse_interlaced_high_sps() {
        // High 4.0, 1920x1080 coded as field pairs
        let sps = [0x67, 0x64, 0x00, 0x28, 0xAC, 0xD9, 0x00, 0x78, 0x04, 0x47, 0xDA];

        let info = parse_sps(&sps).unwrap();
        assert_eq!(info.profile_idc, 100);
        assert!(info.interlaced);
        assert_eq!((info.width, info.height), (1920, 1080));
    }

    #[test]
    fn test_parse_high10_sps() {
        let sps = [0x67, 0x64, 0x00, 0x33, 0xA6, 0xCD, 0x90, 0x03, 0xC0, 0x04, 0x3E, 0x40];

        let info = parse_sps(&sps).unwrap();
        assert_eq!(info.bit_depth_luma, 10);
        assert_eq!(info.bit_depth_chroma, 10);
        assert_eq!((info.width, info.height), (3840, 2160));
    }

    #[test]
    fn test_rejects_non_sps() {
        assert!(parse_sps(&[0x68, 0xCE, 0x3C, 0x80]).is_err());
        assert!(parse_sps(&[]).is_err());
    }

    #[test]
    fn test_truncated_sps() {
        assert!(parse_sps(&[0x67, 0x42, 0x00]).is_err());
    }
}
