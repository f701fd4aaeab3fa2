//! H.265 sequence parameter set parsing
//!
//! Parses through `profile_tier_level()` (including sub-layer entries) up to
//! the bit depths. The remainder of the SPS is irrelevant to framing.

use super::nal::{nal_unit_type, NalUnitType, NAL_HEADER_LEN};
use crate::codec::bitreader::{unescape_rbsp, RbspReader};
use crate::codec::SpsInfo;
use crate::error::{Error, Result};

/// General profile/tier/level fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileTierLevel {
    pub profile_space: u8,
    pub tier_flag: bool,
    pub profile_idc: u8,
    pub progressive_source: bool,
    pub interlaced_source: bool,
    pub frame_only_constraint: bool,
    pub level_idc: u8,
}

fn parse_profile_tier_level(
    r: &mut RbspReader,
    max_sub_layers_minus1: u32,
) -> Result<ProfileTierLevel> {
    let profile_space = r.read_bits(2)? as u8;
    let tier_flag = r.read_bool()?;
    let profile_idc = r.read_bits(5)? as u8;
    let _compatibility_flags = r.read_bits(32)?;
    let progressive_source = r.read_bool()?;
    let interlaced_source = r.read_bool()?;
    let _non_packed_constraint = r.read_bool()?;
    let frame_only_constraint = r.read_bool()?;
    // 43 reserved/constraint bits + inbld/reserved bit
    r.skip_bits(44)?;
    let level_idc = r.read_bits(8)? as u8;

    let mut profile_present = [false; 8];
    let mut level_present = [false; 8];
    for i in 0..max_sub_layers_minus1 as usize {
        profile_present[i] = r.read_bool()?;
        level_present[i] = r.read_bool()?;
    }
    if max_sub_layers_minus1 > 0 {
        for _ in max_sub_layers_minus1..8 {
            r.skip_bits(2)?;
        }
    }
    for i in 0..max_sub_layers_minus1 as usize {
        if profile_present[i] {
            r.skip_bits(88)?;
        }
        if level_present[i] {
            r.skip_bits(8)?;
        }
    }

    Ok(ProfileTierLevel {
        profile_space,
        tier_flag,
        profile_idc,
        progressive_source,
        interlaced_source,
        frame_only_constraint,
        level_idc,
    })
}

/// Parse an SPS NAL unit (two-byte header included, start code excluded)
pub fn parse_sps(nal: &[u8]) -> Result<SpsInfo> {
    match nal_unit_type(nal).map(NalUnitType::from_u8) {
        Some(NalUnitType::SpsNut) => {}
        Some(t) => {
            return Err(Error::bitstream(format!(
                "Expected SPS NAL unit, got {:?}",
                t
            )))
        }
        None => return Err(Error::bitstream("Empty SPS NAL unit")),
    }
    if nal.len() <= NAL_HEADER_LEN {
        return Err(Error::bitstream("Truncated SPS NAL unit"));
    }

    let rbsp = unescape_rbsp(&nal[NAL_HEADER_LEN..]);
    let mut r = RbspReader::new(&rbsp);

    let _vps_id = r.read_bits(4)?;
    let max_sub_layers_minus1 = r.read_bits(3)?;
    if max_sub_layers_minus1 > 6 {
        return Err(Error::bitstream(format!(
            "Invalid sps_max_sub_layers_minus1 {}",
            max_sub_layers_minus1
        )));
    }
    let _temporal_id_nesting = r.read_bool()?;

    let ptl = parse_profile_tier_level(&mut r, max_sub_layers_minus1)?;

    let sps_id = r.read_ue()?;
    if sps_id > 15 {
        return Err(Error::bitstream(format!("Invalid sps_seq_parameter_set_id {}", sps_id)));
    }

    let chroma_format_idc = r.read_ue()?;
    if chroma_format_idc > 3 {
        return Err(Error::bitstream(format!(
            "Invalid chroma_format_idc {}",
            chroma_format_idc
        )));
    }
    let separate_colour_plane = chroma_format_idc == 3 && r.read_bool()?;

    let mut width = r.read_ue()?;
    let mut height = r.read_ue()?;

    if r.read_bool()? {
        let left = r.read_ue()?;
        let right = r.read_ue()?;
        let top = r.read_ue()?;
        let bottom = r.read_ue()?;

        let (sub_width, sub_height) = match (chroma_format_idc, separate_colour_plane) {
            (1, _) => (2, 2),
            (2, _) => (2, 1),
            _ => (1, 1),
        };
        width = width.saturating_sub(left.saturating_add(right).saturating_mul(sub_width));
        height = height.saturating_sub(top.saturating_add(bottom).saturating_mul(sub_height));
    }

    let bit_depth_luma = r.read_ue()?.saturating_add(8);
    let bit_depth_chroma = r.read_ue()?.saturating_add(8);

    Ok(SpsInfo {
        profile_idc: ptl.profile_idc,
        level_idc: ptl.level_idc,
        sps_id: sps_id as u8,
        chroma_format_idc: chroma_format_idc as u8,
        bit_depth_luma: bit_depth_luma.min(u8::MAX as u32) as u8,
        bit_depth_chroma: bit_depth_chroma.min(u8::MAX as u32) as u8,
        width,
        height,
        interlaced: ptl.interlaced_source,
    })
}
