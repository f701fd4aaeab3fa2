//! SEI message parsing for HDR static metadata
//!
//! A prefix SEI NAL unit carries one or more `sei_message()`s, each a
//! type/size pair (both coded as runs of `0xFF` plus a final byte) followed
//! by the payload. Only two payloads are interpreted:
//!
//! - 137: mastering display colour volume (SMPTE ST 2086), 24 bytes
//! - 144: content light level information, 4 bytes

use super::nal::NAL_HEADER_LEN;
use crate::codec::bitreader::unescape_rbsp;
use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Cursor;

/// Mastering display colour volume payload type
pub const SEI_MASTERING_DISPLAY_COLOUR_VOLUME: u32 = 137;

/// Content light level information payload type
pub const SEI_CONTENT_LIGHT_LEVEL: u32 = 144;

/// Raw payloads keyed by SEI payload type
pub type SeiMap = BTreeMap<u32, Vec<u8>>;

/// One SEI message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeiMessage {
    pub payload_type: u32,
    pub payload: Vec<u8>,
}

/// Split the RBSP of an SEI NAL unit (header included) into messages
pub fn parse_sei_messages(nal: &[u8]) -> Result<Vec<SeiMessage>> {
    if nal.len() <= NAL_HEADER_LEN {
        return Err(Error::bitstream("Truncated SEI NAL unit"));
    }

    let rbsp = unescape_rbsp(&nal[NAL_HEADER_LEN..]);
    let mut messages = Vec::new();
    let mut pos = 0;

    // Stop at the rbsp_trailing_bits byte
    while pos < rbsp.len() && !(pos + 1 == rbsp.len() && rbsp[pos] == 0x80) {
        let payload_type = read_ff_coded(&rbsp, &mut pos)?;
        let payload_size = read_ff_coded(&rbsp, &mut pos)? as usize;

        let end = pos
            .checked_add(payload_size)
            .filter(|&e| e <= rbsp.len())
            .ok_or_else(|| {
                Error::bitstream(format!(
                    "SEI payload {} overruns NAL unit ({} bytes)",
                    payload_type, payload_size
                ))
            })?;

        messages.push(SeiMessage {
            payload_type,
            payload: rbsp[pos..end].to_vec(),
        });
        pos = end;
    }

    Ok(messages)
}

fn read_ff_coded(data: &[u8], pos: &mut usize) -> Result<u32> {
    let mut value: u32 = 0;
    loop {
        let byte = *data
            .get(*pos)
            .ok_or_else(|| Error::bitstream("SEI message header truncated"))?;
        *pos += 1;
        value = value.saturating_add(byte as u32);
        if byte != 0xFF {
            return Ok(value);
        }
    }
}

/// Display primary in units of 0.00002
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Primary {
    pub x: u16,
    pub y: u16,
}

impl Primary {
    /// CIE 1931 xy as floating point
    pub fn to_xy(&self) -> (f64, f64) {
        (self.x as f64 * 0.00002, self.y as f64 * 0.00002)
    }
}

/// Mastering display colour volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MasteringDisplay {
    /// Primaries in bitstream order: green, blue, red
    pub display_primaries: [Primary; 3],
    pub white_point: Primary,
    /// Units of 0.0001 cd/m²
    pub max_luminance: u32,
    /// Units of 0.0001 cd/m²
    pub min_luminance: u32,
}

impl MasteringDisplay {
    pub const PAYLOAD_SIZE: usize = 24;

    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::PAYLOAD_SIZE {
            return Err(Error::bitstream(format!(
                "Mastering display SEI too short: {} bytes",
                payload.len()
            )));
        }

        let mut cursor = Cursor::new(payload);
        let mut display_primaries = [Primary::default(); 3];
        for p in display_primaries.iter_mut() {
            p.x = cursor.read_u16::<BigEndian>()?;
            p.y = cursor.read_u16::<BigEndian>()?;
        }
        let white_point = Primary {
            x: cursor.read_u16::<BigEndian>()?,
            y: cursor.read_u16::<BigEndian>()?,
        };

        Ok(MasteringDisplay {
            display_primaries,
            white_point,
            max_luminance: cursor.read_u32::<BigEndian>()?,
            min_luminance: cursor.read_u32::<BigEndian>()?,
        })
    }

    /// Maximum luminance in cd/m²
    pub fn max_nits(&self) -> f64 {
        self.max_luminance as f64 * 0.0001
    }

    /// Minimum luminance in cd/m²
    pub fn min_nits(&self) -> f64 {
        self.min_luminance as f64 * 0.0001
    }
}

/// Content light level information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ContentLightLevel {
    /// MaxCLL in cd/m²
    pub max_cll: u16,
    /// MaxFALL in cd/m²
    pub max_fall: u16,
}

impl ContentLightLevel {
    pub const PAYLOAD_SIZE: usize = 4;

    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::PAYLOAD_SIZE {
            return Err(Error::bitstream(format!(
                "Content light level SEI too short: {} bytes",
                payload.len()
            )));
        }

        let mut cursor = Cursor::new(payload);
        Ok(ContentLightLevel {
            max_cll: cursor.read_u16::<BigEndian>()?,
            max_fall: cursor.read_u16::<BigEndian>()?,
        })
    }
}

/// HDR10 static metadata assembled from cached SEI payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HdrStaticInfo {
    pub mastering_display: Option<MasteringDisplay>,
    pub content_light: Option<ContentLightLevel>,
}

impl HdrStaticInfo {
    /// Build from an SEI map; malformed payloads are skipped
    pub fn from_sei_map(map: &SeiMap) -> Self {
        HdrStaticInfo {
            mastering_display: map
                .get(&SEI_MASTERING_DISPLAY_COLOUR_VOLUME)
                .and_then(|p| MasteringDisplay::parse(p).ok()),
            content_light: map
                .get(&SEI_CONTENT_LIGHT_LEVEL)
                .and_then(|p| ContentLightLevel::parse(p).ok()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mastering_display.is_none() && self.content_light.is_none()
    }
}

/// Whether a payload type carries HDR static metadata
pub fn is_hdr_payload(payload_type: u32) -> bool {
    payload_type == SEI_MASTERING_DISPLAY_COLOUR_VOLUME || payload_type == SEI_CONTENT_LIGHT_LEVEL
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mdcv_payload() -> Vec<u8> {
        let mut p = Vec::new();
        // G, B, R primaries (BT.2020), D65 white point
        for v in [8500u16, 39850, 6550, 2300, 35400, 14600, 15635, 16450] {
            p.extend_from_slice(&v.to_be_bytes());
        }
        p.extend_from_slice(&10_000_000u32.to_be_bytes());
        p.extend_from_slice(&50u32.to_be_bytes());
        p
    }

    #[test]
    fn test_parse_messages() {
        let mut nal = vec![0x4E, 0x01, 137, 24];
        nal.extend_from_slice(&mdcv_payload());
        nal.extend_from_slice(&[144, 4, 0x03, 0xE8, 0x01, 0x90]);
        nal.push(0x80);

        let msgs = parse_sei_messages(&nal).unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].payload_type, 137);
        assert_eq!(msgs[0].payload.len(), 24);
        assert_eq!(msgs[1].payload_type, 144);

        let cll = ContentLightLevel::parse(&msgs[1].payload).unwrap();
        assert_eq!(cll.max_cll, 1000);
        assert_eq!(cll.max_fall, 400);
    }

    #[test]
    fn test_ff_coded_type() {
        // 0xFF 0x05 -> type 260
        let nal = [0x4E, 0x01, 0xFF, 0x05, 0x01, 0xAA, 0x80];
        let msgs = parse_sei_messages(&nal).unwrap();
        assert_eq!(msgs[0].payload_type, 260);
        assert_eq!(msgs[0].payload, vec![0xAA]);
    }

    #[test]
    fn test_overrun_rejected() {
        let nal = [0x4E, 0x01, 137, 24, 0x00, 0x01];
        assert!(parse_sei_messages(&nal).is_err());
    }

    #[test]
    fn test_mastering_display() {
        let md = MasteringDisplay::parse(&mdcv_payload()).unwrap();
        assert_eq!(md.display_primaries[0], Primary { x: 8500, y: 39850 });
        assert_eq!(md.white_point, Primary { x: 15635, y: 16450 });
        assert!((md.max_nits() - 1000.0).abs() < 1e-6);
        assert!((md.min_nits() - 0.005).abs() < 1e-9);

        let (x, y) = md.white_point.to_xy();
        assert!((x - 0.3127).abs() < 1e-4);
        assert!((y - 0.329).abs() < 1e-4);

        assert!(MasteringDisplay::parse(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_hdr_static_info_from_map() {
        let mut map = SeiMap::new();
        assert!(HdrStaticInfo::from_sei_map(&map).is_empty());

        map.insert(SEI_CONTENT_LIGHT_LEVEL, vec![0x03, 0xE8, 0x01, 0x90]);
        let info = HdrStaticInfo::from_sei_map(&map);
        assert!(info.mastering_display.is_none());
        assert_eq!(info.content_light.unwrap().max_cll, 1000);
    }
}
