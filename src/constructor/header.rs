//! Cached stream headers
//!
//! Parameter sets are kept as bare NAL units (start code stripped) and
//! re-assembled into an Annex B block with four-byte start codes whenever
//! one of them changes. For VC-1 and VPx the block is the container's
//! codec-private data verbatim.

use crate::codec::h265::{sei, SeiMap};
use crate::codec::{self, CodecKind, SpsInfo};
use crate::error::Result;
use tracing::{debug, warn};

const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

#[derive(Debug, Default)]
pub struct HeaderCache {
    vps: Option<Vec<u8>>,
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
    sps_info: Option<SpsInfo>,
    sei: SeiMap,
    bytes: Vec<u8>,
    opaque: bool,
}

impl HeaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both SPS and PPS cached, or an opaque header block set
    pub fn is_complete(&self) -> bool {
        if self.opaque {
            !self.bytes.is_empty()
        } else {
            self.sps.is_some() && self.pps.is_some()
        }
    }

    pub fn has_sps(&self) -> bool {
        self.sps.is_some()
    }

    pub fn has_pps(&self) -> bool {
        self.pps.is_some()
    }

    pub fn sps_info(&self) -> Option<&SpsInfo> {
        self.sps_info.as_ref()
    }

    pub fn sei_map(&self) -> &SeiMap {
        &self.sei
    }

    /// Assembled Annex B header block
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Store a VPS
    pub fn set_vps(&mut self, nal: &[u8]) {
        if self.vps.as_deref() != Some(nal) {
            self.vps = Some(nal.to_vec());
            self.assemble();
        }
    }

    /// Store an SPS; returns true when the new one changes the picture format
    pub fn set_sps(&mut self, kind: CodecKind, nal: &[u8]) -> bool {
        if self.sps.as_deref() == Some(nal) {
            return false;
        }

        let info = match codec::parse_sps(kind, nal) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Failed to parse SPS: {}", e);
                None
            }
        };

        let changed = match (&self.sps_info, &info) {
            (Some(old), Some(new)) => old.differs_in_format(new),
            _ => false,
        };
        if let Some(i) = &info {
            debug!(
                width = i.width,
                height = i.height,
                interlaced = i.interlaced,
                "cached SPS"
            );
        }

        self.sps = Some(nal.to_vec());
        self.sps_info = info;
        self.assemble();
        changed
    }

    pub fn set_pps(&mut self, nal: &[u8]) {
        if self.pps.as_deref() != Some(nal) {
            self.pps = Some(nal.to_vec());
            self.assemble();
        }
    }

    /// Cache the HDR payloads of an SEI NAL unit; returns how many were kept
    pub fn store_hdr_sei(&mut self, nal: &[u8]) -> Result<usize> {
        let mut stored = 0;
        for msg in sei::parse_sei_messages(nal)? {
            if sei::is_hdr_payload(msg.payload_type) {
                debug!(payload_type = msg.payload_type, "cached HDR SEI");
                self.sei.insert(msg.payload_type, msg.payload);
                stored += 1;
            }
        }
        Ok(stored)
    }

    /// Replace the header block with opaque codec-private data
    pub fn set_opaque(&mut self, data: &[u8]) {
        self.vps = None;
        self.sps = None;
        self.pps = None;
        self.sps_info = None;
        self.bytes = data.to_vec();
        self.opaque = true;
    }

    pub fn clear(&mut self) {
        *self = HeaderCache::default();
    }

    fn assemble(&mut self) {
        self.opaque = false;
        self.bytes.clear();
        for nal in [&self.vps, &self.sps, &self.pps].into_iter().flatten() {
            self.bytes.extend_from_slice(&START_CODE);
            self.bytes.extend_from_slice(nal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPS_720P: [u8; 10] = [0x67, 0x42, 0xC0, 0x1F, 0xEC, 0x80, 0x28, 0x02, 0xDC, 0x80];
    const SPS_1080P: [u8; 11] = [0x67, 0x42, 0xC0, 0x1F, 0xEC, 0x80, 0x3C, 0x01, 0x13, 0xF2, 0xA0];
    const PPS: [u8; 4] = [0x68, 0xCE, 0x3C, 0x80];

    #[test]
    fn test_assembled_block() {
        let mut cache = HeaderCache::new();
        assert!(!cache.is_complete());

        cache.set_sps(CodecKind::Avc, &SPS_720P);
        assert!(!cache.is_complete());
        cache.set_pps(&PPS);
        assert!(cache.is_complete());

        let mut expected = vec![0, 0, 0, 1];
        expected.extend_from_slice(&SPS_720P);
        expected.extend_from_slice(&[0, 0, 0, 1]);
        expected.extend_from_slice(&PPS);
        assert_eq!(cache.bytes(), expected.as_slice());
        assert_eq!(cache.sps_info().unwrap().height, 720);
    }

    #[test]
    fn test_format_change_detection() {
        let mut cache = HeaderCache::new();
        assert!(!cache.set_sps(CodecKind::Avc, &SPS_720P));
        assert!(!cache.set_sps(CodecKind::Avc, &SPS_720P));
        assert!(cache.set_sps(CodecKind::Avc, &SPS_1080P));
    }

    #[test]
    fn test_unparsable_sps_still_cached() {
        let mut cache = HeaderCache::new();
        cache.set_sps(CodecKind::Avc, &[0x67, 0x42]);
        assert!(cache.has_sps());
        assert!(cache.sps_info().is_none());
    }

    #[test]
    fn test_hdr_sei() {
        let mut cache = HeaderCache::new();
        let nal = [0x4E, 0x01, 144, 4, 0x03, 0xE8, 0x01, 0x90, 5, 1, 0xAA, 0x80];
        assert_eq!(cache.store_hdr_sei(&nal).unwrap(), 1);
        assert!(cache.sei_map().contains_key(&144));
        assert!(!cache.sei_map().contains_key(&5));
    }

    #[test]
    fn test_opaque() {
        let mut cache = HeaderCache::new();
        cache.set_opaque(&[0, 0, 1, 0x0F, 0xCA]);
        assert!(cache.is_complete());
        assert_eq!(cache.bytes(), &[0, 0, 1, 0x0F, 0xCA]);
        cache.clear();
        assert!(cache.bytes().is_empty());
    }
}
