//! VC-1 loading
//!
//! Every input buffer is a whole frame. Advanced profile frames are
//! delivered in byte-stream form: a bare frame gets `00 00 01 0D` in front,
//! and the sequence header from the codec-private data goes ahead of the
//! first frame and again after each reset.

use super::FrameConstructor;
use crate::codec::startcode::iter_nals;
use crate::codec::vc1::{self, Vc1Profile, FRAME_START_CODE, START_CODE_FRAME};
use crate::error::Result;
use crate::util::Timestamp;
use bytes::Bytes;
use tracing::{debug, trace};

pub(super) fn load(
    c: &mut FrameConstructor,
    data: Bytes,
    ts: Timestamp,
    is_header: bool,
    _is_complete_frame: bool,
) -> Result<()> {
    if is_header {
        if Vc1Profile::detect(&data) == Vc1Profile::Advanced {
            c.vc1_profile = Vc1Profile::Advanced;
        }
        c.header.set_opaque(&data);
        c.inject_headers = c.vc1_profile == Vc1Profile::Advanced;
        debug!(profile = ?c.vc1_profile, len = data.len(), "codec private data");
        return Ok(());
    }

    if c.vc1_profile != Vc1Profile::Advanced {
        // STRUCT_C travels out of band
        c.inject_headers = false;
        return c.deliver(data, ts, true, &[]);
    }

    match vc1::start_code_suffix(&data) {
        Some(suffix) if vc1::is_header_start_code(suffix) => {
            let end = sequence_header_len(&data);
            trace!(len = end, "in-band sequence header");
            c.header.set_opaque(&data[..end]);
            c.inject_headers = false;
            c.deliver(data, ts, true, &[])
        }
        Some(_) => c.deliver(data, ts, true, &[]),
        None => c.deliver(data, ts, true, &FRAME_START_CODE),
    }
}

/// Bytes ahead of the first frame start code
fn sequence_header_len(data: &[u8]) -> usize {
    iter_nals(data)
        .find(|n| data.get(n.start) == Some(&START_CODE_FRAME))
        .map(|n| n.start_code_pos())
        .unwrap_or(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecKind;
    use crate::constructor::{ConstructorConfig, LogContext, StreamInfo};

    const SEQ_HDR: [u8; 6] = [0x00, 0x00, 0x01, 0x0F, 0xCA, 0x86];

    fn vc1(profile: u32) -> FrameConstructor {
        let mut fc = FrameConstructor::new(
            CodecKind::Vc1,
            ConstructorConfig {
                initial_buffer_size: 128,
                ..Default::default()
            },
            LogContext::disabled(),
        );
        fc.init(StreamInfo {
            profile,
            ..Default::default()
        })
        .unwrap();
        fc
    }

    #[test]
    fn test_advanced_frame_gets_start_code_and_header() {
        let mut fc = vc1(0);
        fc.load(Bytes::from_static(&SEQ_HDR), 0, true, false).unwrap();
        assert!(fc.bitstream().is_none());
        assert_eq!(fc.header_bytes(), &SEQ_HDR);

        fc.load(Bytes::from_static(&[0xAB, 0xCD]), 0, false, true).unwrap();
        let data = fc.bitstream_ref().unwrap().data();
        assert_eq!(&data[..6], &SEQ_HDR);
        assert_eq!(&data[6..], &[0x00, 0x00, 0x01, 0x0D, 0xAB, 0xCD]);
    }

    #[test]
    fn test_in_band_sequence_header() {
        let mut fc = vc1(3);
        let mut frame = SEQ_HDR.to_vec();
        frame.extend_from_slice(&[0x00, 0x00, 0x01, 0x0D, 0x11]);
        let frame = Bytes::from(frame);

        fc.load(frame.clone(), 0, false, true).unwrap();
        let bst = fc.bitstream_ref().unwrap();
        assert!(bst.is_borrowed());
        assert_eq!(bst.data(), &frame[..]);
        assert_eq!(fc.header_bytes(), &SEQ_HDR);
    }

    #[test]
    fn test_simple_profile_passthrough() {
        let mut fc = vc1(0);
        fc.load(Bytes::from_static(&[0x4E, 0x29, 0x1A]), 0, true, false)
            .unwrap();
        fc.load(Bytes::from_static(&[0x12, 0x34]), 0, false, false)
            .unwrap();

        let bst = fc.bitstream_ref().unwrap();
        assert!(bst.is_borrowed());
        assert!(bst.data_flag.complete_frame);
        assert_eq!(bst.data(), &[0x12, 0x34]);
    }

    #[test]
    fn test_sequence_header_len() {
        assert_eq!(sequence_header_len(&SEQ_HDR), SEQ_HDR.len());
        let mut data = SEQ_HDR.to_vec();
        data.extend_from_slice(&[0x00, 0x00, 0x01, 0x0D, 0x01]);
        assert_eq!(sequence_header_len(&data), SEQ_HDR.len());
    }
}
