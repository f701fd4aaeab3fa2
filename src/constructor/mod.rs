//! Frame constructor
//!
//! Turns arbitrarily chunked elementary-stream input into decoder-ready
//! bitstreams. A constructor owns one internal buffer and, between `load()`
//! and `unload()`, may borrow the caller's buffer instead:
//!
//! ```text
//!  load(bytes) ──► nothing pending & complete? ──yes──► expose caller buffer (zero-copy)
//!                          │no
//!                          ▼
//!                 append to internal buffer ──complete?──► expose internal buffer
//!
//!  decoder: bitstream() → consume(n) → unload()
//!  unload(): caller buffer leftovers are copied in, internal buffer compacted
//! ```
//!
//! AVC and HEVC streams first pass through a header-acquisition phase
//! ([`BstState`]) that drops everything before the first parameter set and
//! caches SPS/PPS (and VPS/SEI for HEVC). The cache survives `reset()`, and
//! the next frame after a reset is prefixed with the cached headers.
//!
//! ## Usage
//!
//! ```rust
//! use bytes::Bytes;
//! use vfc_lib::codec::CodecKind;
//! use vfc_lib::constructor::{FrameConstructor, StreamInfo};
//!
//! let mut fc = FrameConstructor::with_defaults(CodecKind::Vp8);
//! fc.init(StreamInfo::default()).unwrap();
//!
//! // VP8 key frame: tag, start code, 16x16
//! let frame = Bytes::from_static(&[0x10, 0x02, 0x00, 0x9D, 0x01, 0x2A, 0x10, 0x00, 0x10, 0x00]);
//! fc.load(frame, 0, false, true).unwrap();
//!
//! let bst = fc.bitstream().unwrap();
//! let len = bst.data_length();
//! bst.consume(len).unwrap();
//! fc.unload().unwrap();
//! assert!(fc.bitstream().is_none());
//! ```

pub mod bitstream;
pub mod buffer;
pub mod config;
pub mod header;
pub mod state;

mod nal;
mod variant;
mod vc1;
mod vpx;

pub use bitstream::{Bitstream, BitstreamData, DataFlags};
pub use config::{ConstructorConfig, LogContext, DEFAULT_BUFFER_SIZE};
pub use state::{Active, BstState};

use crate::codec::h265::HdrStaticInfo;
use crate::codec::vc1::Vc1Profile;
use crate::codec::{CodecKind, PicStruct, SpsInfo};
use crate::error::{Error, Result};
use crate::util::{BufferStats, Timestamp};
use buffer::BstBuf;
use bytes::Bytes;
use header::HeaderCache;
use tracing::{debug, trace, warn};
use variant::CodecVariant;

/// Stream parameters handed over by the component on `init()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// Codec-specific profile number (for VC-1: 0 simple, 1 main, 3 advanced)
    pub profile: u32,
    pub level: u32,
}

/// Per-stream bitstream reassembler
#[derive(Debug)]
pub struct FrameConstructor {
    variant: &'static CodecVariant,
    config: ConstructorConfig,
    log: LogContext,
    stream_info: Option<StreamInfo>,
    state: BstState,
    bst_in: Bitstream,
    bst_buf: BstBuf,
    active: Active,
    header: HeaderCache,
    inject_headers: bool,
    eos_mode: bool,
    eos_reached: bool,
    first_sample: bool,
    format_change: bool,
    vc1_profile: Vc1Profile,
}

impl FrameConstructor {
    pub fn new(kind: CodecKind, config: ConstructorConfig, log: LogContext) -> Self {
        let variant = variant::for_kind(kind);
        FrameConstructor {
            bst_buf: BstBuf::new(config.max_buffer_size, config.growth),
            variant,
            config,
            log,
            stream_info: None,
            state: variant.initial_state,
            bst_in: Bitstream::empty(),
            active: Active::None,
            header: HeaderCache::new(),
            inject_headers: false,
            eos_mode: false,
            eos_reached: false,
            first_sample: true,
            format_change: false,
            vc1_profile: Vc1Profile::default(),
        }
    }

    /// Default configuration, logging under a span named after the codec
    pub fn with_defaults(kind: CodecKind) -> Self {
        Self::new(kind, ConstructorConfig::default(), LogContext::for_codec(kind))
    }

    pub fn kind(&self) -> CodecKind {
        self.variant.kind
    }

    pub fn state(&self) -> BstState {
        self.state
    }

    pub fn active(&self) -> Active {
        self.active
    }

    pub fn config(&self) -> &ConstructorConfig {
        &self.config
    }

    pub fn log_context(&self) -> &LogContext {
        &self.log
    }

    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.stream_info.as_ref()
    }

    /// Internal buffer counters
    pub fn stats(&self) -> BufferStats {
        self.bst_buf.stats()
    }

    /// Cached header block (Annex B parameter sets, or codec-private data)
    pub fn header_bytes(&self) -> &[u8] {
        self.header.bytes()
    }

    /// Fields of the cached SPS, if one was parsed
    pub fn sps_info(&self) -> Option<&SpsInfo> {
        self.header.sps_info()
    }

    /// Bytes held in the internal buffer
    pub fn pending_len(&self) -> usize {
        self.bst_buf.len()
    }

    /// Store stream parameters and allocate the internal buffer
    pub fn init(&mut self, info: StreamInfo) -> Result<()> {
        let _span = self.log.enter();

        if self.stream_info.is_some() {
            warn!("init() called twice without close()");
            return Err(Error::undefined_behavior(
                "Frame constructor already initialized",
            ));
        }

        self.bst_buf.malloc(self.config.initial_buffer_size)?;
        if self.kind() == CodecKind::Vc1 {
            self.vc1_profile = Vc1Profile::from_u32(info.profile);
        }

        debug!(
            width = info.width,
            height = info.height,
            profile = info.profile,
            buffer = self.config.initial_buffer_size,
            "initialized"
        );
        self.stream_info = Some(info);
        self.state = self.variant.initial_state;
        self.first_sample = true;
        Ok(())
    }

    /// Feed one input buffer
    ///
    /// `pts` is in microseconds; negative means unknown. `is_header` marks
    /// codec configuration data, `is_complete_frame` a buffer that ends on an
    /// access unit boundary.
    pub fn load(
        &mut self,
        data: Bytes,
        pts: i64,
        is_header: bool,
        is_complete_frame: bool,
    ) -> Result<()> {
        let _span = self.log.enter();

        if self.stream_info.is_none() {
            warn!("load() before init()");
            return Err(Error::undefined_behavior("load() called before init()"));
        }

        if data.is_empty() {
            if self.eos_mode {
                debug!("end of stream reached");
                self.eos_reached = true;
                return Ok(());
            }
            warn!("empty input buffer");
            return Err(Error::unknown("Empty input buffer"));
        }

        trace!(
            len = data.len(),
            pts,
            is_header,
            is_complete_frame,
            state = %self.state,
            "load"
        );

        // A caller buffer still exposed is released first; leftovers move
        // into the internal buffer ahead of the new data.
        if self.active == Active::Input {
            self.unload_inner()?;
        }

        let ts = Timestamp::from_micros(pts);
        (self.variant.load)(self, data, ts, is_header, is_complete_frame)
    }

    /// Scan codec configuration data for headers without exposing it
    ///
    /// During header acquisition the data joins the collection; afterwards
    /// it only refreshes the header cache. No-op for non-NAL codecs.
    pub fn load_header(&mut self, data: Bytes, is_header: bool) -> Result<()> {
        let _span = self.log.enter();
        if data.is_empty() {
            return Err(Error::null_pointer("Empty header buffer"));
        }
        (self.variant.load_header)(self, data, is_header)
    }

    /// Alias of [`unload`](Self::unload)
    pub fn sync(&mut self) -> Result<()> {
        self.unload()
    }

    /// Reclaim what the decoder consumed
    ///
    /// Unconsumed bytes of a caller buffer are copied into the internal
    /// buffer so the caller can reuse its buffer. Idempotent.
    pub fn unload(&mut self) -> Result<()> {
        let _span = self.log.enter();
        self.unload_inner()
    }

    fn unload_inner(&mut self) -> Result<()> {
        match self.active {
            Active::Input => {
                let remaining = self.bst_in.data_length();
                if remaining > 0 {
                    trace!(remaining, "keeping unconsumed input");
                    let ts = self.bst_in.time_stamp;
                    self.bst_buf.append(self.bst_in.data(), ts)?;

                    let meta = &self.bst_in;
                    let bst = self.bst_buf.bitstream_mut();
                    bst.frame_type = meta.frame_type;
                    bst.pic_struct = meta.pic_struct;
                    bst.data_flag = meta.data_flag;
                    self.active = Active::Buffer;
                } else {
                    self.active = Active::None;
                }
                self.bst_in.release();
            }
            Active::Buffer => {
                self.bst_buf.sync()?;
                if self.bst_buf.is_empty() {
                    self.bst_buf.clear();
                    self.active = Active::None;
                }
            }
            Active::None => self.bst_buf.sync()?,
        }
        Ok(())
    }

    /// Discard all in-flight data after a seek
    ///
    /// Cached headers survive unless the configuration says otherwise; with
    /// headers cached the next frame is prefixed with them.
    pub fn reset(&mut self) {
        let _span = self.log.enter();
        self.state = BstState::Resetting;

        self.bst_in.release();
        self.bst_buf.clear();
        self.active = Active::None;
        self.eos_mode = false;
        self.eos_reached = false;
        self.first_sample = true;
        self.format_change = false;

        if !self.config.preserve_headers_on_reset {
            self.header.clear();
        }

        if self.variant.reinject_headers && self.header.is_complete() {
            self.inject_headers = true;
            self.state = BstState::HeaderObtained;
        } else {
            self.inject_headers = false;
            self.state = self.variant.initial_state;
        }
        debug!(state = %self.state, inject = self.inject_headers, "reset");
    }

    /// Install parameter sets received out of band (e.g. from a container)
    ///
    /// Either argument may be a bare NAL unit or Annex B data; for HEVC the
    /// `sps` argument may also carry the VPS. With `is_reset` the previous
    /// cache, including VPS and SEI, is dropped first.
    pub fn save_headers(&mut self, sps: &[u8], pps: &[u8], is_reset: bool) -> Result<()> {
        let _span = self.log.enter();
        (self.variant.save_headers)(self, sps, pps, is_reset)
    }

    /// Whether the cached SPS declares interlaced content
    pub fn is_set_interlace_flag(&self) -> bool {
        self.header.sps_info().map(|i| i.interlaced).unwrap_or(false)
    }

    pub fn was_eos_reached(&self) -> bool {
        self.eos_reached
    }

    /// Enter or leave end-of-stream mode
    ///
    /// Entering it flushes whatever is accumulated, including an unfinished
    /// header collection. Reaching EOS stays recorded until `reset()`.
    pub fn set_eos_mode(&mut self, eos: bool) {
        let _span = self.log.enter();
        self.eos_mode = eos;
        if eos {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.state.is_collecting() {
            (self.variant.finish_headers)(self);
        }

        if !self.bst_buf.is_empty() {
            debug!(len = self.bst_buf.len(), "flushing at end of stream");
            self.expose_buffer();
            self.bst_buf.bitstream_mut().data_flag.end_of_stream = true;
        } else if self.active == Active::Input {
            self.bst_in.data_flag.end_of_stream = true;
        }
    }

    /// The bitstream to decode, if any
    pub fn bitstream(&mut self) -> Option<&mut Bitstream> {
        let bst = match self.active {
            Active::None => return None,
            Active::Input => &mut self.bst_in,
            Active::Buffer => self.bst_buf.bitstream_mut(),
        };
        if bst.is_empty() {
            None
        } else {
            Some(bst)
        }
    }

    pub fn bitstream_ref(&self) -> Option<&Bitstream> {
        let bst = match self.active {
            Active::None => return None,
            Active::Input => &self.bst_in,
            Active::Buffer => self.bst_buf.bitstream(),
        };
        (!bst.is_empty()).then_some(bst)
    }

    /// Drop all state; `init()` may be called again afterwards
    pub fn close(&mut self) {
        let _span = self.log.enter();
        self.bst_in.release();
        self.bst_buf = BstBuf::new(self.config.max_buffer_size, self.config.growth);
        self.active = Active::None;
        self.header.clear();
        self.stream_info = None;
        self.state = self.variant.initial_state;
        self.inject_headers = false;
        self.eos_mode = false;
        self.eos_reached = false;
        self.first_sample = true;
        self.format_change = false;
        self.vc1_profile = Vc1Profile::default();
        debug!("closed");
    }

    /// Whether a re-sent SPS changed the picture format since the last call
    pub fn take_format_change(&mut self) -> bool {
        std::mem::take(&mut self.format_change)
    }

    /// Raw cached SEI payload of the given type (HEVC with `hdr_sei`)
    pub fn get_sei(&self, payload_type: u32) -> Option<&[u8]> {
        self.header.sei_map().get(&payload_type).map(Vec::as_slice)
    }

    /// Parsed HDR static metadata from the cached SEI payloads
    pub fn hdr_static_info(&self) -> HdrStaticInfo {
        HdrStaticInfo::from_sei_map(self.header.sei_map())
    }

    /// Hand `data` to the decoder, zero-copy when possible
    ///
    /// Copies when something is pending, when cached headers must go first,
    /// when `prefix` is non-empty, or when the frame is incomplete.
    fn deliver(
        &mut self,
        data: Bytes,
        ts: Timestamp,
        complete: bool,
        prefix: &'static [u8],
    ) -> Result<()> {
        let inject = self.inject_headers;

        if complete && !inject && prefix.is_empty() && self.bst_buf.is_empty() {
            let frame_type = (self.variant.frame_type)(&data);
            let header_only = (self.variant.header_only)(&data);
            let pic_struct = self.pic_struct();

            self.bst_in = Bitstream::borrowed(data);
            self.bst_in.time_stamp = ts;
            self.bst_in.frame_type = frame_type;
            self.bst_in.pic_struct = pic_struct;
            self.bst_in.data_flag = DataFlags {
                complete_frame: true,
                header_only,
                end_of_stream: false,
            };
            self.active = Active::Input;
            return Ok(());
        }

        let header_len = if inject { self.header.bytes().len() } else { 0 };
        // Reserve everything up front so a failure leaves the buffer untouched
        self.bst_buf.realloc(header_len + prefix.len() + data.len())?;

        if inject {
            trace!(len = header_len, "injecting cached headers");
            self.bst_buf.append_internal(self.header.bytes(), ts)?;
            self.inject_headers = false;
        }
        self.bst_buf.append_internal(prefix, ts)?;
        self.bst_buf.append(&data, ts)?;

        if complete {
            self.expose_buffer();
        } else {
            self.bst_buf.bitstream_mut().data_flag.complete_frame = false;
        }
        Ok(())
    }

    fn expose_buffer(&mut self) {
        let frame_type = (self.variant.frame_type)(self.bst_buf.bitstream().data());
        let header_only = (self.variant.header_only)(self.bst_buf.bitstream().data());
        let pic_struct = self.pic_struct();

        let bst = self.bst_buf.bitstream_mut();
        bst.frame_type = frame_type;
        bst.pic_struct = pic_struct;
        bst.data_flag.complete_frame = true;
        bst.data_flag.header_only = header_only;
        self.active = Active::Buffer;
    }

    fn pic_struct(&self) -> PicStruct {
        match (self.header.sps_info(), self.kind()) {
            (Some(info), _) if info.interlaced => PicStruct::Unknown,
            (Some(_), _) => PicStruct::Progressive,
            (None, CodecKind::Vp8 | CodecKind::Vp9) => PicStruct::Progressive,
            (None, _) => PicStruct::Unknown,
        }
    }
}
