//! VFC - elementary-stream frame constructor for hardware video decoders
//!
//! Decoders driven through a component interface receive input in whatever
//! chunks the demuxer produces. This crate turns those chunks back into
//! decoder-ready access units, tracks the stream headers the decoder needs
//! after a seek, and post-processes encoder output.
//!
//! # Architecture
//!
//! - `codec`: per-codec parsing helpers (Annex B scanning, SPS/SEI parsing,
//!   VC-1 start codes, VP8/VP9 frame headers)
//! - `constructor`: the frame constructor and its internal buffer
//! - `framing`: splitting stream files into access units for the CLI
//! - `output`: header removal and classification of encoder output
//! - `util`: buffer growth policy and 90 kHz timestamps

pub mod codec;
pub mod constructor;
pub mod error;
pub mod framing;
pub mod output;
pub mod util;

pub use codec::CodecKind;
pub use constructor::{Bitstream, ConstructorConfig, FrameConstructor, LogContext, StreamInfo};
pub use error::{Error, Result, Status};
pub use output::{classify_output, remove_headers, OutputKind};

/// VFC version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Library-wide settings
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Enable verbose logging
    pub verbose: bool,
    /// Enable debug output
    pub debug: bool,
}

/// Install a log subscriber according to `config`
///
/// `RUST_LOG` overrides the level picked from the flags. Constructors log
/// under their own [`LogContext`] span either way.
pub fn init(config: Config) -> Result<()> {
    if config.verbose || config.debug {
        let level = if config.debug { "debug" } else { "info" };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| Error::config(format!("Failed to install log subscriber: {}", e)))?;
    }

    Ok(())
}
