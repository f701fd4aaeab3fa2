//! Per-constructor configuration and logging context

use crate::codec::CodecKind;
use crate::error::{Error, Result};
use crate::util::GrowthPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::span::EnteredSpan;
use tracing::Span;

/// Default size of the internal buffer allocated by `init()`
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Tunables of a frame constructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstructorConfig {
    /// Cache HEVC mastering display / content light level SEI and hold the
    /// header phase open until the first coded slice
    pub hdr_sei: bool,
    /// Keep cached parameter sets across `reset()`
    pub preserve_headers_on_reset: bool,
    /// Internal buffer size allocated on `init()`
    pub initial_buffer_size: usize,
    /// Hard ceiling for the internal buffer
    pub max_buffer_size: Option<usize>,
    pub growth: GrowthPolicy,
}

impl Default for ConstructorConfig {
    fn default() -> Self {
        ConstructorConfig {
            hdr_sei: false,
            preserve_headers_on_reset: true,
            initial_buffer_size: DEFAULT_BUFFER_SIZE,
            max_buffer_size: None,
            growth: GrowthPolicy::Geometric,
        }
    }
}

impl ConstructorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ConstructorConfig = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid constructor config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject combinations that can never allocate
    pub fn validate(&self) -> Result<()> {
        if let Some(max) = self.max_buffer_size {
            if self.initial_buffer_size > max {
                return Err(Error::config(format!(
                    "initial_buffer_size {} exceeds max_buffer_size {}",
                    self.initial_buffer_size, max
                )));
            }
        }
        Ok(())
    }
}

/// Logging context a constructor reports under
///
/// Every public constructor operation enters this span, so output from
/// concurrent decoding sessions can be told apart by the subscriber.
#[derive(Debug, Clone)]
pub struct LogContext {
    span: Span,
}

impl LogContext {
    pub fn new(span: Span) -> Self {
        LogContext { span }
    }

    /// Span named after the codec
    pub fn for_codec(kind: CodecKind) -> Self {
        LogContext {
            span: tracing::debug_span!("frame_constructor", codec = %kind),
        }
    }

    /// Context that records nothing
    pub fn disabled() -> Self {
        LogContext { span: Span::none() }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub(crate) fn enter(&self) -> EnteredSpan {
        self.span.clone().entered()
    }
}
