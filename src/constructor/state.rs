//! Header-acquisition state and active-bitstream selection

use std::fmt;

/// Where the constructor is in acquiring stream headers
///
/// ```text
/// HeaderAwaiting -> HeaderCollecting -> [HeaderWaitSei] -> HeaderObtained
///        ^                                                      |
///        +------------------- reset() (no cache) <-- Resetting <+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BstState {
    /// No parameter set seen yet; leading bytes are dropped
    #[default]
    HeaderAwaiting,
    /// Parameter sets arriving, not yet complete
    HeaderCollecting,
    /// Headers complete, holding on until the first coded slice so that
    /// prefix SEI between the headers and the picture is captured
    HeaderWaitSei,
    /// Headers known; frames flow through
    HeaderObtained,
    /// Transient, inside `reset()`
    Resetting,
}

impl BstState {
    /// Whether incoming data still goes through header acquisition
    pub fn is_collecting(&self) -> bool {
        matches!(
            self,
            BstState::HeaderAwaiting | BstState::HeaderCollecting | BstState::HeaderWaitSei
        )
    }
}

impl fmt::Display for BstState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BstState::HeaderAwaiting => "header-awaiting",
            BstState::HeaderCollecting => "header-collecting",
            BstState::HeaderWaitSei => "header-wait-sei",
            BstState::HeaderObtained => "header-obtained",
            BstState::Resetting => "resetting",
        };
        f.write_str(name)
    }
}

/// Which bitstream the decoder currently sees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Active {
    /// Nothing to decode
    #[default]
    None,
    /// The caller's buffer, zero-copy
    Input,
    /// The internal accumulation buffer
    Buffer,
}
