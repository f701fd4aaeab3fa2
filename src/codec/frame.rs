//! Per-access-unit picture descriptors attached to assembled bitstreams

use std::fmt;

/// Picture type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PictureType {
    /// Intra frame
    I,
    /// Predicted frame
    P,
    /// Bidirectional frame
    B,
    /// None/Unknown
    #[default]
    None,
}

impl fmt::Display for PictureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PictureType::I => write!(f, "I"),
            PictureType::P => write!(f, "P"),
            PictureType::B => write!(f, "B"),
            PictureType::None => write!(f, "?"),
        }
    }
}

/// Frame type of the access unit carried by a bitstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameType {
    /// Coding type of the first slice
    pub picture: PictureType,
    /// Instantaneous decoder refresh (resync point)
    pub idr: bool,
    /// Used as a reference by later pictures
    pub reference: bool,
}

impl FrameType {
    /// An IDR intra picture
    pub fn idr() -> Self {
        FrameType {
            picture: PictureType::I,
            idr: true,
            reference: true,
        }
    }

    /// A non-IDR picture of the given type
    pub fn new(picture: PictureType, reference: bool) -> Self {
        FrameType {
            picture,
            idr: false,
            reference,
        }
    }

    /// Whether decoding can start at this access unit
    pub fn is_sync_point(&self) -> bool {
        self.idr || self.picture == PictureType::I
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.picture)?;
        if self.idr {
            write!(f, "(IDR)")?;
        }
        Ok(())
    }
}

/// Picture structure hint for the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PicStruct {
    /// Let the decoder work it out from the bitstream
    #[default]
    Unknown,
    /// Progressive frame
    Progressive,
    /// Interlaced, top field first
    FieldTff,
    /// Interlaced, bottom field first
    FieldBff,
}
