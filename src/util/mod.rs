//! Common utilities and data structures

pub mod buffer;
pub mod timestamp;

pub use buffer::{BufferStats, GrowthPolicy};
pub use timestamp::Timestamp;
