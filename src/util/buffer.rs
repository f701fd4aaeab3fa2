//! Growth policy and accounting for internally owned byte buffers

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How an owned buffer grows when appended data does not fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Grow to the larger of the need and twice the current size
    #[default]
    Geometric,
    /// Grow to exactly the needed size
    Exact,
}

impl GrowthPolicy {
    /// New capacity for a buffer of `current` bytes that must hold `needed`
    pub fn next_size(&self, current: usize, needed: usize) -> usize {
        match self {
            GrowthPolicy::Geometric => needed.max(current.saturating_mul(2)),
            GrowthPolicy::Exact => needed,
        }
    }
}

/// Cumulative counters of an owned buffer
///
/// Purely diagnostic; nothing in the constructor branches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BufferStats {
    /// Number of times storage was (re)allocated
    pub reallocs: u64,
    /// Bytes copied in from caller buffers
    pub copied_bytes: u64,
}

/// Allocate a zero-filled vector of `size` bytes without aborting on failure
///
/// Sizes above `limit` are refused the same way an allocator failure is.
pub fn try_alloc(size: usize, limit: Option<usize>) -> Result<Vec<u8>> {
    if let Some(max) = limit {
        if size > max {
            return Err(Error::memory_alloc(size, limit));
        }
    }

    let mut storage = Vec::new();
    storage
        .try_reserve_exact(size)
        .map_err(|_| Error::memory_alloc(size, limit))?;
    storage.resize(size, 0);
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometric_growth() {
        assert_eq!(GrowthPolicy::Geometric.next_size(100, 150), 200);
        assert_eq!(GrowthPolicy::Geometric.next_size(100, 500), 500);
        assert_eq!(GrowthPolicy::Geometric.next_size(0, 10), 10);
    }

    #[test]
    fn test_exact_growth() {
        assert_eq!(GrowthPolicy::Exact.next_size(100, 150), 150);
    }

    #[test]
    fn test_try_alloc_limit() {
        assert_eq!(try_alloc(16, None).unwrap().len(), 16);
        assert!(matches!(
            try_alloc(32, Some(16)),
            Err(Error::MemoryAlloc { requested: 32, .. })
        ));
    }
}
