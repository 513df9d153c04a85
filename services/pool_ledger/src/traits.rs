//! State Management Traits
//!
//! Snapshot and restore for stateful components, plus the sequence counter
//! that numbers committed operations.

use thiserror::Error;

/// Error types for state management operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Snapshot encoding failed: {reason}")]
    Encoding { reason: String },

    #[error("State validation failed: {reason}")]
    ValidationFailed { reason: String },
}

impl From<bincode::Error> for StateError {
    fn from(err: bincode::Error) -> Self {
        StateError::Encoding {
            reason: err.to_string(),
        }
    }
}

/// Core trait for components whose state can be captured and reloaded
pub trait Stateful {
    /// Error type for failed operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a snapshot of the current state
    fn snapshot(&self) -> Result<Vec<u8>, Self::Error>;

    /// Replace the current state with a snapshot
    ///
    /// On error the current state is left as it was.
    fn restore(&mut self, snapshot: &[u8]) -> Result<(), Self::Error>;
}

/// Stateful component that numbers the operations it commits
pub trait SequencedStateful: Stateful {
    /// Sequence number of the last committed operation, 0 if none
    fn last_sequence(&self) -> u64;
}

/// Monotonic operation counter
#[derive(Debug)]
pub struct SequenceTracker {
    next_expected: u64,
    last_processed: u64,
}

impl SequenceTracker {
    /// Create a new sequence tracker starting from sequence 1
    pub fn new() -> Self {
        Self {
            next_expected: 1,
            last_processed: 0,
        }
    }

    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_processed
    }

    /// Set the last processed sequence number (used during restore)
    pub fn set_last_sequence(&mut self, sequence: u64) {
        self.last_processed = sequence;
        self.next_expected = sequence + 1;
    }

    /// Consume the next sequence number
    pub fn advance(&mut self) -> u64 {
        self.last_processed = self.next_expected;
        self.next_expected += 1;
        self.last_processed
    }
}

impl Default for SequenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_tracker_advances() {
        let mut tracker = SequenceTracker::new();
        assert_eq!(tracker.last_sequence(), 0);
        assert_eq!(tracker.advance(), 1);
        assert_eq!(tracker.advance(), 2);
        assert_eq!(tracker.next_expected(), 3);

        tracker.set_last_sequence(40);
        assert_eq!(tracker.advance(), 41);
    }

    #[test]
    fn test_bincode_error_maps_to_encoding() {
        let err = bincode::deserialize::<u64>(&[1, 2]).unwrap_err();
        assert!(matches!(StateError::from(err), StateError::Encoding { .. }));
    }
}
