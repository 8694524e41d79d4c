//! Lost-race detection for conditional seat transitions.

use std::fmt;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatOperation {
    Claim,
    Release,
    Initialize,
}

impl fmt::Display for SeatOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatOperation::Claim => f.write_str("claim"),
            SeatOperation::Release => f.write_str("release"),
            SeatOperation::Initialize => f.write_str("initialize"),
        }
    }
}

/// Compares the rows a conditional update was meant to touch with the rows
/// it actually touched. Any difference means another unit got there first.
pub fn verify(operation: SeatOperation, seat_ids: &[i64], affected: u64) -> AppResult<()> {
    let expected = seat_ids.len() as u64;
    if expected == affected {
        return Ok(());
    }
    tracing::warn!(%operation, expected, affected, seats = ?seat_ids, "seat transition lost a race");
    Err(AppError::conflict(format!(
        "seat {operation} affected {affected} of {expected} seats; another booking changed them first"
    ))
    .with_ids(seat_ids.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_counts_pass() {
        assert!(verify(SeatOperation::Claim, &[1, 2, 3], 3).is_ok());
        assert!(verify(SeatOperation::Release, &[], 0).is_ok());
    }

    #[test]
    fn short_count_is_a_conflict_naming_the_seats() {
        let err = verify(SeatOperation::Claim, &[4, 5], 1).unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(err.ids(), &[4, 5]);
    }

    #[test]
    fn excess_count_is_also_a_conflict() {
        let err = verify(SeatOperation::Release, &[4], 2).unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }
}
