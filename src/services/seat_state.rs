//! Legal states and transitions of a single show seat.
//!
//! AVAILABLE is the initial state. A claim binds the seat to a booking
//! (AVAILABLE -> BOOKED); a release by the owning booking returns it
//! (BOOKED -> AVAILABLE). There is no held or pending state.

use thiserror::Error;

use crate::models::{SeatStatus, ShowSeat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatState {
    pub status: SeatStatus,
    pub booking_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("seat is already booked")]
    AlreadyBooked,
    #[error("seat is not booked")]
    NotBooked,
    #[error("seat belongs to another booking")]
    NotOwner,
}

impl SeatState {
    pub const AVAILABLE: SeatState = SeatState { status: SeatStatus::Available, booking_id: None };

    pub fn booked_by(booking_id: i64) -> Self {
        SeatState { status: SeatStatus::Booked, booking_id: Some(booking_id) }
    }

    pub fn claim(self, booking_id: i64) -> Result<SeatState, TransitionError> {
        match self.status {
            SeatStatus::Available => Ok(SeatState::booked_by(booking_id)),
            SeatStatus::Booked => Err(TransitionError::AlreadyBooked),
        }
    }

    pub fn release(self, booking_id: i64) -> Result<SeatState, TransitionError> {
        match (self.status, self.booking_id) {
            (SeatStatus::Booked, Some(owner)) if owner == booking_id => Ok(SeatState::AVAILABLE),
            (SeatStatus::Booked, _) => Err(TransitionError::NotOwner),
            (SeatStatus::Available, _) => Err(TransitionError::NotBooked),
        }
    }

    /// A booking reference is present iff the seat is BOOKED.
    pub fn is_consistent(self) -> bool {
        (self.status == SeatStatus::Booked) == self.booking_id.is_some()
    }

    pub fn is_claimable(self) -> bool {
        self.claim(0).is_ok()
    }
}

impl From<&ShowSeat> for SeatState {
    fn from(seat: &ShowSeat) -> Self {
        SeatState { status: seat.status, booking_id: seat.booking_id }
    }
}
