use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "seat_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Booked,
}

/// Per-show inventory row joined with its physical seat.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowSeat {
    pub id: i64,
    pub show_id: i64,
    pub seat_id: i64,
    pub seat_row: String,
    pub seat_column: i32,
    pub seat_type: String,
    pub status: SeatStatus,
    pub booking_id: Option<i64>,
}

impl ShowSeat {
    pub fn label(&self) -> String {
        format!("{}{}", self.seat_row, self.seat_column)
    }

    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }

    pub fn is_owned_by(&self, booking_id: i64) -> bool {
        self.status == SeatStatus::Booked && self.booking_id == Some(booking_id)
    }
}
