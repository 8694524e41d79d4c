//! Atomic units of work over catalog, show-seat inventory and bookings.
//!
//! Every booking operation runs inside exactly one [`UnitOfWork`]. A unit
//! that is dropped without [`UnitOfWork::commit`] leaves no trace: Postgres
//! rolls the transaction back, the in-memory store discards its staged copy.
//! Mutual exclusion comes from the store alone, never from in-process locks
//! held by callers.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::AppResult;
use crate::models::{
    Booking, BookingStatus, Movie, NewBooking, NewShow, PhysicalSeat, Screen, Show,
    ShowCascade, ShowFilter, ShowSeat, Theatre,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a serializable unit of work.
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    // --- catalog ---
    async fn find_movie(&mut self, id: i64) -> AppResult<Option<Movie>>;
    async fn find_theatre(&mut self, id: i64) -> AppResult<Option<Theatre>>;
    async fn find_screen(&mut self, id: i64) -> AppResult<Option<Screen>>;
    /// Physical seats of a screen ordered by row, then column.
    async fn screen_seats(&mut self, screen_id: i64) -> AppResult<Vec<PhysicalSeat>>;

    // --- shows ---
    async fn insert_show(&mut self, show: &NewShow) -> AppResult<Show>;
    /// Creates one AVAILABLE show seat per physical seat id; returns rows inserted.
    async fn insert_show_seats(&mut self, show_id: i64, seat_ids: &[i64]) -> AppResult<u64>;
    async fn find_show(&mut self, id: i64) -> AppResult<Option<Show>>;
    async fn list_shows(&mut self, filter: &ShowFilter) -> AppResult<Vec<Show>>;
    async fn count_bookings(&mut self, show_id: i64, status: BookingStatus) -> AppResult<u64>;
    /// Deletes show seats, bookings and the show row, in that order.
    async fn delete_show_cascade(&mut self, show_id: i64) -> AppResult<ShowCascade>;

    // --- seat inventory ---
    /// All seats of a show ordered by row, then column.
    async fn show_seats(&mut self, show_id: i64) -> AppResult<Vec<ShowSeat>>;
    /// Locks and returns the show seats matching the given physical seat ids.
    async fn lock_show_seats(&mut self, show_id: i64, seat_ids: &[i64]) -> AppResult<Vec<ShowSeat>>;
    /// Seats currently BOOKED by the booking, locked.
    async fn owned_seats(&mut self, booking_id: i64) -> AppResult<Vec<ShowSeat>>;
    /// AVAILABLE -> BOOKED for the given seats; returns rows actually transitioned.
    async fn claim_seats(&mut self, show_id: i64, seat_ids: &[i64], booking_id: i64) -> AppResult<u64>;
    /// BOOKED -> AVAILABLE for seats owned by the booking; returns rows actually transitioned.
    async fn release_seats(&mut self, booking_id: i64, seat_ids: &[i64]) -> AppResult<u64>;

    // --- bookings ---
    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<Booking>;
    /// Loads and locks a booking.
    async fn find_booking(&mut self, id: i64) -> AppResult<Option<Booking>>;
    async fn update_booking(
        &mut self,
        id: i64,
        status: BookingStatus,
        total_price: Decimal,
    ) -> AppResult<Booking>;
    /// Bookings of a user, newest first.
    async fn user_bookings(&mut self, user_id: i64) -> AppResult<Vec<Booking>>;

    async fn commit(&mut self) -> AppResult<()>;
}
