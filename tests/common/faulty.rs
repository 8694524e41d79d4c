//! Store wrapper that makes seat transitions lose races on demand.

use async_trait::async_trait;
use rust_decimal::Decimal;

use cinema_booking::error::{AppError, AppResult};
use cinema_booking::models::{
    Booking, BookingStatus, Movie, NewBooking, NewShow, PhysicalSeat, Screen, Show, ShowCascade,
    ShowFilter, ShowSeat, Theatre,
};
use cinema_booking::storage::{MemoryStore, Store, UnitOfWork};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `claim_seats` reports one row fewer than it transitioned.
    ShortClaim,
    /// `release_seats` reports one row fewer than it transitioned.
    ShortRelease,
    /// `lock_show_seats` fails the way a SERIALIZABLE retry error does.
    SerializationFailure,
}

pub struct FaultyStore {
    inner: MemoryStore,
    fault: Fault,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore, fault: Fault) -> Self {
        Self { inner, fault }
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyUnit { inner, fault: self.fault }))
    }
}

struct FaultyUnit {
    inner: Box<dyn UnitOfWork>,
    fault: Fault,
}

#[async_trait]
impl UnitOfWork for FaultyUnit {
    async fn find_movie(&mut self, id: i64) -> AppResult<Option<Movie>> {
        self.inner.find_movie(id).await
    }

    async fn find_theatre(&mut self, id: i64) -> AppResult<Option<Theatre>> {
        self.inner.find_theatre(id).await
    }

    async fn find_screen(&mut self, id: i64) -> AppResult<Option<Screen>> {
        self.inner.find_screen(id).await
    }

    async fn screen_seats(&mut self, screen_id: i64) -> AppResult<Vec<PhysicalSeat>> {
        self.inner.screen_seats(screen_id).await
    }

    async fn insert_show(&mut self, show: &NewShow) -> AppResult<Show> {
        self.inner.insert_show(show).await
    }

    async fn insert_show_seats(&mut self, show_id: i64, seat_ids: &[i64]) -> AppResult<u64> {
        self.inner.insert_show_seats(show_id, seat_ids).await
    }

    async fn find_show(&mut self, id: i64) -> AppResult<Option<Show>> {
        self.inner.find_show(id).await
    }

    async fn list_shows(&mut self, filter: &ShowFilter) -> AppResult<Vec<Show>> {
        self.inner.list_shows(filter).await
    }

    async fn count_bookings(&mut self, show_id: i64, status: BookingStatus) -> AppResult<u64> {
        self.inner.count_bookings(show_id, status).await
    }

    async fn delete_show_cascade(&mut self, show_id: i64) -> AppResult<ShowCascade> {
        self.inner.delete_show_cascade(show_id).await
    }

    async fn show_seats(&mut self, show_id: i64) -> AppResult<Vec<ShowSeat>> {
        self.inner.show_seats(show_id).await
    }

    async fn lock_show_seats(&mut self, show_id: i64, seat_ids: &[i64]) -> AppResult<Vec<ShowSeat>> {
        if self.fault == Fault::SerializationFailure {
            return Err(AppError::conflict("concurrent update detected, retry with a fresh read"));
        }
        self.inner.lock_show_seats(show_id, seat_ids).await
    }

    async fn owned_seats(&mut self, booking_id: i64) -> AppResult<Vec<ShowSeat>> {
        self.inner.owned_seats(booking_id).await
    }

    async fn claim_seats(&mut self, show_id: i64, seat_ids: &[i64], booking_id: i64) -> AppResult<u64> {
        let affected = self.inner.claim_seats(show_id, seat_ids, booking_id).await?;
        Ok(match self.fault {
            Fault::ShortClaim => affected.saturating_sub(1),
            _ => affected,
        })
    }

    async fn release_seats(&mut self, booking_id: i64, seat_ids: &[i64]) -> AppResult<u64> {
        let affected = self.inner.release_seats(booking_id, seat_ids).await?;
        Ok(match self.fault {
            Fault::ShortRelease => affected.saturating_sub(1),
            _ => affected,
        })
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<Booking> {
        self.inner.insert_booking(booking).await
    }

    async fn find_booking(&mut self, id: i64) -> AppResult<Option<Booking>> {
        self.inner.find_booking(id).await
    }

    async fn update_booking(
        &mut self,
        id: i64,
        status: BookingStatus,
        total_price: Decimal,
    ) -> AppResult<Booking> {
        self.inner.update_booking(id, status, total_price).await
    }

    async fn user_bookings(&mut self, user_id: i64) -> AppResult<Vec<Booking>> {
        self.inner.user_bookings(user_id).await
    }

    async fn commit(&mut self) -> AppResult<()> {
        self.inner.commit().await
    }
}
