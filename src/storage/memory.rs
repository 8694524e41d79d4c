//! In-memory store for tests and embedding.
//!
//! A unit of work holds the store-wide lock for its whole lifetime and works
//! on a staged copy of the tables, so units are trivially serializable.
//! `commit` publishes the copy; dropping the unit discards it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Store, UnitOfWork};
use crate::error::{AppError, AppResult};
use crate::models::{
    Booking, BookingStatus, Movie, NewBooking, NewShow, PhysicalSeat, Screen, SeatStatus, Show,
    ShowCascade, ShowFilter, ShowSeat, Theatre,
};
use crate::services::seat_state::SeatState;

#[derive(Debug, Clone)]
struct ShowSeatRow {
    id: i64,
    show_id: i64,
    seat_id: i64,
    status: SeatStatus,
    booking_id: Option<i64>,
}

impl ShowSeatRow {
    fn state(&self) -> SeatState {
        SeatState { status: self.status, booking_id: self.booking_id }
    }

    fn set_state(&mut self, state: SeatState) {
        self.status = state.status;
        self.booking_id = state.booking_id;
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i64,
    theatres: BTreeMap<i64, Theatre>,
    movies: BTreeMap<i64, Movie>,
    screens: BTreeMap<i64, Screen>,
    seats: BTreeMap<i64, PhysicalSeat>,
    shows: BTreeMap<i64, Show>,
    show_seats: BTreeMap<i64, ShowSeatRow>,
    bookings: BTreeMap<i64, Booking>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn join(&self, row: &ShowSeatRow) -> AppResult<ShowSeat> {
        let seat = self.seats.get(&row.seat_id).ok_or_else(|| {
            AppError::Internal(format!("show seat {} references missing seat {}", row.id, row.seat_id))
        })?;
        Ok(ShowSeat {
            id: row.id,
            show_id: row.show_id,
            seat_id: row.seat_id,
            seat_row: seat.seat_row.clone(),
            seat_column: seat.seat_column,
            seat_type: seat.seat_type.clone(),
            status: row.status,
            booking_id: row.booking_id,
        })
    }

    fn joined<'a>(&self, rows: impl Iterator<Item = &'a ShowSeatRow>) -> AppResult<Vec<ShowSeat>> {
        let mut seats = rows.map(|row| self.join(row)).collect::<AppResult<Vec<_>>>()?;
        seats.sort_by(|a, b| (&a.seat_row, a.seat_column).cmp(&(&b.seat_row, b.seat_column)));
        Ok(seats)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_theatre(&self, name: &str, location: &str, owner_id: i64) -> Theatre {
        let mut tables = self.tables.lock().await;
        let theatre = Theatre {
            id: tables.next_id(),
            name: name.to_string(),
            location: location.to_string(),
            owner_id,
        };
        tables.theatres.insert(theatre.id, theatre.clone());
        theatre
    }

    pub async fn add_movie(&self, title: &str) -> Movie {
        let mut tables = self.tables.lock().await;
        let movie = Movie {
            id: tables.next_id(),
            title: title.to_string(),
            language: None,
            duration_minutes: None,
            release_date: None,
        };
        tables.movies.insert(movie.id, movie.clone());
        movie
    }

    /// Adds a screen with the given (row, column) physical seats.
    pub async fn add_screen(&self, theatre_id: i64, name: &str, layout: &[(&str, i32)]) -> Screen {
        let mut tables = self.tables.lock().await;
        let screen = Screen {
            id: tables.next_id(),
            theatre_id,
            name: name.to_string(),
            capacity: layout.len() as i32,
        };
        for (row, column) in layout {
            let seat = PhysicalSeat {
                id: tables.next_id(),
                screen_id: screen.id,
                seat_row: row.to_string(),
                seat_column: *column,
                seat_type: "STANDARD".to_string(),
            };
            tables.seats.insert(seat.id, seat);
        }
        tables.screens.insert(screen.id, screen.clone());
        screen
    }

    pub async fn booking_count(&self) -> usize {
        self.tables.lock().await.bookings.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = (*guard).clone();
        Ok(Box::new(MemoryUnit { guard: Some(guard), work }))
    }
}

pub struct MemoryUnit {
    guard: Option<OwnedMutexGuard<Tables>>,
    work: Tables,
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn find_movie(&mut self, id: i64) -> AppResult<Option<Movie>> {
        Ok(self.work.movies.get(&id).cloned())
    }

    async fn find_theatre(&mut self, id: i64) -> AppResult<Option<Theatre>> {
        Ok(self.work.theatres.get(&id).cloned())
    }

    async fn find_screen(&mut self, id: i64) -> AppResult<Option<Screen>> {
        Ok(self.work.screens.get(&id).cloned())
    }

    async fn screen_seats(&mut self, screen_id: i64) -> AppResult<Vec<PhysicalSeat>> {
        let mut seats: Vec<PhysicalSeat> = self
            .work
            .seats
            .values()
            .filter(|seat| seat.screen_id == screen_id)
            .cloned()
            .collect();
        seats.sort_by(|a, b| (&a.seat_row, a.seat_column).cmp(&(&b.seat_row, b.seat_column)));
        Ok(seats)
    }

    async fn insert_show(&mut self, new: &NewShow) -> AppResult<Show> {
        // Foreign keys
        if !self.work.movies.contains_key(&new.movie_id)
            || !self.work.theatres.contains_key(&new.theatre_id)
            || !self.work.screens.contains_key(&new.screen_id)
        {
            return Err(AppError::Internal("show references missing catalog rows".to_string()));
        }
        let show = Show {
            id: self.work.next_id(),
            movie_id: new.movie_id,
            theatre_id: new.theatre_id,
            screen_id: new.screen_id,
            show_time: new.show_time,
            price: new.price,
            created_at: Utc::now(),
        };
        self.work.shows.insert(show.id, show.clone());
        Ok(show)
    }

    async fn insert_show_seats(&mut self, show_id: i64, seat_ids: &[i64]) -> AppResult<u64> {
        for seat_id in seat_ids {
            let duplicate = self
                .work
                .show_seats
                .values()
                .any(|row| row.show_id == show_id && row.seat_id == *seat_id);
            if duplicate {
                return Err(AppError::conflict("record already exists"));
            }
            let id = self.work.next_id();
            self.work.show_seats.insert(
                id,
                ShowSeatRow {
                    id,
                    show_id,
                    seat_id: *seat_id,
                    status: SeatStatus::Available,
                    booking_id: None,
                },
            );
        }
        Ok(seat_ids.len() as u64)
    }

    async fn find_show(&mut self, id: i64) -> AppResult<Option<Show>> {
        Ok(self.work.shows.get(&id).cloned())
    }

    async fn list_shows(&mut self, filter: &ShowFilter) -> AppResult<Vec<Show>> {
        let mut shows: Vec<Show> = self
            .work
            .shows
            .values()
            .filter(|show| filter.matches(show))
            .cloned()
            .collect();
        shows.sort_by_key(|show| (show.show_time, show.id));
        Ok(shows)
    }

    async fn count_bookings(&mut self, show_id: i64, status: BookingStatus) -> AppResult<u64> {
        Ok(self
            .work
            .bookings
            .values()
            .filter(|b| b.show_id == show_id && b.status == status)
            .count() as u64)
    }

    async fn delete_show_cascade(&mut self, show_id: i64) -> AppResult<ShowCascade> {
        let before = self.work.show_seats.len();
        self.work.show_seats.retain(|_, row| row.show_id != show_id);
        let show_seats = (before - self.work.show_seats.len()) as u64;

        let before = self.work.bookings.len();
        self.work.bookings.retain(|_, booking| booking.show_id != show_id);
        let bookings = (before - self.work.bookings.len()) as u64;

        self.work.shows.remove(&show_id);
        Ok(ShowCascade { show_seats, bookings })
    }

    async fn show_seats(&mut self, show_id: i64) -> AppResult<Vec<ShowSeat>> {
        let work = &self.work;
        work.joined(work.show_seats.values().filter(|row| row.show_id == show_id))
    }

    async fn lock_show_seats(&mut self, show_id: i64, seat_ids: &[i64]) -> AppResult<Vec<ShowSeat>> {
        let work = &self.work;
        work.joined(
            work.show_seats
                .values()
                .filter(|row| row.show_id == show_id && seat_ids.contains(&row.seat_id)),
        )
    }

    async fn owned_seats(&mut self, booking_id: i64) -> AppResult<Vec<ShowSeat>> {
        let work = &self.work;
        work.joined(work.show_seats.values().filter(|row| {
            row.booking_id == Some(booking_id) && row.status == SeatStatus::Booked
        }))
    }

    async fn claim_seats(&mut self, show_id: i64, seat_ids: &[i64], booking_id: i64) -> AppResult<u64> {
        if !self.work.bookings.contains_key(&booking_id) {
            return Err(AppError::Internal(format!("booking {booking_id} does not exist")));
        }
        let mut affected = 0;
        for row in self.work.show_seats.values_mut() {
            if row.show_id != show_id || !seat_ids.contains(&row.seat_id) {
                continue;
            }
            if let Ok(next) = row.state().claim(booking_id) {
                row.set_state(next);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn release_seats(&mut self, booking_id: i64, seat_ids: &[i64]) -> AppResult<u64> {
        let mut affected = 0;
        for row in self.work.show_seats.values_mut() {
            if !seat_ids.contains(&row.seat_id) {
                continue;
            }
            if let Ok(next) = row.state().release(booking_id) {
                row.set_state(next);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn insert_booking(&mut self, new: &NewBooking) -> AppResult<Booking> {
        if !self.work.shows.contains_key(&new.show_id) {
            return Err(AppError::Internal(format!("show {} does not exist", new.show_id)));
        }
        let booking = Booking {
            id: self.work.next_id(),
            user_id: new.user_id,
            show_id: new.show_id,
            total_price: new.total_price,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        };
        self.work.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_booking(&mut self, id: i64) -> AppResult<Option<Booking>> {
        Ok(self.work.bookings.get(&id).cloned())
    }

    async fn update_booking(
        &mut self,
        id: i64,
        status: BookingStatus,
        total_price: Decimal,
    ) -> AppResult<Booking> {
        let booking = self
            .work
            .bookings
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("booking {id} not found")).with_ids(vec![id]))?;
        booking.status = status;
        booking.total_price = total_price;
        Ok(booking.clone())
    }

    async fn user_bookings(&mut self, user_id: i64) -> AppResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .work
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(bookings)
    }

    async fn commit(&mut self) -> AppResult<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| AppError::Internal("unit of work already committed".to_string()))?;
        *guard = std::mem::take(&mut self.work);
        Ok(())
    }
}
