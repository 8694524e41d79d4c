#![allow(dead_code)]

pub mod faulty;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use cinema_booking::config::BookingConfig;
use cinema_booking::models::{AuthUser, NewShow, Role, Show, ShowSeat};
use cinema_booking::services::{BookingService, ShowService};
use cinema_booking::storage::{MemoryStore, Store};

use faulty::{Fault, FaultyStore};

pub const OWNER_ID: i64 = 100;

/// A theatre with one ten-seat screen (A1..A10) and one show at 12.50.
pub struct Fixture {
    pub store: MemoryStore,
    pub shows: ShowService,
    pub bookings: BookingService,
    pub show: Show,
    pub seats: Vec<ShowSeat>,
    pub theatre_id: i64,
    pub movie_id: i64,
    pub screen_id: i64,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_policy(BookingConfig::default()).await
    }

    pub async fn with_policy(policy: BookingConfig) -> Self {
        let store = MemoryStore::new();
        let theatre = store.add_theatre("Grand", "Downtown", OWNER_ID).await;
        let movie = store.add_movie("Arrival").await;
        let layout: Vec<(&str, i32)> = (1..=10).map(|column| ("A", column)).collect();
        let screen = store.add_screen(theatre.id, "Screen 1", &layout).await;

        let shared: Arc<dyn Store> = Arc::new(store.clone());
        let shows = ShowService::new(shared.clone());
        let bookings = BookingService::new(shared, policy);

        let created = shows
            .initialize_show(&owner(), new_show(movie.id, theatre.id, screen.id, price()))
            .await
            .expect("show initializes");
        let seats = shows.show_seats(created.show.id).await.expect("seat map");

        Self {
            store,
            shows,
            bookings,
            show: created.show,
            seats,
            theatre_id: theatre.id,
            movie_id: movie.id,
            screen_id: screen.id,
        }
    }

    /// Physical seat id of `A{column}`.
    pub fn seat(&self, column: i32) -> i64 {
        self.seats
            .iter()
            .find(|seat| seat.seat_column == column)
            .map(|seat| seat.seat_id)
            .expect("seat exists")
    }

    /// Booking service over the same data whose seat transitions misbehave.
    pub fn faulty_bookings(&self, fault: Fault) -> BookingService {
        let store: Arc<dyn Store> = Arc::new(FaultyStore::new(self.store.clone(), fault));
        BookingService::new(store, BookingConfig::default())
    }

    pub async fn seat_map(&self) -> Vec<ShowSeat> {
        self.shows.show_seats(self.show.id).await.expect("seat map")
    }

    pub async fn available(&self) -> usize {
        self.seat_map().await.iter().filter(|seat| seat.is_available()).count()
    }
}

pub fn price() -> Decimal {
    Decimal::new(1250, 2)
}

pub fn new_show(movie_id: i64, theatre_id: i64, screen_id: i64, price: Decimal) -> NewShow {
    NewShow {
        movie_id,
        theatre_id,
        screen_id,
        show_time: Utc.with_ymd_and_hms(2030, 5, 1, 19, 30, 0).unwrap(),
        price,
    }
}

pub fn owner() -> AuthUser {
    AuthUser::new(OWNER_ID, Role::Owner)
}

pub fn customer(user_id: i64) -> AuthUser {
    AuthUser::new(user_id, Role::Customer)
}

pub fn admin() -> AuthUser {
    AuthUser::new(1, Role::Admin)
}
