use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use super::{Store, UnitOfWork};
use crate::error::{AppError, AppResult};
use crate::models::{
    Booking, BookingStatus, Movie, NewBooking, NewShow, PhysicalSeat, Screen, Show,
    ShowCascade, ShowFilter, ShowSeat, Theatre,
};

const SHOW_SEAT_COLUMNS: &str = r#"
    ss.id, ss.show_id, ss.seat_id, s.seat_row, s.seat_column, s.seat_type, ss.status, ss.booking_id
"#;

const SHOW_COLUMNS: &str = "id, movie_id, theatre_id, screen_id, show_time, price, created_at";

const BOOKING_COLUMNS: &str = "id, user_id, show_id, total_price, status, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }
}

/// One SERIALIZABLE transaction. Dropping it uncommitted rolls back.
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> AppResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("unit of work already committed".to_string()))
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_movie(&mut self, id: i64) -> AppResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT id, title, language, duration_minutes, release_date FROM movies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(movie)
    }

    async fn find_theatre(&mut self, id: i64) -> AppResult<Option<Theatre>> {
        let theatre = sqlx::query_as::<_, Theatre>(
            "SELECT id, name, location, owner_id FROM theatres WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(theatre)
    }

    async fn find_screen(&mut self, id: i64) -> AppResult<Option<Screen>> {
        let screen = sqlx::query_as::<_, Screen>(
            "SELECT id, theatre_id, name, capacity FROM screens WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(screen)
    }

    async fn screen_seats(&mut self, screen_id: i64) -> AppResult<Vec<PhysicalSeat>> {
        let seats = sqlx::query_as::<_, PhysicalSeat>(
            r#"
            SELECT id, screen_id, seat_row, seat_column, seat_type
            FROM seats
            WHERE screen_id = $1
            ORDER BY seat_row, seat_column
            "#,
        )
        .bind(screen_id)
        .fetch_all(self.conn()?)
        .await?;
        Ok(seats)
    }

    async fn insert_show(&mut self, show: &NewShow) -> AppResult<Show> {
        let query = format!(
            "INSERT INTO shows (movie_id, theatre_id, screen_id, show_time, price)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SHOW_COLUMNS}"
        );
        let show = sqlx::query_as::<_, Show>(&query)
            .bind(show.movie_id)
            .bind(show.theatre_id)
            .bind(show.screen_id)
            .bind(show.show_time)
            .bind(show.price)
            .fetch_one(self.conn()?)
            .await?;
        Ok(show)
    }

    async fn insert_show_seats(&mut self, show_id: i64, seat_ids: &[i64]) -> AppResult<u64> {
        if seat_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            r#"
            INSERT INTO show_seats (show_id, seat_id, status)
            SELECT $1, seat_id, 'AVAILABLE'
            FROM UNNEST($2::BIGINT[]) AS seat_id
            "#,
        )
        .bind(show_id)
        .bind(seat_ids)
        .execute(self.conn()?)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_show(&mut self, id: i64) -> AppResult<Option<Show>> {
        let query = format!("SELECT {SHOW_COLUMNS} FROM shows WHERE id = $1");
        let show = sqlx::query_as::<_, Show>(&query)
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(show)
    }

    async fn list_shows(&mut self, filter: &ShowFilter) -> AppResult<Vec<Show>> {
        let query = format!(
            "SELECT {SHOW_COLUMNS} FROM shows
             WHERE ($1::BIGINT IS NULL OR movie_id = $1)
               AND ($2::BIGINT IS NULL OR theatre_id = $2)
               AND ($3::BIGINT IS NULL OR screen_id = $3)
             ORDER BY show_time, id"
        );
        let shows = sqlx::query_as::<_, Show>(&query)
            .bind(filter.movie_id)
            .bind(filter.theatre_id)
            .bind(filter.screen_id)
            .fetch_all(self.conn()?)
            .await?;
        Ok(shows)
    }

    async fn count_bookings(&mut self, show_id: i64, status: BookingStatus) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings WHERE show_id = $1 AND status = $2",
        )
        .bind(show_id)
        .bind(status)
        .fetch_one(self.conn()?)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn delete_show_cascade(&mut self, show_id: i64) -> AppResult<ShowCascade> {
        let show_seats = sqlx::query("DELETE FROM show_seats WHERE show_id = $1")
            .bind(show_id)
            .execute(self.conn()?)
            .await?
            .rows_affected();

        let bookings = sqlx::query("DELETE FROM bookings WHERE show_id = $1")
            .bind(show_id)
            .execute(self.conn()?)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM shows WHERE id = $1")
            .bind(show_id)
            .execute(self.conn()?)
            .await?;

        Ok(ShowCascade { show_seats, bookings })
    }

    async fn show_seats(&mut self, show_id: i64) -> AppResult<Vec<ShowSeat>> {
        let query = format!(
            "SELECT {SHOW_SEAT_COLUMNS}
             FROM show_seats ss
             JOIN seats s ON s.id = ss.seat_id
             WHERE ss.show_id = $1
             ORDER BY s.seat_row, s.seat_column"
        );
        let seats = sqlx::query_as::<_, ShowSeat>(&query)
            .bind(show_id)
            .fetch_all(self.conn()?)
            .await?;
        Ok(seats)
    }

    async fn lock_show_seats(&mut self, show_id: i64, seat_ids: &[i64]) -> AppResult<Vec<ShowSeat>> {
        let query = format!(
            "SELECT {SHOW_SEAT_COLUMNS}
             FROM show_seats ss
             JOIN seats s ON s.id = ss.seat_id
             WHERE ss.show_id = $1 AND ss.seat_id = ANY($2)
             ORDER BY s.seat_row, s.seat_column
             FOR UPDATE OF ss"
        );
        let seats = sqlx::query_as::<_, ShowSeat>(&query)
            .bind(show_id)
            .bind(seat_ids)
            .fetch_all(self.conn()?)
            .await?;
        Ok(seats)
    }

    async fn owned_seats(&mut self, booking_id: i64) -> AppResult<Vec<ShowSeat>> {
        let query = format!(
            "SELECT {SHOW_SEAT_COLUMNS}
             FROM show_seats ss
             JOIN seats s ON s.id = ss.seat_id
             WHERE ss.booking_id = $1 AND ss.status = 'BOOKED'
             ORDER BY s.seat_row, s.seat_column
             FOR UPDATE OF ss"
        );
        let seats = sqlx::query_as::<_, ShowSeat>(&query)
            .bind(booking_id)
            .fetch_all(self.conn()?)
            .await?;
        Ok(seats)
    }

    async fn claim_seats(&mut self, show_id: i64, seat_ids: &[i64], booking_id: i64) -> AppResult<u64> {
        // Guard re-checked at write time
        let result = sqlx::query(
            r#"
            UPDATE show_seats
            SET status = 'BOOKED', booking_id = $3
            WHERE show_id = $1 AND seat_id = ANY($2) AND status = 'AVAILABLE'
            "#,
        )
        .bind(show_id)
        .bind(seat_ids)
        .bind(booking_id)
        .execute(self.conn()?)
        .await?;
        Ok(result.rows_affected())
    }

    async fn release_seats(&mut self, booking_id: i64, seat_ids: &[i64]) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE show_seats
            SET status = 'AVAILABLE', booking_id = NULL
            WHERE booking_id = $1 AND seat_id = ANY($2) AND status = 'BOOKED'
            "#,
        )
        .bind(booking_id)
        .bind(seat_ids)
        .execute(self.conn()?)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<Booking> {
        let query = format!(
            "INSERT INTO bookings (user_id, show_id, total_price, status)
             VALUES ($1, $2, $3, 'Confirmed')
             RETURNING {BOOKING_COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&query)
            .bind(booking.user_id)
            .bind(booking.show_id)
            .bind(booking.total_price)
            .fetch_one(self.conn()?)
            .await?;
        Ok(booking)
    }

    async fn find_booking(&mut self, id: i64) -> AppResult<Option<Booking>> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
        let booking = sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(booking)
    }

    async fn update_booking(
        &mut self,
        id: i64,
        status: BookingStatus,
        total_price: Decimal,
    ) -> AppResult<Booking> {
        let query = format!(
            "UPDATE bookings SET status = $2, total_price = $3 WHERE id = $1
             RETURNING {BOOKING_COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(status)
            .bind(total_price)
            .fetch_optional(self.conn()?)
            .await?
            .ok_or_else(|| AppError::not_found(format!("booking {id} not found")).with_ids(vec![id]))?;
        Ok(booking)
    }

    async fn user_bookings(&mut self, user_id: i64) -> AppResult<Vec<Booking>> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        let bookings = sqlx::query_as::<_, Booking>(&query)
            .bind(user_id)
            .fetch_all(self.conn()?)
            .await?;
        Ok(bookings)
    }

    async fn commit(&mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Internal("unit of work already committed".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}
