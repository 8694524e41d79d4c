use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::AppResult;
use crate::models::{AuthUser, BookingChanges, BookingStatus};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(get_user_bookings).post(create_booking))
        .route("/bookings/{id}", put(update_booking).delete(cancel_booking))
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
#[derive(Debug, Deserialize, Validate)]
struct CreateBookingRequest {
    #[serde(alias = "showId")]
    #[validate(range(min = 1, message = "show_id must be > 0"))]
    show_id: i64,
    #[serde(alias = "seatIds")]
    #[validate(length(min = 1, message = "at least one seat is required"))]
    seat_ids: Vec<i64>,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;

    let booking = state.bookings.create_booking(&user, req.show_id, &req.seat_ids).await?;
    state.cache.invalidate_seats(req.show_id).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Booking successful", "booking": booking })),
    ))
}

// GET /api/bookings
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let bookings = state.bookings.list_user_bookings(&user).await?;
    Ok((StatusCode::OK, Json(bookings)))
}

// PUT /api/bookings/{id}
#[derive(Debug, Deserialize)]
struct UpdateBookingRequest {
    status: Option<BookingStatus>,
    #[serde(default, alias = "addSeatIds")]
    add_seat_ids: Vec<i64>,
    #[serde(default, alias = "removeSeatIds")]
    remove_seat_ids: Vec<i64>,
}

async fn update_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
    Json(req): Json<UpdateBookingRequest>,
) -> AppResult<impl IntoResponse> {
    let changes = BookingChanges {
        status: req.status,
        add_seat_ids: req.add_seat_ids,
        remove_seat_ids: req.remove_seat_ids,
    };

    let booking = state.bookings.update_booking(&user, booking_id, changes).await?;
    state.cache.invalidate_seats(booking.booking.show_id).await;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Booking updated", "booking": booking })),
    ))
}

// DELETE /api/bookings/{id}
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let booking = state.bookings.cancel_booking(&user, booking_id).await?;
    state.cache.invalidate_seats(booking.show_id).await;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Booking cancelled, seats released", "booking": booking })),
    ))
}
