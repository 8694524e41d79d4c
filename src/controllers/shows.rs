use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::AppResult;
use crate::models::{AuthUser, NewShow, ShowFilter};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows", get(list_shows).post(create_show))
        .route("/shows/{id}", get(get_show).delete(delete_show))
        .route("/shows/{id}/seats", get(get_show_seats))
}

/* ---------- SHOWS ---------- */

// POST /api/shows
#[derive(Debug, Deserialize, Validate)]
struct CreateShowRequest {
    #[serde(alias = "movieId")]
    #[validate(range(min = 1))]
    movie_id: i64,
    #[serde(alias = "theatreId")]
    #[validate(range(min = 1))]
    theatre_id: i64,
    #[serde(alias = "screenId")]
    #[validate(range(min = 1))]
    screen_id: i64,
    #[serde(alias = "showTime")]
    show_time: DateTime<Utc>,
    price: Decimal,
}

async fn create_show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateShowRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;

    let created = state
        .shows
        .initialize_show(
            &user,
            NewShow {
                movie_id: req.movie_id,
                theatre_id: req.theatre_id,
                screen_id: req.screen_id,
                show_time: req.show_time,
                price: req.price,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Show created successfully",
            "show": created.show,
            "seats_created": created.seats_created
        })),
    ))
}

// GET /api/shows
async fn list_shows(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ShowFilter>,
) -> AppResult<impl IntoResponse> {
    let shows = state.shows.list_shows(&filter).await?;
    Ok((StatusCode::OK, Json(shows)))
}

// GET /api/shows/{id}
async fn get_show(
    State(state): State<Arc<AppState>>,
    Path(show_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let show = state.shows.get_show(show_id).await?;
    Ok((StatusCode::OK, Json(show)))
}

// GET /api/shows/{id}/seats
async fn get_show_seats(
    State(state): State<Arc<AppState>>,
    Path(show_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    // Поколение читаем до базы, иначе можно закешировать устаревшую карту
    let generation = state.cache.seat_generation(show_id).await;

    // Сначала пробуем кеш
    if let Some(generation) = generation {
        if let Some(seats) = state.cache.get_seat_map(show_id, generation).await {
            return Ok((StatusCode::OK, [("X-Cache", "HIT")], Json(seats)));
        }
    }

    let seats = state.shows.show_seats(show_id).await?;
    if let Some(generation) = generation {
        state.cache.put_seat_map(show_id, generation, &seats).await;
    }

    Ok((StatusCode::OK, [("X-Cache", "MISS")], Json(seats)))
}

// DELETE /api/shows/{id}
async fn delete_show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(show_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let removed = state.shows.delete_show(&user, show_id).await?;
    state.cache.invalidate_seats(show_id).await;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Show deleted successfully", "removed": removed })),
    ))
}
