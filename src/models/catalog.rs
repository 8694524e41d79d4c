//! Catalog facts the booking engine reads but never mutates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Theatre {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub owner_id: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub language: Option<String>,
    pub duration_minutes: Option<i32>,
    pub release_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Screen {
    pub id: i64,
    pub theatre_id: i64,
    pub name: String,
    pub capacity: i32,
}

/// A fixed seat of a screen, independent of any show.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhysicalSeat {
    pub id: i64,
    pub screen_id: i64,
    pub seat_row: String,
    pub seat_column: i32,
    pub seat_type: String,
}
