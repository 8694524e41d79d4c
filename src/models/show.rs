use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::catalog::{Movie, Screen, Theatre};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct Show {
    pub id: i64,
    pub movie_id: i64,
    pub theatre_id: i64,
    pub screen_id: i64,
    pub show_time: DateTime<Utc>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewShow {
    pub movie_id: i64,
    pub theatre_id: i64,
    pub screen_id: i64,
    pub show_time: DateTime<Utc>,
    pub price: Decimal,
}

/// Show with the catalog rows it references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowDetail {
    #[serde(flatten)]
    pub show: Show,
    pub movie: Movie,
    pub theatre: Theatre,
    pub screen: Screen,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShowOverview {
    #[serde(flatten)]
    pub detail: ShowDetail,
    pub total_seats: usize,
    pub available_seats: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowFilter {
    #[serde(alias = "movieId")]
    pub movie_id: Option<i64>,
    #[serde(alias = "theatreId")]
    pub theatre_id: Option<i64>,
    #[serde(alias = "screenId")]
    pub screen_id: Option<i64>,
}

impl ShowFilter {
    pub fn matches(&self, show: &Show) -> bool {
        self.movie_id.map_or(true, |id| id == show.movie_id)
            && self.theatre_id.map_or(true, |id| id == show.theatre_id)
            && self.screen_id.map_or(true, |id| id == show.screen_id)
    }
}

/// Result of creating a show together with its seat inventory.
#[derive(Debug, Clone, Serialize)]
pub struct InitializedShow {
    pub show: Show,
    pub seats_created: u64,
}

/// Rows removed by the show cascade.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ShowCascade {
    pub show_seats: u64,
    pub bookings: u64,
}
