//! Show creation with its seat inventory, show queries and the show cascade.

use std::sync::Arc;

use tracing::{info, warn};

use super::conflict::{self, SeatOperation};
use super::pricing;
use crate::error::{AppError, AppResult};
use crate::models::{
    AuthUser, BookingStatus, Capability, InitializedShow, NewShow, Show, ShowCascade, ShowDetail,
    ShowFilter, ShowOverview, ShowSeat,
};
use crate::storage::{Store, UnitOfWork};

#[derive(Clone)]
pub struct ShowService {
    store: Arc<dyn Store>,
}

impl ShowService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates the show and one AVAILABLE show seat per physical seat of its
    /// screen. Nothing is written unless every reference checks out.
    pub async fn initialize_show(&self, caller: &AuthUser, new: NewShow) -> AppResult<InitializedShow> {
        pricing::validate_unit_price(new.price)?;
        if !caller.can(Capability::ManageShows) {
            return Err(AppError::Forbidden("only theatre owners and admins can create shows".to_string()));
        }

        let mut unit = self.store.begin().await?;

        unit.find_movie(new.movie_id)
            .await?
            .ok_or_else(|| not_found("movie", new.movie_id))?;
        let theatre = unit
            .find_theatre(new.theatre_id)
            .await?
            .ok_or_else(|| not_found("theatre", new.theatre_id))?;
        let screen = unit
            .find_screen(new.screen_id)
            .await?
            .ok_or_else(|| not_found("screen", new.screen_id))?;

        if screen.theatre_id != theatre.id {
            return Err(AppError::Mismatch(format!(
                "screen {} does not belong to theatre {}",
                screen.id, theatre.id
            )));
        }
        if !caller.manages_theatre(theatre.owner_id) {
            return Err(AppError::Forbidden(format!("you do not own theatre {}", theatre.id)));
        }

        let layout = unit.screen_seats(screen.id).await?;
        let show = unit.insert_show(&new).await?;

        let seat_ids: Vec<i64> = layout.iter().map(|seat| seat.id).collect();
        let created = unit.insert_show_seats(show.id, &seat_ids).await?;
        conflict::verify(SeatOperation::Initialize, &seat_ids, created)?;

        unit.commit().await?;

        if created == 0 {
            warn!(show_id = show.id, screen_id = screen.id, "show created for a screen without seats");
        }
        info!(show_id = show.id, screen_id = screen.id, seats = created, "show initialized");

        Ok(InitializedShow { show, seats_created: created })
    }

    pub async fn list_shows(&self, filter: &ShowFilter) -> AppResult<Vec<ShowDetail>> {
        let mut unit = self.store.begin().await?;
        let shows = unit.list_shows(filter).await?;

        let mut details = Vec::with_capacity(shows.len());
        for show in shows {
            details.push(load_show_detail(unit.as_mut(), show).await?);
        }
        Ok(details)
    }

    pub async fn get_show(&self, show_id: i64) -> AppResult<ShowOverview> {
        let mut unit = self.store.begin().await?;
        let show = unit
            .find_show(show_id)
            .await?
            .ok_or_else(|| not_found("show", show_id))?;
        let seats = unit.show_seats(show_id).await?;
        let detail = load_show_detail(unit.as_mut(), show).await?;

        Ok(ShowOverview {
            detail,
            total_seats: seats.len(),
            available_seats: seats.iter().filter(|seat| seat.is_available()).count(),
        })
    }

    /// Seat map of a show ordered by row, then column.
    pub async fn show_seats(&self, show_id: i64) -> AppResult<Vec<ShowSeat>> {
        let mut unit = self.store.begin().await?;
        unit.find_show(show_id)
            .await?
            .ok_or_else(|| not_found("show", show_id))?;

        let seats = unit.show_seats(show_id).await?;
        if seats.is_empty() {
            return Err(AppError::not_found(format!("show {show_id} has no seat layout")).with_ids(vec![show_id]));
        }
        Ok(seats)
    }

    /// Removes the show with its seats and cancelled bookings. Refused while
    /// any booking for the show is still Confirmed.
    pub async fn delete_show(&self, caller: &AuthUser, show_id: i64) -> AppResult<ShowCascade> {
        if !caller.can(Capability::ManageShows) {
            return Err(AppError::Forbidden("only theatre owners and admins can delete shows".to_string()));
        }

        let mut unit = self.store.begin().await?;
        let show = unit
            .find_show(show_id)
            .await?
            .ok_or_else(|| not_found("show", show_id))?;
        let theatre = unit
            .find_theatre(show.theatre_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("show {show_id} references a missing theatre")))?;
        if !caller.manages_theatre(theatre.owner_id) {
            return Err(AppError::Forbidden(format!("you do not own theatre {}", theatre.id)));
        }

        let active = unit.count_bookings(show_id, BookingStatus::Confirmed).await?;
        if active > 0 {
            return Err(AppError::conflict(format!(
                "show {show_id} has {active} confirmed booking(s); cancel them first"
            ))
            .with_ids(vec![show_id]));
        }

        let cascade = unit.delete_show_cascade(show_id).await?;
        unit.commit().await?;

        info!(
            show_id,
            show_seats = cascade.show_seats,
            bookings = cascade.bookings,
            "show deleted"
        );
        Ok(cascade)
    }
}

pub(crate) async fn load_show_detail(unit: &mut dyn UnitOfWork, show: Show) -> AppResult<ShowDetail> {
    let missing = |what: &str, id: i64| AppError::Internal(format!("show {} references missing {what} {id}", show.id));

    let movie = unit
        .find_movie(show.movie_id)
        .await?
        .ok_or_else(|| missing("movie", show.movie_id))?;
    let theatre = unit
        .find_theatre(show.theatre_id)
        .await?
        .ok_or_else(|| missing("theatre", show.theatre_id))?;
    let screen = unit
        .find_screen(show.screen_id)
        .await?
        .ok_or_else(|| missing("screen", show.screen_id))?;

    Ok(ShowDetail { show, movie, theatre, screen })
}

fn not_found(what: &str, id: i64) -> AppError {
    AppError::not_found(format!("{what} {id} not found")).with_ids(vec![id])
}
