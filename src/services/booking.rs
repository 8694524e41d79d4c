//! Booking transaction coordinator: create, modify and cancel bookings as
//! all-or-nothing units over the show-seat inventory.
//!
//! Every operation follows the same shape:
//! 1. open one unit of work;
//! 2. load and lock the booking and/or the targeted show seats;
//! 3. validate ownership and availability against what was read;
//! 4. apply conditional seat transitions and check the affected row
//!    counts (see [`conflict::verify`]);
//! 5. persist the booking row and commit.
//!
//! Any error before the commit drops the unit and with it every write made
//! so far.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::conflict::{self, SeatOperation};
use super::pricing;
use super::seat_state::SeatState;
use super::shows::load_show_detail;
use crate::config::BookingConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    AuthUser, Booking, BookingChanges, BookingDetail, BookingStatus, Capability, NewBooking,
    Show, ShowDetail, ShowSeat,
};
use crate::storage::{Store, UnitOfWork};

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn Store>,
    policy: BookingConfig,
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>, policy: BookingConfig) -> Self {
        Self { store, policy }
    }

    /// Claims the given physical seats of a show for a new Confirmed booking.
    pub async fn create_booking(
        &self,
        caller: &AuthUser,
        show_id: i64,
        seat_ids: &[i64],
    ) -> AppResult<BookingDetail> {
        if !caller.can(Capability::BookSeats) {
            return Err(AppError::Forbidden("caller may not book seats".to_string()));
        }
        let seat_ids = unique_seat_ids(seat_ids)?;

        let mut unit = self.store.begin().await?;

        let show = unit
            .find_show(show_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("show {show_id} not found")).with_ids(vec![show_id]))?;

        let seats = unit
            .lock_show_seats(show_id, &seat_ids)
            .await
            .map_err(|e| e.or_ids(&seat_ids))?;
        if seats.len() != seat_ids.len() {
            let found: HashSet<i64> = seats.iter().map(|seat| seat.seat_id).collect();
            let missing: Vec<i64> = seat_ids.iter().copied().filter(|id| !found.contains(id)).collect();
            return Err(AppError::not_found(format!(
                "seats {} do not exist for show {show_id}",
                join_ids(&missing)
            ))
            .with_ids(missing));
        }

        let taken: Vec<&ShowSeat> = seats
            .iter()
            .filter(|seat| !SeatState::from(*seat).is_claimable())
            .collect();
        if !taken.is_empty() {
            return Err(unavailable(&taken));
        }

        let total_price = pricing::total(show.price, seat_ids.len())?;
        let booking = unit
            .insert_booking(&NewBooking { user_id: caller.user_id, show_id, total_price })
            .await?;

        let claimed = unit
            .claim_seats(show_id, &seat_ids, booking.id)
            .await
            .map_err(|e| e.or_ids(&seat_ids))?;
        conflict::verify(SeatOperation::Claim, &seat_ids, claimed)?;

        let seats = unit.owned_seats(booking.id).await?;
        unit.commit().await.map_err(|e| e.or_ids(&seat_ids))?;

        info!(
            booking_id = booking.id,
            show_id,
            user_id = caller.user_id,
            seats = seats.len(),
            total = %booking.total_price,
            "booking created"
        );
        Ok(BookingDetail { booking, seats, show: None })
    }

    /// Bookings of the caller, newest first, with show and seat detail.
    pub async fn list_user_bookings(&self, caller: &AuthUser) -> AppResult<Vec<BookingDetail>> {
        let mut unit = self.store.begin().await?;
        let bookings = unit.user_bookings(caller.user_id).await?;

        let mut shows: BTreeMap<i64, ShowDetail> = BTreeMap::new();
        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            if !shows.contains_key(&booking.show_id) {
                let show = unit.find_show(booking.show_id).await?.ok_or_else(|| {
                    AppError::Internal(format!("booking {} references a missing show", booking.id))
                })?;
                let detail = load_show_detail(unit.as_mut(), show).await?;
                shows.insert(booking.show_id, detail);
            }
            let seats = unit.owned_seats(booking.id).await?;
            let show = shows.get(&booking.show_id).cloned();
            details.push(BookingDetail { booking, seats, show });
        }
        Ok(details)
    }

    /// Applies status and seat changes to a booking in one unit. Additions are
    /// all-or-nothing; removals only touch seats the booking owns.
    pub async fn update_booking(
        &self,
        caller: &AuthUser,
        booking_id: i64,
        changes: BookingChanges,
    ) -> AppResult<BookingDetail> {
        let mut unit = self.store.begin().await?;
        let booking = load_owned_booking(unit.as_mut(), caller, booking_id).await?;
        let show = load_booking_show(unit.as_mut(), &booking).await?;

        let target = changes.status.unwrap_or(booking.status);
        let add_ids = dedupe(&changes.add_seat_ids);

        if booking.status == BookingStatus::Cancelled
            && (target == BookingStatus::Confirmed || !add_ids.is_empty())
        {
            return Err(AppError::conflict(format!("booking {booking_id} is cancelled"))
                .with_ids(vec![booking_id]));
        }

        if target == BookingStatus::Cancelled {
            let (booking, seats) = cancel_in_unit(unit.as_mut(), booking).await?;
            unit.commit().await.map_err(|e| e.or_ids(&seat_ids_of(&seats)))?;
            info!(booking_id, released = seats.len(), "booking cancelled through update");
            return Ok(BookingDetail { booking, seats: Vec::new(), show: None });
        }

        let owned = unit.owned_seats(booking.id).await?;
        let mut owned_ids: Vec<i64> = owned.iter().map(|seat| seat.seat_id).collect();

        // Additions
        let add_ids: Vec<i64> = add_ids.into_iter().filter(|id| !owned_ids.contains(id)).collect();
        if !add_ids.is_empty() {
            let candidates = unit
                .lock_show_seats(show.id, &add_ids)
                .await
                .map_err(|e| e.or_ids(&add_ids))?;
            let claimable: HashSet<i64> = candidates
                .iter()
                .filter(|seat| SeatState::from(*seat).is_claimable())
                .map(|seat| seat.seat_id)
                .collect();
            if claimable.len() != add_ids.len() {
                let rejected: Vec<i64> = add_ids.iter().copied().filter(|id| !claimable.contains(id)).collect();
                return Err(AppError::conflict(format!(
                    "seats {} are not available or do not exist for show {}",
                    join_ids(&rejected),
                    show.id
                ))
                .with_ids(rejected));
            }

            let claimed = unit
                .claim_seats(show.id, &add_ids, booking.id)
                .await
                .map_err(|e| e.or_ids(&add_ids))?;
            conflict::verify(SeatOperation::Claim, &add_ids, claimed)?;
            owned_ids.extend(&add_ids);
        }

        // Removals
        let remove_ids: Vec<i64> = dedupe(&changes.remove_seat_ids)
            .into_iter()
            .filter(|id| owned_ids.contains(id))
            .collect();
        if !remove_ids.is_empty() {
            let released = unit
                .release_seats(booking.id, &remove_ids)
                .await
                .map_err(|e| e.or_ids(&remove_ids))?;
            conflict::verify(SeatOperation::Release, &remove_ids, released)?;
            owned_ids.retain(|id| !remove_ids.contains(id));
        }

        let total_price = reconcile_total(&booking, &show, add_ids.len(), remove_ids.len(), owned_ids.len())?;
        let status = if owned_ids.is_empty() && self.policy.cancel_empty_bookings {
            BookingStatus::Cancelled
        } else {
            target
        };

        let updated = unit.update_booking(booking.id, status, total_price).await?;
        let seats = unit.owned_seats(booking.id).await?;
        let touched: Vec<i64> = add_ids.iter().chain(&remove_ids).copied().collect();
        unit.commit().await.map_err(|e| e.or_ids(&touched))?;

        info!(
            booking_id,
            added = add_ids.len(),
            removed = remove_ids.len(),
            seats = seats.len(),
            total = %updated.total_price,
            status = ?updated.status,
            "booking updated"
        );
        Ok(BookingDetail { booking: updated, seats, show: None })
    }

    /// Releases every seat of the booking and marks it Cancelled. Cancelling
    /// twice is a no-op.
    pub async fn cancel_booking(&self, caller: &AuthUser, booking_id: i64) -> AppResult<Booking> {
        let mut unit = self.store.begin().await?;
        let booking = load_owned_booking(unit.as_mut(), caller, booking_id).await?;
        let show_id = booking.show_id;

        let (booking, released) = cancel_in_unit(unit.as_mut(), booking).await?;
        unit.commit().await.map_err(|e| e.or_ids(&seat_ids_of(&released)))?;

        info!(booking_id, show_id, released = released.len(), "booking cancelled");
        Ok(booking)
    }
}

/// Rejects empty or repeated seat ids, keeping request order.
pub fn unique_seat_ids(seat_ids: &[i64]) -> AppResult<Vec<i64>> {
    if seat_ids.is_empty() {
        return Err(AppError::InvalidInput("at least one seat id is required".to_string()));
    }
    let unique = dedupe(seat_ids);
    if unique.len() != seat_ids.len() {
        return Err(AppError::InvalidInput("duplicate seat ids provided".to_string()));
    }
    Ok(unique)
}

/// First occurrence of every id, in order.
pub fn dedupe(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

async fn load_owned_booking(
    unit: &mut dyn UnitOfWork,
    caller: &AuthUser,
    booking_id: i64,
) -> AppResult<Booking> {
    let booking = unit.find_booking(booking_id).await?.ok_or_else(|| {
        AppError::not_found(format!("booking {booking_id} not found")).with_ids(vec![booking_id])
    })?;
    if !caller.may_modify_booking(booking.user_id) {
        return Err(AppError::Forbidden(format!("booking {booking_id} does not belong to you")));
    }
    Ok(booking)
}

async fn load_booking_show(unit: &mut dyn UnitOfWork, booking: &Booking) -> AppResult<Show> {
    unit.find_show(booking.show_id).await?.ok_or_else(|| {
        AppError::not_found(format!("show {} of booking {} not found", booking.show_id, booking.id))
            .with_ids(vec![booking.show_id])
    })
}

/// Releases all seats owned by the booking, then marks it Cancelled. The
/// last total is kept as the record of what was booked.
async fn cancel_in_unit(
    unit: &mut dyn UnitOfWork,
    booking: Booking,
) -> AppResult<(Booking, Vec<ShowSeat>)> {
    let owned = unit.owned_seats(booking.id).await?;
    let seat_ids = seat_ids_of(&owned);

    if !seat_ids.is_empty() {
        let released = unit
            .release_seats(booking.id, &seat_ids)
            .await
            .map_err(|e| e.or_ids(&seat_ids))?;
        conflict::verify(SeatOperation::Release, &seat_ids, released)?;
    }

    let cancelled = unit
        .update_booking(booking.id, BookingStatus::Cancelled, booking.total_price)
        .await?;
    Ok((cancelled, owned))
}

fn reconcile_total(
    booking: &Booking,
    show: &Show,
    added: usize,
    removed: usize,
    owned: usize,
) -> AppResult<Decimal> {
    let running = pricing::adjust(booking.total_price, show.price, added, removed)?;
    let expected = pricing::total(show.price, owned)?;
    if running != expected {
        warn!(
            booking_id = booking.id,
            running = %running,
            expected = %expected,
            "booking total drifted from its seats; recomputing"
        );
    }
    Ok(expected)
}

fn unavailable(taken: &[&ShowSeat]) -> AppError {
    let labels: Vec<String> = taken.iter().map(|seat| seat.label()).collect();
    AppError::conflict(format!("seats already booked: {}", labels.join(", ")))
        .with_ids(taken.iter().map(|seat| seat.seat_id).collect())
}

fn seat_ids_of(seats: &[ShowSeat]) -> Vec<i64> {
    seats.iter().map(|seat| seat.seat_id).collect()
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}
