use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

/// Largest unit price a show can carry, `NUMERIC(10, 2)`.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Largest booking total, `NUMERIC(12, 2)`.
pub const MAX_TOTAL: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Positive, at most two decimal places, within [`MAX_UNIT_PRICE`].
pub fn validate_unit_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::InvalidInput("price must be greater than 0".to_string()));
    }
    if price.normalize().scale() > 2 {
        return Err(AppError::InvalidInput(format!(
            "price {price} has more than 2 decimal places"
        )));
    }
    if price > MAX_UNIT_PRICE {
        return Err(AppError::InvalidInput(format!(
            "price {price} exceeds the maximum of {MAX_UNIT_PRICE}"
        )));
    }
    Ok(())
}

/// `unit_price * seat_count`, exact. Fails when the result does not fit a
/// booking total.
pub fn total(unit_price: Decimal, seat_count: usize) -> AppResult<Decimal> {
    unit_price
        .checked_mul(Decimal::from(seat_count as u64))
        .filter(|total| *total <= MAX_TOTAL)
        .ok_or_else(|| too_large(unit_price, seat_count))
}

/// Running total after adding and removing seats.
pub fn adjust(current_total: Decimal, unit_price: Decimal, added: usize, removed: usize) -> AppResult<Decimal> {
    let added_amount = total(unit_price, added)?;
    let removed_amount = unit_price.checked_mul(Decimal::from(removed as u64));

    current_total
        .checked_add(added_amount)
        .zip(removed_amount)
        .and_then(|(sum, removed_amount)| sum.checked_sub(removed_amount))
        .filter(|total| *total <= MAX_TOTAL)
        .ok_or_else(|| too_large(unit_price, added))
}

fn too_large(unit_price: Decimal, seat_count: usize) -> AppError {
    AppError::InvalidInput(format!(
        "{seat_count} seats at {unit_price} exceed the maximum booking total of {MAX_TOTAL}"
    ))
}
