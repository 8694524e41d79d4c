pub mod booking;
pub mod conflict;
pub mod pricing;
pub mod seat_state;
pub mod shows;

pub use booking::BookingService;
pub use shows::ShowService;
