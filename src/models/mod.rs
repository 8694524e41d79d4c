pub mod booking;
pub mod catalog;
pub mod seat;
pub mod show;
pub mod user;

pub use booking::{Booking, BookingChanges, BookingDetail, BookingStatus, NewBooking};
pub use catalog::{Movie, PhysicalSeat, Screen, Theatre};
pub use seat::{SeatStatus, ShowSeat};
pub use show::{InitializedShow, NewShow, Show, ShowCascade, ShowDetail, ShowFilter, ShowOverview};
pub use user::{AuthUser, Capability, Role};
