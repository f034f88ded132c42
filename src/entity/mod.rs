pub mod booking;
pub mod booking_request;
pub mod datetime;
pub mod price;
pub mod schedule;
pub mod slot;
pub mod venue;
