pub mod booking_session;
pub mod interface;
pub mod search_venues;
pub mod show_slots;
