use crate::entity::booking_request::BookingRequest;
use crate::entity::venue::{Turf, Venue};
use crate::error::TurfslotError;
use chrono::{DateTime, Local};

pub trait VenueRepositoryTrait {
    fn load(&mut self) -> Result<(), TurfslotError>;
    fn get_all_venues(&self) -> Vec<&Venue>;
    fn get_turf(&self, turf_id: &str) -> Option<&Turf>;
    fn sync_clock(&mut self, now: DateTime<Local>);
    fn get_last_synced_time(&self) -> DateTime<Local>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Confirmed,
    Rejected(String),
}

pub trait CheckoutTrait {
    fn submit(&mut self, request: &BookingRequest) -> CheckoutOutcome;
    fn sync_clock(&mut self, now: DateTime<Local>);
}
