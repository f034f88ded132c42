use crate::application::interface::{CheckoutOutcome, CheckoutTrait};
use crate::entity::booking_request::BookingRequest;
use chrono::{DateTime, Local};

#[cfg(test)]
use crate::entity::booking_request::BookingSource;
#[cfg(test)]
use crate::entity::venue::{SportType, Turf};
#[cfg(test)]
use chrono::TimeZone;

// 決済は行わない。送信時点でまだ始まっていない枠なら確定とする
pub struct SimulatedCheckout {
    now: DateTime<Local>,
    submitted: Vec<BookingRequest>,
}

impl SimulatedCheckout {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now,
            submitted: vec![],
        }
    }

    pub fn get_submitted(&self) -> &Vec<BookingRequest> {
        &self.submitted
    }
}

impl CheckoutTrait for SimulatedCheckout {
    fn submit(&mut self, request: &BookingRequest) -> CheckoutOutcome {
        if request.get_start_time() <= self.now {
            return CheckoutOutcome::Rejected(format!(
                "slot at {} has already started",
                request.get_start_time().format("%H:%M")
            ));
        }

        let overlapping = self.submitted.iter().any(|other| {
            other.get_turf_id() == request.get_turf_id()
                && other.get_start_time() < request.get_end_time()
                && request.get_start_time() < other.get_end_time()
        });
        if overlapping {
            return CheckoutOutcome::Rejected("slot was just taken".to_string());
        }

        log::info!(
            "payment simulated for booking {} ({})",
            request.get_id(),
            request.get_price()
        );
        self.submitted.push(request.clone());
        CheckoutOutcome::Confirmed
    }

    fn sync_clock(&mut self, now: DateTime<Local>) {
        self.now = now;
    }
}

#[cfg(test)]
fn request_at(hour: u32) -> BookingRequest {
    let turf = Turf::new("16", "Main Ground", "12", SportType::Football, 1000.0, vec![]);
    let start = Local.with_ymd_and_hms(2024, 5, 10, hour, 0, 0).unwrap();
    BookingRequest::new(&turf, start, 60, BookingSource::Online, None)
}

#[test]
fn test_submit_未来の枠は確定() {
    let now = Local.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();
    let mut checkout = SimulatedCheckout::new(now);

    assert_eq!(checkout.submit(&request_at(9)), CheckoutOutcome::Confirmed);
    assert_eq!(checkout.get_submitted().len(), 1);
}

#[test]
fn test_submit_始まった枠は拒否() {
    let now = Local.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
    let mut checkout = SimulatedCheckout::new(now);

    assert!(matches!(
        checkout.submit(&request_at(9)),
        CheckoutOutcome::Rejected(_)
    ));
}

#[test]
fn test_submit_同じ枠の二重予約は拒否() {
    let now = Local.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();
    let mut checkout = SimulatedCheckout::new(now);

    checkout.submit(&request_at(9));

    assert!(matches!(
        checkout.submit(&request_at(9)),
        CheckoutOutcome::Rejected(_)
    ));
    assert_eq!(checkout.submit(&request_at(10)), CheckoutOutcome::Confirmed);
}

#[test]
fn test_sync_clock_日付を跨いだら前日の枠は拒否() {
    let now = Local.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();
    let mut checkout = SimulatedCheckout::new(now);

    checkout.sync_clock(Local.with_ymd_and_hms(2024, 5, 11, 0, 10, 0).unwrap());

    assert!(matches!(
        checkout.submit(&request_at(21)),
        CheckoutOutcome::Rejected(_)
    ));
    assert!(checkout.get_submitted().is_empty());
}
