use crate::entity::datetime::at_time_of_day;
use crate::entity::price::compute_price;
use crate::entity::schedule::DurationBounds;
use crate::entity::venue::Turf;
use crate::error::TurfslotError;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Timelike};
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

#[cfg(test)]
use chrono::TimeZone;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingSource {
    Online,
    Offline,
}

/// The payload handed to the backend adapter when a slot is booked.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BookingRequest {
    id: Uuid,
    turf_id: String,
    date: NaiveDate,
    start_time: DateTime<Local>,
    end_time: DateTime<Local>,
    duration_minutes: u32,
    price: f64,
    source: BookingSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
}

impl BookingRequest {
    pub fn new(
        turf: &Turf,
        start_time: DateTime<Local>,
        duration_minutes: u32,
        source: BookingSource,
        user_name: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            turf_id: turf.get_id().to_string(),
            date: start_time.date_naive(),
            start_time,
            end_time: start_time + Duration::minutes(duration_minutes as i64),
            duration_minutes,
            price: compute_price(turf.get_price_per_hour(), duration_minutes),
            source,
            user_name,
        }
    }

    pub fn get_id(&self) -> Uuid {
        self.id
    }

    pub fn get_turf_id(&self) -> &str {
        &self.turf_id
    }

    pub fn get_date(&self) -> NaiveDate {
        self.date
    }

    pub fn get_start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub fn get_end_time(&self) -> DateTime<Local> {
        self.end_time
    }

    pub fn get_duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn get_price(&self) -> f64 {
        self.price
    }

    pub fn get_source(&self) -> BookingSource {
        self.source
    }

    pub fn get_user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn to_json(&self) -> Result<String, TurfslotError> {
        Ok(serde_json::to_string(self)?)
    }
}

// ホストのオフライン予約ダイアログの選択肢: 00:00から23:30まで30分刻み
// 当日は現在の分より後の時刻のみ
pub fn offline_time_options(date: NaiveDate, now: DateTime<Local>) -> Vec<NaiveTime> {
    let is_today = date == now.date_naive();
    let current_minutes = now.hour() * 60 + now.minute();

    (0..24 * 60)
        .step_by(30)
        .filter(|minutes| !is_today || *minutes > current_minutes)
        .filter_map(|minutes| NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0))
        .collect()
}

pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, TurfslotError> {
    let re = Regex::new(r"^(\d{1,2}):(\d{2})$").map_err(|e| TurfslotError::InvalidTime(e.to_string()))?;
    let caps = re
        .captures(s.trim())
        .ok_or_else(|| TurfslotError::InvalidTime(s.to_string()))?;

    let hour: u32 = caps[1]
        .parse()
        .map_err(|_| TurfslotError::InvalidTime(s.to_string()))?;
    let minute: u32 = caps[2]
        .parse()
        .map_err(|_| TurfslotError::InvalidTime(s.to_string()))?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| TurfslotError::InvalidTime(s.to_string()))
}

#[derive(Clone, Debug, PartialEq)]
pub struct OfflineBookingForm {
    pub date: NaiveDate,
    pub start_time: String,
    pub duration_minutes: u32,
    pub user_name: String,
}

impl OfflineBookingForm {
    pub fn into_request(
        self,
        turf: &Turf,
        now: DateTime<Local>,
    ) -> Result<BookingRequest, TurfslotError> {
        let user_name = self.user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(TurfslotError::InvalidBooking(
                "user name is required".to_string(),
            ));
        }

        let time = parse_time_of_day(&self.start_time)?;
        if !offline_time_options(self.date, now).contains(&time) {
            return Err(TurfslotError::InvalidTime(format!(
                "{} is not an offered start time on {}",
                self.start_time, self.date
            )));
        }

        let duration_minutes = DurationBounds::host().check(self.duration_minutes)?;

        let start_time = at_time_of_day(self.date, time.hour(), time.minute())
            .ok_or_else(|| TurfslotError::InvalidTime(self.start_time.clone()))?;
        if start_time < now {
            return Err(TurfslotError::InvalidTime(format!(
                "{} {} is in the past",
                self.date, self.start_time
            )));
        }

        Ok(BookingRequest::new(
            turf,
            start_time,
            duration_minutes,
            BookingSource::Offline,
            Some(user_name),
        ))
    }
}

#[cfg(test)]
fn sample_turf() -> Turf {
    use crate::entity::venue::SportType;
    Turf::new("16", "Main Ground", "12", SportType::Football, 1000.0, vec![])
}

#[cfg(test)]
fn noon() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 10, 12, 10, 0).unwrap()
}

#[test]
fn test_offline_time_options_翌日は48件() {
    let date = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();
    let actual = offline_time_options(date, noon());

    assert_eq!(actual.len(), 48);
    assert_eq!(actual[0], NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    assert_eq!(actual[47], NaiveTime::from_hms_opt(23, 30, 0).unwrap());
}

#[test]
fn test_offline_time_options_当日は現在時刻より後のみ() {
    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    let actual = offline_time_options(date, noon());

    assert_eq!(actual[0], NaiveTime::from_hms_opt(12, 30, 0).unwrap());
}

#[test]
fn test_parse_time_of_day() {
    assert_eq!(
        parse_time_of_day("09:30").unwrap(),
        NaiveTime::from_hms_opt(9, 30, 0).unwrap()
    );
    assert!(parse_time_of_day("25:00").is_err());
    assert!(parse_time_of_day("9.30").is_err());
}

#[test]
fn test_offline_booking_form_into_request_正常系() {
    let form = OfflineBookingForm {
        date: NaiveDate::from_ymd_opt(2024, 5, 11).unwrap(),
        start_time: "18:00".to_string(),
        duration_minutes: 90,
        user_name: "walk-in".to_string(),
    };

    let actual = form.into_request(&sample_turf(), noon()).unwrap();

    assert_eq!(actual.get_turf_id(), "16");
    assert_eq!(actual.get_source(), BookingSource::Offline);
    assert_eq!(actual.get_duration_minutes(), 90);
    assert_eq!(actual.get_price(), 1500.0);
    assert_eq!(
        actual.get_end_time(),
        Local.with_ymd_and_hms(2024, 5, 11, 19, 30, 0).unwrap()
    );
    assert_eq!(actual.get_user_name(), Some("walk-in"));
}

#[test]
fn test_offline_booking_form_into_request_名前が空はエラー() {
    let form = OfflineBookingForm {
        date: NaiveDate::from_ymd_opt(2024, 5, 11).unwrap(),
        start_time: "18:00".to_string(),
        duration_minutes: 60,
        user_name: "  ".to_string(),
    };

    assert!(form.into_request(&sample_turf(), noon()).is_err());
}

#[test]
fn test_offline_booking_form_into_request_時間の範囲外はエラー() {
    let form = OfflineBookingForm {
        date: NaiveDate::from_ymd_opt(2024, 5, 11).unwrap(),
        start_time: "18:00".to_string(),
        duration_minutes: 30,
        user_name: "walk-in".to_string(),
    };

    assert!(matches!(
        form.into_request(&sample_turf(), noon()),
        Err(TurfslotError::InvalidDuration { .. })
    ));
}

#[test]
fn test_offline_booking_form_into_request_過去の時刻はエラー() {
    let form = OfflineBookingForm {
        date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        start_time: "11:00".to_string(),
        duration_minutes: 60,
        user_name: "walk-in".to_string(),
    };

    assert!(form.into_request(&sample_turf(), noon()).is_err());
}

#[test]
fn test_booking_request_to_json() {
    let start = Local.with_ymd_and_hms(2024, 5, 11, 9, 0, 0).unwrap();
    let request = BookingRequest::new(&sample_turf(), start, 60, BookingSource::Online, None);

    let json = request.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["turf_id"], "16");
    assert_eq!(value["date"], "2024-05-11");
    assert_eq!(value["duration_minutes"], 60);
    assert_eq!(value["price"], 1000.0);
    assert_eq!(value["source"], "online");
    assert!(value.get("user_name").is_none());
}
