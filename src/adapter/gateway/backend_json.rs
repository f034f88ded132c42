use crate::adapter::gateway::yaml::parse_local_datetime;
use crate::entity::booking::{read_status, Booking, BookingStatus};
use crate::error::TurfslotError;
use serde::Deserialize;

#[cfg(test)]
use chrono::{Local, TimeZone};

// バックエンドのIDは数値の場合と文字列の場合がある
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum BackendId {
    Number(i64),
    Text(String),
}

impl BackendId {
    fn as_string(&self) -> String {
        match self {
            BackendId::Number(n) => n.to_string(),
            BackendId::Text(s) => s.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackendTurfRef {
    pub id: Option<BackendId>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackendUserDetails {
    pub username: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BackendBooking {
    pub id: Option<BackendId>,
    pub turf: Option<BackendTurfRef>,
    pub user_details: Option<BackendUserDetails>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub total_price: Option<String>,
    pub status: Option<String>,
}

impl BackendBooking {
    pub fn into_booking(self) -> Option<Booking> {
        let start_time = self.start_datetime.as_deref().and_then(parse_local_datetime);
        let end_time = self.end_datetime.as_deref().and_then(parse_local_datetime);
        let id = self.id.map(|id| id.as_string()).unwrap_or_default();

        let (start_time, end_time) = match (start_time, end_time) {
            (Some(start), Some(end)) if start < end => (start, end),
            _ => {
                log::warn!("dropping backend booking {} with a malformed interval", id);
                return None;
            }
        };

        let turf_id = self
            .turf
            .and_then(|turf| turf.id)
            .map(|id| id.as_string())
            .unwrap_or_else(|| "0".to_string());
        let user_name = self
            .user_details
            .and_then(|user| user.username)
            .unwrap_or_else(|| "0".to_string());
        let total_price = self
            .total_price
            .and_then(|price| price.trim().parse().ok())
            .unwrap_or(0.0);
        let status = self
            .status
            .as_deref()
            .and_then(read_status)
            .unwrap_or(BookingStatus::Confirmed);

        Some(Booking::new(
            &id, &turf_id, &user_name, start_time, end_time, total_price, status,
        ))
    }
}

pub fn parse_bookings(json: &str) -> Result<Vec<Booking>, TurfslotError> {
    let raw: Vec<BackendBooking> = serde_json::from_str(json)?;
    let total = raw.len();

    let bookings: Vec<Booking> = raw
        .into_iter()
        .filter_map(|booking| booking.into_booking())
        .collect();

    log::info!("parsed {} of {} backend bookings", bookings.len(), total);
    Ok(bookings)
}

#[test]
fn test_parse_bookings_バックエンド形式を変換する() {
    let json = r#"[
        {
            "id": 7,
            "turf": {"id": 16},
            "user_details": {"username": "sup"},
            "start_datetime": "2024-05-10T09:00:00",
            "end_datetime": "2024-05-10T11:00:00",
            "total_price": "2000.00"
        }
    ]"#;

    let actual = parse_bookings(json).unwrap();

    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].get_id(), "7");
    assert_eq!(actual[0].get_turf_id(), "16");
    assert_eq!(actual[0].get_user_name(), "sup");
    assert_eq!(actual[0].get_total_price(), 2000.0);
    assert_eq!(actual[0].get_status(), BookingStatus::Confirmed);
    assert_eq!(
        actual[0].get_end_time(),
        Local.with_ymd_and_hms(2024, 5, 10, 11, 0, 0).unwrap()
    );
}

#[test]
fn test_parse_bookings_欠けた項目はデフォルト_区間が壊れていれば捨てる() {
    let json = r#"[
        {"start_datetime": "2024-05-10T09:00:00", "end_datetime": "2024-05-10T10:00:00", "status": "cancelled"},
        {"start_datetime": "2024-05-10T10:00:00", "end_datetime": "2024-05-10T10:00:00"},
        {"id": "x"}
    ]"#;

    let actual = parse_bookings(json).unwrap();

    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].get_turf_id(), "0");
    assert_eq!(actual[0].get_status(), BookingStatus::Cancelled);
    assert!(!actual[0].blocks_slots());
}

#[test]
fn test_parse_bookings_jsonが壊れている場合はエラー() {
    assert!(matches!(
        parse_bookings("{not json"),
        Err(TurfslotError::Json(_))
    ));
}
