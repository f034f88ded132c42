use chrono::{DateTime, Local};
use std::fmt;

#[cfg(test)]
use chrono::TimeZone;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,

    // ホストが台帳に書き込んだ予約の由来
    Online,
    Offline,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Online => "online",
            BookingStatus::Offline => "offline",
        };
        write!(f, "{}", s)
    }
}

pub fn read_status(s: &str) -> Option<BookingStatus> {
    match s.trim().to_lowercase().as_str() {
        "pending" => Some(BookingStatus::Pending),
        "confirmed" => Some(BookingStatus::Confirmed),
        "completed" => Some(BookingStatus::Completed),
        "cancelled" | "canceled" => Some(BookingStatus::Cancelled),
        "online" => Some(BookingStatus::Online),
        "offline" => Some(BookingStatus::Offline),
        _ => None,
    }
}

#[test]
fn test_read_status_大文字小文字を区別しない() {
    assert_eq!(read_status("Confirmed"), Some(BookingStatus::Confirmed));
    assert_eq!(read_status("OFFLINE"), Some(BookingStatus::Offline));
}

#[test]
fn test_read_status_米国綴りのcanceledも受け付ける() {
    assert_eq!(read_status("canceled"), Some(BookingStatus::Cancelled));
}

#[test]
fn test_read_status_パーズできなかったときはnoneを返す() {
    assert_eq!(read_status("booked"), None);
}

#[test]
fn test_booking_status_display() {
    assert_eq!(BookingStatus::Cancelled.to_string(), "cancelled");
}

/// An existing reservation on a turf, covering `[start_time, end_time)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Booking {
    id: String,
    turf_id: String,
    user_name: String,
    start_time: DateTime<Local>,
    end_time: DateTime<Local>,
    total_price: f64,
    status: BookingStatus,
}

impl Booking {
    pub fn new(
        id: &str,
        turf_id: &str,
        user_name: &str,
        start_time: DateTime<Local>,
        end_time: DateTime<Local>,
        total_price: f64,
        status: BookingStatus,
    ) -> Self {
        Self {
            id: id.to_string(),
            turf_id: turf_id.to_string(),
            user_name: user_name.to_string(),
            start_time,
            end_time,
            total_price,
            status,
        }
    }

    pub fn new_with_interval(start_time: DateTime<Local>, end_time: DateTime<Local>) -> Self {
        Self::new("", "", "", start_time, end_time, 0.0, BookingStatus::Confirmed)
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_turf_id(&self) -> &str {
        &self.turf_id
    }

    pub fn get_user_name(&self) -> &str {
        &self.user_name
    }

    pub fn get_start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub fn get_end_time(&self) -> DateTime<Local> {
        self.end_time
    }

    pub fn get_total_price(&self) -> f64 {
        self.total_price
    }

    pub fn get_status(&self) -> BookingStatus {
        self.status
    }

    pub fn is_well_formed(&self) -> bool {
        self.start_time < self.end_time
    }

    pub fn blocks_slots(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    // [start, end) 同士の重なり判定。隣接(end == start)は重ならない
    // 長さ0の区間は時点startとして扱い、予約の [start, end) に含まれれば重なる
    // 不正な区間(start > end)は何とも重ならない
    pub fn overlaps(&self, start: &DateTime<Local>, end: &DateTime<Local>) -> bool {
        if !self.is_well_formed() || start > end {
            return false;
        }
        if start == end {
            return self.start_time <= *start && *start < self.end_time;
        }

        *start < self.end_time && *end > self.start_time
    }
}

#[cfg(test)]
fn nine_to_eleven() -> Booking {
    Booking::new_with_interval(
        Local.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap(),
        Local.with_ymd_and_hms(2024, 5, 10, 11, 0, 0).unwrap(),
    )
}

#[cfg(test)]
fn at(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 10, hour, minute, 0).unwrap()
}

#[test]
fn test_overlaps_開始が予約の内側() {
    assert!(nine_to_eleven().overlaps(&at(10, 0), &at(12, 0)));
}

#[test]
fn test_overlaps_終了が予約の内側() {
    assert!(nine_to_eleven().overlaps(&at(8, 30), &at(9, 30)));
}

#[test]
fn test_overlaps_予約を包含する() {
    assert!(nine_to_eleven().overlaps(&at(8, 0), &at(12, 0)));
}

#[test]
fn test_overlaps_区間が完全一致() {
    assert!(nine_to_eleven().overlaps(&at(9, 0), &at(11, 0)));
}

#[test]
fn test_overlaps_開始が一致() {
    assert!(nine_to_eleven().overlaps(&at(9, 0), &at(9, 30)));
}

#[test]
fn test_overlaps_終了が一致() {
    assert!(nine_to_eleven().overlaps(&at(10, 30), &at(11, 0)));
}

#[test]
fn test_overlaps_隣接する区間は重ならない() {
    assert!(!nine_to_eleven().overlaps(&at(11, 0), &at(12, 0)));
    assert!(!nine_to_eleven().overlaps(&at(8, 0), &at(9, 0)));
}

#[test]
fn test_overlaps_不正な予約は何とも重ならない() {
    let broken = Booking::new_with_interval(at(11, 0), at(9, 0));

    assert!(!broken.is_well_formed());
    assert!(!broken.overlaps(&at(9, 0), &at(11, 0)));
}

#[test]
fn test_overlaps_長さ0の区間は時点として判定する() {
    assert!(nine_to_eleven().overlaps(&at(9, 0), &at(9, 0)));
    assert!(nine_to_eleven().overlaps(&at(10, 0), &at(10, 0)));
    assert!(!nine_to_eleven().overlaps(&at(11, 0), &at(11, 0)));
    assert!(!nine_to_eleven().overlaps(&at(8, 30), &at(8, 30)));
}

#[test]
fn test_overlaps_逆向きの区間は重ならない() {
    assert!(!nine_to_eleven().overlaps(&at(10, 30), &at(9, 30)));
}

#[test]
fn test_blocks_slots_キャンセル済みはブロックしない() {
    let cancelled = Booking::new(
        "1",
        "16",
        "sup",
        at(9, 0),
        at(10, 0),
        1000.0,
        BookingStatus::Cancelled,
    );

    assert!(!cancelled.blocks_slots());
    assert!(nine_to_eleven().blocks_slots());
}
