use crate::entity::booking::Booking;
use crate::entity::datetime::{at_time_of_day, earliest_bookable_time, is_same_date};
use crate::entity::schedule::validate_window;
use crate::error::TurfslotError;
use chrono::{DateTime, Duration, Local, NaiveDate};

#[cfg(test)]
use chrono::{TimeZone, Timelike};

/// A start instant on the operating day, tagged with whether a booking of the
/// current duration can begin there.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CandidateSlot {
    time: DateTime<Local>,
    available: bool,
}

impl CandidateSlot {
    pub fn new(time: DateTime<Local>, available: bool) -> Self {
        Self { time, available }
    }

    pub fn get_time(&self) -> DateTime<Local> {
        self.time
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn end_time(&self, duration_minutes: u32) -> DateTime<Local> {
        self.time + Duration::minutes(duration_minutes as i64)
    }
}

// [open_hour:00, close_hour:00) をstep_minutes刻みで列挙する
// DSTで存在しない時刻は飛ばす
pub fn generate_candidates(
    date: NaiveDate,
    open_hour: u32,
    close_hour: u32,
    step_minutes: u32,
) -> Result<Vec<DateTime<Local>>, TurfslotError> {
    validate_window(open_hour, close_hour, step_minutes)?;

    let candidates = (open_hour * 60..close_hour * 60)
        .step_by(step_minutes as usize)
        .filter_map(|minute_of_day| at_time_of_day(date, minute_of_day / 60, minute_of_day % 60))
        .collect();

    Ok(candidates)
}

// 候補を削除せず、利用可否のタグ付けのみ行う
// 当日の場合は now + lead_minutes より前の候補を埋める
pub fn filter_availability(
    candidates: &[DateTime<Local>],
    duration_minutes: u32,
    bookings: &[Booking],
    now: DateTime<Local>,
    lead_minutes: u32,
) -> Vec<CandidateSlot> {
    let earliest = earliest_bookable_time(now, lead_minutes);
    let duration = Duration::minutes(duration_minutes as i64);

    candidates
        .iter()
        .map(|start| {
            let end = *start + duration;

            let too_soon = is_same_date(start, &now) && *start < earliest;
            let conflicts = bookings
                .iter()
                .filter(|booking| booking.is_well_formed())
                .any(|booking| booking.overlaps(start, &end));

            CandidateSlot::new(*start, !too_soon && !conflicts)
        })
        .collect()
}

pub fn has_available(slots: &[CandidateSlot]) -> bool {
    slots.iter().any(|slot| slot.is_available())
}

pub fn first_available_at_or_after(
    slots: &[CandidateSlot],
    time: DateTime<Local>,
) -> Option<&CandidateSlot> {
    slots
        .iter()
        .find(|slot| slot.is_available() && slot.get_time() >= time)
}

pub fn available_slots(slots: &[CandidateSlot]) -> Vec<&CandidateSlot> {
    slots.iter().filter(|slot| slot.is_available()).collect()
}

#[cfg(test)]
fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
}

#[cfg(test)]
fn at(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 10, hour, minute, 0).unwrap()
}

// 予約日より前の日の「今」
#[cfg(test)]
fn yesterday_noon() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 9, 12, 0, 0).unwrap()
}

#[test]
fn test_generate_candidates_6時から22時まで30分刻み() {
    let actual = generate_candidates(day(), 6, 22, 30).unwrap();

    assert_eq!(actual.len(), 32);
    assert_eq!(actual.first(), Some(&at(6, 0)));
    assert_eq!(actual.last(), Some(&at(21, 30)));
}

#[test]
fn test_generate_candidates_隣接する候補の差はstep分() {
    let actual = generate_candidates(day(), 8, 12, 15).unwrap();

    assert_eq!(actual[0].hour(), 8);
    assert_eq!(actual[0].minute(), 0);
    for pair in actual.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::minutes(15));
    }
}

#[test]
fn test_generate_candidates_毎回同じ結果を返す() {
    let first = generate_candidates(day(), 6, 22, 30).unwrap();
    let second = generate_candidates(day(), 6, 22, 30).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_generate_candidates_不正な入力はエラー() {
    assert!(generate_candidates(day(), 22, 6, 30).is_err());
    assert!(generate_candidates(day(), 6, 24, 30).is_err());
    assert!(generate_candidates(day(), 6, 22, 7).is_err());
    assert!(generate_candidates(day(), 6, 22, 0).is_err());
}

#[test]
fn test_filter_availability_予約と重なる候補は埋まる() {
    let candidates = vec![at(8, 30), at(9, 0), at(11, 0)];
    let bookings = vec![Booking::new_with_interval(at(9, 0), at(11, 0))];

    let actual = filter_availability(&candidates, 60, &bookings, yesterday_noon(), 30);

    assert_eq!(
        actual,
        vec![
            CandidateSlot::new(at(8, 30), false),
            CandidateSlot::new(at(9, 0), false),
            CandidateSlot::new(at(11, 0), true),
        ]
    );
}

#[test]
fn test_filter_availability_予約と完全一致する候補は埋まる() {
    let candidates = vec![at(9, 0)];
    let bookings = vec![Booking::new_with_interval(at(9, 0), at(11, 0))];

    let actual = filter_availability(&candidates, 120, &bookings, yesterday_noon(), 30);

    assert!(!actual[0].is_available());
}

#[test]
fn test_filter_availability_予約を包含する候補は埋まる() {
    let candidates = vec![at(8, 0)];
    let bookings = vec![Booking::new_with_interval(at(9, 0), at(10, 0))];

    let actual = filter_availability(&candidates, 180, &bookings, yesterday_noon(), 30);

    assert!(!actual[0].is_available());
}

#[test]
fn test_filter_availability_予約の直前で終わる候補は空き() {
    let candidates = vec![at(8, 0)];
    let bookings = vec![Booking::new_with_interval(at(9, 0), at(10, 0))];

    let actual = filter_availability(&candidates, 60, &bookings, yesterday_noon(), 30);

    assert!(actual[0].is_available());
}

#[test]
fn test_filter_availability_長さ0でも予約の内側の開始は埋まる() {
    let candidates = vec![at(8, 30), at(9, 0), at(10, 0), at(11, 0)];
    let bookings = vec![Booking::new_with_interval(at(9, 0), at(11, 0))];

    let actual = filter_availability(&candidates, 0, &bookings, yesterday_noon(), 30);

    assert_eq!(
        actual,
        vec![
            CandidateSlot::new(at(8, 30), true),
            CandidateSlot::new(at(9, 0), false),
            CandidateSlot::new(at(10, 0), false),
            CandidateSlot::new(at(11, 0), true),
        ]
    );
}

#[test]
fn test_filter_availability_不正な予約は無視される() {
    let candidates = vec![at(9, 0)];
    let bookings = vec![Booking::new_with_interval(at(11, 0), at(9, 0))];

    let actual = filter_availability(&candidates, 60, &bookings, yesterday_noon(), 30);

    assert!(actual[0].is_available());
}

#[test]
fn test_filter_availability_当日はリードタイムより前が埋まる() {
    let candidates = generate_candidates(day(), 6, 22, 30).unwrap();
    let now = at(14, 5);

    let actual = filter_availability(&candidates, 60, &[], now, 30);

    for slot in actual.iter() {
        if slot.get_time() < at(14, 35) {
            assert!(!slot.is_available(), "{:?}", slot);
        } else {
            assert!(slot.is_available(), "{:?}", slot);
        }
    }
    let first = first_available_at_or_after(&actual, at(6, 0)).unwrap();
    assert_eq!(first.get_time(), at(15, 0));
}

#[test]
fn test_filter_availability_翌日以降はリードタイムを見ない() {
    let candidates = vec![at(6, 0)];
    let now = Local.with_ymd_and_hms(2024, 5, 9, 23, 50, 0).unwrap();

    let actual = filter_availability(&candidates, 60, &[], now, 30);

    assert!(actual[0].is_available());
}

#[test]
fn test_filter_availability_長さと順序を保つ() {
    let candidates = generate_candidates(day(), 6, 22, 30).unwrap();
    let bookings = vec![Booking::new_with_interval(at(6, 0), at(21, 0))];

    let actual = filter_availability(&candidates, 60, &bookings, yesterday_noon(), 30);

    assert_eq!(actual.len(), candidates.len());
    for (slot, candidate) in actual.iter().zip(candidates.iter()) {
        assert_eq!(slot.get_time(), *candidate);
    }
}

#[test]
fn test_filter_availability_空きがなくてもエラーにならない() {
    let candidates = generate_candidates(day(), 6, 22, 30).unwrap();
    let bookings = vec![Booking::new_with_interval(at(0, 0), at(23, 0))];

    let actual = filter_availability(&candidates, 60, &bookings, yesterday_noon(), 30);

    assert!(!has_available(&actual));
    assert!(available_slots(&actual).is_empty());
}

#[test]
fn test_filter_availability_冪等である() {
    let candidates = generate_candidates(day(), 6, 22, 30).unwrap();
    let bookings = vec![Booking::new_with_interval(at(9, 0), at(11, 0))];

    let first = filter_availability(&candidates, 90, &bookings, at(7, 0), 30);
    let second = filter_availability(&candidates, 90, &bookings, at(7, 0), 30);

    assert_eq!(first, second);
}

#[test]
fn test_candidate_slot_end_time() {
    let slot = CandidateSlot::new(at(9, 0), true);

    assert_eq!(slot.end_time(90), at(10, 30));
}
