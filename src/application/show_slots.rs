use crate::entity::datetime::{ceil_to_step, earliest_bookable_time, is_same_date};
use crate::entity::price::{compute_price, format_price};
use crate::entity::schedule::ScheduleConfig;
use crate::entity::slot::{filter_availability, generate_candidates, has_available};
use crate::entity::venue::Turf;
use crate::error::TurfslotError;
use chrono::{DateTime, Local, NaiveDate};

#[cfg(test)]
use crate::entity::booking::Booking;
#[cfg(test)]
use chrono::TimeZone;

pub const NO_SLOTS_MESSAGE: &str = "No available slots for this date";

// 1日分のスロット表を行ごとの文字列で返す
pub fn show_slots(
    turf: &Turf,
    date: NaiveDate,
    config: &ScheduleConfig,
    now: DateTime<Local>,
    duration_minutes: u32,
) -> Result<Vec<String>, TurfslotError> {
    let duration_minutes = config.get_duration_bounds().check(duration_minutes)?;
    let candidates = generate_candidates(
        date,
        config.get_open_hour(),
        config.get_close_hour(),
        config.get_step_minutes(),
    )?;
    let slots = filter_availability(
        &candidates,
        duration_minutes,
        &turf.active_bookings(),
        now,
        config.get_lead_minutes(),
    );

    let earliest = earliest_bookable_time(now, config.get_lead_minutes());
    let mut lines = vec![format!(
        "{} on {} ({} min, {})",
        turf.get_name(),
        date.format("%B %-d, %Y"),
        duration_minutes,
        format_price(compute_price(turf.get_price_per_hour(), duration_minutes))
    )];

    if date == now.date_naive() {
        let boundary = ceil_to_step(earliest, config.get_step_minutes());
        lines.push(format!("Earliest start today: {}", boundary.format("%H:%M")));
    }

    for slot in slots.iter() {
        let state = if slot.is_available() {
            "free"
        } else if is_same_date(&slot.get_time(), &now) && slot.get_time() < earliest {
            "past"
        } else {
            "booked"
        };

        lines.push(format!(
            "{} - {}  {}",
            slot.get_time().format("%H:%M"),
            slot.end_time(duration_minutes).format("%H:%M"),
            state
        ));
    }

    if !has_available(&slots) {
        lines.push(NO_SLOTS_MESSAGE.to_string());
    }

    Ok(lines)
}

#[cfg(test)]
fn sample_turf(bookings: Vec<Booking>) -> Turf {
    use crate::entity::venue::SportType;
    Turf::new("16", "Main Ground", "12", SportType::Football, 1200.0, bookings)
}

#[test]
fn test_show_slots_予約と過去を区別する() {
    let booking = Booking::new_with_interval(
        Local.with_ymd_and_hms(2024, 5, 10, 16, 0, 0).unwrap(),
        Local.with_ymd_and_hms(2024, 5, 10, 17, 0, 0).unwrap(),
    );
    let turf = sample_turf(vec![booking]);
    let now = Local.with_ymd_and_hms(2024, 5, 10, 14, 5, 0).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

    let lines = show_slots(&turf, date, &ScheduleConfig::default(), now, 60).unwrap();

    assert_eq!(lines[0], "Main Ground on May 10, 2024 (60 min, ₹1200)");
    assert_eq!(lines[1], "Earliest start today: 15:00");
    assert_eq!(lines.len(), 34);
    assert!(lines.contains(&"06:00 - 07:00  past".to_string()));
    assert!(lines.contains(&"14:30 - 15:30  past".to_string()));
    assert!(lines.contains(&"15:00 - 16:00  free".to_string()));
    assert!(lines.contains(&"15:30 - 16:30  booked".to_string()));
    assert!(lines.contains(&"17:00 - 18:00  free".to_string()));
}

#[test]
fn test_show_slots_空きがない場合はメッセージを出す() {
    let turf = sample_turf(vec![]);
    let now = Local.with_ymd_and_hms(2024, 5, 10, 23, 0, 0).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

    let lines = show_slots(&turf, date, &ScheduleConfig::default(), now, 60).unwrap();

    assert_eq!(lines.last().unwrap(), NO_SLOTS_MESSAGE);
}

#[test]
fn test_show_slots_範囲外の時間はエラー() {
    let turf = sample_turf(vec![]);
    let now = Local.with_ymd_and_hms(2024, 5, 9, 12, 0, 0).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

    assert!(show_slots(&turf, date, &ScheduleConfig::default(), now, 600).is_err());
}
