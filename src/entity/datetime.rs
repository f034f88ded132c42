use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike};

// DSTの切り替えで存在しない/曖昧な時刻はNone
pub fn at_time_of_day(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    Local.from_local_datetime(&naive).single()
}

pub fn is_same_date(a: &DateTime<Local>, b: &DateTime<Local>) -> bool {
    a.date_naive() == b.date_naive()
}

pub fn earliest_bookable_time(now: DateTime<Local>, lead_minutes: u32) -> DateTime<Local> {
    now + Duration::minutes(lead_minutes as i64)
}

// 次のスロット境界に切り上げる。境界ちょうどの場合はそのまま
pub fn ceil_to_step(dt: DateTime<Local>, step_minutes: u32) -> DateTime<Local> {
    let truncated = dt
        .with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt);
    let minute_of_day = truncated.hour() * 60 + truncated.minute();

    let step = step_minutes.max(1);
    let rem = minute_of_day % step;
    let needs_bump = rem != 0 || truncated != dt;

    if !needs_bump {
        return truncated;
    }

    let bump = if rem == 0 { step } else { step - rem };
    truncated + Duration::minutes(bump as i64)
}

#[cfg(test)]
use chrono::Datelike;

#[test]
fn test_at_time_of_day_正常系() {
    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    let actual = at_time_of_day(date, 6, 30).unwrap();

    assert_eq!(actual, Local.with_ymd_and_hms(2024, 5, 10, 6, 30, 0).unwrap());
}

#[test]
fn test_at_time_of_day_範囲外の時刻はnone() {
    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

    assert_eq!(at_time_of_day(date, 24, 0), None);
    assert_eq!(at_time_of_day(date, 10, 60), None);
}

#[test]
fn test_is_same_date() {
    let a = Local.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();
    let b = Local.with_ymd_and_hms(2024, 5, 10, 23, 59, 59).unwrap();
    let c = Local.with_ymd_and_hms(2024, 5, 11, 0, 0, 0).unwrap();

    assert!(is_same_date(&a, &b));
    assert!(!is_same_date(&b, &c));
}

#[test]
fn test_earliest_bookable_time() {
    let now = Local.with_ymd_and_hms(2024, 5, 10, 14, 5, 0).unwrap();
    let actual = earliest_bookable_time(now, 30);

    assert_eq!(actual, Local.with_ymd_and_hms(2024, 5, 10, 14, 35, 0).unwrap());
}

#[test]
fn test_ceil_to_step_境界の途中は次の境界へ() {
    let dt = Local.with_ymd_and_hms(2024, 5, 10, 14, 35, 0).unwrap();
    let actual = ceil_to_step(dt, 30);

    assert_eq!(actual, Local.with_ymd_and_hms(2024, 5, 10, 15, 0, 0).unwrap());
}

#[test]
fn test_ceil_to_step_境界ちょうどはそのまま() {
    let dt = Local.with_ymd_and_hms(2024, 5, 10, 14, 30, 0).unwrap();
    let actual = ceil_to_step(dt, 30);

    assert_eq!(actual, dt);
}

#[test]
fn test_ceil_to_step_秒があれば切り上げ() {
    let dt = Local.with_ymd_and_hms(2024, 5, 10, 14, 30, 1).unwrap();
    let actual = ceil_to_step(dt, 30);

    assert_eq!(actual, Local.with_ymd_and_hms(2024, 5, 10, 15, 0, 0).unwrap());
}

#[test]
fn test_ceil_to_step_日付を跨ぐ() {
    let dt = Local.with_ymd_and_hms(2024, 5, 10, 23, 45, 0).unwrap();
    let actual = ceil_to_step(dt, 30);

    assert_eq!(actual.day(), 11);
    assert_eq!(actual.hour(), 0);
    assert_eq!(actual.minute(), 0);
}
