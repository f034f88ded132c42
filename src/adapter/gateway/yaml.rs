use crate::entity::booking::{read_status, Booking, BookingStatus};
use crate::entity::schedule::{DurationBounds, ScheduleConfig};
use crate::entity::venue::{read_sport_type, SportType, Turf, Venue};
use crate::error::TurfslotError;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use yaml_rust::Yaml;

#[cfg(test)]
use yaml_rust::YamlLoader;

// 数値でも文字列でも受け付ける ("1000.00" のような価格)
fn yaml_to_f64(yaml: &Yaml) -> Option<f64> {
    match yaml {
        Yaml::Real(_) => yaml.as_f64(),
        Yaml::Integer(i) => Some(*i as f64),
        Yaml::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn yaml_to_id(yaml: &Yaml) -> String {
    match yaml {
        Yaml::Integer(i) => i.to_string(),
        Yaml::String(s) => s.to_string(),
        _ => String::new(),
    }
}

fn yaml_to_u32(yaml: &Yaml, default: u32) -> u32 {
    yaml.as_i64()
        .and_then(|i| u32::try_from(i).ok())
        .unwrap_or(default)
}

pub fn parse_local_datetime(s: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y/%m/%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&naive).single();
        }
    }

    None
}

pub fn yaml_to_booking(yaml: &Yaml, turf_id: &str) -> Option<Booking> {
    let start_time = parse_local_datetime(yaml["start_time"].as_str().unwrap_or(""));
    let end_time = parse_local_datetime(yaml["end_time"].as_str().unwrap_or(""));

    let (start_time, end_time) = match (start_time, end_time) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            log::warn!("dropping malformed booking on turf {}: {:?}", turf_id, yaml);
            return None;
        }
    };

    let status_str = yaml["status"].as_str().unwrap_or("");
    let status = read_status(status_str).unwrap_or(BookingStatus::Confirmed);

    Some(Booking::new(
        &yaml_to_id(&yaml["id"]),
        turf_id,
        yaml["user_name"].as_str().unwrap_or(""),
        start_time,
        end_time,
        yaml_to_f64(&yaml["total_price"]).unwrap_or(0.0),
        status,
    ))
}

pub fn yaml_to_turf(yaml: &Yaml, venue_id: &str) -> Turf {
    let id = yaml_to_id(&yaml["id"]);
    let sport_str = yaml["sport"].as_str().unwrap_or("");
    let sport = read_sport_type(sport_str).unwrap_or_else(|| {
        log::warn!("turf {}: unknown sport '{}', using football", id, sport_str);
        SportType::Football
    });

    let price_per_hour = yaml_to_f64(&yaml["price_per_hr"]).unwrap_or_else(|| {
        log::warn!("turf {}: price_per_hr missing, using 0", id);
        0.0
    });

    let bookings = yaml["bookings"]
        .as_vec()
        .unwrap_or(&vec![])
        .iter()
        .filter_map(|booking_yaml| yaml_to_booking(booking_yaml, &id))
        .collect();

    Turf::new(
        &id,
        yaml["name"].as_str().unwrap_or(""),
        venue_id,
        sport,
        price_per_hour,
        bookings,
    )
}

pub fn yaml_to_venue(yaml: &Yaml) -> Venue {
    let id = yaml_to_id(&yaml["id"]);

    let mut turfs = vec![];
    for turf_yaml in yaml["turfs"].as_vec().unwrap_or(&vec![]) {
        turfs.push(yaml_to_turf(turf_yaml, &id));
    }

    Venue::new(
        &id,
        yaml["name"].as_str().unwrap_or(""),
        yaml["address"].as_str().unwrap_or("Address not available"),
        yaml["host_name"].as_str().unwrap_or(""),
        turfs,
    )
}

pub fn yaml_to_config(yaml: &Yaml) -> Result<ScheduleConfig, TurfslotError> {
    let default = ScheduleConfig::default();
    let default_bounds = default.get_duration_bounds();

    let duration_yaml = &yaml["duration"];
    let duration_bounds = match duration_yaml["preset"].as_str() {
        Some("host") => DurationBounds::host(),
        Some("player") => DurationBounds::player(),
        _ => DurationBounds::new(
            yaml_to_u32(&duration_yaml["min"], default_bounds.get_min()),
            yaml_to_u32(&duration_yaml["max"], default_bounds.get_max()),
            yaml_to_u32(&duration_yaml["step"], default_bounds.get_step()),
        )?,
    };

    ScheduleConfig::new(
        yaml_to_u32(&yaml["open_hour"], default.get_open_hour()),
        yaml_to_u32(&yaml["close_hour"], default.get_close_hour()),
        yaml_to_u32(&yaml["step_minutes"], default.get_step_minutes()),
        yaml_to_u32(&yaml["lead_minutes"], default.get_lead_minutes()),
        duration_bounds,
    )
}

#[test]
fn test_yaml_to_venue_再帰的にパーズできること() {
    let s = "
id: 12
name: 'Venue-uhh-api-2'
host_name: 'sup'
turfs:
  - id: 16
    name: 'Main Ground'
    sport: 'cricket'
    price_per_hr: '1000.00'
    bookings:
      - id: 1
        start_time: '2024-05-10T09:00:00'
        end_time: '2024-05-10T11:00:00'
        status: 'offline'
        user_name: 'walk-in'
";
    let docs = YamlLoader::load_from_str(s).unwrap();
    let actual = yaml_to_venue(&docs[0]);

    assert_eq!(actual.get_id(), "12");
    assert_eq!(actual.get_address(), "Address not available");
    let turf = &actual.get_turfs()[0];
    assert_eq!(turf.get_id(), "16");
    assert_eq!(turf.get_venue_id(), "12");
    assert_eq!(turf.get_sport(), SportType::Cricket);
    assert_eq!(turf.get_price_per_hour(), 1000.0);

    let booking = &turf.get_bookings()[0];
    assert_eq!(booking.get_turf_id(), "16");
    assert_eq!(booking.get_status(), BookingStatus::Offline);
    assert_eq!(
        booking.get_start_time(),
        Local.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
    );
}

#[test]
fn test_yaml_to_turf_turfsキーが存在しない場合は空配列() {
    let s = "
id: '13'
name: 'testttt'
";
    let docs = YamlLoader::load_from_str(s).unwrap();
    let actual = yaml_to_venue(&docs[0]);

    assert!(actual.get_turfs().is_empty());
}

#[test]
fn test_yaml_to_booking_終了が開始以前の予約は捨てる() {
    let s = "
start_time: '2024-05-10 11:00'
end_time: '2024-05-10 09:00'
";
    let docs = YamlLoader::load_from_str(s).unwrap();

    assert_eq!(yaml_to_booking(&docs[0], "16"), None);
}

#[test]
fn test_yaml_to_booking_statusが不正な時はconfirmedとして登録されること() {
    let s = "
start_time: '2024-05-10 09:00'
end_time: '2024-05-10 10:00'
status: 'booked'
";
    let docs = YamlLoader::load_from_str(s).unwrap();
    let actual = yaml_to_booking(&docs[0], "16").unwrap();

    assert_eq!(actual.get_status(), BookingStatus::Confirmed);
}

#[test]
fn test_parse_local_datetime_オフセット付き() {
    let actual = parse_local_datetime("2024-05-10T09:00:00Z").unwrap();

    assert_eq!(
        actual,
        DateTime::parse_from_rfc3339("2024-05-10T09:00:00+00:00")
            .unwrap()
            .with_timezone(&Local)
    );
}

#[test]
fn test_yaml_to_config_キーが存在しない場合はデフォルト() {
    let docs = YamlLoader::load_from_str("lead_minutes: 60").unwrap();
    let actual = yaml_to_config(&docs[0]).unwrap();

    assert_eq!(actual, ScheduleConfig::default().with_lead_minutes(60));
}

#[test]
fn test_yaml_to_config_hostプリセット() {
    let s = "
open_hour: 5
close_hour: 23
duration:
  preset: 'host'
";
    let docs = YamlLoader::load_from_str(s).unwrap();
    let actual = yaml_to_config(&docs[0]).unwrap();

    assert_eq!(actual.get_open_hour(), 5);
    assert_eq!(actual.get_close_hour(), 23);
    assert_eq!(actual.get_duration_bounds(), DurationBounds::host());
}

#[test]
fn test_yaml_to_config_不正な営業時間はエラー() {
    let docs = YamlLoader::load_from_str("open_hour: 22\nclose_hour: 6").unwrap();

    assert!(yaml_to_config(&docs[0]).is_err());
}
