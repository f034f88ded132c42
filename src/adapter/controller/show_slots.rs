use chrono::{Local, NaiveDate};
use std::env;
use std::process;
use turfslot::adapter::gateway::config::load_schedule_config;
use turfslot::adapter::gateway::venue_repository::VenueRepository;
use turfslot::application::interface::VenueRepositoryTrait;
use turfslot::application::show_slots::show_slots;
use turfslot::error::TurfslotError;

const DEFAULT_CONFIG_PATH: &str = "schedule.yaml";
const DEFAULT_DURATION_MINUTES: u32 = 60;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 6 {
        eprintln!(
            "usage: {} <venues_dir> <turf_id> [YYYY-MM-DD] [duration_minutes] [schedule.yaml]",
            &args[0]
        );
        process::exit(2);
    }

    let config_path = config_path_arg(&args);

    if let Err(e) = run(&args[1], &args[2], args.get(3), args.get(4), config_path) {
        eprintln!("show_slots: {}", e);
        process::exit(1);
    }
}

fn run(
    venues_dir: &str,
    turf_id: &str,
    date_arg: Option<&String>,
    duration_arg: Option<&String>,
    config_path: &str,
) -> Result<(), TurfslotError> {
    let config = load_schedule_config(config_path)?;

    let mut venue_repository = VenueRepository::new(venues_dir);
    venue_repository.sync_clock(Local::now());
    venue_repository.load()?;

    let now = venue_repository.get_last_synced_time();
    let turf = venue_repository
        .get_turf(turf_id)
        .ok_or_else(|| TurfslotError::UnknownTurf(turf_id.to_string()))?;

    let date = match date_arg {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| TurfslotError::InvalidTime(format!("{}: {}", s, e)))?,
        None => now.date_naive(),
    };

    let duration_minutes = match duration_arg {
        Some(s) => s
            .parse()
            .map_err(|_| TurfslotError::InvalidArgument(format!("duration '{}'", s)))?,
        None => DEFAULT_DURATION_MINUTES,
    };

    for line in show_slots(turf, date, &config, now, duration_minutes)? {
        println!("{}", line);
    }

    Ok(())
}

fn config_path_arg(args: &[String]) -> &str {
    args.get(5).map(|s| s.as_str()).unwrap_or(DEFAULT_CONFIG_PATH)
}

#[cfg(test)]
fn args_of(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn test_config_path_arg_省略時はschedule_yaml() {
    let args = args_of(&["show_slots", "venues", "16", "2024-05-10", "60"]);

    assert_eq!(config_path_arg(&args), "schedule.yaml");
}

#[test]
fn test_config_path_arg_6番目の引数を使う() {
    let args = args_of(&["show_slots", "venues", "16", "2024-05-10", "60", "host.yaml"]);

    assert_eq!(config_path_arg(&args), "host.yaml");
}
