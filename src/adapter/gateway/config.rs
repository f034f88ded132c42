use crate::adapter::gateway::yaml::yaml_to_config;
use crate::entity::schedule::ScheduleConfig;
use crate::error::TurfslotError;
use std::env;
use std::fmt::Display;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use std::str::FromStr;
use yaml_rust::YamlLoader;

pub const LEAD_MINUTES_VAR: &str = "TURFSLOT_LEAD_MINUTES";
pub const STEP_MINUTES_VAR: &str = "TURFSLOT_STEP_MINUTES";

// ファイルがなければデフォルト、その上に環境変数を重ねる
pub fn load_schedule_config(config_file_path: &str) -> Result<ScheduleConfig, TurfslotError> {
    let config = if Path::new(config_file_path).exists() {
        let mut file = File::open(config_file_path)?;
        let mut text = String::new();
        file.read_to_string(&mut text)?;

        let config = load_schedule_config_from_str(&text)?;
        log::info!("loaded schedule config from {}", config_file_path);
        config
    } else {
        log::info!("{} not found, using default schedule", config_file_path);
        ScheduleConfig::default()
    };

    apply_env_overrides(config)
}

pub fn load_schedule_config_from_str(yaml_str: &str) -> Result<ScheduleConfig, TurfslotError> {
    let docs = YamlLoader::load_from_str(yaml_str)?;

    match docs.first() {
        Some(doc) => yaml_to_config(doc),
        None => Ok(ScheduleConfig::default()),
    }
}

fn try_load<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: Display,
{
    let value = env::var(key).ok()?;

    value
        .trim()
        .parse()
        .map_err(|e| {
            log::warn!("Invalid {key} value '{value}': {e}, ignoring");
        })
        .ok()
}

fn apply_env_overrides(config: ScheduleConfig) -> Result<ScheduleConfig, TurfslotError> {
    let mut config = config;

    if let Some(lead_minutes) = try_load::<u32>(LEAD_MINUTES_VAR) {
        log::info!("{LEAD_MINUTES_VAR} overrides lead time: {lead_minutes} min");
        config = config.with_lead_minutes(lead_minutes);
    }

    if let Some(step_minutes) = try_load::<u32>(STEP_MINUTES_VAR) {
        log::info!("{STEP_MINUTES_VAR} overrides slot step: {step_minutes} min");
        config = config.with_step_minutes(step_minutes)?;
    }

    Ok(config)
}

#[test]
fn test_load_schedule_config_from_str_空文字はデフォルト() {
    let actual = load_schedule_config_from_str("").unwrap();

    assert_eq!(actual, ScheduleConfig::default());
}

#[test]
fn test_load_schedule_config_from_str_壊れたyamlはエラー() {
    let actual = load_schedule_config_from_str("open_hour: [6");

    assert!(matches!(actual, Err(TurfslotError::Yaml(_))));
}

#[test]
fn test_load_schedule_config_ファイルがなければデフォルト() {
    let actual = load_schedule_config("/nonexistent/turfslot/schedule.yaml").unwrap();

    assert_eq!(actual.get_open_hour(), 6);
    assert_eq!(actual.get_close_hour(), 22);
}
