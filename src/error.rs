use thiserror::Error;

#[derive(Error, Debug)]
pub enum TurfslotError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Duration {minutes} min is outside {min}-{max} min (step {step})")]
    InvalidDuration {
        minutes: u32,
        min: u32,
        max: u32,
        step: u32,
    },

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Slot at {0} is not available")]
    SlotUnavailable(String),

    #[error("No start time selected")]
    NoSelection,

    #[error("No date selected")]
    NoDateSelected,

    #[error("Invalid booking: {0}")]
    InvalidBooking(String),

    #[error("Unknown turf: {0}")]
    UnknownTurf(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] yaml_rust::ScanError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
