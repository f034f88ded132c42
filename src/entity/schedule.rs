use crate::error::TurfslotError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DurationBounds {
    min: u32,
    max: u32,
    step: u32,
}

impl DurationBounds {
    pub fn new(min: u32, max: u32, step: u32) -> Result<Self, TurfslotError> {
        if step == 0 || min == 0 || min > max || min % step != 0 || max % step != 0 {
            return Err(TurfslotError::InvalidSchedule(format!(
                "duration bounds {}-{} with step {}",
                min, max, step
            )));
        }

        Ok(Self { min, max, step })
    }

    // 予約ページのスライダー
    pub fn player() -> Self {
        Self {
            min: 30,
            max: 180,
            step: 30,
        }
    }

    // ホストのオフライン予約ダイアログ (最大5時間)
    pub fn host() -> Self {
        Self {
            min: 60,
            max: 300,
            step: 30,
        }
    }

    pub fn get_min(&self) -> u32 {
        self.min
    }

    pub fn get_max(&self) -> u32 {
        self.max
    }

    pub fn get_step(&self) -> u32 {
        self.step
    }

    pub fn contains(&self, minutes: u32) -> bool {
        self.min <= minutes && minutes <= self.max && minutes % self.step == 0
    }

    // stepの倍数に切り下げてから範囲に収める
    pub fn clamp(&self, minutes: u32) -> u32 {
        let snapped = minutes - minutes % self.step;
        snapped.clamp(self.min, self.max)
    }

    pub fn increase(&self, minutes: u32) -> u32 {
        self.clamp(minutes.saturating_add(self.step))
    }

    pub fn decrease(&self, minutes: u32) -> u32 {
        self.clamp(minutes.saturating_sub(self.step))
    }

    pub fn check(&self, minutes: u32) -> Result<u32, TurfslotError> {
        if self.contains(minutes) {
            Ok(minutes)
        } else {
            Err(TurfslotError::InvalidDuration {
                minutes,
                min: self.min,
                max: self.max,
                step: self.step,
            })
        }
    }
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self::player()
    }
}

#[test]
fn test_duration_bounds_new_不正な値はエラー() {
    assert!(DurationBounds::new(0, 180, 30).is_err());
    assert!(DurationBounds::new(60, 30, 30).is_err());
    assert!(DurationBounds::new(45, 180, 30).is_err());
    assert!(DurationBounds::new(30, 180, 0).is_err());
    assert!(DurationBounds::new(30, 180, 30).is_ok());
}

#[test]
fn test_duration_bounds_clamp() {
    let bounds = DurationBounds::player();

    assert_eq!(bounds.clamp(0), 30);
    assert_eq!(bounds.clamp(100), 90);
    assert_eq!(bounds.clamp(999), 180);
}

#[test]
fn test_duration_bounds_increase_上限で止まる() {
    let bounds = DurationBounds::host();

    assert_eq!(bounds.increase(60), 90);
    assert_eq!(bounds.increase(300), 300);
}

#[test]
fn test_duration_bounds_decrease_下限で止まる() {
    let bounds = DurationBounds::host();

    assert_eq!(bounds.decrease(90), 60);
    assert_eq!(bounds.decrease(60), 60);
}

#[test]
fn test_duration_bounds_check() {
    let bounds = DurationBounds::player();

    assert_eq!(bounds.check(90).unwrap(), 90);
    assert!(bounds.check(45).is_err());
    assert!(bounds.check(210).is_err());
}

/// Operating window and slot grid of a turf.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScheduleConfig {
    open_hour: u32,
    close_hour: u32,
    step_minutes: u32,
    lead_minutes: u32,
    duration_bounds: DurationBounds,
}

impl ScheduleConfig {
    pub fn new(
        open_hour: u32,
        close_hour: u32,
        step_minutes: u32,
        lead_minutes: u32,
        duration_bounds: DurationBounds,
    ) -> Result<Self, TurfslotError> {
        let config = Self {
            open_hour,
            close_hour,
            step_minutes,
            lead_minutes,
            duration_bounds,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TurfslotError> {
        validate_window(self.open_hour, self.close_hour, self.step_minutes)?;

        if self.duration_bounds.get_step() % self.step_minutes != 0 {
            return Err(TurfslotError::InvalidSchedule(format!(
                "duration step {} is not a multiple of slot step {}",
                self.duration_bounds.get_step(),
                self.step_minutes
            )));
        }

        Ok(())
    }

    pub fn get_open_hour(&self) -> u32 {
        self.open_hour
    }

    pub fn get_close_hour(&self) -> u32 {
        self.close_hour
    }

    pub fn get_step_minutes(&self) -> u32 {
        self.step_minutes
    }

    pub fn get_lead_minutes(&self) -> u32 {
        self.lead_minutes
    }

    pub fn get_duration_bounds(&self) -> DurationBounds {
        self.duration_bounds
    }

    pub fn with_lead_minutes(mut self, lead_minutes: u32) -> Self {
        self.lead_minutes = lead_minutes;
        self
    }

    pub fn with_step_minutes(mut self, step_minutes: u32) -> Result<Self, TurfslotError> {
        self.step_minutes = step_minutes;
        self.validate()?;
        Ok(self)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            open_hour: 6,
            close_hour: 22,
            step_minutes: 30,
            lead_minutes: 30,
            duration_bounds: DurationBounds::player(),
        }
    }
}

pub fn validate_window(
    open_hour: u32,
    close_hour: u32,
    step_minutes: u32,
) -> Result<(), TurfslotError> {
    if open_hour >= close_hour || close_hour >= 24 {
        return Err(TurfslotError::InvalidSchedule(format!(
            "opening hour {} must be before closing hour {}",
            open_hour, close_hour
        )));
    }

    if step_minutes == 0 || 60 % step_minutes != 0 {
        return Err(TurfslotError::InvalidSchedule(format!(
            "step {} min does not divide an hour",
            step_minutes
        )));
    }

    Ok(())
}

#[test]
fn test_schedule_config_default() {
    let config = ScheduleConfig::default();

    assert_eq!(config.get_open_hour(), 6);
    assert_eq!(config.get_close_hour(), 22);
    assert_eq!(config.get_step_minutes(), 30);
    assert_eq!(config.get_lead_minutes(), 30);
    assert!(config.validate().is_ok());
}

#[test]
fn test_schedule_config_new_営業時間が逆転している場合はエラー() {
    let actual = ScheduleConfig::new(22, 6, 30, 30, DurationBounds::player());

    assert!(actual.is_err());
}

#[test]
fn test_schedule_config_new_stepが60を割り切らない場合はエラー() {
    let actual = ScheduleConfig::new(6, 22, 25, 30, DurationBounds::player());

    assert!(actual.is_err());
}

#[test]
fn test_schedule_config_with_step_minutes_15分刻み() {
    let config = ScheduleConfig::default().with_step_minutes(15).unwrap();

    assert_eq!(config.get_step_minutes(), 15);
}
