use crate::application::interface::CheckoutOutcome;
use crate::entity::booking::{Booking, BookingStatus};
use crate::entity::booking_request::{BookingRequest, BookingSource};
use crate::entity::datetime::{at_time_of_day, earliest_bookable_time};
use crate::entity::price::compute_price_opt;
use crate::entity::schedule::{DurationBounds, ScheduleConfig};
use crate::entity::slot::{
    available_slots, filter_availability, first_available_at_or_after, generate_candidates,
    CandidateSlot,
};
use crate::entity::venue::Turf;
use crate::error::TurfslotError;
use chrono::{DateTime, Local, NaiveDate, Timelike};

#[cfg(test)]
use chrono::TimeZone;

const DEFAULT_DURATION_MINUTES: u32 = 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    NoDateSelected,
    DateSelected,
    SlotSelected,
    BookingRequested,
    Confirmed,
    Rejected(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    date: Option<NaiveDate>,
    start_time: Option<DateTime<Local>>,
    duration_minutes: u32,
}

impl Selection {
    pub fn get_date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn get_start_time(&self) -> Option<DateTime<Local>> {
        self.start_time
    }

    pub fn get_duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

/// One user's slot picking on one turf.
///
/// Only the selection itself is stored. Candidate slots, price and slider
/// bounds are recomputed from it on every call.
pub struct BookingSession {
    config: ScheduleConfig,
    turf: Turf,
    bookings: Vec<Booking>,
    now: DateTime<Local>,
    selection: Selection,
    phase: Phase,
    pending_request: Option<BookingRequest>,
}

impl BookingSession {
    pub fn new(turf: &Turf, config: ScheduleConfig, now: DateTime<Local>) -> Self {
        let duration_minutes = config
            .get_duration_bounds()
            .clamp(DEFAULT_DURATION_MINUTES);

        Self {
            config,
            turf: turf.clone(),
            bookings: turf.active_bookings(),
            now,
            selection: Selection {
                date: None,
                start_time: None,
                duration_minutes,
            },
            phase: Phase::NoDateSelected,
            pending_request: None,
        }
    }

    pub fn get_config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn get_turf(&self) -> &Turf {
        &self.turf
    }

    pub fn get_selection(&self) -> &Selection {
        &self.selection
    }

    pub fn get_phase(&self) -> &Phase {
        &self.phase
    }

    pub fn get_now(&self) -> DateTime<Local> {
        self.now
    }

    pub fn duration_bounds(&self) -> DurationBounds {
        self.config.get_duration_bounds()
    }

    pub fn sync_clock(&mut self, now: DateTime<Local>) {
        self.now = now;
        self.revalidate();
    }

    pub fn select_date(&mut self, date: NaiveDate) -> Result<(), TurfslotError> {
        if date < self.now.date_naive() {
            return Err(TurfslotError::InvalidTime(format!("{} is in the past", date)));
        }

        // 開始時刻は新しい日付の同じ時刻に付け替えてから再検証する
        let carried_start = self
            .selection
            .start_time
            .and_then(|start| at_time_of_day(date, start.hour(), start.minute()));

        self.selection.date = Some(date);
        self.selection.start_time = carried_start;
        self.pending_request = None;
        self.phase = Phase::DateSelected;
        self.revalidate();

        log::debug!("date selected: {} (start {:?})", date, self.selection.start_time);
        Ok(())
    }

    pub fn slots(&self) -> Result<Vec<CandidateSlot>, TurfslotError> {
        let date = self.selection.date.ok_or(TurfslotError::NoDateSelected)?;
        self.slots_for(date, self.selection.duration_minutes)
    }

    fn slots_for(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Result<Vec<CandidateSlot>, TurfslotError> {
        let candidates = generate_candidates(
            date,
            self.config.get_open_hour(),
            self.config.get_close_hour(),
            self.config.get_step_minutes(),
        )?;

        Ok(filter_availability(
            &candidates,
            duration_minutes,
            &self.bookings,
            self.now,
            self.config.get_lead_minutes(),
        ))
    }

    pub fn select_start(&mut self, time: DateTime<Local>) -> Result<(), TurfslotError> {
        let slots = self.slots()?;
        let is_free = slots
            .iter()
            .any(|slot| slot.get_time() == time && slot.is_available());

        if !is_free {
            return Err(TurfslotError::SlotUnavailable(
                time.format("%Y-%m-%d %H:%M").to_string(),
            ));
        }

        self.selection.start_time = Some(time);
        self.withdraw_request();
        self.phase = Phase::SlotSelected;
        Ok(())
    }

    pub fn clear_start(&mut self) {
        self.selection.start_time = None;
        self.withdraw_request();
        if self.selection.date.is_some() {
            self.phase = Phase::DateSelected;
        }
    }

    // 送信待ちの間に選択が変わったら、古い区間の依頼は取り下げる
    fn withdraw_request(&mut self) {
        if let Some(request) = self.pending_request.take() {
            log::debug!("booking request {} withdrawn", request.get_id());
            self.phase = match (self.selection.date, self.selection.start_time) {
                (_, Some(_)) => Phase::SlotSelected,
                (Some(_), None) => Phase::DateSelected,
                (None, None) => Phase::NoDateSelected,
            };
        }
    }

    pub fn increase_duration(&mut self) {
        let next = self
            .duration_bounds()
            .increase(self.selection.duration_minutes);
        self.apply_duration(next);
    }

    pub fn decrease_duration(&mut self) {
        let next = self
            .duration_bounds()
            .decrease(self.selection.duration_minutes);
        self.apply_duration(next);
    }

    pub fn set_duration(&mut self, duration_minutes: u32) -> Result<(), TurfslotError> {
        let checked = self.duration_bounds().check(duration_minutes)?;
        self.apply_duration(checked);
        Ok(())
    }

    fn apply_duration(&mut self, duration_minutes: u32) {
        if duration_minutes == self.selection.duration_minutes {
            return;
        }

        self.selection.duration_minutes = duration_minutes;
        self.withdraw_request();
        self.revalidate();
    }

    // スライダーの位置を空きスロット上でoffset個動かす。未選択なら先頭の空きを選ぶ
    pub fn move_selection(&mut self, offset: i32) -> Result<(), TurfslotError> {
        let slots = self.slots()?;
        let free = available_slots(&slots);
        if free.is_empty() {
            return Ok(());
        }

        let next_index = match self.selection.start_time {
            None => 0,
            Some(start) => {
                let current = free
                    .iter()
                    .position(|slot| slot.get_time() == start)
                    .unwrap_or(0) as i32;
                current.saturating_add(offset).clamp(0, free.len() as i32 - 1) as usize
            }
        };

        let time = free[next_index].get_time();
        self.select_start(time)
    }

    // 選択中の区間が埋まった場合は、それ以降で最も近い空きへ寄せる。なければ選択を外す
    // 日付を跨いで選択日が過去になった場合は日付から選び直させる
    fn revalidate(&mut self) {
        if let Some(date) = self.selection.date {
            if date < self.now.date_naive() {
                log::debug!("{} is now in the past, selection cleared", date);
                self.reset();
                return;
            }
        }

        let (date, start) = match (self.selection.date, self.selection.start_time) {
            (Some(date), Some(start)) => (date, start),
            _ => return,
        };

        let slots = match self.slots_for(date, self.selection.duration_minutes) {
            Ok(slots) => slots,
            Err(e) => {
                log::warn!("could not recompute slots for {}: {}", date, e);
                self.clear_start();
                return;
            }
        };

        match first_available_at_or_after(&slots, start) {
            Some(slot) => {
                let moved_to = slot.get_time();
                self.selection.start_time = Some(moved_to);
                if moved_to != start {
                    log::debug!(
                        "start {} no longer free, moved to {}",
                        start.format("%H:%M"),
                        moved_to.format("%H:%M")
                    );
                    self.withdraw_request();
                }
                if self.phase == Phase::DateSelected {
                    self.phase = Phase::SlotSelected;
                }
            }
            None => {
                log::debug!("start {} no longer free, selection cleared", start.format("%H:%M"));
                self.clear_start();
            }
        }
    }

    pub fn price(&self) -> f64 {
        let duration_opt = self
            .selection
            .start_time
            .map(|_| self.selection.duration_minutes);
        compute_price_opt(self.turf.get_price_per_hour(), duration_opt)
    }

    pub fn end_time(&self) -> Option<DateTime<Local>> {
        self.selection
            .start_time
            .map(|start| CandidateSlot::new(start, true).end_time(self.selection.duration_minutes))
    }

    pub fn request(&mut self) -> Result<BookingRequest, TurfslotError> {
        if self.selection.date.is_none() {
            return Err(TurfslotError::NoDateSelected);
        }
        let start = self.selection.start_time.ok_or(TurfslotError::NoSelection)?;
        if start < earliest_bookable_time(self.now, self.config.get_lead_minutes()) {
            return Err(TurfslotError::SlotUnavailable(
                start.format("%Y-%m-%d %H:%M").to_string(),
            ));
        }

        // 時計が進んでいる可能性があるので送信直前に再確認する
        self.select_start(start)?;

        let request = BookingRequest::new(
            &self.turf,
            start,
            self.selection.duration_minutes,
            BookingSource::Online,
            None,
        );

        log::info!(
            "booking requested: turf {} at {} for {} min",
            request.get_turf_id(),
            start.format("%Y-%m-%d %H:%M"),
            request.get_duration_minutes()
        );
        self.pending_request = Some(request.clone());
        self.phase = Phase::BookingRequested;

        Ok(request)
    }

    pub fn resolve(&mut self, outcome: CheckoutOutcome) -> Result<(), TurfslotError> {
        let request = self.pending_request.take().ok_or_else(|| {
            TurfslotError::InvalidBooking("no booking has been requested".to_string())
        })?;

        match outcome {
            CheckoutOutcome::Confirmed => {
                // 確定した予約は手元の一覧にも反映し、以降の空き計算に使う
                self.bookings.push(Booking::new(
                    &request.get_id().to_string(),
                    request.get_turf_id(),
                    request.get_user_name().unwrap_or(""),
                    request.get_start_time(),
                    request.get_end_time(),
                    request.get_price(),
                    BookingStatus::Confirmed,
                ));
                self.selection.start_time = None;
                self.phase = Phase::Confirmed;
            }
            CheckoutOutcome::Rejected(reason) => {
                log::warn!("booking rejected: {}", reason);
                self.phase = Phase::Rejected(reason);
            }
        }

        Ok(())
    }

    pub fn reset(&mut self) {
        self.selection.date = None;
        self.selection.start_time = None;
        self.pending_request = None;
        self.phase = Phase::NoDateSelected;
    }
}

#[cfg(test)]
fn sample_turf() -> Turf {
    use crate::entity::venue::SportType;

    let booking = Booking::new_with_interval(at(9, 0), at(11, 0));
    let cancelled = Booking::new(
        "c1",
        "16",
        "x",
        at(13, 0),
        at(14, 0),
        1200.0,
        BookingStatus::Cancelled,
    );
    Turf::new(
        "16",
        "Main Ground",
        "12",
        SportType::Football,
        1200.0,
        vec![booking, cancelled],
    )
}

#[cfg(test)]
fn at(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 10, hour, minute, 0).unwrap()
}

#[cfg(test)]
fn session() -> BookingSession {
    let now = Local.with_ymd_and_hms(2024, 5, 9, 20, 0, 0).unwrap();
    let mut session = BookingSession::new(&sample_turf(), ScheduleConfig::default(), now);
    session
        .select_date(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap())
        .unwrap();
    session
}

#[test]
fn test_new_日付未選択() {
    let now = Local.with_ymd_and_hms(2024, 5, 9, 20, 0, 0).unwrap();
    let session = BookingSession::new(&sample_turf(), ScheduleConfig::default(), now);

    assert_eq!(session.get_phase(), &Phase::NoDateSelected);
    assert_eq!(session.get_selection().get_duration_minutes(), 60);
    assert!(matches!(session.slots(), Err(TurfslotError::NoDateSelected)));
    assert_eq!(session.price(), 0.0);
}

#[test]
fn test_select_date_過去の日付はエラー() {
    let mut session = session();

    let actual = session.select_date(NaiveDate::from_ymd_opt(2024, 5, 8).unwrap());

    assert!(actual.is_err());
}

#[test]
fn test_slots_キャンセル済みの予約はブロックしない() {
    let session = session();
    let slots = session.slots().unwrap();

    let one_pm = slots.iter().find(|slot| slot.get_time() == at(13, 0)).unwrap();
    let nine = slots.iter().find(|slot| slot.get_time() == at(9, 0)).unwrap();
    assert!(one_pm.is_available());
    assert!(!nine.is_available());
}

#[test]
fn test_select_start_空いていないスロットはエラー() {
    let mut session = session();

    assert!(session.select_start(at(9, 0)).is_err());
    assert!(session.select_start(at(11, 0)).is_ok());
    assert_eq!(session.get_phase(), &Phase::SlotSelected);
}

#[test]
fn test_price_1200円で90分() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();
    session.set_duration(90).unwrap();

    assert_eq!(session.price(), 1800.0);
    assert_eq!(session.end_time(), Some(at(12, 30)));
}

#[test]
fn test_increase_duration_埋まったら次の空きへ寄せる() {
    let mut session = session();
    session.select_start(at(8, 0)).unwrap();

    // 8:00-9:30は9:00からの予約と重なる
    session.increase_duration();

    assert_eq!(session.get_selection().get_duration_minutes(), 90);
    assert_eq!(session.get_selection().get_start_time(), Some(at(11, 0)));
    assert_eq!(session.get_phase(), &Phase::SlotSelected);
}

#[test]
fn test_increase_duration_空きがなければ選択を外す() {
    let mut session = session();
    session.select_start(at(21, 30)).unwrap();
    session.set_duration(30).unwrap();
    session.select_start(at(21, 30)).unwrap();

    let full_day = Booking::new_with_interval(at(6, 0), at(21, 30));
    session.bookings.push(full_day);
    session.increase_duration();

    // 21:30以降の候補は21:30のみで、それはまだ空いている
    assert_eq!(session.get_selection().get_start_time(), Some(at(21, 30)));

    session.bookings.push(Booking::new_with_interval(at(21, 30), at(22, 0)));
    session.increase_duration();

    assert_eq!(session.get_selection().get_start_time(), None);
    assert_eq!(session.get_phase(), &Phase::DateSelected);
    assert_eq!(session.price(), 0.0);
}

#[test]
fn test_decrease_duration_下限で止まる() {
    let mut session = session();
    session.decrease_duration();
    session.decrease_duration();

    assert_eq!(session.get_selection().get_duration_minutes(), 30);
}

#[test]
fn test_set_duration_範囲外はエラー() {
    let mut session = session();

    assert!(session.set_duration(240).is_err());
    assert!(session.set_duration(45).is_err());
    assert_eq!(session.get_selection().get_duration_minutes(), 60);
}

#[test]
fn test_move_selection_空きスロットだけを移動する() {
    let mut session = session();

    session.move_selection(1).unwrap();
    assert_eq!(session.get_selection().get_start_time(), Some(at(6, 0)));

    session.select_start(at(7, 30)).unwrap();
    session.move_selection(1).unwrap();
    // 8:00-9:00 は空き、8:30は9:00からの予約に掛かる
    assert_eq!(session.get_selection().get_start_time(), Some(at(8, 0)));
    session.move_selection(1).unwrap();
    assert_eq!(session.get_selection().get_start_time(), Some(at(11, 0)));

    session.move_selection(-100).unwrap();
    assert_eq!(session.get_selection().get_start_time(), Some(at(6, 0)));
}

#[test]
fn test_select_date_開始時刻を新しい日付に付け替える() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();

    session
        .select_date(NaiveDate::from_ymd_opt(2024, 5, 11).unwrap())
        .unwrap();

    assert_eq!(
        session.get_selection().get_start_time(),
        Some(Local.with_ymd_and_hms(2024, 5, 11, 11, 0, 0).unwrap())
    );
    assert_eq!(session.get_phase(), &Phase::SlotSelected);
}

#[test]
fn test_sync_clock_リードタイムを過ぎた選択は寄せられる() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();

    session.sync_clock(at(11, 10));

    assert_eq!(session.get_selection().get_start_time(), Some(at(12, 0)));
}

#[test]
fn test_request_未選択はエラー() {
    let mut session = session();

    assert!(matches!(session.request(), Err(TurfslotError::NoSelection)));
}

#[test]
fn test_request_確定すると手元の予約に反映される() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();

    let request = session.request().unwrap();
    assert_eq!(request.get_price(), 1200.0);
    assert_eq!(session.get_phase(), &Phase::BookingRequested);

    session.resolve(CheckoutOutcome::Confirmed).unwrap();
    assert_eq!(session.get_phase(), &Phase::Confirmed);
    assert_eq!(session.get_selection().get_start_time(), None);

    let slots = session.slots().unwrap();
    let eleven = slots.iter().find(|slot| slot.get_time() == at(11, 0)).unwrap();
    assert!(!eleven.is_available());
}

#[test]
fn test_resolve_拒否された場合() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();
    session.request().unwrap();

    session
        .resolve(CheckoutOutcome::Rejected("payment failed".to_string()))
        .unwrap();

    assert_eq!(
        session.get_phase(),
        &Phase::Rejected("payment failed".to_string())
    );
    assert!(session.resolve(CheckoutOutcome::Confirmed).is_err());
}

#[test]
fn test_reset() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();

    session.reset();

    assert_eq!(session.get_phase(), &Phase::NoDateSelected);
    assert_eq!(session.get_selection().get_date(), None);
}

#[test]
fn test_sync_clock_日付を跨いだら過去の選択を外す() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();

    session.sync_clock(Local.with_ymd_and_hms(2024, 5, 11, 9, 0, 0).unwrap());

    assert_eq!(session.get_selection().get_date(), None);
    assert_eq!(session.get_selection().get_start_time(), None);
    assert_eq!(session.get_phase(), &Phase::NoDateSelected);
    assert!(matches!(session.request(), Err(TurfslotError::NoDateSelected)));
}

#[test]
fn test_sync_clock_送信待ちでも日付を跨いだら依頼を取り下げる() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();
    session.request().unwrap();

    session.sync_clock(Local.with_ymd_and_hms(2024, 5, 11, 0, 5, 0).unwrap());

    assert_eq!(session.get_phase(), &Phase::NoDateSelected);
    assert!(session.resolve(CheckoutOutcome::Confirmed).is_err());
}

#[test]
fn test_request_リードタイムより前の開始は拒否() {
    let mut session = session();
    session.select_start(at(14, 0)).unwrap();

    // 再検証を通さずに時計だけ進める
    session.now = at(13, 50);

    assert!(matches!(
        session.request(),
        Err(TurfslotError::SlotUnavailable(_))
    ));
    assert_eq!(session.get_phase(), &Phase::SlotSelected);
}

#[test]
fn test_increase_duration_送信待ちの依頼を取り下げる() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();
    session.request().unwrap();

    session.increase_duration();

    assert_eq!(session.get_phase(), &Phase::SlotSelected);
    assert!(session.resolve(CheckoutOutcome::Confirmed).is_err());

    // 取り下げた11:00-12:00は手元の予約に入っていない
    let slots = session.slots().unwrap();
    let eleven = slots.iter().find(|slot| slot.get_time() == at(11, 0)).unwrap();
    assert!(eleven.is_available());
}

#[test]
fn test_select_start_送信待ちの依頼を取り下げる() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();
    session.request().unwrap();

    session.move_selection(1).unwrap();

    assert_eq!(session.get_selection().get_start_time(), Some(at(11, 30)));
    assert_eq!(session.get_phase(), &Phase::SlotSelected);
    assert!(session.resolve(CheckoutOutcome::Confirmed).is_err());
}

#[test]
fn test_move_selection_大きなoffsetでも末尾で止まる() {
    let mut session = session();
    session.select_start(at(11, 0)).unwrap();

    session.move_selection(i32::MAX).unwrap();

    // 閉店時刻を越える予約も許すので、最後の候補21:30まで動く
    assert_eq!(session.get_selection().get_start_time(), Some(at(21, 30)));
}
