use chrono::{Duration, Local, NaiveDate};
use std::env;
use std::io::{stdin, stdout, Stdout, Write};
use std::process;
use termion::event::Key;
use termion::input::TermRead;
use termion::raw::{IntoRawMode, RawTerminal};
use termion::style;
use turfslot::adapter::controller::terminal::{pad_to_width, render_slot_strip};
use turfslot::adapter::gateway::checkout::SimulatedCheckout;
use turfslot::adapter::gateway::config::load_schedule_config;
use turfslot::adapter::gateway::venue_repository::VenueRepository;
use turfslot::application::booking_session::{BookingSession, Phase};
use turfslot::application::interface::{CheckoutTrait, VenueRepositoryTrait};
use turfslot::application::show_slots::NO_SLOTS_MESSAGE;
use turfslot::entity::price::format_price;
use turfslot::entity::slot::has_available;
use turfslot::error::TurfslotError;

const DEFAULT_CONFIG_PATH: &str = "schedule.yaml";
const LABEL_WIDTH: usize = 12;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: {} <venues_dir> <turf_id> [schedule.yaml]", &args[0]);
        process::exit(2);
    }

    let config_path = args.get(3).map(|s| s.as_str()).unwrap_or(DEFAULT_CONFIG_PATH);

    if let Err(e) = run(&args[1], &args[2], config_path) {
        eprintln!("turfslot: {}", e);
        process::exit(1);
    }
}

fn run(venues_dir: &str, turf_id: &str, config_path: &str) -> Result<(), TurfslotError> {
    let config = load_schedule_config(config_path)?;

    let mut venue_repository = VenueRepository::new(venues_dir);
    venue_repository.sync_clock(Local::now());
    venue_repository.load()?;

    let turf = venue_repository
        .get_turf(turf_id)
        .ok_or_else(|| TurfslotError::UnknownTurf(turf_id.to_string()))?;

    let now = venue_repository.get_last_synced_time();
    let mut session = BookingSession::new(turf, config, now);
    session.select_date(now.date_naive())?;

    let mut checkout = SimulatedCheckout::new(now);

    // controllerで実体を見るのを避けるために、1つ関数を切る
    application(&mut session, &mut checkout)
}

fn application(
    session: &mut BookingSession,
    checkout: &mut dyn CheckoutTrait,
) -> Result<(), TurfslotError> {
    let mut stdout = stdout().into_raw_mode()?;
    write!(stdout, "{}", termion::cursor::Hide)?;

    let mut message = String::new();
    render(&mut stdout, session, &message)?;

    for key in stdin().keys() {
        let now = Local::now();
        session.sync_clock(now);
        checkout.sync_clock(now);
        message.clear();

        // 日付を跨ぐと選択が外れるので今日を選び直す
        if session.get_selection().get_date().is_none() {
            session.select_date(now.date_naive())?;
            message.push_str("The date has changed, showing today");
        }

        match key? {
            Key::Char('q') | Key::Ctrl('d') | Key::Ctrl('c') => break,
            Key::Left | Key::Char('h') => session.move_selection(-1)?,
            Key::Right | Key::Char('l') => session.move_selection(1)?,
            Key::Char('+') | Key::Up => session.increase_duration(),
            Key::Char('-') | Key::Down => session.decrease_duration(),
            Key::Char('n') => shift_date(session, 1, &mut message)?,
            Key::Char('p') => shift_date(session, -1, &mut message)?,
            Key::Char('\n') | Key::Ctrl('m') => book(session, checkout, &mut message)?,
            _ => {}
        }

        render(&mut stdout, session, &message)?;
    }

    write!(
        stdout,
        "{}{}",
        termion::cursor::Show,
        termion::cursor::Goto(1, 1)
    )?;
    write!(stdout, "{}", termion::clear::All)?;
    stdout.flush()?;

    Ok(())
}

fn shift_date(
    session: &mut BookingSession,
    days: i64,
    message: &mut String,
) -> Result<(), TurfslotError> {
    let current = session
        .get_selection()
        .get_date()
        .ok_or(TurfslotError::NoDateSelected)?;
    let next: NaiveDate = current + Duration::days(days);

    match session.select_date(next) {
        Ok(()) => {}
        Err(TurfslotError::InvalidTime(reason)) => {
            *message = reason;
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

fn book(
    session: &mut BookingSession,
    checkout: &mut dyn CheckoutTrait,
    message: &mut String,
) -> Result<(), TurfslotError> {
    let request = match session.request() {
        Ok(request) => request,
        Err(TurfslotError::NoSelection) => {
            *message = "Pick a start time first".to_string();
            return Ok(());
        }
        Err(TurfslotError::SlotUnavailable(at)) => {
            *message = format!("{} is no longer available", at);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let outcome = checkout.submit(&request);
    session.resolve(outcome)?;

    *message = match session.get_phase() {
        Phase::Confirmed => format!(
            "Booked {} - {} on {} for {}",
            request.get_start_time().format("%-I:%M %p"),
            request.get_end_time().format("%-I:%M %p"),
            request.get_date().format("%B %-d, %Y"),
            format_price(request.get_price())
        ),
        Phase::Rejected(reason) => format!("Booking failed: {}", reason),
        _ => String::new(),
    };

    Ok(())
}

fn render(
    stdout: &mut RawTerminal<Stdout>,
    session: &BookingSession,
    message: &str,
) -> Result<(), TurfslotError> {
    let selection = session.get_selection();
    let slots = session.slots()?;
    let bounds = session.duration_bounds();

    write!(
        stdout,
        "{}{}",
        termion::clear::All,
        termion::cursor::Goto(1, 1)
    )?;

    let turf = session.get_turf();
    let mut lines: Vec<String> = vec![
        format!(
            "{}{}{}  {}/hour",
            style::Bold,
            turf.get_name(),
            style::Reset,
            format_price(turf.get_price_per_hour())
        ),
        String::new(),
    ];

    if let Some(date) = selection.get_date() {
        lines.push(format!(
            "{}{}",
            pad_to_width("Date", LABEL_WIDTH),
            date.format("%a %B %-d, %Y")
        ));
    }

    lines.push(format!(
        "{}{} min  ({}-{})",
        pad_to_width("Duration", LABEL_WIDTH),
        selection.get_duration_minutes(),
        bounds.get_min(),
        bounds.get_max()
    ));

    let start_label = match (selection.get_start_time(), session.end_time()) {
        (Some(start), Some(end)) => {
            format!("{} - {}", start.format("%-I:%M %p"), end.format("%-I:%M %p"))
        }
        _ => "-".to_string(),
    };
    lines.push(format!("{}{}", pad_to_width("Time", LABEL_WIDTH), start_label));
    lines.push(format!(
        "{}{}",
        pad_to_width("Total", LABEL_WIDTH),
        format_price(session.price())
    ));
    lines.push(String::new());

    if let (Some(first), Some(last)) = (slots.first(), slots.last()) {
        lines.push(format!(
            "{} {} {}",
            first.get_time().format("%H:%M"),
            render_slot_strip(&slots, selection.get_start_time(), selection.get_duration_minutes()),
            last.end_time(session.get_config().get_step_minutes()).format("%H:%M")
        ));
    }
    if !has_available(&slots) {
        lines.push(NO_SLOTS_MESSAGE.to_string());
    }

    lines.push(String::new());
    lines.push("←/→ start  +/- duration  n/p day  Enter book  q quit".to_string());
    if !message.is_empty() {
        lines.push(String::new());
        lines.push(message.to_string());
    }

    // RawModeでは改行だけでは行頭に戻らない
    for line in lines.iter() {
        write!(stdout, "{}\r\n", line)?;
    }
    stdout.flush()?;

    Ok(())
}
