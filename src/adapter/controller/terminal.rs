use crate::entity::slot::CandidateSlot;
use chrono::{DateTime, Local};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const FREE_CELL: char = '.';
pub const BLOCKED_CELL: char = 'x';
pub const SELECTED_CELL: char = '#';

// 表示幅で切り詰め、足りなければ空白で埋める
pub fn pad_to_width(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        let padding = width - UnicodeWidthStr::width(s);
        return format!("{}{}", s, " ".repeat(padding));
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;

    format!("{}{}", out, " ".repeat(width.saturating_sub(used)))
}

#[test]
fn test_pad_to_width_アスキー() {
    assert_eq!(pad_to_width("abc", 5), "abc  ");
}

#[test]
fn test_pad_to_width_多バイト() {
    // 全角は幅2
    assert_eq!(pad_to_width("芝生", 6), "芝生  ");
}

#[test]
fn test_pad_to_width_長すぎる場合は切り詰める() {
    assert_eq!(pad_to_width("Green Field Arena", 8), "Green F…");
    assert_eq!(pad_to_width("グリーン", 5), "グリ…");
}

// スロット1つを1文字で描く。選択中の区間は # で塗る
pub fn render_slot_strip(
    slots: &[CandidateSlot],
    selected_start: Option<DateTime<Local>>,
    duration_minutes: u32,
) -> String {
    let selected_end = selected_start
        .map(|start| CandidateSlot::new(start, true).end_time(duration_minutes));

    slots
        .iter()
        .map(|slot| {
            let in_selection = match (selected_start, selected_end) {
                (Some(start), Some(end)) => start <= slot.get_time() && slot.get_time() < end,
                _ => false,
            };

            if in_selection {
                SELECTED_CELL
            } else if slot.is_available() {
                FREE_CELL
            } else {
                BLOCKED_CELL
            }
        })
        .collect()
}

#[cfg(test)]
use chrono::TimeZone;

#[test]
fn test_render_slot_strip() {
    let at = |hour: u32, minute: u32| Local.with_ymd_and_hms(2024, 5, 10, hour, minute, 0).unwrap();
    let slots = vec![
        CandidateSlot::new(at(9, 0), false),
        CandidateSlot::new(at(9, 30), true),
        CandidateSlot::new(at(10, 0), true),
        CandidateSlot::new(at(10, 30), true),
        CandidateSlot::new(at(11, 0), true),
    ];

    assert_eq!(render_slot_strip(&slots, None, 60), "x....");
    assert_eq!(render_slot_strip(&slots, Some(at(9, 30)), 60), "x##..");
    assert_eq!(render_slot_strip(&slots, Some(at(10, 30)), 90), "x..##");
}
