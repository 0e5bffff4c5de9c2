//! Text rendering of timelines and slot-search results.
//!
//! A timeline row is a fixed-width bar over the display window. Each cell
//! is sampled at its center: `#` where the participant is busy, `+` where
//! a suggested slot lies, `.` otherwise.

use std::fmt::Write as _;

use slotify_core::time::format_time_of_day;
use slotify_core::{Category, SlotSearchResult, Timeline};

/// Bar width used by the commands.
pub const TIMELINE_WIDTH: u16 = 48;

/// Columns reserved for the participant name.
const NAME_WIDTH: usize = 12;

/// Marker, space, name, space and the opening `|`.
const ROW_PREFIX_WIDTH: usize = NAME_WIDTH + 4;

/// Minimum columns between two hour labels.
const LABEL_SPACING: u32 = 3;

const fn category_marker(category: Category) -> char {
    match category {
        Category::Required => '*',
        Category::Optional => '?',
        Category::Unselected => ' ',
    }
}

/// Renders `timeline` with bars `width` cells wide.
pub fn timeline(timeline: &Timeline, width: u16) -> String {
    let width = width.max(1);
    let window = timeline.window;
    let mut out = format!(
        "Timeline {:02}:00-{:02}:00\n",
        window.start_hour(),
        window.end_hour()
    );
    out.push_str(&hour_axis(timeline, width));
    out.push('\n');

    for row in &timeline.rows {
        let name: String = row.name.chars().take(NAME_WIDTH).collect();
        let bar: String = (0..width)
            .map(|cell| {
                let center = (f64::from(cell) + 0.5) * 100.0 / f64::from(width);
                if row.busy.iter().any(|block| block.covers(center)) {
                    '#'
                } else if timeline
                    .overlay
                    .markers_for(&row.name)
                    .any(|slot| slot.covers(center))
                {
                    '+'
                } else {
                    '.'
                }
            })
            .collect();
        let _ = writeln!(
            out,
            "{} {name:<NAME_WIDTH$} |{bar}|",
            category_marker(row.category)
        );
    }
    out
}

/// Hour labels aligned with the cell boundaries, thinned out so that
/// neighbouring labels never touch.
fn hour_axis(timeline: &Timeline, width: u16) -> String {
    let width = u32::from(width);
    let hours = timeline.window.end_hour() - timeline.window.start_hour();
    let step = (LABEL_SPACING * hours).div_ceil(width).max(1);

    let mut axis: Vec<char> = Vec::new();
    for (index, label) in (0_u32..).zip(&timeline.hours) {
        if index % step != 0 {
            continue;
        }
        let column = usize::try_from(index * width / hours).unwrap_or(usize::MAX);
        if axis.len() > column {
            continue;
        }
        axis.resize(column, ' ');
        axis.extend(label.chars());
    }

    let mut line = " ".repeat(ROW_PREFIX_WIDTH);
    line.extend(axis);
    line.trim_end().to_string()
}

/// Renders the search summary and one line per slot.
pub fn slots(result: &SlotSearchResult, required_count: usize, duration_minutes: u32) -> String {
    let mut out = result.summary(required_count);
    out.push('\n');

    for slot in &result.slots {
        let time = slot.interval(duration_minutes).map_or_else(
            || format_time_of_day(slot.start),
            |interval| interval.to_string(),
        );
        let _ = write!(out, "  {time}");
        if !slot.available_optional.is_empty() {
            let _ = write!(out, "  \u{2713} {}", slot.available_optional.join(", "));
        }
        if !slot.unavailable_optional.is_empty() {
            let _ = write!(out, "  \u{2717} {}", slot.unavailable_optional.join(", "));
        }
        out.push('\n');
    }
    out
}
