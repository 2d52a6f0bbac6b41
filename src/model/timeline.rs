//! Storyline grouping for the timeline view.
//!
//! Dates are free text. Events whose date reads as a calendar date sort
//! chronologically and come first; the rest sort lexically after them.
//! Sorting is stable, so equal dates keep their stored order.

use std::cmp::Ordering;

use super::document::Event;

/// Events sharing one era, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct EraGroup<'a> {
    pub era: &'a str,
    pub events: Vec<&'a Event>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum DateKey<'a> {
    Calendar(i32, u32, u32),
    Text(&'a str),
}

fn date_key(date: &str) -> DateKey<'_> {
    match parse_date(date) {
        Some((y, m, d)) => DateKey::Calendar(y, m, d),
        None => DateKey::Text(date),
    }
}

/// Best-effort parse of `YYYY`, `YYYY-MM`, `YYYY-MM-DD` (also `/` or `.`
/// separated) and `YYYY年 MM月 DD日`.
pub fn parse_date(date: &str) -> Option<(i32, u32, u32)> {
    let normalized: String = date
        .trim()
        .chars()
        .map(|c| match c {
            '年' | '月' | '/' | '.' => '-',
            '日' => ' ',
            c => c,
        })
        .collect();
    let parts: Vec<&str> = normalized
        .split(|c: char| c == '-' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let year: i32 = parts[0].parse().ok()?;
    let month: u32 = match parts.get(1) {
        Some(m) => m.parse().ok()?,
        None => 1,
    };
    let day: u32 = match parts.get(2) {
        Some(d) => d.parse().ok()?,
        None => 1,
    };
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some((year, month, day))
}

fn compare_dates(a: &str, b: &str) -> Ordering {
    date_key(a).cmp(&date_key(b))
}

/// Groups the storyline by era. Events are sorted by date within and across
/// groups; groups are ordered by their earliest event.
pub fn group_by_era(storyline: &[Event]) -> Vec<EraGroup<'_>> {
    let mut sorted: Vec<&Event> = storyline.iter().collect();
    sorted.sort_by(|a, b| compare_dates(&a.date, &b.date));

    let mut groups: Vec<EraGroup<'_>> = Vec::new();
    for event in sorted {
        match groups.iter_mut().find(|g| g.era == event.era) {
            Some(group) => group.events.push(event),
            None => groups.push(EraGroup {
                era: &event.era,
                events: vec![event],
            }),
        }
    }
    // Groups were created in order of their earliest event already.
    groups
}
