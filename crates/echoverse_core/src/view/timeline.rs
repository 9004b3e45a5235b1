//! Timeline projection: search, mood filter and month grouping.
//!
//! # Invariants
//! - Search is a case-insensitive substring match on the title.
//! - Mood filter is an exact match on the normalized mood.
//! - Groups are keyed by the calendar month of `created_at` in the caller's
//!   UTC offset, newest month first.

use crate::model::echo::{normalize_mood, Echo};
use crate::view::card::EchoCard;
use chrono::{DateTime, Datelike, FixedOffset, Offset, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Timeline filter options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineQuery {
    pub search: Option<String>,
    pub mood: Option<String>,
    /// Caller's UTC offset used for month bucketing; clamped to +/-14h.
    pub utc_offset_minutes: i32,
}

/// One month bucket of the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineGroup {
    /// Display label, e.g. `May 2025`.
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub echoes: Vec<EchoCard>,
}

/// Filters and groups echoes for the timeline list view.
pub fn build_timeline(echoes: &[Echo], query: &TimelineQuery, now_ms: i64) -> Vec<TimelineGroup> {
    let offset = resolve_offset(query.utc_offset_minutes);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase);
    let mood = query
        .mood
        .as_deref()
        .map(normalize_mood)
        .filter(|value| !value.is_empty());

    let mut buckets: BTreeMap<(i32, u32), Vec<EchoCard>> = BTreeMap::new();
    for echo in echoes {
        if let Some(needle) = search.as_deref() {
            if !echo.title.to_lowercase().contains(needle) {
                continue;
            }
        }
        if let Some(wanted) = mood.as_deref() {
            if echo.mood != wanted {
                continue;
            }
        }

        let local = local_time(echo.created_at, offset);
        buckets
            .entry((local.year(), local.month()))
            .or_default()
            .push(EchoCard::from_echo(echo, now_ms));
    }

    buckets
        .into_iter()
        .rev()
        .map(|((year, month), mut cards)| {
            cards.sort_by(|left, right| {
                right
                    .created_at
                    .cmp(&left.created_at)
                    .then_with(|| left.id.cmp(&right.id))
            });
            TimelineGroup {
                label: month_label(year, month, offset),
                year,
                month,
                echoes: cards,
            }
        })
        .collect()
}

fn resolve_offset(minutes: i32) -> FixedOffset {
    let clamped = minutes.clamp(-MAX_OFFSET_MINUTES, MAX_OFFSET_MINUTES);
    FixedOffset::east_opt(clamped * 60).unwrap_or_else(|| Utc.fix())
}

fn local_time(epoch_ms: i64, offset: FixedOffset) -> DateTime<FixedOffset> {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .unwrap_or_default()
        .with_timezone(&offset)
}

fn month_label(year: i32, month: u32, offset: FixedOffset) -> String {
    offset
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .map(|first_day| first_day.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{year}-{month:02}"))
}

#[cfg(test)]
mod tests {
    use super::{build_timeline, TimelineQuery};
    use crate::model::echo::Echo;
    use uuid::Uuid;

    // 2025-05-11T00:00:00Z and 2025-04-15T00:00:00Z
    const MAY_11: i64 = 1_746_921_600_000;
    const APR_15: i64 = 1_744_675_200_000;

    #[test]
    fn groups_by_month_newest_first() {
        let owner = Uuid::new_v4();
        let echoes = vec![
            Echo::new(owner, "Birthday thoughts", APR_15, APR_15).unwrap(),
            Echo::new(owner, "Letter to myself", MAY_11, MAY_11).unwrap(),
        ];

        let groups = build_timeline(&echoes, &TimelineQuery::default(), MAY_11);
        let labels = groups.iter().map(|g| g.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["May 2025", "April 2025"]);
    }

    #[test]
    fn offset_moves_month_boundary() {
        let owner = Uuid::new_v4();
        // 2025-05-01T02:00:00Z is still April at UTC-05:00.
        let created = 1_746_064_800_000;
        let echoes = vec![Echo::new(owner, "edge", created, created).unwrap()];
        let query = TimelineQuery {
            utc_offset_minutes: -300,
            ..TimelineQuery::default()
        };

        let groups = build_timeline(&echoes, &query, created);
        assert_eq!(groups[0].label, "April 2025");
    }
}
