//! Echo card projection used by the dashboard and timeline lists.

use crate::model::echo::{Echo, EchoId};
use serde::Serialize;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const DAYS_PER_MONTH: i64 = 30;

/// Render-ready echo row with derived lock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EchoCard {
    pub id: EchoId,
    pub title: String,
    pub mood: String,
    pub created_at: i64,
    pub unlock_at: i64,
    pub audio_duration_secs: u32,
    pub unlocked: bool,
    /// Remaining time label, only set while locked.
    pub countdown: Option<String>,
}

impl EchoCard {
    pub fn from_echo(echo: &Echo, now_ms: i64) -> Self {
        Self {
            id: echo.id,
            title: echo.title.clone(),
            mood: echo.mood.clone(),
            created_at: echo.created_at,
            unlock_at: echo.unlock_at,
            audio_duration_secs: echo.audio_duration_secs,
            unlocked: echo.is_unlocked(now_ms),
            countdown: time_until_unlock(echo.unlock_at, now_ms),
        }
    }
}

/// Builds "All Echoes" cards, newest `created_at` first.
pub fn dashboard_cards(echoes: &[Echo], now_ms: i64) -> Vec<EchoCard> {
    let mut cards = echoes
        .iter()
        .map(|echo| EchoCard::from_echo(echo, now_ms))
        .collect::<Vec<_>>();
    cards.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| left.id.cmp(&right.id))
    });
    cards
}

/// Formats the remaining lock time as `N day(s)` or `N month(s)`.
///
/// Days are rounded up; more than 30 remaining days switch to whole
/// 30-day months. Returns `None` once the echo is unlocked.
pub fn time_until_unlock(unlock_at: i64, now_ms: i64) -> Option<String> {
    if now_ms >= unlock_at {
        return None;
    }

    let remaining = unlock_at - now_ms;
    let days = (remaining + DAY_MS - 1) / DAY_MS;
    if days > DAYS_PER_MONTH {
        let months = days / DAYS_PER_MONTH;
        return Some(format!("{months} month{}", plural(months)));
    }
    Some(format!("{days} day{}", plural(days)))
}

fn plural(count: i64) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}
