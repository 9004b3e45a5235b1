//! Pure unlock evaluation over echo collections.

use crate::model::echo::Echo;

/// Returns the echoes with `unlock_at <= now_ms`.
///
/// Input order is irrelevant and output order is unspecified; callers sort
/// for their own view.
pub fn unlocked_echoes(echoes: &[Echo], now_ms: i64) -> Vec<&Echo> {
    echoes
        .iter()
        .filter(|echo| echo.is_unlocked(now_ms))
        .collect()
}

/// Returns unlocked echoes whose notification was never acknowledged.
///
/// Ordered by `unlock_at` then `id`, so the first element is the primary
/// alert candidate of a dispatch pass.
pub fn pending_notifications(echoes: &[Echo], now_ms: i64) -> Vec<&Echo> {
    let mut pending = unlocked_echoes(echoes, now_ms)
        .into_iter()
        .filter(|echo| !echo.notification_shown)
        .collect::<Vec<_>>();
    pending.sort_by(|left, right| {
        left.unlock_at
            .cmp(&right.unlock_at)
            .then_with(|| left.id.cmp(&right.id))
    });
    pending
}

/// Returns the earliest `unlock_at` strictly after `now_ms`.
///
/// A view schedules one refresh at this instant instead of polling.
pub fn next_unlock_at(echoes: &[Echo], now_ms: i64) -> Option<i64> {
    echoes
        .iter()
        .map(|echo| echo.unlock_at)
        .filter(|unlock_at| *unlock_at > now_ms)
        .min()
}
