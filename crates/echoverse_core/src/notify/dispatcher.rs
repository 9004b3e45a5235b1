//! Notification dispatcher.
//!
//! # Responsibility
//! - Pick the primary echo of a pass and emit a single alert for it.
//! - Acknowledge every pending echo of the pass in the store.
//!
//! # Invariants
//! - Emit first, persist second: a failed write keeps `notification_shown`
//!   false and the next pass alerts again.
//! - A cancelled mount suppresses the alert but not the writes.
//! - Write failures are logged and returned, never swallowed.

use crate::model::echo::{Echo, EchoId};
use crate::notify::alert::{AlertSink, UnlockAlert};
use crate::repo::echo_repo::EchoStore;
use crate::view::mount::MountToken;
use log::{info, warn};
use serde::Serialize;

/// Why a pass with pending echoes produced no alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// The view unmounted before emission.
    Cancelled,
    /// The owner turned unlock notifications off.
    Disabled,
}

/// Failed acknowledgment of one echo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AckFailure {
    pub echo_id: EchoId,
    pub error: String,
}

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub alert: Option<UnlockAlert>,
    pub suppressed: Option<SuppressReason>,
    /// Echoes whose acknowledgment reached the store.
    pub acknowledged: Vec<EchoId>,
    /// Echoes that stay eligible because the write failed.
    pub failed: Vec<AckFailure>,
}

impl DispatchReport {
    pub fn is_noop(&self) -> bool {
        self.alert.is_none()
            && self.suppressed.is_none()
            && self.acknowledged.is_empty()
            && self.failed.is_empty()
    }
}

/// Emits unlock alerts and persists acknowledgments through an `EchoStore`.
pub struct NotificationDispatcher<S: EchoStore> {
    store: S,
}

impl<S: EchoStore> NotificationDispatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Runs one dispatch pass over `pending`.
    ///
    /// `pending` is expected to come from
    /// [`pending_notifications`](crate::unlock::evaluator::pending_notifications);
    /// acknowledged or still-locked entries are skipped, so repeated
    /// triggers stay no-ops.
    ///
    /// # Contract
    /// - At most one alert reaches `sink`.
    /// - Every eligible echo gets one `mark_notified` attempt.
    pub fn dispatch(
        &self,
        pending: &[&Echo],
        now_ms: i64,
        alerts_enabled: bool,
        token: &MountToken,
        sink: &mut dyn AlertSink,
    ) -> DispatchReport {
        let mut eligible = pending
            .iter()
            .copied()
            .filter(|echo| echo.is_unlocked(now_ms) && !echo.notification_shown)
            .collect::<Vec<_>>();
        if eligible.is_empty() {
            return DispatchReport::default();
        }
        eligible.sort_by(|left, right| {
            left.unlock_at
                .cmp(&right.unlock_at)
                .then_with(|| left.id.cmp(&right.id))
        });

        let mut report = DispatchReport::default();
        let primary = eligible[0];

        if !alerts_enabled {
            report.suppressed = Some(SuppressReason::Disabled);
        } else if token.is_cancelled() {
            report.suppressed = Some(SuppressReason::Cancelled);
        } else {
            let alert = UnlockAlert::for_primary(primary, eligible.len() - 1);
            sink.emit(&alert);
            report.alert = Some(alert);
        }

        for echo in &eligible {
            match self.store.mark_notified(echo.id, now_ms) {
                Ok(()) => report.acknowledged.push(echo.id),
                Err(err) => {
                    warn!(
                        "event=unlock_ack module=notify status=error echo_id={} error={}",
                        echo.id, err
                    );
                    report.failed.push(AckFailure {
                        echo_id: echo.id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            "event=unlock_dispatch module=notify status={} view={} eligible={} acknowledged={} failed={} alert={}",
            if report.failed.is_empty() { "ok" } else { "partial" },
            token.surface().as_str(),
            eligible.len(),
            report.acknowledged.len(),
            report.failed.len(),
            alert_label(&report)
        );
        report
    }
}

fn alert_label(report: &DispatchReport) -> &'static str {
    match (&report.alert, report.suppressed) {
        (Some(_), _) => "shown",
        (None, Some(SuppressReason::Cancelled)) => "suppressed_cancelled",
        (None, Some(SuppressReason::Disabled)) => "suppressed_disabled",
        (None, None) => "none",
    }
}
