//! Alert payloads and the sink seam towards the UI.

use crate::model::echo::{Echo, EchoId};
use serde::Serialize;

/// User-facing unlock alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlockAlert {
    pub echo_id: EchoId,
    pub title: String,
    pub unlock_at: i64,
    /// Other echoes acknowledged by the same pass without their own alert.
    pub also_unlocked: usize,
}

impl UnlockAlert {
    pub(crate) fn for_primary(primary: &Echo, also_unlocked: usize) -> Self {
        Self {
            echo_id: primary.id,
            title: primary.title.clone(),
            unlock_at: primary.unlock_at,
            also_unlocked,
        }
    }

    /// Human-readable toast text.
    pub fn message(&self) -> String {
        match self.also_unlocked {
            0 => format!("Your echo \"{}\" is now unlocked.", self.title),
            1 => format!(
                "Your echo \"{}\" and 1 more echo are now unlocked.",
                self.title
            ),
            more => format!(
                "Your echo \"{}\" and {more} more echoes are now unlocked.",
                self.title
            ),
        }
    }
}

/// Destination of unlock alerts (toast layer, stdout, test recorder).
pub trait AlertSink {
    fn emit(&mut self, alert: &UnlockAlert);
}

/// Sink that keeps emitted alerts in memory.
///
/// Used by the FFI layer to hand alerts back to the host in the mount
/// response.
#[derive(Debug, Default)]
pub struct CollectingSink {
    alerts: Vec<UnlockAlert>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> &[UnlockAlert] {
        &self.alerts
    }

    pub fn into_alerts(self) -> Vec<UnlockAlert> {
        self.alerts
    }
}

impl AlertSink for CollectingSink {
    fn emit(&mut self, alert: &UnlockAlert) {
        self.alerts.push(alert.clone());
    }
}
