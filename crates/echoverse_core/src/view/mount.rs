//! Mount lifecycle for views that display echoes.
//!
//! # Responsibility
//! - Hand out one cancellation token per view mount.
//! - Compute the single follow-up refresh a mounted view should schedule.
//!
//! # Invariants
//! - A cancelled token never becomes active again.
//! - Refresh plans only point at future unlock instants.

use crate::model::echo::Echo;
use crate::unlock::evaluator::next_unlock_at;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Page surfaces that run unlock evaluation when they mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewSurface {
    Dashboard,
    Navbar,
    Timeline,
}

impl ViewSurface {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Navbar => "navbar",
            Self::Timeline => "timeline",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Some(Self::Dashboard),
            "navbar" => Some(Self::Navbar),
            "timeline" => Some(Self::Timeline),
            _ => None,
        }
    }
}

/// Cancellation handle tied to one mounted view.
///
/// Clones share state, so the UI thread can cancel while a dispatch pass
/// runs elsewhere.
#[derive(Debug, Clone)]
pub struct MountToken {
    id: Uuid,
    surface: ViewSurface,
    cancelled: Arc<AtomicBool>,
}

impl MountToken {
    pub fn new(surface: ViewSurface) -> Self {
        Self {
            id: Uuid::new_v4(),
            surface,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn surface(&self) -> ViewSurface {
        self.surface
    }

    /// Marks the view as torn down. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Follow-up evaluation a mounted view should schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshPlan {
    /// Epoch ms of the next unlock, `None` when nothing is left locked.
    pub next_refresh_at: Option<i64>,
}

impl RefreshPlan {
    pub fn after(echoes: &[Echo], now_ms: i64) -> Self {
        Self {
            next_refresh_at: next_unlock_at(echoes, now_ms),
        }
    }

    /// Milliseconds to wait from `now_ms`, clamped at zero.
    pub fn delay_ms(&self, now_ms: i64) -> Option<u64> {
        self.next_refresh_at
            .map(|at| u64::try_from(at.saturating_sub(now_ms)).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::{MountToken, RefreshPlan, ViewSurface};

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = MountToken::new(ViewSurface::Navbar);
        let ui_side = token.clone();
        assert!(!token.is_cancelled());

        ui_side.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.id(), ui_side.id());
    }

    #[test]
    fn surface_parse_accepts_known_names() {
        assert_eq!(ViewSurface::parse(" Timeline "), Some(ViewSurface::Timeline));
        assert_eq!(ViewSurface::parse("settings"), None);
    }

    #[test]
    fn delay_is_clamped() {
        let plan = RefreshPlan {
            next_refresh_at: Some(100),
        };
        assert_eq!(plan.delay_ms(40), Some(60));
        assert_eq!(plan.delay_ms(140), Some(0));
    }
}
