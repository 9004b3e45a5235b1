//! Per-owner unlock notification preferences.

use crate::model::echo::OwnerId;
use serde::{Deserialize, Serialize};

/// Settings-page toggles that affect unlock dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockPreferences {
    pub owner: OwnerId,
    /// When `false`, eligible echoes are acknowledged without an alert.
    pub unlock_notifications: bool,
}

impl UnlockPreferences {
    /// Defaults applied when the owner never saved settings.
    pub fn defaults_for(owner: OwnerId) -> Self {
        Self {
            owner,
            unlock_notifications: true,
        }
    }
}
