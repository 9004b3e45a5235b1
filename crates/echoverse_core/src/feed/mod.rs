//! In-process change feed for push-style re-evaluation.
//!
//! # Responsibility
//! - Let mounted views subscribe to echo changes of one owner.
//! - Deliver `Created`/`Notified` events published by the service layer.
//!
//! # Invariants
//! - Callbacks run outside the registry lock, so a callback may subscribe,
//!   unsubscribe or trigger another evaluation pass.
//! - Subscription ids are never reused within one feed.

use crate::model::echo::{EchoId, OwnerId};
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type SubscriptionId = u64;

type Callback = Arc<dyn Fn(&EchoChange) + Send + Sync>;

/// Echo mutation observed by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoChange {
    Created { owner: OwnerId, echo_id: EchoId },
    Notified { owner: OwnerId, echo_id: EchoId },
}

impl EchoChange {
    pub fn owner(&self) -> OwnerId {
        match self {
            Self::Created { owner, .. } | Self::Notified { owner, .. } => *owner,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Notified { .. } => "notified",
        }
    }
}

#[derive(Default)]
struct FeedState {
    next_id: SubscriptionId,
    subscribers: BTreeMap<SubscriptionId, (OwnerId, Callback)>,
}

/// Subscription registry keyed by owner.
#[derive(Default)]
pub struct ChangeFeed {
    state: Mutex<FeedState>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for changes of `owner`.
    pub fn subscribe(
        &self,
        owner: OwnerId,
        callback: impl Fn(&EchoChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let callback: Callback = Arc::new(callback);
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.subscribers.insert(id, (owner, callback));
        id
    }

    /// Removes one subscription. Returns `false` for unknown ids.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().subscribers.remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Delivers `change` to every subscriber of its owner.
    ///
    /// Returns the number of callbacks invoked.
    pub fn publish(&self, change: EchoChange) -> usize {
        let owner = change.owner();
        let targets = self
            .lock()
            .subscribers
            .values()
            .filter(|(subscribed_owner, _)| *subscribed_owner == owner)
            .map(|(_, callback)| Arc::clone(callback))
            .collect::<Vec<_>>();

        for callback in &targets {
            callback(&change);
        }

        debug!(
            "event=feed_publish module=feed status=ok change={} delivered={}",
            change.kind(),
            targets.len()
        );
        targets.len()
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
