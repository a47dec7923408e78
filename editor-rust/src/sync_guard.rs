use std::time::Duration;
use tokio::time::Instant;

/// Whether a store-originated value should be mirrored into local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDecision {
    Apply,
    /// The value echoes our own recent write.
    Skip,
}

/// Breaks write -> notify -> write loops between a local mirror and a shared
/// store.
///
/// A remote value is skipped when it arrives within `window` of the last
/// local write and equals what was written. Anything else is applied.
#[derive(Debug, Clone)]
pub struct SyncGuard<T> {
    value: Option<T>,
    last_local_write: Option<Instant>,
    window: Duration,
}

impl<T> SyncGuard<T>
where
    T: PartialEq + Clone,
{
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            value: None,
            last_local_write: None,
            window,
        }
    }

    pub fn record_local_write(&mut self, value: T, at: Instant) {
        self.value = Some(value);
        self.last_local_write = Some(at);
    }

    pub fn on_remote(&mut self, value: &T, at: Instant) -> RemoteDecision {
        if let (Some(local), Some(written_at)) = (&self.value, self.last_local_write) {
            if at.saturating_duration_since(written_at) < self.window && local == value {
                return RemoteDecision::Skip;
            }
        }
        self.value = Some(value.clone());
        RemoteDecision::Apply
    }

    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}
