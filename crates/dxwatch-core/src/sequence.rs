// ── Request sequencing ──
//
// Monotonic tickets for "fire a request, apply whenever it resolves"
// flows. Only the most recently issued ticket may write to a store; an
// older response that resolves late is dropped by the caller.

use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket issued by [`RequestSequencer::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Issues tickets for one logical operation (e.g. "fetch device status").
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request; supersedes every ticket issued before.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` is still the newest one issued.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }
}

/// Outcome of an orchestrated fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied<T> {
    /// The response was written to the store.
    Fresh(T),
    /// A newer request was issued meanwhile; the response was discarded.
    Stale,
}

impl<T> Applied<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    pub fn fresh(self) -> Option<T> {
        match self {
            Self::Fresh(value) => Some(value),
            Self::Stale => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Applied<U> {
        match self {
            Self::Fresh(value) => Applied::Fresh(f(value)),
            Self::Stale => Applied::Stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_ticket_wins() {
        let seq = RequestSequencer::new();
        let first = seq.begin();
        assert!(seq.is_current(first));

        let second = seq.begin();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        assert!(second > first);
    }

    #[test]
    fn applied_helpers() {
        assert_eq!(Applied::Fresh(2).map(|v| v * 2).fresh(), Some(4));
        assert!(Applied::<u8>::Stale.is_stale());
        assert_eq!(Applied::<u8>::Stale.fresh(), None);
    }
}
