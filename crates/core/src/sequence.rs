//! Request sequence tickets.
//!
//! Debounced search fires overlapping requests whose responses can resolve
//! out of order. Each request takes a [`Ticket`] from the
//! [`RequestSequence`] of its page; when the response is ready it is only
//! delivered if no later ticket has been issued since. Anything older is
//! superseded.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Largest client sequence number accepted as-is. Browsers count in
/// doubles, so nothing legitimate goes past 2^53.
pub const MAX_CLIENT_SEQ: u64 = 1 << 53;

/// Monotonic request counter for one page's search box.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

/// A request's position in its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl RequestSequence {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Issue the next ticket. Saturates at `u64::MAX`.
    pub fn begin(&self) -> Ticket {
        let previous = self
            .latest
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_add(1))
            })
            .unwrap_or_else(|n| n);
        Ticket(previous.saturating_add(1))
    }

    /// Register a sequence number chosen by the client, clamped to
    /// [`MAX_CLIENT_SEQ`].
    ///
    /// A number lower than one already seen fails [`Self::is_current`]; a
    /// number equal to the latest one passes.
    pub fn observe(&self, client_seq: u64) -> Ticket {
        let seq = client_seq.min(MAX_CLIENT_SEQ);
        self.latest.fetch_max(seq, Ordering::AcqRel);
        Ticket(seq)
    }

    /// Whether `ticket` is still the newest request.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// The newest ticket issued so far.
    #[must_use]
    pub fn latest(&self) -> Ticket {
        Ticket(self.latest.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_ticket_supersedes_earlier() {
        let seq = RequestSequence::new();
        let first = seq.begin();
        let second = seq.begin();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        assert!(first < second);
    }

    #[test]
    fn test_out_of_order_client_numbers() {
        let seq = RequestSequence::new();
        let newer = seq.observe(5);
        let older = seq.observe(3);
        assert!(seq.is_current(newer));
        assert!(!seq.is_current(older));
        assert_eq!(seq.latest().value(), 5);

        // Server-issued tickets continue after the highest client number.
        assert_eq!(seq.begin().value(), 6);
    }

    #[test]
    fn test_repeated_client_number_stays_current() {
        let seq = RequestSequence::new();
        seq.observe(4);
        assert!(seq.is_current(seq.observe(4)));
    }

    #[test]
    fn test_huge_client_number_is_clamped_and_begin_does_not_overflow() {
        let seq = RequestSequence::new();
        let clamped = seq.observe(u64::MAX);
        assert_eq!(clamped.value(), MAX_CLIENT_SEQ);
        assert_eq!(seq.begin().value(), MAX_CLIENT_SEQ + 1);

        let saturated = RequestSequence {
            latest: AtomicU64::new(u64::MAX),
        };
        assert_eq!(saturated.begin().value(), u64::MAX);
        assert!(saturated.is_current(saturated.begin()));
    }

    #[test]
    fn test_concurrent_begin_issues_unique_tickets() {
        let seq = std::sync::Arc::new(RequestSequence::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = std::sync::Arc::clone(&seq);
                std::thread::spawn(move || (0..100).map(|_| seq.begin().value()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_default())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 800);
        assert_eq!(seq.latest().value(), 800);
    }
}
