use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/* Identifier of one in-flight request */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/* Last-request-wins bookkeeping.
 *
 * Every `issue` supersedes the tickets handed out before it; results that
 * come back with an older ticket are dropped by the caller. Clones share
 * the same counter. */
#[derive(Debug, Clone, Default)]
pub struct LatestRequest {
    current: Arc<AtomicU64>,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }

    /* Supersede every outstanding ticket without starting a new request */
    pub fn cancel(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

/* Issues tickets that never repeat for the life of the sequence. Holders
 * that come and go (one slot dropped, another created under the same key)
 * keep distinct tickets as long as they draw from one sequence. */
#[derive(Debug, Default)]
pub struct TicketSequence {
    last: u64,
}

impl TicketSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.last += 1;
        Ticket(self.last)
    }
}
