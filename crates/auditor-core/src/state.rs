//! UI-agnostic submission bookkeeping
//!
//! Several submissions may be in flight at once and can finish in any order.
//! Every submission takes a [`Ticket`]; a finished result is applied only if
//! its ticket is still the newest one handed out.

/// Sequence number of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn number(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct SubmissionSequence {
    latest: u64,
    applied: u64,
}

impl SubmissionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new submission, superseding all earlier ones.
    pub fn begin(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    /// Mark `ticket` as applied if it is current. Returns whether it was.
    pub fn complete(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.applied = ticket.0;
        true
    }

    /// Whether the newest submission has not produced a result yet.
    pub fn is_pending(&self) -> bool {
        self.applied < self.latest
    }
}
