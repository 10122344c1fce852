use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket handed out when a load starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Monotonic generation counter for one logical load operation (e.g.
/// "replace the current flow"). Starting a load supersedes every earlier
/// ticket, so a slow response cannot overwrite a newer one.
#[derive(Debug, Default)]
pub struct LoadSequencer {
    generation: AtomicU64,
}

impl LoadSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Pass `value` through only if `ticket` is still the latest.
    pub fn accept<T>(&self, ticket: LoadTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(
                ticket = ticket.0,
                current = self.generation.load(Ordering::SeqCst),
                "dropping stale load response"
            );
            None
        }
    }
}
