use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Result of a backend fetch as seen by a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Loading
    }
}

impl<T> Loadable<T> {
    pub fn from_result(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Loadable::Loaded(value),
            Err(err) => Loadable::Failed(format!("{err:#}")),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn as_loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Loadable<U> {
        match self {
            Loadable::Loading => Loadable::Loading,
            Loadable::Loaded(value) => Loadable::Loaded(f(value)),
            Loadable::Failed(message) => Loadable::Failed(message),
        }
    }
}

impl<T> Loadable<Vec<T>> {
    /// List views render failures and pending loads as empty.
    pub fn loaded_or_empty(&self) -> &[T] {
        self.as_loaded().map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

/// Tags in-flight requests so only the most recently issued one may land.
#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Stores `value` into `slot` if `ticket` is still the latest request. Returns whether
    /// it was stored.
    pub fn accept<T>(&self, ticket: RequestTicket, value: Loadable<T>, slot: &mut Loadable<T>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                ticket = ticket.0,
                latest = self.issued.load(Ordering::SeqCst),
                "discarding stale response"
            );
            return false;
        }
        *slot = value;
        true
    }
}
