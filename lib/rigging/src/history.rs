//! Record of completed calls.

use parking_lot::Mutex;
use serde_json::Value;

use crate::{Error, Response, Result};

/// Decoded responses of the calls a service completed, oldest first.
///
/// Each entry keeps its originating request.
#[derive(Debug, Default)]
pub struct History {
    entries: Mutex<Vec<Response<Value>>>,
}

impl History {
    /// An empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, response: Response<Value>) {
        self.entries.lock().push(response);
    }

    /// The newest entry.
    ///
    /// # Errors
    ///
    /// [`Error::NoRequestsInHistory`] when nothing was recorded.
    pub fn last(&self) -> Result<Response<Value>> {
        self.entries.lock().last().cloned().ok_or(Error::NoRequestsInHistory)
    }

    /// Snapshot of all entries.
    #[must_use]
    pub fn entries(&self) -> Vec<Response<Value>> {
        self.entries.lock().clone()
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
