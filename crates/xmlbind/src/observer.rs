//! Field access instrumentation.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use indexmap::IndexSet;

use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

/// Notified on every scalar field read and write.
pub trait PropertyObserver: fmt::Debug + Send + Sync {
    fn on_access(&self, schema: &'static str, field: &'static str, access: Access);
}

/// Records which fields were touched, so a test suite can report the
/// declared fields it never exercised.
#[derive(Debug, Default)]
pub struct TrackingObserver {
    seen: Mutex<IndexSet<(&'static str, &'static str)>>,
}

impl TrackingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(schema, field)` pairs in first-touched order.
    pub fn seen(&self) -> Vec<(&'static str, &'static str)> {
        self.lock().iter().copied().collect()
    }

    pub fn was_seen(&self, schema: &str, field: &str) -> bool {
        self.lock().iter().any(|(s, f)| *s == schema && *f == field)
    }

    /// Scalar fields of every schema cached in `registry` that were never
    /// read or written.
    pub fn unseen(&self, registry: &Registry) -> Vec<(&'static str, &'static str)> {
        let seen = self.lock();
        let mut out = Vec::new();
        for info in registry.schemas() {
            for (field, _) in info.properties() {
                let key = (info.type_name(), field);
                if !seen.contains(&key) {
                    out.push(key);
                }
            }
        }
        out.sort_unstable();
        out
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexSet<(&'static str, &'static str)>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PropertyObserver for TrackingObserver {
    fn on_access(&self, schema: &'static str, field: &'static str, _access: Access) {
        self.lock().insert((schema, field));
    }
}
