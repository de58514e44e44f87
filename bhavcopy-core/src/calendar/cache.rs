//! Day-scoped cache for exception lists.
//!
//! The published lists rarely change within a day, so repeated resolutions
//! for the same exchange-local date reuse one fetch. An entry is only valid
//! for the date it was fetched for: the first request for any other date
//! refetches, so the cache never carries lists across a day boundary.

use super::trading_day::{ExceptionSets, ExceptionSource};
use crate::data::provider::{DataError, ExceptionListProvider};
use chrono::NaiveDate;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

#[derive(Debug)]
struct Entry {
    as_of: NaiveDate,
    sets: ExceptionSets,
}

/// Wraps a provider and remembers the last fetched sets for one date.
#[derive(Debug)]
pub struct CachedExceptionLists<P> {
    inner: P,
    slot: Mutex<Option<Entry>>,
}

impl<P: ExceptionListProvider> CachedExceptionLists<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            slot: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Date the cached entry was fetched for, if any.
    pub fn cached_for(&self) -> Option<NaiveDate> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|e| e.as_of)
    }

    /// Drop the cached entry; the next request fetches again.
    pub fn invalidate(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<P: ExceptionListProvider> ExceptionSource for CachedExceptionLists<P> {
    fn exception_sets(&self, as_of: NaiveDate) -> Result<ExceptionSets, DataError> {
        // Held across the fetch so concurrent callers share one request.
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = slot.as_ref().filter(|e| e.as_of == as_of) {
            debug!(%as_of, provider = self.inner.name(), "exception lists served from cache");
            return Ok(entry.sets.clone());
        }

        let sets = ExceptionSets::fetch(&self.inner)?;
        *slot = Some(Entry {
            as_of,
            sets: sets.clone(),
        });
        Ok(sets)
    }
}
