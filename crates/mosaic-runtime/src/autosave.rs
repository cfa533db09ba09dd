#![forbid(unsafe_code)]

//! Quiet-period autosave.
//!
//! [`AutosaveScheduler`] watches the store version. After the configured
//! delay with no further change, [`AutosaveScheduler::poll`] hands out one
//! [`LayoutPayload`] snapshot for the external publisher. A burst of edits
//! yields a single snapshot.

use std::time::Duration;

use mosaic_layout::LayoutPayload;
use tracing::debug;

use crate::debounce::Debouncer;
use crate::store::ItemStore;

#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    debouncer: Debouncer,
    seen_version: u64,
}

impl AutosaveScheduler {
    /// Start watching `store`; its current state counts as saved.
    #[must_use]
    pub fn new(store: &ItemStore, delay: Duration) -> Self {
        Self {
            debouncer: Debouncer::trailing(delay),
            seen_version: store.version(),
        }
    }

    /// Whether a change is waiting for its quiet period to pass.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Record a change if the store moved since the last look.
    pub fn observe(&mut self, store: &ItemStore, now: Duration) {
        let version = store.version();
        if version != self.seen_version {
            self.seen_version = version;
            self.debouncer.schedule(now);
        }
    }

    /// Snapshot to publish, once the quiet period after the last change has
    /// elapsed.
    pub fn poll(&mut self, store: &ItemStore, now: Duration) -> Option<LayoutPayload> {
        self.observe(store, now);
        if !self.debouncer.poll(now) {
            return None;
        }
        let payload = store.snapshot();
        debug!(
            items = payload.items.len(),
            version = self.seen_version,
            "autosave snapshot ready"
        );
        Some(payload)
    }

    /// Snapshot any pending change immediately (e.g. on page hide).
    pub fn flush(&mut self, store: &ItemStore) -> Option<LayoutPayload> {
        let version = store.version();
        let dirty = self.debouncer.cancel() || version != self.seen_version;
        self.seen_version = version;
        dirty.then(|| store.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_layout::RawItem;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn burst_of_changes_yields_one_snapshot() {
        let store = ItemStore::new(10);
        let mut autosave = AutosaveScheduler::new(&store, ms(2000));
        assert!(autosave.poll(&store, ms(0)).is_none());

        store.add_item(RawItem::sized("a", 1, 1));
        assert!(autosave.poll(&store, ms(100)).is_none());
        store.add_item(RawItem::sized("b", 1, 1));
        assert!(autosave.poll(&store, ms(1500)).is_none());
        assert!(autosave.poll(&store, ms(3000)).is_none());

        let payload = autosave.poll(&store, ms(3500)).expect("snapshot");
        assert_eq!(payload.items.len(), 2);
        assert!(autosave.poll(&store, ms(9000)).is_none());
    }

    #[test]
    fn flush_only_reports_unsaved_changes() {
        let store = ItemStore::new(10);
        let mut autosave = AutosaveScheduler::new(&store, ms(2000));
        assert!(autosave.flush(&store).is_none());
        store.add_item(RawItem::sized("a", 1, 1));
        assert!(autosave.flush(&store).is_some());
        assert!(!autosave.is_pending());
        assert!(autosave.flush(&store).is_none());
    }
}
