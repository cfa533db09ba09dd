#![forbid(unsafe_code)]

//! Canonical item collection with synchronous change notification.
//!
//! # Design
//!
//! [`ItemStore`] wraps the collection in shared, reference-counted storage
//! (`Rc<RefCell<..>>`). Cloning the store clones the handle, not the items.
//! Every mutating operation that changes something bumps the version and
//! notifies all live subscribers before returning.
//!
//! Subscribers receive a snapshot slice. The store never holds its borrow
//! while a callback runs, so callbacks may read from or write to the store.
//! A write from inside a callback is delivered in a follow-up round once the
//! current round has reached every subscriber.
//!
//! # Batching
//!
//! [`ItemStore::batch`] (or a [`StoreBatch`] guard) defers notification until
//! the outermost scope ends, then fires at most once. Nested scopes are
//! supported.
//!
//! # Failure Modes
//!
//! - **Held item borrow**: [`ItemStore::find_item`] returns a `Ref` into the
//!   store. Mutating the store while that `Ref` is alive panics (RefCell
//!   borrow rules). Drop it before mutating.
//! - **Subscriber leak**: callbacks stay registered while their
//!   [`Subscription`] guard lives. Dead entries are pruned on notify.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use mosaic_core::{GridRect, MAX_ROW};
use mosaic_layout::{
    IdAllocator, Item, ItemId, ItemPatch, LayoutPayload, PositionPatch, PositionUpdate, RawItem,
    compact, first_available_slot, normalize_all, normalize_item, reflow,
};
use rustc_hash::FxHashSet;
use tracing::{debug, info_span, trace, warn};
use web_time::Instant;

type ListenerRc = Rc<dyn Fn(&[Item])>;
type ListenerWeak = Weak<dyn Fn(&[Item])>;

struct StoreInner {
    items: Vec<Item>,
    columns: u32,
    ids: IdAllocator,
    version: u64,
    notifications: u64,
    subscribers: Vec<ListenerWeak>,
    batch_depth: u32,
    batch_dirty: bool,
    notifying: bool,
    renotify: bool,
}

/// Shared handle to the item collection.
///
/// # Invariants
///
/// 1. Every item fits the current column count.
/// 2. `version` increments by exactly 1 on each notifying mutation.
/// 3. Subscribers are notified in registration order.
/// 4. Within a batch, reads see the latest state; only notification waits.
pub struct ItemStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl Clone for ItemStore {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ItemStore")
            .field("items", &inner.items.len())
            .field("columns", &inner.columns)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl ItemStore {
    /// Create an empty store for a `columns`-wide grid (at least 1).
    #[must_use]
    pub fn new(columns: u32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                items: Vec::new(),
                columns: columns.max(1),
                ids: IdAllocator::new(),
                version: 0,
                notifications: 0,
                subscribers: Vec::new(),
                batch_depth: 0,
                batch_dirty: false,
                notifying: false,
                renotify: false,
            })),
        }
    }

    /// Whether two handles share the same collection.
    #[must_use]
    pub fn ptr_eq(&self, other: &ItemStore) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn columns(&self) -> u32 {
        self.inner.borrow().columns
    }

    /// Number of notifying mutations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of notification rounds actually delivered.
    #[must_use]
    pub fn notification_count(&self) -> u64 {
        self.inner.borrow().notifications
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    // --- Reads -------------------------------------------------------------

    /// Copies of every item in canonical order.
    #[must_use]
    pub fn get_items(&self) -> Vec<Item> {
        self.inner.borrow().items.clone()
    }

    /// Borrow the collection without copying.
    pub fn with_items<R>(&self, f: impl FnOnce(&[Item]) -> R) -> R {
        f(&self.inner.borrow().items)
    }

    /// Live reference to one item, for read-only algorithm use.
    ///
    /// The returned `Ref` must be dropped before the store is mutated.
    #[must_use]
    pub fn find_item(&self, id: &ItemId) -> Option<Ref<'_, Item>> {
        Ref::filter_map(self.inner.borrow(), |inner| {
            inner.items.iter().find(|item| &item.id == id)
        })
        .ok()
    }

    /// Copy of one item's rectangle.
    #[must_use]
    pub fn rect_of(&self, id: &ItemId) -> Option<GridRect> {
        self.find_item(id).map(|item| item.rect)
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.find_item(id).is_some()
    }

    /// Publish form of the current collection.
    #[must_use]
    pub fn snapshot(&self) -> LayoutPayload {
        self.with_items(LayoutPayload::from_items)
    }

    /// First free `w x h` slot. Nothing is mutated.
    #[must_use]
    pub fn first_available_slot(&self, w: u32, h: u32) -> GridRect {
        let inner = self.inner.borrow();
        first_available_slot(&inner.items, inner.columns, w, h)
    }

    // --- Subscriptions -----------------------------------------------------

    /// Register `callback`. It runs once immediately with the current items,
    /// then after every notification.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&[Item]) + 'static) -> Subscription {
        let strong: ListenerRc = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        let items = self.get_items();
        strong(&items);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    // --- Mutations ---------------------------------------------------------

    /// Replace the whole collection.
    ///
    /// Each raw item is normalized, then the collection is reflowed so the
    /// result is packed. `None` keeps the previous state and does not notify.
    pub fn load_state(&self, payload: Option<LayoutPayload>) -> bool {
        let Some(payload) = payload else {
            debug!("load_state called without payload; keeping previous state");
            return false;
        };
        {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;
            let mut items = normalize_all(payload.items, inner.columns, &mut inner.ids);
            let updates = reflow(&items, inner.columns, None);
            apply_updates(&mut items, &updates, inner.columns);
            debug!(
                items = items.len(),
                repositioned = updates.len(),
                "layout loaded"
            );
            inner.items = items;
            inner.version += 1;
        }
        self.emit();
        true
    }

    /// Parse and load a JSON payload. On a parse error the previous state is
    /// kept and the error is logged.
    pub fn load_state_json(&self, json: &str) -> bool {
        match LayoutPayload::from_json_str(json) {
            Ok(payload) => self.load_state(Some(payload)),
            Err(error) => {
                warn!(%error, "ignoring malformed layout payload");
                false
            }
        }
    }

    /// Merge `patch` into the item with `id`.
    ///
    /// Returns `false` if no such item exists.
    pub fn update_item(&self, id: &ItemId, patch: ItemPatch) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            let columns = inner.columns;
            let Some(item) = inner.items.iter_mut().find(|item| &item.id == id) else {
                trace!(%id, "update_item: unknown id");
                return false;
            };
            item.apply_patch(patch, columns);
            inner.version += 1;
        }
        self.emit();
        true
    }

    /// Normalize and append one item; returns the stored copy.
    ///
    /// If the normalized rectangle collides with an existing item, the new
    /// item goes to the first available slot instead.
    pub fn add_item(&self, raw: RawItem) -> Item {
        let added = {
            let mut inner = self.inner.borrow_mut();
            let inner = &mut *inner;
            let mut taken = ids_of(&inner.items);
            let mut item = normalize_item(
                raw,
                inner.items.len(),
                inner.columns,
                &mut inner.ids,
                &mut taken,
            );
            if inner
                .items
                .iter()
                .any(|other| other.rect.intersects(&item.rect))
            {
                item.rect = first_available_slot(
                    &inner.items,
                    inner.columns,
                    item.rect.w,
                    item.rect.h,
                );
            }
            inner.items.push(item.clone());
            inner.version += 1;
            item
        };
        self.emit();
        added
    }

    /// Remove the item with `id`. Notifies only if something was removed.
    pub fn delete_item(&self, id: &ItemId) -> bool {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.items.len();
            inner.items.retain(|item| &item.id != id);
            let removed = inner.items.len() != before;
            if removed {
                inner.version += 1;
            }
            removed
        };
        if removed {
            self.emit();
        }
        removed
    }

    /// Position/size-only update. Absent fields are left untouched;
    /// coordinates are floored at 0 and the result is kept on-grid.
    pub fn move_item(&self, id: &ItemId, patch: PositionPatch) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            let columns = inner.columns;
            let Some(item) = inner.items.iter_mut().find(|item| &item.id == id) else {
                trace!(%id, "move_item: unknown id");
                return false;
            };
            item.rect = patch.apply_to(item.rect, columns);
            inner.version += 1;
        }
        self.emit();
        true
    }

    /// Apply many position changes with a single notification.
    ///
    /// Returns how many items actually moved; nothing is notified if none did.
    pub fn apply_position_updates(&self, updates: &[PositionUpdate]) -> usize {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let columns = inner.columns;
            let changed = apply_updates(&mut inner.items, updates, columns);
            if changed > 0 {
                inner.version += 1;
            }
            changed
        };
        if changed > 0 {
            debug!(changed, "position updates applied");
            self.emit();
        }
        changed
    }

    /// Move every item down by `rows`. Used before inserting at the top.
    pub fn shift_all_rows_down(&self, rows: u32) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if rows == 0 || inner.items.is_empty() {
                return false;
            }
            for item in &mut inner.items {
                item.rect.y = item.rect.y.saturating_add(rows).min(MAX_ROW);
            }
            inner.version += 1;
        }
        self.emit();
        true
    }

    /// Change the column count, re-clamp every item, and reflow.
    ///
    /// Notifies once. Returns `false` if the count did not change.
    pub fn set_columns(&self, columns: u32) -> bool {
        let columns = columns.max(1);
        {
            let mut inner = self.inner.borrow_mut();
            if inner.columns == columns {
                return false;
            }
            debug!(from = inner.columns, to = columns, "column count changed");
            inner.columns = columns;
            for item in &mut inner.items {
                item.rect = item.rect.clamp_to_grid(columns);
            }
            let updates = reflow(&inner.items, columns, None);
            apply_updates(&mut inner.items, &updates, columns);
            inner.version += 1;
        }
        self.emit();
        true
    }

    /// Reflow the collection, optionally anchored. Returns moved count.
    pub fn reflow(&self, anchor: Option<&ItemId>) -> usize {
        let updates = {
            let inner = self.inner.borrow();
            reflow(&inner.items, inner.columns, anchor)
        };
        self.apply_position_updates(&updates)
    }

    /// Compact the collection, skipping `exclude`. Returns moved count.
    pub fn compact(&self, exclude: Option<&ItemId>) -> usize {
        let updates = {
            let inner = self.inner.borrow();
            compact(&inner.items, inner.columns, exclude)
        };
        self.apply_position_updates(&updates)
    }

    // --- Batching ----------------------------------------------------------

    /// Open a batch scope. Notifications are deferred until every open
    /// scope has been dropped.
    #[must_use]
    pub fn begin_batch(&self) -> StoreBatch {
        self.inner.borrow_mut().batch_depth += 1;
        StoreBatch {
            store: self.clone(),
        }
    }

    /// Run `f` inside a batch scope.
    pub fn batch<R>(&self, f: impl FnOnce(&ItemStore) -> R) -> R {
        let _batch = self.begin_batch();
        f(self)
    }

    /// Whether a batch scope is open.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.inner.borrow().batch_depth > 0
    }

    fn end_batch(&self) {
        let flush = {
            let mut inner = self.inner.borrow_mut();
            inner.batch_depth = inner.batch_depth.saturating_sub(1);
            let flush = inner.batch_depth == 0 && inner.batch_dirty;
            if flush {
                inner.batch_dirty = false;
            }
            flush
        };
        if flush {
            self.notify();
        }
    }

    fn emit(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.batch_depth > 0 {
                inner.batch_dirty = true;
                return;
            }
        }
        self.notify();
    }

    /// Notify live subscribers and prune dead ones.
    ///
    /// A mutation made by a subscriber while a round is running does not
    /// notify re-entrantly. It schedules another round with the newer items
    /// once the current one has reached every subscriber, so the last
    /// delivery each subscriber sees is the current state.
    fn notify(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.notifying {
                inner.renotify = true;
                return;
            }
            inner.notifying = true;
        }
        loop {
            self.notify_round();
            let mut inner = self.inner.borrow_mut();
            if !inner.renotify {
                inner.notifying = false;
                break;
            }
            inner.renotify = false;
        }
    }

    fn notify_round(&self) {
        let (callbacks, items) = {
            let mut inner = self.inner.borrow_mut();
            inner.notifications += 1;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks: Vec<ListenerRc> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (callbacks, inner.items.clone())
        };
        if callbacks.is_empty() {
            return;
        }

        let subscribers = callbacks.len() as u64;
        let started = Instant::now();
        let _span = info_span!(
            "store.notify",
            subscribers,
            items = items.len() as u64,
            duration_us = tracing::field::Empty
        )
        .entered();

        for cb in &callbacks {
            cb(&items);
        }

        let duration_us = started.elapsed().as_micros() as u64;
        tracing::Span::current().record("duration_us", duration_us);
        trace!(duration_us, subscribers, "store notification delivered");
    }
}

/// RAII batch scope returned by [`ItemStore::begin_batch`].
#[must_use = "notifications flush when the batch is dropped"]
pub struct StoreBatch {
    store: ItemStore,
}

impl std::fmt::Debug for StoreBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBatch").finish_non_exhaustive()
    }
}

impl Drop for StoreBatch {
    fn drop(&mut self) {
        self.store.end_batch();
    }
}

/// RAII guard for a store subscriber.
///
/// Dropping it makes the callback unreachable; the dead entry is pruned on
/// the next notification.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    /// Unsubscribe now.
    pub fn cancel(self) {}
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

fn ids_of(items: &[Item]) -> FxHashSet<ItemId> {
    items.iter().map(|item| item.id.clone()).collect()
}

fn apply_updates(items: &mut [Item], updates: &[PositionUpdate], columns: u32) -> usize {
    let mut changed = 0;
    for update in updates {
        let Some(item) = items.iter_mut().find(|item| item.id == update.id) else {
            continue;
        };
        let rect = item
            .rect
            .at(update.x, update.y)
            .clamp_to_grid(columns);
        if rect != item.rect {
            item.rect = rect;
            changed += 1;
        }
    }
    changed
}
