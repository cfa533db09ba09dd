#![forbid(unsafe_code)]

//! Item model and packing algorithms for the Mosaic tile grid.
//!
//! # Role
//!
//! This crate is pure: it takes item lists and returns item lists or
//! position updates. Ownership, notification, and interaction live in
//! `mosaic-runtime` and `mosaic-web`.
//!
//! # Modules
//!
//! - [`item`]: the tagged item model and field patches.
//! - [`payload`]: the lenient persisted `{ items: [...] }` form.
//! - [`normalize`]: raw input to valid, on-grid items.
//! - [`occupancy`]: sparse first-fit occupancy map.
//! - [`reflow`]: anchored reflow, compaction, and slot queries.
//! - [`validate`]: the layout self-check report.
//! - [`import`]: seed items from a static layout.

pub mod import;
pub mod item;
pub mod normalize;
pub mod occupancy;
pub mod payload;
pub mod reflow;
pub mod validate;

pub use import::{ImportHint, import_layout};
pub use item::{
    DEFAULT_BG_COLOR, DEFAULT_FONT_SIZE, DEFAULT_TEXT_COLOR, Item, ItemContent, ItemId, ItemPatch,
    ItemType, MediaContent, PendingAsset, PositionPatch, PositionUpdate, TextAlign, TextContent,
    TileStyle,
};
pub use mosaic_core::GridRect;
pub use normalize::{IdAllocator, normalize_all, normalize_item};
pub use occupancy::OccupancyMap;
pub use payload::{LayoutPayload, RawItem};
pub use reflow::{
    ReflowPlan, compact, content_bottom, first_available_slot, plan_reflow, reflow,
};
pub use validate::{LayoutReport, check_layout};
