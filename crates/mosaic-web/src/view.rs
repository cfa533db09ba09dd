#![forbid(unsafe_code)]

//! Pure rendering and keyed diffing.
//!
//! [`render_view`] maps an item list plus UI state to a [`ViewTree`], one
//! [`TileView`] per item keyed by id. [`diff_views`] turns two trees into the
//! [`ViewOp`]s that transform the first into the second; surfaces apply them
//! to their own child list.
//!
//! # Invariants
//!
//! 1. Rendering is a function of its inputs only.
//! 2. Applying `diff_views(a, b)` to a mirror of `a` yields exactly `b`.
//! 3. Tiles whose view did not change produce no op.

use mosaic_core::{GridRect, PixelOffset};
use mosaic_layout::{Item, ItemContent, ItemId, ItemType, MediaContent, PendingAsset, TileStyle};
use rustc_hash::FxHashMap;

/// Placeholder text shown when there are no items.
pub const EMPTY_GALLERY_MESSAGE: &str = "No gallery items yet.";

/// CSS-grid style placement (1-based lines, spans in cells).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPlacement {
    pub column_start: u32,
    pub column_span: u32,
    pub row_start: u32,
    pub row_span: u32,
}

impl From<GridRect> for GridPlacement {
    fn from(rect: GridRect) -> Self {
        Self {
            column_start: rect.x.saturating_add(1),
            column_span: rect.w,
            row_start: rect.y.saturating_add(1),
            row_span: rect.h,
        }
    }
}

/// What an image or video tile points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Url(String),
    /// Local file not uploaded yet.
    Pending(PendingAsset),
    Missing,
}

impl MediaSource {
    fn resolve(media: &MediaContent, pending: Option<&PendingAsset>) -> Self {
        if let Some(asset) = pending {
            return Self::Pending(asset.clone());
        }
        media
            .source()
            .map_or(Self::Missing, |src| Self::Url(src.to_owned()))
    }
}

/// Kind-specific tile body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileBody {
    Image {
        source: MediaSource,
        caption: String,
    },
    Video {
        source: MediaSource,
        caption: String,
    },
    Text {
        content: String,
        style: TileStyle,
    },
    Placeholder {
        content: String,
        style: TileStyle,
    },
}

/// Active gesture kind shown on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionMode {
    Moving,
    Resizing,
}

/// Transient view state of the tile under a gesture.
///
/// While it is set, the tile ignores the store's placement for that item.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionOverlay {
    pub item_id: ItemId,
    pub mode: InteractionMode,
    pub placement: GridRect,
    pub transform: Option<PixelOffset>,
}

/// One rendered tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub id: ItemId,
    pub kind: ItemType,
    pub placement: GridPlacement,
    pub body: TileBody,
    pub selected: bool,
    pub editable: bool,
    pub interaction: Option<InteractionMode>,
    /// Raised above siblings (z-index) during a gesture.
    pub elevated: bool,
    pub transform: Option<PixelOffset>,
}

/// Whole rendered grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewTree {
    pub tiles: Vec<TileView>,
    pub empty_placeholder: bool,
}

impl ViewTree {
    #[must_use]
    pub fn tile(&self, id: &ItemId) -> Option<&TileView> {
        self.tiles.iter().find(|tile| &tile.id == id)
    }
}

/// UI state that rendering depends on besides the items.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    pub selected: Option<&'a ItemId>,
    pub edit_mode: bool,
    pub overlay: Option<&'a InteractionOverlay>,
}

/// Render `items` into a keyed view tree.
#[must_use]
pub fn render_view(items: &[Item], ctx: &RenderContext<'_>) -> ViewTree {
    let tiles = items.iter().map(|item| render_tile(item, ctx)).collect();
    ViewTree {
        tiles,
        empty_placeholder: items.is_empty(),
    }
}

fn render_tile(item: &Item, ctx: &RenderContext<'_>) -> TileView {
    let body = match &item.content {
        ItemContent::Image(media) => TileBody::Image {
            source: MediaSource::resolve(media, item.pending_asset.as_ref()),
            caption: media.caption.clone(),
        },
        ItemContent::Video(media) => TileBody::Video {
            source: MediaSource::resolve(media, item.pending_asset.as_ref()),
            caption: media.caption.clone(),
        },
        ItemContent::Text(text) => TileBody::Text {
            content: text.content.clone(),
            style: item.style.clone(),
        },
        ItemContent::Placeholder(text) => TileBody::Placeholder {
            content: text.content.clone(),
            style: item.style.clone(),
        },
    };

    let overlay = ctx.overlay.filter(|o| o.item_id == item.id);
    let placement = overlay.map_or(item.rect, |o| o.placement);

    TileView {
        id: item.id.clone(),
        kind: item.kind(),
        placement: placement.into(),
        body,
        selected: ctx.selected == Some(&item.id),
        editable: ctx.edit_mode,
        interaction: overlay.map(|o| o.mode),
        elevated: overlay.is_some(),
        transform: overlay.and_then(|o| o.transform),
    }
}

/// Keyed child-list operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOp {
    /// Create `tile` at child `index`.
    Insert { index: usize, tile: TileView },
    /// Replace the content of an existing tile in place.
    Update { tile: TileView },
    /// Reposition an existing tile to child `index`.
    Move { id: ItemId, index: usize },
    Remove { id: ItemId },
    SetEmpty(bool),
}

/// Ops that transform `prev` into `next`.
///
/// Removals come first, then a single left-to-right pass that inserts,
/// moves, and updates. Indices refer to the child list as it stands when
/// each op is applied.
#[must_use]
pub fn diff_views(prev: &ViewTree, next: &ViewTree) -> Vec<ViewOp> {
    let mut ops = Vec::new();
    let next_ids: FxHashMap<&ItemId, usize> = next
        .tiles
        .iter()
        .enumerate()
        .map(|(i, tile)| (&tile.id, i))
        .collect();
    let prev_tiles: FxHashMap<&ItemId, &TileView> =
        prev.tiles.iter().map(|tile| (&tile.id, tile)).collect();

    let mut current: Vec<&ItemId> = Vec::with_capacity(prev.tiles.len());
    for tile in &prev.tiles {
        if next_ids.contains_key(&tile.id) {
            current.push(&tile.id);
        } else {
            ops.push(ViewOp::Remove {
                id: tile.id.clone(),
            });
        }
    }

    for (index, tile) in next.tiles.iter().enumerate() {
        match prev_tiles.get(&tile.id) {
            None => {
                ops.push(ViewOp::Insert {
                    index,
                    tile: tile.clone(),
                });
                current.insert(index, &tile.id);
            }
            Some(old) => {
                if current.get(index) != Some(&&tile.id) {
                    if let Some(from) = current.iter().position(|id| *id == &tile.id) {
                        let id = current.remove(from);
                        current.insert(index, id);
                    }
                    ops.push(ViewOp::Move {
                        id: tile.id.clone(),
                        index,
                    });
                }
                if *old != tile {
                    ops.push(ViewOp::Update { tile: tile.clone() });
                }
            }
        }
    }

    if prev.empty_placeholder != next.empty_placeholder {
        ops.push(ViewOp::SetEmpty(next.empty_placeholder));
    }
    ops
}

/// Apply `ops` to a mirrored child list. Surfaces without their own tree
/// can use this directly.
pub fn apply_ops(tree: &mut ViewTree, ops: &[ViewOp]) {
    for op in ops {
        match op {
            ViewOp::Insert { index, tile } => {
                let index = (*index).min(tree.tiles.len());
                tree.tiles.insert(index, tile.clone());
            }
            ViewOp::Update { tile } => {
                if let Some(slot) = tree.tiles.iter_mut().find(|t| t.id == tile.id) {
                    *slot = tile.clone();
                }
            }
            ViewOp::Move { id, index } => {
                if let Some(from) = tree.tiles.iter().position(|t| &t.id == id) {
                    let tile = tree.tiles.remove(from);
                    let index = (*index).min(tree.tiles.len());
                    tree.tiles.insert(index, tile);
                }
            }
            ViewOp::Remove { id } => tree.tiles.retain(|t| &t.id != id),
            ViewOp::SetEmpty(show) => tree.empty_placeholder = *show,
        }
    }
}
