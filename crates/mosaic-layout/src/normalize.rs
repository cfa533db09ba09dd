#![forbid(unsafe_code)]

//! Normalization of raw input into valid items.
//!
//! Every [`RawItem`] normalizes to an [`Item`]; nothing here fails. Missing
//! spans default by kind, missing coordinates fall back to a row-major slot,
//! and the result is clamped onto the grid. Ids that are missing or already
//! taken get a fresh `item-<n>` from an [`IdAllocator`].

use mosaic_core::{GridRect, clamp};
use rustc_hash::FxHashSet;

use crate::item::{
    DEFAULT_BG_COLOR, DEFAULT_FONT_SIZE, DEFAULT_TEXT_COLOR, Item, ItemContent, ItemId, ItemType,
    MediaContent, TextAlign, TextContent, TileStyle, saturate_u32,
};
use crate::payload::{PENDING_FILE_KEY, RawItem, non_empty};

/// Monotonic generator for `item-<n>` ids.
///
/// The counter never goes backwards, so an id handed out once is never
/// handed out again for the lifetime of the allocator.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Next counter value that will be tried.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Allocate an id not present in `taken`.
    pub fn allocate(&mut self, taken: &FxHashSet<ItemId>) -> ItemId {
        loop {
            let candidate = ItemId::new(format!("item-{}", self.next));
            self.next += 1;
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
    }
}

/// Normalize one raw item.
///
/// `index` is the item's position in its input list and only matters when
/// `x`/`y` are missing. `taken` holds ids already in use; the chosen id is
/// inserted into it.
pub fn normalize_item(
    raw: RawItem,
    index: usize,
    columns: u32,
    ids: &mut IdAllocator,
    taken: &mut FxHashSet<ItemId>,
) -> Item {
    let columns = columns.max(1);
    let kind = raw.item_type();
    let (default_w, default_h) = kind.default_span();

    // Zero spans count as missing.
    let w = raw
        .w
        .filter(|&w| w != 0)
        .map_or(default_w, |w| saturate_u32(w.max(1)));
    let h = raw
        .h
        .filter(|&h| h != 0)
        .map_or(default_h, |h| saturate_u32(h.max(1)));
    let w = clamp(w, 1, columns);

    let slot = u64::try_from(index).unwrap_or(u64::MAX);
    let fallback_x = (slot % u64::from(columns)) as u32;
    let fallback_y = u32::try_from(slot / u64::from(columns)).unwrap_or(u32::MAX);
    let x = raw.x.map_or(fallback_x, saturate_u32);
    let y = raw.y.map_or(fallback_y, saturate_u32);
    let rect = GridRect::new(x, y, w, h).clamp_to_grid(columns);

    let id = match non_empty(raw.id.as_deref()).map(ItemId::from) {
        Some(id) if !taken.contains(&id) => id,
        _ => ids.allocate(taken),
    };
    taken.insert(id.clone());

    let path = non_empty(raw.path.as_deref()).or(non_empty(raw.src.as_deref()));
    let src = non_empty(raw.src.as_deref()).or(path);
    let caption = raw.caption.clone().unwrap_or_default();
    let content = match non_empty(raw.content.as_deref()) {
        Some(c) => c.to_owned(),
        None => caption.clone(),
    };

    let media = || MediaContent {
        path: path.unwrap_or_default().to_owned(),
        src: src.unwrap_or_default().to_owned(),
        caption: caption.clone(),
    };
    let text = || TextContent {
        content: content.clone(),
        caption: caption.clone(),
    };
    let item_content = match kind {
        ItemType::Image => ItemContent::Image(media()),
        ItemType::Video => ItemContent::Video(media()),
        ItemType::Text => ItemContent::Text(text()),
        ItemType::Placeholder => ItemContent::Placeholder(text()),
    };

    let style = TileStyle {
        bg_color: non_empty(raw.bg_color.as_deref())
            .unwrap_or(DEFAULT_BG_COLOR)
            .to_owned(),
        text_color: non_empty(raw.text_color.as_deref())
            .unwrap_or(DEFAULT_TEXT_COLOR)
            .to_owned(),
        font_size: raw
            .font_size
            .filter(|&s| s > 0)
            .map_or(DEFAULT_FONT_SIZE, saturate_u32),
        text_align: raw.text_align.as_deref().and_then(TextAlign::parse),
    };

    let mut extra = raw.extra;
    extra.remove(PENDING_FILE_KEY);

    Item {
        id,
        rect,
        content: item_content,
        style,
        pending_asset: raw.pending_asset,
        extra,
    }
}

/// Normalize a whole input list, resolving duplicate ids in input order.
pub fn normalize_all(raws: Vec<RawItem>, columns: u32, ids: &mut IdAllocator) -> Vec<Item> {
    // Reserve every explicit id first so generated ids never collide with
    // an explicit id that appears later in the list.
    let reserved: FxHashSet<ItemId> = raws
        .iter()
        .filter_map(|r| non_empty(r.id.as_deref()).map(ItemId::from))
        .collect();
    let mut taken = FxHashSet::default();
    let mut out = Vec::with_capacity(raws.len());
    for (index, raw) in raws.into_iter().enumerate() {
        let explicit = non_empty(raw.id.as_deref()).map(ItemId::from);
        let item = match explicit {
            Some(id) if !taken.contains(&id) => {
                normalize_item(raw, index, columns, ids, &mut taken)
            }
            _ => {
                let mut blocked = taken.clone();
                blocked.extend(reserved.iter().cloned());
                let fresh = ids.allocate(&blocked);
                let raw = RawItem {
                    id: Some(fresh.to_string()),
                    ..raw
                };
                normalize_item(raw, index, columns, ids, &mut taken)
            }
        };
        out.push(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use mosaic_core::{MAX_ITEM_ROWS, MAX_ROW};
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawItem {
        serde_json::from_value(value).expect("raw item")
    }

    #[test]
    fn default_spans_depend_on_kind() {
        let items = normalize_all(
            vec![raw(json!({"type": "text"})), raw(json!({"type": "image"}))],
            10,
            &mut IdAllocator::new(),
        );
        assert_eq!(items[0].rect, GridRect::new(0, 0, 2, 1));
        assert_eq!(items[1].rect, GridRect::new(1, 0, 1, 1));
    }

    #[test]
    fn missing_coordinates_use_row_major_fallback() {
        let raws = (0..5).map(|_| raw(json!({}))).collect();
        let items = normalize_all(raws, 2, &mut IdAllocator::new());
        let positions: Vec<_> = items.iter().map(|i| (i.rect.x, i.rect.y)).collect();
        assert_eq!(positions, vec![(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);
    }

    #[test]
    fn geometry_is_clamped_onto_grid() {
        let items = normalize_all(
            vec![
                raw(json!({"x": 9, "y": -3, "w": 4, "h": -2})),
                raw(json!({"x": 0, "w": 40})),
            ],
            10,
            &mut IdAllocator::new(),
        );
        assert_eq!(items[0].rect, GridRect::new(6, 0, 4, 1));
        assert_eq!(items[1].rect.w, 10);
    }

    #[test]
    fn oversized_rows_are_capped() {
        let items = normalize_all(
            vec![raw(json!({"id": "tall", "y": 4e12, "h": 1e9}))],
            4,
            &mut IdAllocator::new(),
        );
        assert_eq!(items[0].rect, GridRect::new(0, MAX_ROW, 1, MAX_ITEM_ROWS));
    }

    #[test]
    fn path_and_src_fill_each_other() {
        let items = normalize_all(
            vec![
                raw(json!({"src": "s.jpg"})),
                raw(json!({"path": "p.jpg", "caption": "hi"})),
                raw(json!({"type": "text", "caption": "cap"})),
            ],
            10,
            &mut IdAllocator::new(),
        );
        let m0 = items[0].content.media().expect("media");
        assert_eq!((m0.path.as_str(), m0.src.as_str()), ("s.jpg", "s.jpg"));
        let m1 = items[1].content.media().expect("media");
        assert_eq!((m1.path.as_str(), m1.src.as_str()), ("p.jpg", "p.jpg"));
        assert_eq!(m1.caption, "hi");
        assert_eq!(items[2].content.text().map(|t| t.content.as_str()), Some("cap"));
    }

    #[test]
    fn style_defaults_apply() {
        let items = normalize_all(
            vec![raw(json!({"fontSize": 0, "bgColor": "", "textAlign": "right"}))],
            10,
            &mut IdAllocator::new(),
        );
        let style = &items[0].style;
        assert_eq!(style.bg_color, DEFAULT_BG_COLOR);
        assert_eq!(style.text_color, DEFAULT_TEXT_COLOR);
        assert_eq!(style.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(style.text_align, Some(TextAlign::Right));
    }

    #[test]
    fn missing_and_duplicate_ids_get_fresh_ones() {
        let mut ids = IdAllocator::new();
        let items = normalize_all(
            vec![
                raw(json!({"id": "a"})),
                raw(json!({})),
                raw(json!({"id": "a"})),
                raw(json!({"id": "item-0"})),
            ],
            10,
            &mut ids,
        );
        let got: Vec<_> = items.iter().map(|i| i.id.as_str().to_owned()).collect();
        assert_eq!(got, vec!["a", "item-1", "item-2", "item-0"]);
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut ids = IdAllocator::new();
        let taken = FxHashSet::default();
        let first = ids.allocate(&taken);
        let second = ids.allocate(&taken);
        assert_ne!(first, second);
        assert_eq!(ids.peek(), 2);
    }
}
