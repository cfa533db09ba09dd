#![forbid(unsafe_code)]

//! One-shot import of a static layout.
//!
//! Hosts scan their existing markup into [`ImportHint`]s (declared span,
//! media source, caption, text) and get back seed items already packed with
//! first-fit in document order, ready for the store.

use rustc_hash::FxHashSet;

use crate::item::{DEFAULT_BG_COLOR, DEFAULT_FONT_SIZE, DEFAULT_TEXT_COLOR, ItemType};
use crate::occupancy::OccupancyMap;
use crate::payload::{RawItem, non_empty};

/// Max characters of text used to derive an id.
const TEXT_ID_CHARS: usize = 30;

/// Declarative description of one pre-existing tile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportHint {
    /// Explicit id (e.g. a `data-id` attribute).
    pub id: Option<String>,
    /// Kind tag as found in the source. Unknown tags import as images.
    pub kind: Option<String>,
    pub media_src: Option<String>,
    pub caption: Option<String>,
    /// Body text for text and placeholder tiles.
    pub text: Option<String>,
    /// Declared width in columns. Missing or non-positive reads as 1.
    pub width_units: Option<i64>,
    /// Declared height in rows. Missing or non-positive reads as 1.
    pub height_units: Option<i64>,
}

/// Pack `hints` into seed items for a `columns`-wide grid.
#[must_use]
pub fn import_layout(hints: &[ImportHint], columns: u32) -> Vec<RawItem> {
    let columns = columns.max(1);
    let mut occupancy = OccupancyMap::new(columns);
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut seeds = Vec::with_capacity(hints.len());

    for (index, hint) in hints.iter().enumerate() {
        let w = span(hint.width_units).min(columns);
        let h = span(hint.height_units);
        let rect = occupancy.place(w, h);

        let id = unique_id(derive_id(hint, index), &mut seen);
        let src = non_empty(hint.media_src.as_deref()).unwrap_or_default();
        let caption = non_empty(hint.caption.as_deref())
            .map(str::trim)
            .unwrap_or_default();
        let content = non_empty(hint.text.as_deref())
            .map(str::trim)
            .unwrap_or(caption);

        seeds.push(RawItem {
            id: Some(id),
            kind: Some(ItemType::from_tag(hint.kind.as_deref()).as_str().to_owned()),
            path: Some(src.to_owned()),
            src: Some(src.to_owned()),
            caption: Some(caption.to_owned()),
            content: Some(content.to_owned()),
            x: Some(i64::from(rect.x)),
            y: Some(i64::from(rect.y)),
            w: Some(i64::from(rect.w)),
            h: Some(i64::from(rect.h)),
            bg_color: Some(DEFAULT_BG_COLOR.to_owned()),
            text_color: Some(DEFAULT_TEXT_COLOR.to_owned()),
            font_size: Some(i64::from(DEFAULT_FONT_SIZE)),
            ..RawItem::default()
        });
    }
    seeds
}

fn span(units: Option<i64>) -> u32 {
    units
        .filter(|&u| u > 0)
        .map_or(1, |u| u32::try_from(u).unwrap_or(u32::MAX))
}

/// Explicit id, then media source, then leading text, then `item-<index>`.
fn derive_id(hint: &ImportHint, index: usize) -> String {
    if let Some(id) = non_empty(hint.id.as_deref()) {
        return id.trim().to_owned();
    }
    if let Some(src) = non_empty(hint.media_src.as_deref()) {
        return src.trim().to_owned();
    }
    if let Some(text) = non_empty(hint.text.as_deref()) {
        return text.trim().chars().take(TEXT_ID_CHARS).collect();
    }
    format!("item-{index}")
}

fn unique_id(base: String, seen: &mut FxHashSet<String>) -> String {
    let mut id = base.clone();
    let mut n = 2;
    while seen.contains(&id) {
        id = format!("{base}-{n}");
        n += 1;
    }
    seen.insert(id.clone());
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hint(w: i64, h: i64) -> ImportHint {
        ImportHint {
            width_units: Some(w),
            height_units: Some(h),
            ..ImportHint::default()
        }
    }

    #[test]
    fn hints_pack_first_fit_in_document_order() {
        let seeds = import_layout(&[hint(2, 2), hint(3, 1), hint(1, 1), hint(2, 1)], 4);
        let rects: Vec<_> = seeds
            .iter()
            .map(|s| (s.x.unwrap_or(-1), s.y.unwrap_or(-1), s.w.unwrap_or(-1)))
            .collect();
        assert_eq!(rects, vec![(0, 0, 2), (0, 2, 3), (2, 0, 1), (2, 1, 2)]);
    }

    #[test]
    fn ids_fall_back_in_order() {
        let seeds = import_layout(
            &[
                ImportHint {
                    id: Some("explicit".into()),
                    media_src: Some("a.jpg".into()),
                    ..ImportHint::default()
                },
                ImportHint {
                    media_src: Some("a.jpg".into()),
                    ..ImportHint::default()
                },
                ImportHint {
                    kind: Some("text".into()),
                    text: Some("  An unusually long paragraph of opening text  ".into()),
                    ..ImportHint::default()
                },
                ImportHint::default(),
            ],
            10,
        );
        let ids: Vec<_> = seeds.iter().filter_map(|s| s.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                "explicit".to_owned(),
                "a.jpg".to_owned(),
                "An unusually long paragraph of".to_owned(),
                "item-3".to_owned(),
            ]
        );
    }

    #[test]
    fn duplicate_ids_get_suffixes() {
        let same = ImportHint {
            media_src: Some("dup.png".into()),
            ..ImportHint::default()
        };
        let seeds = import_layout(&[same.clone(), same.clone(), same], 10);
        let ids: Vec<_> = seeds.iter().filter_map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec!["dup.png", "dup.png-2", "dup.png-3"]);
    }

    #[test]
    fn spans_are_sanitized_and_kinds_mapped() {
        let seeds = import_layout(
            &[ImportHint {
                kind: Some("media".into()),
                width_units: Some(12),
                height_units: Some(0),
                caption: Some(" cap ".into()),
                ..ImportHint::default()
            }],
            5,
        );
        assert_eq!(seeds[0].w, Some(5));
        assert_eq!(seeds[0].h, Some(1));
        assert_eq!(seeds[0].kind.as_deref(), Some("image"));
        assert_eq!(seeds[0].content.as_deref(), Some("cap"));
    }
}
