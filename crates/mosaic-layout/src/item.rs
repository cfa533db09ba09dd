#![forbid(unsafe_code)]

//! Layout items.
//!
//! An [`Item`] is one tile: a grid rectangle shared by every kind, plus a
//! kind-specific [`ItemContent`] payload. Content and style are opaque to the
//! packing algorithm and are carried through unchanged.

use std::fmt;

use mosaic_core::GridRect;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default tile background.
pub const DEFAULT_BG_COLOR: &str = "#ffffff";
/// Default tile text color.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
/// Default font size in CSS pixels.
pub const DEFAULT_FONT_SIZE: u32 = 16;

/// Stable item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Item kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Image,
    Video,
    Text,
    Placeholder,
}

impl ItemType {
    /// Parse a wire tag. Unknown or missing tags (including the legacy
    /// `media` tag) map to [`ItemType::Image`].
    #[must_use]
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("video") => Self::Video,
            Some(t) if t.eq_ignore_ascii_case("text") => Self::Text,
            Some(t) if t.eq_ignore_ascii_case("placeholder") => Self::Placeholder,
            _ => Self::Image,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Text => "text",
            Self::Placeholder => "placeholder",
        }
    }

    #[must_use]
    pub const fn is_media(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }

    /// Span used when the input omits `w`/`h`.
    #[must_use]
    pub const fn default_span(self) -> (u32, u32) {
        match self {
            Self::Text => (2, 1),
            Self::Image | Self::Video | Self::Placeholder => (1, 1),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

/// Source and caption of an image or video tile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaContent {
    pub path: String,
    pub src: String,
    pub caption: String,
}

impl MediaContent {
    /// Best available source reference.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        [self.src.as_str(), self.path.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

/// Body of a text or placeholder tile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextContent {
    pub content: String,
    pub caption: String,
}

/// Kind-specific tile payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemContent {
    Image(MediaContent),
    Video(MediaContent),
    Text(TextContent),
    Placeholder(TextContent),
}

impl ItemContent {
    #[must_use]
    pub const fn kind(&self) -> ItemType {
        match self {
            Self::Image(_) => ItemType::Image,
            Self::Video(_) => ItemType::Video,
            Self::Text(_) => ItemType::Text,
            Self::Placeholder(_) => ItemType::Placeholder,
        }
    }

    #[must_use]
    pub fn caption(&self) -> &str {
        match self {
            Self::Image(m) | Self::Video(m) => &m.caption,
            Self::Text(t) | Self::Placeholder(t) => &t.caption,
        }
    }

    #[must_use]
    pub fn media(&self) -> Option<&MediaContent> {
        match self {
            Self::Image(m) | Self::Video(m) => Some(m),
            Self::Text(_) | Self::Placeholder(_) => None,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&TextContent> {
        match self {
            Self::Text(t) | Self::Placeholder(t) => Some(t),
            Self::Image(_) | Self::Video(_) => None,
        }
    }

    /// Re-tag the payload, carrying over whatever fields both shapes share.
    #[must_use]
    pub fn into_kind(self, kind: ItemType) -> Self {
        if self.kind() == kind {
            return self;
        }
        let (media, text) = match self {
            Self::Image(m) | Self::Video(m) => {
                let text = TextContent {
                    content: m.caption.clone(),
                    caption: m.caption.clone(),
                };
                (m, text)
            }
            Self::Text(t) | Self::Placeholder(t) => {
                let media = MediaContent {
                    caption: t.caption.clone(),
                    ..MediaContent::default()
                };
                (media, t)
            }
        };
        match kind {
            ItemType::Image => Self::Image(media),
            ItemType::Video => Self::Video(media),
            ItemType::Text => Self::Text(text),
            ItemType::Placeholder => Self::Placeholder(text),
        }
    }

    fn caption_mut(&mut self) -> &mut String {
        match self {
            Self::Image(m) | Self::Video(m) => &mut m.caption,
            Self::Text(t) | Self::Placeholder(t) => &mut t.caption,
        }
    }
}

/// Visual style of a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileStyle {
    pub bg_color: String,
    pub text_color: String,
    pub font_size: u32,
    pub text_align: Option<TextAlign>,
}

impl Default for TileStyle {
    fn default() -> Self {
        Self {
            bg_color: DEFAULT_BG_COLOR.to_owned(),
            text_color: DEFAULT_TEXT_COLOR.to_owned(),
            font_size: DEFAULT_FONT_SIZE,
            text_align: None,
        }
    }
}

/// Handle to a locally added asset that has not been uploaded yet.
///
/// The handle is owned by the host's upload queue; the grid only displays it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingAsset {
    pub handle: u64,
    pub file_name: String,
}

/// One placed tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub rect: GridRect,
    pub content: ItemContent,
    pub style: TileStyle,
    pub pending_asset: Option<PendingAsset>,
    /// Unknown wire fields, written back unchanged.
    pub extra: Map<String, Value>,
}

impl Item {
    #[must_use]
    pub const fn kind(&self) -> ItemType {
        self.content.kind()
    }

    /// Apply a field patch. Geometry in the patch is clamped to `columns`.
    ///
    /// Returns `true` if anything changed.
    pub fn apply_patch(&mut self, patch: ItemPatch, columns: u32) -> bool {
        let before = self.clone();

        if let Some(kind) = patch.kind {
            let content = std::mem::replace(
                &mut self.content,
                ItemContent::Placeholder(TextContent::default()),
            );
            self.content = content.into_kind(kind);
        }
        if let Some(caption) = patch.caption {
            *self.content.caption_mut() = caption;
        }
        match &mut self.content {
            ItemContent::Image(m) | ItemContent::Video(m) => {
                if let Some(path) = patch.path {
                    m.path = path;
                }
                if let Some(src) = patch.src {
                    m.src = src;
                }
            }
            ItemContent::Text(t) | ItemContent::Placeholder(t) => {
                if let Some(content) = patch.content {
                    t.content = content;
                }
            }
        }
        if let Some(bg) = patch.bg_color {
            self.style.bg_color = bg;
        }
        if let Some(fg) = patch.text_color {
            self.style.text_color = fg;
        }
        if let Some(size) = patch.font_size {
            self.style.font_size = size.max(1);
        }
        if let Some(align) = patch.text_align {
            self.style.text_align = align;
        }
        if let Some(asset) = patch.pending_asset {
            self.pending_asset = asset;
        }
        if let Some(rect) = patch.rect {
            self.rect = rect.clamp_to_grid(columns);
        }
        for (key, value) in patch.extra {
            self.extra.insert(key, value);
        }

        *self != before
    }
}

/// Partial update merged into an item by the store.
///
/// `None` leaves a field untouched. For the optional style/asset fields,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub kind: Option<ItemType>,
    pub path: Option<String>,
    pub src: Option<String>,
    pub caption: Option<String>,
    pub content: Option<String>,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub font_size: Option<u32>,
    pub text_align: Option<Option<TextAlign>>,
    pub pending_asset: Option<Option<PendingAsset>>,
    pub rect: Option<GridRect>,
    pub extra: Map<String, Value>,
}

impl ItemPatch {
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    #[must_use]
    pub fn source(mut self, src: impl Into<String>) -> Self {
        let src = src.into();
        self.path = Some(src.clone());
        self.src = Some(src);
        self
    }

    #[must_use]
    pub fn pending_asset(mut self, asset: Option<PendingAsset>) -> Self {
        self.pending_asset = Some(asset);
        self
    }

    #[must_use]
    pub fn rect(mut self, rect: GridRect) -> Self {
        self.rect = Some(rect);
        self
    }
}

/// Position/size-only partial update.
///
/// Values are signed so hosts can pass raw arithmetic results; negative
/// coordinates are floored at 0 and spans at 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionPatch {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub w: Option<i64>,
    pub h: Option<i64>,
}

impl PositionPatch {
    #[must_use]
    pub const fn to(x: i64, y: i64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            w: None,
            h: None,
        }
    }

    #[must_use]
    pub const fn from_rect(rect: GridRect) -> Self {
        Self {
            x: Some(rect.x as i64),
            y: Some(rect.y as i64),
            w: Some(rect.w as i64),
            h: Some(rect.h as i64),
        }
    }

    /// Merge into `rect`, keeping it on a `columns`-wide grid.
    #[must_use]
    pub fn apply_to(&self, rect: GridRect, columns: u32) -> GridRect {
        let columns = columns.max(1);
        let w = self.w.map_or(rect.w, |w| saturate_u32(w.max(1)));
        let h = self.h.map_or(rect.h, |h| saturate_u32(h.max(1)));
        let x = self.x.map_or(rect.x, |x| saturate_u32(x.max(0)));
        let y = self.y.map_or(rect.y, |y| saturate_u32(y.max(0)));
        GridRect::new(x, y, w, h).clamp_to_grid(columns)
    }
}

/// One position change produced by reflow or compaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionUpdate {
    pub id: ItemId,
    pub x: u32,
    pub y: u32,
}

pub(crate) fn saturate_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
