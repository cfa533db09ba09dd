#![forbid(unsafe_code)]

//! Persisted `{ "items": [...] }` payload.
//!
//! [`RawItem`] is the lenient wire form: every field is optional, numbers may
//! arrive as floats or numeric strings, ids may arrive as numbers, and unknown
//! fields are kept verbatim in [`RawItem::extra`]. Normalization into a valid
//! [`Item`] happens in [`crate::normalize`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::item::{Item, ItemContent, ItemType, PendingAsset};

/// Wire key of the transient upload handle. Never persisted.
pub const PENDING_FILE_KEY: &str = "pendingFile";

/// One item as read from, or written to, the persisted payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    /// Local upload handle. Only set in-process; never read or written.
    #[serde(skip)]
    pub pending_asset: Option<PendingAsset>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawItem {
    /// Shorthand for a typed item with an explicit rectangle.
    #[must_use]
    pub fn placed(id: &str, kind: ItemType, x: i64, y: i64, w: i64, h: i64) -> Self {
        Self {
            id: Some(id.to_owned()),
            kind: Some(kind.as_str().to_owned()),
            x: Some(x),
            y: Some(y),
            w: Some(w),
            h: Some(h),
            ..Self::default()
        }
    }

    /// Shorthand for an item that only carries an id and a span.
    #[must_use]
    pub fn sized(id: &str, w: i64, h: i64) -> Self {
        Self {
            id: Some(id.to_owned()),
            w: Some(w),
            h: Some(h),
            ..Self::default()
        }
    }

    /// Kind after tag normalization.
    #[must_use]
    pub fn item_type(&self) -> ItemType {
        ItemType::from_tag(self.kind.as_deref())
    }

    /// Whether the item has something to show once rendered.
    ///
    /// Only images need a source; videos, text, and placeholders always
    /// render. A pending local upload counts as a source.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        if self.item_type() != ItemType::Image || self.pending_asset.is_some() {
            return true;
        }
        non_empty(self.path.as_deref()).is_some() || non_empty(self.src.as_deref()).is_some()
    }
}

impl From<&Item> for RawItem {
    fn from(item: &Item) -> Self {
        let (path, src, content) = match &item.content {
            ItemContent::Image(m) | ItemContent::Video(m) => {
                (m.path.clone(), m.src.clone(), m.caption.clone())
            }
            ItemContent::Text(t) | ItemContent::Placeholder(t) => {
                (String::new(), String::new(), t.content.clone())
            }
        };
        Self {
            id: Some(item.id.to_string()),
            kind: Some(item.kind().as_str().to_owned()),
            path: Some(path),
            src: Some(src),
            caption: Some(item.content.caption().to_owned()),
            content: Some(content),
            x: Some(i64::from(item.rect.x)),
            y: Some(i64::from(item.rect.y)),
            w: Some(i64::from(item.rect.w)),
            h: Some(i64::from(item.rect.h)),
            bg_color: Some(item.style.bg_color.clone()),
            text_color: Some(item.style.text_color.clone()),
            font_size: Some(i64::from(item.style.font_size)),
            text_align: item.style.text_align.map(|a| a.as_str().to_owned()),
            pending_asset: None,
            extra: item.extra.clone(),
        }
    }
}

/// The persisted layout document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutPayload {
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<RawItem>,
}

impl LayoutPayload {
    /// Parse a payload. Non-object entries in `items` are skipped and a
    /// `null` item list reads as empty.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Publish form of a collection of items.
    #[must_use]
    pub fn from_items(items: &[Item]) -> Self {
        Self {
            items: items.iter().map(RawItem::from).collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Drop items that would render as empty tiles (images with no source).
    ///
    /// Returns the number of items removed.
    pub fn retain_renderable(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(RawItem::is_renderable);
        before - self.items.len()
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| value_to_int(&v)))
}

fn value_to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.floor() as i64)
            })
        }
        _ => None,
    }
}

fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<RawItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| serde_json::from_value::<RawItem>(v).ok())
        .map(|mut raw| {
            raw.extra.remove(PENDING_FILE_KEY);
            raw
        })
        .collect())
}
