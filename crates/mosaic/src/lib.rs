#![forbid(unsafe_code)]

//! Mosaic public facade crate.
//!
//! This crate provides the stable surface area for hosts. It re-exports the
//! common types from the internal crates, adds the startup flow that picks
//! between a saved layout and an imported one, and offers a prelude.

use std::fmt;

use tracing::{debug, warn};

// --- Core re-exports -------------------------------------------------------

pub use mosaic_core::{
    Breakpoints, ColumnTiers, DEFAULT_ASPECT_RATIO, GridMetrics, GridRect, MAX_ITEM_ROWS, MAX_ROW,
    PixelOffset, PixelPoint, PointerButton, PointerSample, PointerTarget, ViewportClass,
};

// --- Layout re-exports -----------------------------------------------------

pub use mosaic_layout::{
    ImportHint, Item, ItemContent, ItemId, ItemPatch, ItemType, LayoutPayload, LayoutReport,
    PositionPatch, PositionUpdate, RawItem, TextAlign, TileStyle, check_layout, import_layout,
};

// --- Runtime re-exports ----------------------------------------------------

pub use mosaic_runtime::{AutosaveScheduler, GridConfig, GridConfigError, ItemStore, Subscription};

// --- Web re-exports --------------------------------------------------------

#[cfg(feature = "web")]
pub use mosaic_web::{
    GridEngine, GridEngineOptions, GridSurface, InteractionEffect, InteractionMachineError,
    PointerCaptureCommand, RecordingSurface, TextStylePatch, ViewOp, ViewTree,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Mosaic hosts.
#[derive(Debug)]
pub enum Error {
    /// Configuration failed to load or validate.
    Config(GridConfigError),
    /// Layout payload is not valid JSON of the expected shape.
    Payload(serde_json::Error),
    /// Engine interaction settings are invalid.
    #[cfg(feature = "web")]
    Interaction(InteractionMachineError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "config: {err}"),
            Self::Payload(err) => write!(f, "layout payload: {err}"),
            #[cfg(feature = "web")]
            Self::Interaction(err) => write!(f, "interaction: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Payload(err) => Some(err),
            #[cfg(feature = "web")]
            Self::Interaction(err) => Some(err),
        }
    }
}

impl From<GridConfigError> for Error {
    fn from(err: GridConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err)
    }
}

#[cfg(feature = "web")]
impl From<InteractionMachineError> for Error {
    fn from(err: InteractionMachineError) -> Self {
        Self::Interaction(err)
    }
}

/// Standard result type for Mosaic APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Startup ---------------------------------------------------------------

/// Where the startup layout came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    Saved,
    Imported,
    Empty,
}

/// Parse a persisted payload strictly, dropping media tiles with nothing to
/// show.
pub fn parse_payload(json: &str) -> Result<LayoutPayload> {
    let mut payload = LayoutPayload::from_json_str(json)?;
    let dropped = payload.retain_renderable();
    if dropped > 0 {
        debug!(dropped, "dropped media items without a source");
    }
    Ok(payload)
}

/// Populate `store` at startup.
///
/// A saved layout wins when it parses and has items. Otherwise the imported
/// seed layout is used. A malformed saved layout is logged and skipped.
pub fn bootstrap(store: &ItemStore, seed: &[ImportHint], saved_json: Option<&str>) -> LayoutSource {
    if let Some(json) = saved_json {
        match parse_payload(json) {
            Ok(payload) if !payload.items.is_empty() => {
                store.load_state(Some(payload));
                return LayoutSource::Saved;
            }
            Ok(_) => debug!("saved layout is empty; falling back to import"),
            Err(error) => warn!(%error, "saved layout unreadable; falling back to import"),
        }
    }
    if seed.is_empty() {
        return LayoutSource::Empty;
    }
    let items = import_layout(seed, store.columns());
    store.load_state(Some(LayoutPayload { items }));
    LayoutSource::Imported
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, GridConfig, GridRect, ImportHint, Item, ItemId, ItemStore, ItemType, LayoutPayload,
        LayoutSource, PointerSample, PointerTarget, RawItem, Result, bootstrap,
    };

    #[cfg(feature = "web")]
    pub use crate::{GridEngine, GridEngineOptions, GridSurface, TextStylePatch};

    pub use crate::{core, layout, runtime};

    #[cfg(feature = "web")]
    pub use crate::web;
}

pub use mosaic_core as core;
pub use mosaic_layout as layout;
pub use mosaic_runtime as runtime;
#[cfg(feature = "web")]
pub use mosaic_web as web;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hint(id: &str, w: i64) -> ImportHint {
        ImportHint {
            id: Some(id.into()),
            kind: Some("text".into()),
            text: Some(format!("{id} body")),
            width_units: Some(w),
            ..ImportHint::default()
        }
    }

    #[test]
    fn saved_layout_wins_over_import() {
        let store = ItemStore::new(10);
        let source = bootstrap(
            &store,
            &[hint("seed", 1)],
            Some(r#"{"items":[{"id":"saved","type":"text","content":"x"}]}"#),
        );
        assert_eq!(source, LayoutSource::Saved);
        assert!(store.contains(&ItemId::from("saved")));
        assert!(!store.contains(&ItemId::from("seed")));
    }

    #[test]
    fn malformed_saved_layout_falls_back_to_import() {
        let store = ItemStore::new(10);
        let source = bootstrap(&store, &[hint("a", 2), hint("b", 1)], Some("{not json"));
        assert_eq!(source, LayoutSource::Imported);
        assert_eq!(store.rect_of(&ItemId::from("b")), Some(GridRect::new(2, 0, 1, 1)));
    }

    #[test]
    fn nothing_to_load_is_empty() {
        let store = ItemStore::new(10);
        assert_eq!(bootstrap(&store, &[], Some(r#"{"items":[]}"#)), LayoutSource::Empty);
        assert!(store.is_empty());
    }

    #[test]
    fn parse_payload_drops_sourceless_images() {
        let payload = parse_payload(
            r#"{"items":[{"id":"a","type":"image"},{"id":"b","type":"image","src":"b.png"}]}"#,
        )
        .expect("payload");
        assert_eq!(payload.items.len(), 1);
    }

    #[test]
    fn errors_convert_and_chain() {
        fn load(json: &str) -> Result<GridConfig> {
            Ok(GridConfig::from_json_str(json)?)
        }
        let err = load("[").expect_err("bad config");
        assert!(matches!(err, Error::Config(_)));
        assert!(std::error::Error::source(&err).is_some());
        let err = parse_payload("nope").expect_err("bad payload");
        assert!(err.to_string().starts_with("layout payload"));
    }
}
