//! Schema-Driven Forms and Views
//!
//! This crate renders editable forms and read-only views for values of a
//! resolved `TypeNode`. A single structural walker drives both: the
//! [`FormEditor`] walks a live edit value and collects per-field errors,
//! the [`FormViewer`] walks a value that may have drifted from its type.
//! Per-field presentation comes from a [`SettingsTable`] keyed by
//! wildcard-capable [`FieldPath`]s. Blob leaves bound to a method name are
//! decoded with the tuple payload [`codec`] and edited through a nested
//! editor.

pub mod adornment;
pub mod bridge;
pub mod codec;
pub mod config;
pub mod editor;
pub mod errors;
pub mod leaf;
pub mod load;
pub mod path;
pub mod principal;
pub mod render;
pub mod scope;
pub mod settings;
pub mod value;
pub mod viewer;
pub(crate) mod walker;

// Re-export commonly used types at the crate root
pub use adornment::{Adornment, AdornmentContext, FieldRenderer, Mode};
pub use bridge::{
    resolve_payload, Direction, PayloadBinding, PayloadCatalog, PayloadRequest,
    PayloadResolution, PayloadSlot, SlotStatus,
};
pub use codec::{decode, decode_with_limits, encode, DecodeError, DecodeLimits, EncodeError};
pub use config::{EngineConfig, EngineOptions, LabelStyle};
pub use editor::{Draft, EditOp, FormEditor};
pub use errors::{EditError, EngineError, Result};
pub use leaf::{LeafRenderer, LeafRendererRegistry, Widget};
pub use load::{LoadRequest, Loaded};
pub use path::{FieldPath, Segment};
pub use principal::Principal;
pub use render::{CaseOption, Control, LeafControl, PayloadControl, RenderNode};
pub use settings::{
    resolve_field_settings, FieldSettings, Pattern, SettingsBuiltins, SettingsPatch,
    SettingsTable, Validator,
};
pub use value::{Value, ValueError};
pub use viewer::FormViewer;

// Re-export the type model for convenience
pub use schema_types::{PrimitiveKind, TypeNode};
