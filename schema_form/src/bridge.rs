//! Codec Bridge
//!
//! Blob leaves whose settings carry a [`PayloadBinding`] hold a tuple
//! payload whose type depends on the value of a sibling field (the method
//! name). The editor keeps one [`PayloadSlot`] per bound leaf; whenever the
//! sibling changes the slot takes a fresh ticket and asks for the method's
//! tuple type through [`PayloadRequest`]. Tickets come from one sequence per
//! editor, so a slot that is dropped and created again never reuses one.
//! Resolutions come back as [`PayloadResolution`]s and are applied only when
//! their ticket is still the slot's latest one.

use crate::editor::FormEditor;
use crate::codec::DecodeError;
use crate::path::FieldPath;
use crate::value::Value;
use schema_loader::{
    ResolveError, SchemaProgram, SchemaResolver, SchemaSource, Ticket, TypeSelector,
};
use schema_types::TypeNode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/* ============================================================================
   Binding
   ============================================================================ */

/// Which tuple of the method the payload carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Args,
    Results,
}

impl Direction {
    pub fn selector(&self, method: &str) -> TypeSelector {
        match self {
            Direction::Args => TypeSelector::method_args(method),
            Direction::Results => TypeSelector::method_results(method),
        }
    }
}

/// Declares a blob leaf as an encoded argument or result tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PayloadBinding {
    /// Sibling field holding the method name, relative to the blob's parent
    pub method_field: String,
    /// Endpoint publishing the method; falls back to the engine default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub direction: Direction,
}

impl PayloadBinding {
    pub fn new(method_field: impl Into<String>) -> Self {
        Self {
            method_field: method_field.into(),
            endpoint: None,
            direction: Direction::Args,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Path of the method field for the blob at `blob`
    pub fn method_path(&self, blob: &FieldPath) -> FieldPath {
        let mut segments = blob
            .parent()
            .map(|p| p.segments().to_vec())
            .unwrap_or_default();
        segments.extend(FieldPath::parse(&self.method_field).segments().iter().cloned());
        FieldPath::from(segments)
    }

    /// Method name for the blob at `blob`, read from the sibling field of
    /// `root`. An optional method field counts when present; blank names
    /// count as no method.
    pub fn method_in(&self, root: &Value, blob: &FieldPath) -> Option<String> {
        let text = match root.get(&self.method_path(blob))? {
            Value::Text(m) => m,
            Value::Optional(Some(inner)) => match inner.as_ref() {
                Value::Text(m) => m,
                _ => return None,
            },
            _ => return None,
        };
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/* ============================================================================
   Requests & Resolutions
   ============================================================================ */

/// A pending tuple-type lookup for one payload slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadRequest {
    /// Internal key of the slot (stable across list reorders)
    pub key: String,
    pub path: FieldPath,
    pub ticket: Ticket,
    pub endpoint: String,
    pub method: String,
    pub direction: Direction,
}

impl PayloadRequest {
    /// Build the resolution for this request from a resolved type
    pub fn resolved(&self, result: Result<TypeNode, ResolveError>) -> PayloadResolution {
        PayloadResolution {
            key: self.key.clone(),
            ticket: self.ticket,
            result,
        }
    }
}

/// Answer to a [`PayloadRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadResolution {
    pub key: String,
    pub ticket: Ticket,
    pub result: Result<TypeNode, ResolveError>,
}

/// Resolve the tuple type a request asks for
pub async fn resolve_payload<S: SchemaSource>(
    resolver: &SchemaResolver<S>,
    request: &PayloadRequest,
) -> PayloadResolution {
    let selector = request.direction.selector(&request.method);
    let result = resolver
        .resolve(&request.endpoint, &selector)
        .await
        .map(|resolved| resolved.node);
    if let Err(e) = &result {
        tracing::warn!(
            endpoint = %request.endpoint,
            method = %request.method,
            error = %e,
            "payload type resolution failed"
        );
    }
    request.resolved(result)
}

/* ============================================================================
   Slots
   ============================================================================ */

/// Decoding state of one bound blob leaf
#[derive(Debug)]
pub enum SlotStatus {
    /// No method selected yet
    Idle,
    /// Waiting for the tuple type
    Pending,
    Decoded {
        node: TypeNode,
        editor: Box<FormEditor>,
        /// Blob contents the editor was built from
        source_bytes: Vec<u8>,
    },
    /// The bytes do not fit the resolved tuple
    DecodeFailed {
        node: TypeNode,
        error: DecodeError,
        source_bytes: Vec<u8>,
    },
    /// The tuple type could not be resolved
    Unresolved { reason: String },
}

impl SlotStatus {
    pub fn name(&self) -> &'static str {
        match self {
            SlotStatus::Idle => "idle",
            SlotStatus::Pending => "pending",
            SlotStatus::Decoded { .. } => "decoded",
            SlotStatus::DecodeFailed { .. } => "decode-failed",
            SlotStatus::Unresolved { .. } => "unresolved",
        }
    }
}

#[derive(Debug)]
pub struct PayloadSlot {
    pub path: FieldPath,
    pub binding: PayloadBinding,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    /* Latest ticket, drawn from the editor-wide sequence */
    pub ticket: Option<Ticket>,
    pub status: SlotStatus,
}

impl PayloadSlot {
    pub(crate) fn new(path: FieldPath, binding: PayloadBinding) -> Self {
        Self {
            path,
            binding,
            endpoint: None,
            method: None,
            ticket: None,
            status: SlotStatus::Idle,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.ticket == Some(ticket)
    }
}

/* ============================================================================
   Catalog (view mode)
   ============================================================================ */

/// Method tuples of one endpoint, prepared ahead of a synchronous view render
#[derive(Debug, Clone)]
pub struct PayloadCatalog {
    endpoint: String,
    program: Arc<SchemaProgram>,
    cache: HashMap<(String, Direction), TypeNode>,
}

impl PayloadCatalog {
    pub async fn load<S: SchemaSource>(
        resolver: &SchemaResolver<S>,
        endpoint: &str,
    ) -> Result<Self, ResolveError> {
        let program = resolver.program(endpoint).await?;
        Ok(Self::from_program(endpoint, program))
    }

    pub fn from_program(endpoint: &str, program: Arc<SchemaProgram>) -> Self {
        let mut cache = HashMap::new();
        for method in program.method_names() {
            for direction in [Direction::Args, Direction::Results] {
                match program.select(&direction.selector(method)) {
                    Ok(node) => {
                        cache.insert((method.to_string(), direction), node);
                    }
                    Err(e) => {
                        tracing::warn!(endpoint, method, error = %e, "skipping method tuple");
                    }
                }
            }
        }
        Self {
            endpoint: endpoint.to_string(),
            program,
            cache,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn program(&self) -> &SchemaProgram {
        &self.program
    }

    pub fn tuple(&self, method: &str, direction: Direction) -> Option<&TypeNode> {
        self.cache.get(&(method.to_string(), direction))
    }
}
