//! Form Editor
//!
//! A [`FormEditor`] owns the edit session for one type: the live value,
//! drafts of leaf input that did not parse, stable identities of list
//! elements, expanded recursion points, and the payload slots of the codec
//! bridge. All changes go through path-addressed operations that check the
//! target against the type before touching the value.

use crate::bridge::{
    resolve_payload, PayloadBinding, PayloadRequest, PayloadResolution, PayloadSlot, SlotStatus,
};
use crate::codec;
use crate::config::EngineOptions;
use crate::errors::{EditError, EngineError};
use crate::path::{FieldPath, Segment};
use crate::render::RenderNode;
use crate::scope::Scope;
use crate::settings::{resolve_field_settings, SettingsBuiltins, SettingsTable};
use crate::value::Value;
use crate::walker::{element_key, join_key, Walker};
use schema_loader::{SchemaResolver, SchemaSource, TicketSequence};
use schema_types::{PrimitiveKind, TypeNode};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Input that did not parse, kept so the user can fix it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub error: String,
}

/// Mutable state of one edit session
#[derive(Debug)]
pub(crate) struct EditState {
    pub(crate) value: Value,
    /* Keyed by internal position key */
    pub(crate) drafts: HashMap<String, Draft>,
    /* Element identities per vector key, in list order */
    pub(crate) element_ids: HashMap<String, Vec<u64>>,
    pub(crate) next_id: u64,
    pub(crate) expanded: BTreeSet<String>,
    pub(crate) payloads: BTreeMap<String, PayloadSlot>,
    pub(crate) tickets: TicketSequence,
}

/// A change operation in serializable form, as used by scripted sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    SetInput { path: FieldPath, text: String },
    SetValue { path: FieldPath, value: JsonValue },
    SelectCase { path: FieldPath, tag: String },
    SetPresent { path: FieldPath, present: bool },
    PushItem { path: FieldPath },
    RemoveItem { path: FieldPath, index: usize },
    MoveItem { path: FieldPath, from: usize, to: usize },
    Expand { path: FieldPath },
}

/* A position in the type tree reached by following a path through the
 * current value */
struct Located<'t> {
    node: &'t TypeNode,
    scope: Scope<'t>,
    key: String,
    disabled: bool,
    /* The position is a back-reference to an enclosing definition */
    recursive: bool,
}

#[derive(Debug)]
pub struct FormEditor {
    node: Arc<TypeNode>,
    table: SettingsTable,
    options: EngineOptions,
    builtins: SettingsBuiltins,
    state: EditState,
}

impl FormEditor {
    /// Mount an editor with default engine options
    pub fn mount(
        node: TypeNode,
        initial: Option<Value>,
        table: SettingsTable,
    ) -> Result<Self, EngineError> {
        Self::mount_with(node, initial, table, EngineOptions::default())
    }

    /// Mount an editor. Without an initial value every position starts at
    /// its settings default or the per-type default.
    pub fn mount_with(
        node: TypeNode,
        initial: Option<Value>,
        table: SettingsTable,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        node.validate()?;
        let builtins = options.builtins();
        let value = match initial {
            Some(value) => {
                value.check_partial(&node)?;
                value
            }
            None => {
                let mut scope = Scope::new();
                default_value(
                    &node,
                    &mut scope,
                    &FieldPath::root(),
                    &table,
                    &builtins,
                    options.config.max_decode_depth,
                )
            }
        };

        let mut editor = Self {
            node: Arc::new(node),
            table,
            options,
            builtins,
            state: EditState {
                value,
                drafts: HashMap::new(),
                element_ids: HashMap::new(),
                next_id: 0,
                expanded: BTreeSet::new(),
                payloads: BTreeMap::new(),
                tickets: TicketSequence::new(),
            },
        };
        editor.reconcile();
        tracing::debug!(
            kind = editor.node.kind_name(),
            payloads = editor.state.payloads.len(),
            "form mounted"
        );
        Ok(editor)
    }

    /// Mount from a plain JSON value
    pub fn mount_json(
        node: TypeNode,
        initial: &JsonValue,
        table: SettingsTable,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let value = Value::from_json(initial, &node)?;
        Self::mount_with(node, Some(value), table, options)
    }

    pub fn node(&self) -> &TypeNode {
        &self.node
    }

    pub fn table(&self) -> &SettingsTable {
        &self.table
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /* ========================================================================
       Read side
       ======================================================================== */

    pub fn render(&self) -> RenderNode {
        self.render_with_errors().0
    }

    pub fn render_with_errors(&self) -> (RenderNode, BTreeMap<FieldPath, Vec<String>>) {
        let mut walker = Walker::edit(&self.table, &self.options, &self.state);
        let rendered = walker.render(&self.node);
        (rendered, walker.into_errors())
    }

    /// Errors of every reachable, visible field
    pub fn errors(&self) -> BTreeMap<FieldPath, Vec<String>> {
        self.render_with_errors().1
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    /// The current value, hidden and disabled fields included
    pub fn get_values(&self) -> &Value {
        &self.state.value
    }

    pub fn get_json(&self) -> JsonValue {
        self.state.value.to_json()
    }

    pub fn value_at(&self, path: &FieldPath) -> Option<&Value> {
        self.state.value.get(path)
    }

    pub fn draft(&self, path: &FieldPath) -> Option<&Draft> {
        let root = self.node.clone();
        let located = self.locate(&root, path).ok()?;
        self.state.drafts.get(&located.key)
    }

    pub fn is_expanded(&self, path: &FieldPath) -> bool {
        let root = self.node.clone();
        self.locate(&root, path)
            .map(|located| self.state.expanded.contains(&located.key))
            .unwrap_or(false)
    }

    /* ========================================================================
       Change operations
       ======================================================================== */

    /// Type into a leaf. Input that does not parse is kept as a draft with
    /// its error; the value keeps its last good state.
    pub fn set_input(&mut self, path: &FieldPath, text: &str) -> Result<(), EditError> {
        let root = self.node.clone();
        let located = self.locate(&root, path)?;
        self.ensure_enabled(&located, path)?;
        let TypeNode::Primitive { kind } = located.node else {
            return Err(not_a(path, "primitive", located.node));
        };

        match self.options.leaves.parse(*kind, text) {
            Ok(value) => {
                let slot = self
                    .state
                    .value
                    .get_mut(path)
                    .ok_or_else(|| EditError::UnknownPath(path.clone()))?;
                *slot = value;
                self.state.drafts.remove(&located.key);
            }
            Err(error) => {
                tracing::trace!(path = %path, error = %error, "keeping draft");
                self.state.drafts.insert(
                    located.key.clone(),
                    Draft {
                        text: text.to_string(),
                        error,
                    },
                );
            }
        }
        self.reconcile();
        Ok(())
    }

    /// Replace the value at a position. Unselected variants are allowed.
    pub fn set_value(&mut self, path: &FieldPath, value: Value) -> Result<(), EditError> {
        let root = self.node.clone();
        let mut located = self.locate(&root, path)?;
        self.ensure_enabled(&located, path)?;
        value
            .conforms_in(located.node, &mut located.scope, path, true)
            .map_err(|e| EditError::TypeMismatch {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        self.replace(path, &located.key, value)?;
        self.reconcile();
        Ok(())
    }

    /// Replace the value at a position from plain JSON
    pub fn set_json(&mut self, path: &FieldPath, json: &JsonValue) -> Result<(), EditError> {
        let root = self.node.clone();
        let mut located = self.locate(&root, path)?;
        let value = Value::from_json_in(json, located.node, &mut located.scope, path).map_err(
            |e| EditError::TypeMismatch {
                path: path.clone(),
                reason: e.to_string(),
            },
        )?;
        self.set_value(path, value)
    }

    /// Choose the active case of a variant. Switching discards the value of
    /// the previous case; choosing the active case again changes nothing.
    pub fn select_case(&mut self, path: &FieldPath, tag: &str) -> Result<(), EditError> {
        let root = self.node.clone();
        let mut located = self.locate(&root, path)?;
        self.ensure_enabled(&located, path)?;
        let TypeNode::Variant { cases } = located.node else {
            return Err(not_a(path, "variant", located.node));
        };
        let settings = resolve_field_settings(located.node, path, &self.table, &self.builtins);
        let case = cases
            .iter()
            .find(|c| c.name == tag)
            .filter(|c| !settings.is_case_excluded(&c.name))
            .ok_or_else(|| EditError::UnknownCase {
                path: path.clone(),
                tag: tag.to_string(),
            })?;

        if matches!(self.state.value.get(path), Some(Value::Variant(current, _)) if current == tag) {
            return Ok(());
        }

        let inner = default_value(
            &case.node,
            &mut located.scope,
            &path.child(tag),
            &self.table,
            &self.builtins,
            self.options.config.max_decode_depth,
        );
        self.replace(path, &located.key, Value::variant(tag, inner))?;
        self.reconcile();
        Ok(())
    }

    /// Toggle an optional. Turning it off drops the inner value.
    pub fn set_present(&mut self, path: &FieldPath, present: bool) -> Result<(), EditError> {
        let root = self.node.clone();
        let mut located = self.locate(&root, path)?;
        self.ensure_enabled(&located, path)?;
        let TypeNode::Optional { inner } = located.node else {
            return Err(not_a(path, "optional", located.node));
        };

        let is_present = match self.state.value.get(path) {
            Some(Value::Optional(slot)) => slot.is_some(),
            _ => return Err(EditError::UnknownPath(path.clone())),
        };
        if is_present == present {
            return Ok(());
        }

        let value = if present {
            Value::some(default_value(
                inner,
                &mut located.scope,
                &path.index(0),
                &self.table,
                &self.builtins,
                self.options.config.max_decode_depth,
            ))
        } else {
            Value::none()
        };
        self.replace(path, &located.key, value)?;
        self.reconcile();
        Ok(())
    }

    /// Append a default element to a list
    pub fn push_item(&mut self, path: &FieldPath) -> Result<(), EditError> {
        let root = self.node.clone();
        let mut located = self.locate(&root, path)?;
        self.ensure_enabled(&located, path)?;
        let TypeNode::Vector { element } = located.node else {
            return Err(not_a(path, "vector", located.node));
        };

        let len = self.items(path)?.len();
        let item = default_value(
            element,
            &mut located.scope,
            &path.index(len),
            &self.table,
            &self.builtins,
            self.options.config.max_decode_depth,
        );
        self.items_mut(path)?.push(item);
        self.reconcile();
        Ok(())
    }

    pub fn remove_item(&mut self, path: &FieldPath, index: usize) -> Result<(), EditError> {
        let root = self.node.clone();
        let located = self.locate(&root, path)?;
        self.ensure_enabled(&located, path)?;
        if !matches!(located.node, TypeNode::Vector { .. }) {
            return Err(not_a(path, "vector", located.node));
        }

        let items = self.items_mut(path)?;
        if index >= items.len() {
            return Err(EditError::IndexOutOfRange {
                path: path.clone(),
                index,
                len: items.len(),
            });
        }
        items.remove(index);
        if let Some(ids) = self.state.element_ids.get_mut(&located.key) {
            if index < ids.len() {
                ids.remove(index);
            }
        }
        self.reconcile();
        Ok(())
    }

    /// Move an element; drafts and payload state travel with it
    pub fn move_item(&mut self, path: &FieldPath, from: usize, to: usize) -> Result<(), EditError> {
        let root = self.node.clone();
        let located = self.locate(&root, path)?;
        self.ensure_enabled(&located, path)?;
        if !matches!(located.node, TypeNode::Vector { .. }) {
            return Err(not_a(path, "vector", located.node));
        }

        let items = self.items_mut(path)?;
        let len = items.len();
        for index in [from, to] {
            if index >= len {
                return Err(EditError::IndexOutOfRange {
                    path: path.clone(),
                    index,
                    len,
                });
            }
        }
        let item = items.remove(from);
        items.insert(to, item);
        if let Some(ids) = self.state.element_ids.get_mut(&located.key) {
            if from < ids.len() && to < ids.len() {
                let id = ids.remove(from);
                ids.insert(to, id);
            }
        }
        self.reconcile();
        Ok(())
    }

    /// Render one more level below a collapsed recursion point
    pub fn expand(&mut self, path: &FieldPath) -> Result<(), EditError> {
        let root = self.node.clone();
        let located = self.locate(&root, path)?;
        if !located.recursive {
            return Err(not_a(path, "recursive reference", located.node));
        }
        self.state.expanded.insert(located.key);
        Ok(())
    }

    pub fn apply(&mut self, op: &EditOp) -> Result<(), EditError> {
        match op {
            EditOp::SetInput { path, text } => self.set_input(path, text),
            EditOp::SetValue { path, value } => self.set_json(path, value),
            EditOp::SelectCase { path, tag } => self.select_case(path, tag),
            EditOp::SetPresent { path, present } => self.set_present(path, *present),
            EditOp::PushItem { path } => self.push_item(path),
            EditOp::RemoveItem { path, index } => self.remove_item(path, *index),
            EditOp::MoveItem { path, from, to } => self.move_item(path, *from, *to),
            EditOp::Expand { path } => self.expand(path),
        }
    }

    /* ========================================================================
       Codec bridge
       ======================================================================== */

    /// Tuple-type lookups the payload slots are waiting for
    pub fn payload_requests(&self) -> Vec<PayloadRequest> {
        self.state
            .payloads
            .iter()
            .filter_map(|(key, slot)| match (&slot.status, slot.ticket, &slot.method, &slot.endpoint) {
                (SlotStatus::Pending, Some(ticket), Some(method), Some(endpoint)) => {
                    Some(PayloadRequest {
                        key: key.clone(),
                        path: slot.path.clone(),
                        ticket,
                        endpoint: endpoint.clone(),
                        method: method.clone(),
                        direction: slot.binding.direction,
                    })
                }
                _ => None,
            })
            .collect()
    }

    /// Apply a resolution. Returns false when it was superseded by a later
    /// request or its slot no longer exists.
    pub fn apply_payload(&mut self, resolution: PayloadResolution) -> bool {
        let Some(slot) = self.state.payloads.get_mut(&resolution.key) else {
            tracing::warn!(key = %resolution.key, "payload slot is gone, dropping resolution");
            return false;
        };
        if !slot.is_current(resolution.ticket) || !matches!(slot.status, SlotStatus::Pending) {
            tracing::warn!(
                key = %resolution.key,
                ticket = resolution.ticket.id(),
                "dropping stale payload resolution"
            );
            return false;
        }

        let bytes = match self.state.value.get(&slot.path) {
            Some(Value::Blob(bytes)) => bytes.clone(),
            _ => Vec::new(),
        };
        slot.status = match resolution.result {
            Ok(node) => decode_slot(node, bytes, &self.options),
            Err(e) => SlotStatus::Unresolved {
                reason: e.to_string(),
            },
        };
        tracing::debug!(key = %resolution.key, status = slot.status.name(), "payload resolved");
        true
    }

    /// Resolve every pending payload slot and apply the results
    pub async fn resolve_payloads<S: SchemaSource>(&mut self, resolver: &SchemaResolver<S>) -> usize {
        let mut applied = 0;
        for request in self.payload_requests() {
            let resolution = resolve_payload(resolver, &request).await;
            if self.apply_payload(resolution) {
                applied += 1;
            }
        }
        applied
    }

    pub fn payload_slot(&self, path: &FieldPath) -> Option<&PayloadSlot> {
        self.state.payloads.values().find(|slot| slot.path == *path)
    }

    pub fn payload_editor(&self, path: &FieldPath) -> Option<&FormEditor> {
        match &self.payload_slot(path)?.status {
            SlotStatus::Decoded { editor, .. } => Some(editor.as_ref()),
            _ => None,
        }
    }

    pub fn payload_editor_mut(&mut self, path: &FieldPath) -> Option<&mut FormEditor> {
        let slot = self.state.payloads.values_mut().find(|slot| slot.path == *path)?;
        match &mut slot.status {
            SlotStatus::Decoded { editor, .. } => Some(editor.as_mut()),
            _ => None,
        }
    }

    /// Encode the nested payload editor's value back into the blob leaf
    pub fn commit_payload(&mut self, path: &FieldPath) -> Result<(), EngineError> {
        let root = self.node.clone();
        let located = self.locate(&root, path)?;
        self.ensure_enabled(&located, path)?;

        let slot = self
            .state
            .payloads
            .get_mut(&located.key)
            .ok_or_else(|| EditError::NoPayload(path.clone()))?;
        let SlotStatus::Decoded {
            node,
            editor,
            source_bytes,
        } = &mut slot.status
        else {
            return Err(EditError::NoPayload(path.clone()).into());
        };
        let bytes = codec::encode(editor.get_values(), node)?;
        *source_bytes = bytes.clone();

        let target = self
            .state
            .value
            .get_mut(path)
            .ok_or_else(|| EditError::UnknownPath(path.clone()))?;
        *target = Value::Blob(bytes);
        self.state.drafts.remove(&located.key);
        self.reconcile();
        Ok(())
    }

    /* ========================================================================
       Internals
       ======================================================================== */

    fn locate<'t>(&self, root: &'t TypeNode, path: &FieldPath) -> Result<Located<'t>, EditError> {
        let unknown = || EditError::UnknownPath(path.clone());
        let mut scope = Scope::new();
        let mut node = root;
        let mut value = &self.state.value;
        let mut key = String::new();
        let mut prefix = FieldPath::root();
        let mut disabled = false;

        for segment in path.segments() {
            let (structural, _) = scope.descend(node).ok_or_else(unknown)?;
            disabled |= resolve_field_settings(structural, &prefix, &self.table, &self.builtins).disabled;

            let (next, next_value, key_segment) = match (structural, value) {
                (TypeNode::Record { fields }, _) => {
                    let name = segment_name(segment).ok_or_else(unknown)?;
                    let field = fields.iter().find(|f| f.name == name).ok_or_else(unknown)?;
                    let v = value.field(&name).ok_or_else(unknown)?;
                    (&field.node, v, name)
                }
                (TypeNode::Variant { cases }, Value::Variant(tag, inner)) => {
                    let name = segment_name(segment).ok_or_else(unknown)?;
                    if *tag != name {
                        return Err(unknown());
                    }
                    let case = cases.iter().find(|c| c.name == name).ok_or_else(unknown)?;
                    (&case.node, inner.as_ref(), name)
                }
                (TypeNode::Optional { inner }, Value::Optional(Some(v))) => {
                    if *segment != Segment::Index(0) {
                        return Err(unknown());
                    }
                    (inner.as_ref(), v.as_ref(), "0".to_string())
                }
                (TypeNode::Vector { element }, Value::Vector(items)) => {
                    let Segment::Index(i) = segment else {
                        return Err(unknown());
                    };
                    let v = items.get(*i).ok_or_else(unknown)?;
                    let id = self.state.element_ids.get(&key).and_then(|ids| ids.get(*i));
                    (element.as_ref(), v, element_key(id, *i))
                }
                _ => return Err(unknown()),
            };
            node = next;
            value = next_value;
            key = join_key(&key, &key_segment);
            prefix = prefix.extend(segment.clone());
        }

        let recursive = matches!(node, TypeNode::Recursive { .. });
        let (structural, _) = scope.descend(node).ok_or_else(unknown)?;
        disabled |= resolve_field_settings(structural, path, &self.table, &self.builtins).disabled;
        Ok(Located {
            node: structural,
            scope,
            key,
            disabled,
            recursive,
        })
    }

    fn ensure_enabled(&self, located: &Located, path: &FieldPath) -> Result<(), EditError> {
        if located.disabled {
            return Err(EditError::Disabled(path.clone()));
        }
        Ok(())
    }

    /* Replace a subtree and forget per-position state below it */
    fn replace(&mut self, path: &FieldPath, key: &str, value: Value) -> Result<(), EditError> {
        let slot = self
            .state
            .value
            .get_mut(path)
            .ok_or_else(|| EditError::UnknownPath(path.clone()))?;
        *slot = value;
        let below = |k: &String| key.is_empty() || k == key || k.starts_with(&format!("{}.", key));
        self.state.drafts.retain(|k, _| !below(k));
        self.state.element_ids.retain(|k, _| !below(k));
        Ok(())
    }

    fn items(&self, path: &FieldPath) -> Result<&Vec<Value>, EditError> {
        match self.state.value.get(path) {
            Some(Value::Vector(items)) => Ok(items),
            _ => Err(EditError::UnknownPath(path.clone())),
        }
    }

    fn items_mut(&mut self, path: &FieldPath) -> Result<&mut Vec<Value>, EditError> {
        match self.state.value.get_mut(path) {
            Some(Value::Vector(items)) => Ok(items),
            _ => Err(EditError::UnknownPath(path.clone())),
        }
    }

    /* Bring element identities, drafts, expansions and payload slots in
     * line with the current value */
    fn reconcile(&mut self) {
        let mut live = HashSet::new();
        let mut bindings = Vec::new();
        {
            let mut sync = Reconciler {
                table: &self.table,
                builtins: &self.builtins,
                element_ids: &mut self.state.element_ids,
                next_id: &mut self.state.next_id,
                live: &mut live,
                bindings: &mut bindings,
            };
            let mut scope = Scope::new();
            sync.visit(&self.node, &self.state.value, &mut scope, &FieldPath::root(), "");
        }
        self.state.drafts.retain(|k, _| live.contains(k));
        self.state.expanded.retain(|k| live.contains(k));
        self.state.element_ids.retain(|k, _| live.contains(k));
        self.sync_payloads(bindings);
    }

    fn sync_payloads(&mut self, bindings: Vec<(String, FieldPath, PayloadBinding)>) {
        let keys: HashSet<&str> = bindings.iter().map(|(key, _, _)| key.as_str()).collect();
        self.state
            .payloads
            .retain(|key, _| keys.contains(key.as_str()));

        for (key, path, binding) in bindings {
            let method = binding.method_in(&self.state.value, &path);
            let endpoint = binding
                .endpoint
                .clone()
                .or_else(|| self.options.config.payload_endpoint.clone());
            let bytes = match self.state.value.get(&path) {
                Some(Value::Blob(bytes)) => bytes.clone(),
                _ => Vec::new(),
            };

            let fresh = !self.state.payloads.contains_key(&key);
            let slot = self
                .state
                .payloads
                .entry(key.clone())
                .or_insert_with(|| PayloadSlot::new(path.clone(), binding.clone()));
            slot.path = path;
            slot.binding = binding;

            if fresh || slot.method != method || slot.endpoint != endpoint {
                slot.ticket = None;
                slot.status = match (&method, &endpoint) {
                    (None, _) => SlotStatus::Idle,
                    (Some(_), None) => SlotStatus::Unresolved {
                        reason: "no schema endpoint configured for this payload".to_string(),
                    },
                    (Some(m), Some(ep)) => {
                        let ticket = self.state.tickets.issue();
                        tracing::debug!(key = %key, method = %m, endpoint = %ep, ticket = ticket.id(), "payload method changed");
                        slot.ticket = Some(ticket);
                        SlotStatus::Pending
                    }
                };
                slot.method = method;
                slot.endpoint = endpoint;
                continue;
            }

            let stale = match &slot.status {
                SlotStatus::Decoded {
                    node, source_bytes, ..
                }
                | SlotStatus::DecodeFailed {
                    node, source_bytes, ..
                } if *source_bytes != bytes => Some(node.clone()),
                _ => None,
            };
            if let Some(node) = stale {
                slot.status = decode_slot(node, bytes, &self.options);
            }
        }
    }
}

fn not_a(path: &FieldPath, expected: &'static str, found: &TypeNode) -> EditError {
    EditError::NotA {
        path: path.clone(),
        expected,
        found: found.kind_name(),
    }
}

fn segment_name(segment: &Segment) -> Option<String> {
    match segment {
        Segment::Name(name) => Some(name.clone()),
        Segment::Index(i) => Some(i.to_string()),
        Segment::AnyIndex => None,
    }
}

/* Decode payload bytes into a nested editor. Empty bytes start a fresh
 * payload from defaults. */
fn decode_slot(node: TypeNode, bytes: Vec<u8>, options: &EngineOptions) -> SlotStatus {
    let initial = if bytes.is_empty() {
        None
    } else {
        match codec::decode_with_limits(&bytes, &node, options.config.decode_limits()) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(error = %error, "payload does not decode against its method");
                return SlotStatus::DecodeFailed {
                    node,
                    error,
                    source_bytes: bytes,
                };
            }
        }
    };
    match FormEditor::mount_with(node.clone(), initial, SettingsTable::new(), options.clone()) {
        Ok(editor) => SlotStatus::Decoded {
            node,
            editor: Box::new(editor),
            source_bytes: bytes,
        },
        Err(e) => SlotStatus::Unresolved {
            reason: e.to_string(),
        },
    }
}

/* Per-type starting value at a position */
pub(crate) fn default_value<'t>(
    node: &'t TypeNode,
    scope: &mut Scope<'t>,
    path: &FieldPath,
    table: &SettingsTable,
    builtins: &SettingsBuiltins,
    max_depth: usize,
) -> Value {
    if scope.depth() > max_depth {
        return Value::Empty;
    }
    let Some((structural, pushed)) = scope.descend(node) else {
        return Value::Empty;
    };

    let settings = resolve_field_settings(structural, path, table, builtins);
    let configured = match &settings.default_value {
        Some(json) => match Value::from_json_in(json, structural, scope, path) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "ignoring default value that does not fit");
                None
            }
        },
        None => None,
    };

    let value = match configured {
        Some(value) => value,
        None => match structural {
            TypeNode::Primitive { kind } => zero_value(*kind),
            TypeNode::Record { fields } => Value::Record(
                fields
                    .iter()
                    .map(|field| {
                        let value = default_value(
                            &field.node,
                            scope,
                            &path.child(&field.name),
                            table,
                            builtins,
                            max_depth,
                        );
                        (field.name.clone(), value)
                    })
                    .collect(),
            ),
            TypeNode::Variant { .. } => Value::Empty,
            TypeNode::Optional { .. } => Value::none(),
            TypeNode::Vector { .. } => Value::Vector(Vec::new()),
            TypeNode::Named { .. } | TypeNode::Recursive { .. } => Value::Empty,
        },
    };
    scope.unwind(pushed);
    value
}

fn zero_value(kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Null => Value::Null,
        PrimitiveKind::Bool => Value::Bool(false),
        PrimitiveKind::Text => Value::text(""),
        PrimitiveKind::Principal => Value::Empty,
        PrimitiveKind::Blob => Value::Blob(Vec::new()),
        PrimitiveKind::Timestamp => Value::Timestamp(0),
        k if k.is_unsigned() => Value::Nat(0),
        k if k.is_signed() => Value::Int(0),
        _ => Value::Float(0.0),
    }
}

/* Walks the value alongside its type to refresh element identities and
 * collect live keys and payload bindings */
struct Reconciler<'r> {
    table: &'r SettingsTable,
    builtins: &'r SettingsBuiltins,
    element_ids: &'r mut HashMap<String, Vec<u64>>,
    next_id: &'r mut u64,
    live: &'r mut HashSet<String>,
    bindings: &'r mut Vec<(String, FieldPath, PayloadBinding)>,
}

impl Reconciler<'_> {
    fn visit<'t>(
        &mut self,
        node: &'t TypeNode,
        value: &Value,
        scope: &mut Scope<'t>,
        path: &FieldPath,
        key: &str,
    ) {
        self.live.insert(key.to_string());
        let Some((structural, pushed)) = scope.descend(node) else {
            return;
        };

        match (structural, value) {
            (TypeNode::Primitive { kind: PrimitiveKind::Blob }, _) => {
                let settings = resolve_field_settings(structural, path, self.table, self.builtins);
                if let Some(binding) = settings.payload {
                    self.bindings.push((key.to_string(), path.clone(), binding));
                }
            }
            (TypeNode::Record { fields }, Value::Record(_)) => {
                for field in fields {
                    if let Some(v) = value.field(&field.name) {
                        let child_key = join_key(key, &field.name);
                        self.visit(&field.node, v, scope, &path.child(&field.name), &child_key);
                    }
                }
            }
            (TypeNode::Variant { cases }, Value::Variant(tag, inner)) => {
                if let Some(case) = cases.iter().find(|c| c.name == *tag) {
                    let child_key = join_key(key, tag);
                    self.visit(&case.node, inner, scope, &path.child(tag), &child_key);
                }
            }
            (TypeNode::Optional { inner }, Value::Optional(Some(v))) => {
                let child_key = join_key(key, "0");
                self.visit(inner, v, scope, &path.index(0), &child_key);
            }
            (TypeNode::Vector { element }, Value::Vector(items)) => {
                let ids = self.element_ids.entry(key.to_string()).or_default();
                ids.truncate(items.len());
                while ids.len() < items.len() {
                    ids.push(*self.next_id);
                    *self.next_id += 1;
                }
                let ids = ids.clone();
                for (i, (item, id)) in items.iter().zip(ids.iter()).enumerate() {
                    let child_key = join_key(key, &element_key(Some(id), i));
                    self.visit(element, item, scope, &path.index(i), &child_key);
                }
            }
            _ => {}
        }
        scope.unwind(pushed);
    }
}
