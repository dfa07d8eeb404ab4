/* Structural walker shared by the editor and the viewer.
 *
 * Descends the type tree in lock-step with a value, resolving settings for
 * every field instance and producing a RenderNode per position. In edit
 * mode it also collects the error map that defines form validity. */

use crate::adornment::{Adornment, AdornmentContext, Mode};
use crate::bridge::{PayloadBinding, PayloadCatalog, SlotStatus};
use crate::codec;
use crate::config::EngineOptions;
use crate::editor::EditState;
use crate::path::{FieldPath, Segment};
use crate::render::{CaseOption, Control, LeafControl, PayloadControl, RenderNode};
use crate::scope::Scope;
use crate::settings::{resolve_field_settings, FieldSettings, SettingsBuiltins, SettingsTable};
use crate::value::Value;
use schema_types::{FieldNode, PrimitiveKind, TypeNode};
use std::collections::{BTreeMap, BTreeSet};

pub(crate) const REQUIRED: &str = "This field is required";
pub(crate) const SELECT_CASE: &str = "Select an option";
pub(crate) const COLLAPSED_INCOMPLETE: &str = "Expand to complete this field";
pub(crate) const PAYLOAD_INVALID: &str = "Payload has invalid fields";

/* Internal key of a child position */
pub(crate) fn join_key(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", parent, segment)
    }
}

pub(crate) fn element_key(id: Option<&u64>, index: usize) -> String {
    match id {
        Some(id) => format!("@{}", id),
        None => index.to_string(),
    }
}

/* Where the walk currently is */
#[derive(Debug, Clone)]
struct Site {
    path: FieldPath,
    key: String,
    hidden: bool,
    disabled: bool,
    /* Extra recursion levels granted by expansions above this point */
    bonus: usize,
    /* Label of an enclosing optional, used when this field has no label of
     * its own */
    inherited_label: Option<String>,
}

impl Site {
    fn root() -> Self {
        Self {
            path: FieldPath::root(),
            key: String::new(),
            hidden: false,
            disabled: false,
            bonus: 0,
            inherited_label: None,
        }
    }

    fn child(&self, segment: Segment, key_segment: &str, hidden: bool, disabled: bool) -> Self {
        Self {
            path: self.path.extend(segment),
            key: join_key(&self.key, key_segment),
            hidden,
            disabled,
            bonus: self.bonus,
            inherited_label: None,
        }
    }
}

pub(crate) struct Walker<'a> {
    mode: Mode,
    table: &'a SettingsTable,
    options: &'a EngineOptions,
    builtins: SettingsBuiltins,
    root: &'a Value,
    state: Option<&'a EditState>,
    expanded: &'a BTreeSet<String>,
    catalog: Option<&'a PayloadCatalog>,
    errors: BTreeMap<FieldPath, Vec<String>>,
}

impl<'a> Walker<'a> {
    pub(crate) fn edit(
        table: &'a SettingsTable,
        options: &'a EngineOptions,
        state: &'a EditState,
    ) -> Self {
        Self {
            mode: Mode::Edit,
            table,
            options,
            builtins: options.builtins(),
            root: &state.value,
            state: Some(state),
            expanded: &state.expanded,
            catalog: None,
            errors: BTreeMap::new(),
        }
    }

    pub(crate) fn view(
        table: &'a SettingsTable,
        options: &'a EngineOptions,
        root: &'a Value,
        expanded: &'a BTreeSet<String>,
        catalog: Option<&'a PayloadCatalog>,
    ) -> Self {
        Self {
            mode: Mode::View,
            table,
            options,
            builtins: options.builtins(),
            root,
            state: None,
            expanded,
            catalog,
            errors: BTreeMap::new(),
        }
    }

    pub(crate) fn render(&mut self, node: &TypeNode) -> RenderNode {
        let mut scope = Scope::new();
        let root = self.root;
        self.walk(node, Some(root), &mut scope, Site::root())
    }

    pub(crate) fn into_errors(self) -> BTreeMap<FieldPath, Vec<String>> {
        self.errors
    }

    fn walk<'t>(
        &mut self,
        node: &'t TypeNode,
        value: Option<&'a Value>,
        scope: &mut Scope<'t>,
        mut site: Site,
    ) -> RenderNode {
        let mut pushed = 0;
        let mut current = node;
        let mut expansion_counted = false;
        loop {
            match current {
                TypeNode::Named { id, node: body } => {
                    scope.enter(id, body.as_ref());
                    pushed += 1;
                    current = body.as_ref();
                }
                TypeNode::Recursive { id } => {
                    let Some(body) = scope.lookup(id) else {
                        scope.unwind(pushed);
                        let reason = format!("unresolved recursive type '{}'", id);
                        return self.bare(&site, Control::Unknown { reason });
                    };
                    if !expansion_counted && self.expanded.contains(&site.key) {
                        site.bonus += 1;
                        expansion_counted = true;
                    }
                    let reentries = scope.occurrences(id).saturating_sub(1);
                    if reentries >= self.options.config.max_recursion_depth + site.bonus {
                        tracing::trace!(path = %site.path, id = %id, "recursion ceiling reached");
                        let rendered = self.load_more(current, id, value, scope, &site);
                        scope.unwind(pushed);
                        return rendered;
                    }
                    scope.enter(id, body);
                    pushed += 1;
                    current = body;
                }
                _ => break,
            }
        }

        let rendered = self.structural(current, value, scope, site);
        scope.unwind(pushed);
        rendered
    }

    fn structural<'t>(
        &mut self,
        node: &'t TypeNode,
        value: Option<&'a Value>,
        scope: &mut Scope<'t>,
        site: Site,
    ) -> RenderNode {
        let settings = resolve_field_settings(node, &site.path, self.table, &self.builtins);
        let label = match (&site.inherited_label, settings.label_is_default()) {
            (Some(inherited), true) => inherited.clone(),
            _ => settings.label.clone(),
        };
        let hidden = site.hidden || settings.hide;
        let disabled = site.disabled || settings.disabled;
        tracing::trace!(path = %site.path, kind = node.kind_name(), hidden, "walk");

        let mut errors = Vec::new();
        let control = match value {
            None => match node {
                TypeNode::Optional { .. } => Control::Optional {
                    present: false,
                    body: None,
                },
                _ => Control::Unknown {
                    reason: "missing value".to_string(),
                },
            },
            Some(v) => self.control(node, v, scope, &site, &settings, &label, hidden, disabled, &mut errors),
        };

        if self.mode == Mode::Edit && errors.is_empty() {
            if let Some(v) = value {
                self.validate(v, &control, &settings, &mut errors);
            }
        }

        let mut rendered = RenderNode {
            key: site.key.clone(),
            path: site.path.clone(),
            label,
            hidden,
            disabled,
            errors,
            control,
            end: None,
        };

        if let Some(adornment) = &settings.adornment {
            let ctx = AdornmentContext {
                mode: self.mode,
                path: &site.path,
                label: &rendered.label,
                node,
                value,
                errors: &rendered.errors,
            };
            let content = adornment.render(&ctx);
            match adornment {
                Adornment::Replace(_) => rendered.control = Control::Custom { content },
                Adornment::End(_) => rendered.end = Some(content),
            }
        }

        if self.mode == Mode::Edit && !hidden && !rendered.errors.is_empty() {
            self.errors
                .entry(site.path)
                .or_default()
                .extend(rendered.errors.iter().cloned());
        }
        rendered
    }

    #[allow(clippy::too_many_arguments)]
    fn control<'t>(
        &mut self,
        node: &'t TypeNode,
        value: &'a Value,
        scope: &mut Scope<'t>,
        site: &Site,
        settings: &FieldSettings,
        label: &str,
        hidden: bool,
        disabled: bool,
        errors: &mut Vec<String>,
    ) -> Control {
        match (node, value) {
            (TypeNode::Primitive { kind }, v) if v.matches_kind(*kind) || *v == Value::Empty => {
                self.leaf(*kind, v, site, settings, errors)
            }
            (TypeNode::Record { fields }, Value::Record(_)) => {
                let mut ordered: Vec<(i64, usize, &'t FieldNode)> = fields
                    .iter()
                    .enumerate()
                    .map(|(idx, field)| {
                        let child_path = site.path.child(&field.name);
                        let order = resolve_field_settings(
                            &field.node,
                            &child_path,
                            self.table,
                            &self.builtins,
                        )
                        .order;
                        (order.unwrap_or(idx as i64), idx, field)
                    })
                    .collect();
                ordered.sort_by_key(|(order, idx, _)| (*order, *idx));

                let mut children = Vec::with_capacity(ordered.len());
                for (_, _, field) in ordered {
                    let child = site.child(Segment::name(&field.name), &field.name, hidden, disabled);
                    children.push(self.walk(&field.node, value.field(&field.name), scope, child));
                }
                Control::Record { fields: children }
            }
            (TypeNode::Variant { cases }, Value::Empty) => {
                if self.mode == Mode::Edit {
                    errors.push(SELECT_CASE.to_string());
                }
                Control::Variant {
                    cases: self.case_options(cases, site, settings, None),
                    selected: None,
                    body: None,
                }
            }
            (TypeNode::Variant { cases }, Value::Variant(tag, inner)) => {
                let Some(case) = cases.iter().find(|c| c.name == *tag) else {
                    return Control::Unknown {
                        reason: format!("unknown case '{}'", tag),
                    };
                };
                let child = site.child(Segment::name(tag), tag, hidden, disabled);
                let body = self.walk(&case.node, Some(inner.as_ref()), scope, child);
                Control::Variant {
                    cases: self.case_options(cases, site, settings, Some(tag)),
                    selected: Some(tag.clone()),
                    body: Some(Box::new(body)),
                }
            }
            (TypeNode::Optional { inner }, Value::Optional(slot)) => {
                let body = slot.as_ref().map(|v| {
                    let mut child = site.child(Segment::Index(0), "0", hidden, disabled);
                    child.inherited_label = Some(label.to_string());
                    Box::new(self.walk(inner, Some(v.as_ref()), scope, child))
                });
                Control::Optional {
                    present: body.is_some(),
                    body,
                }
            }
            (TypeNode::Vector { element }, Value::Vector(items)) => {
                let ids = self
                    .state
                    .and_then(|state| state.element_ids.get(&site.key));
                let mut children = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let key = element_key(ids.and_then(|ids| ids.get(i)), i);
                    let child = site.child(Segment::Index(i), &key, hidden, disabled);
                    children.push(self.walk(element, Some(item), scope, child));
                }
                Control::Vector {
                    items: children,
                    can_add: !disabled,
                }
            }
            (node, v) => Control::Unknown {
                reason: format!("expected {}, found {}", node.kind_name(), v.kind_name()),
            },
        }
    }

    /* Required rule and caller validators, for positions without structural
     * errors */
    fn validate(
        &self,
        value: &Value,
        control: &Control,
        settings: &FieldSettings,
        errors: &mut Vec<String>,
    ) {
        if matches!(control, Control::Unknown { .. } | Control::LoadMore { .. }) {
            return;
        }
        /* An empty leaf cannot be encoded, whatever the required setting says */
        let unentered = matches!(control, Control::Leaf(_)) && *value == Value::Empty;
        if unentered || (settings.required && value.is_blank()) {
            errors.push(REQUIRED.to_string());
            return;
        }
        for validator in settings.options.values() {
            if let Some(message) = validator.check(value) {
                errors.push(message);
            }
        }
    }

    fn case_options(
        &self,
        cases: &[FieldNode],
        site: &Site,
        settings: &FieldSettings,
        selected: Option<&str>,
    ) -> Vec<CaseOption> {
        cases
            .iter()
            .filter(|c| !settings.is_case_excluded(&c.name) || selected == Some(c.name.as_str()))
            .map(|c| CaseOption {
                name: c.name.clone(),
                label: resolve_field_settings(
                    &c.node,
                    &site.path.child(&c.name),
                    self.table,
                    &self.builtins,
                )
                .label,
            })
            .collect()
    }

    fn leaf(
        &mut self,
        kind: PrimitiveKind,
        value: &'a Value,
        site: &Site,
        settings: &FieldSettings,
        errors: &mut Vec<String>,
    ) -> Control {
        if let (PrimitiveKind::Blob, Some(binding), Value::Blob(bytes)) =
            (kind, &settings.payload, value)
        {
            return Control::Payload(self.payload(binding, bytes, site, errors));
        }

        let leaves = &self.options.leaves;
        let draft = self.state.and_then(|state| state.drafts.get(&site.key));
        let (text, json) = match draft {
            Some(draft) => {
                errors.push(draft.error.clone());
                (draft.text.clone(), serde_json::Value::Null)
            }
            None => (leaves.format(kind, value), value.to_json()),
        };
        Control::Leaf(LeafControl {
            kind,
            widget: leaves.widget(kind, settings.multiline),
            text,
            value: json,
            placeholder: settings.placeholder.clone(),
            extra: leaves.enrich(kind, value),
        })
    }

    fn payload(
        &mut self,
        binding: &PayloadBinding,
        bytes: &[u8],
        site: &Site,
        errors: &mut Vec<String>,
    ) -> PayloadControl {
        let mut control = PayloadControl {
            status: SlotStatus::Idle.name().to_string(),
            method: None,
            endpoint: None,
            bytes: format!("0x{}", hex::encode(bytes)),
            error: None,
            body: None,
        };

        if let Some(state) = self.state {
            let Some(slot) = state.payloads.get(&site.key) else {
                return control;
            };
            control.status = slot.status.name().to_string();
            control.method = slot.method.clone();
            control.endpoint = slot.endpoint.clone();
            match &slot.status {
                SlotStatus::Decoded { editor, .. } => {
                    let (body, nested_errors) = editor.render_with_errors();
                    if !nested_errors.is_empty() {
                        errors.push(PAYLOAD_INVALID.to_string());
                    }
                    control.body = Some(Box::new(body));
                }
                SlotStatus::DecodeFailed { error, .. } => control.error = Some(error.to_string()),
                SlotStatus::Unresolved { reason } => control.error = Some(reason.clone()),
                SlotStatus::Idle | SlotStatus::Pending => {}
            }
            return control;
        }

        /* View mode: decode through the prepared catalog */
        let method = binding.method_in(self.root, &site.path);
        let endpoint = binding
            .endpoint
            .clone()
            .or_else(|| self.options.config.payload_endpoint.clone());
        control.method = method.clone();
        control.endpoint = endpoint.clone();

        let Some(method) = method else {
            return control;
        };
        let unresolved = |control: &mut PayloadControl, reason: String| {
            control.status = "unresolved".to_string();
            control.error = Some(reason);
        };
        let Some(catalog) = self.catalog else {
            unresolved(&mut control, "no schema catalog loaded".to_string());
            return control;
        };
        if endpoint.as_deref().is_some_and(|e| e != catalog.endpoint()) {
            unresolved(
                &mut control,
                format!("no schema catalog loaded for '{}'", endpoint.unwrap_or_default()),
            );
            return control;
        }
        let Some(tuple) = catalog.tuple(&method, binding.direction) else {
            unresolved(&mut control, format!("unknown method '{}'", method));
            return control;
        };

        match codec::decode_with_limits(bytes, tuple, self.options.config.decode_limits()) {
            Ok(decoded) => {
                let table = SettingsTable::new();
                let expanded = BTreeSet::new();
                let mut nested =
                    Walker::view(&table, self.options, &decoded, &expanded, self.catalog);
                control.status = "decoded".to_string();
                control.body = Some(Box::new(nested.render(tuple)));
            }
            Err(e) => {
                tracing::debug!(path = %site.path, method = %method, error = %e, "payload does not decode");
                control.status = "decode-failed".to_string();
                control.error = Some(e.to_string());
            }
        }
        control
    }

    fn load_more<'t>(
        &mut self,
        node: &'t TypeNode,
        id: &str,
        value: Option<&'a Value>,
        scope: &mut Scope<'t>,
        site: &Site,
    ) -> RenderNode {
        let settings = resolve_field_settings(node, &site.path, self.table, &self.builtins);
        let label = match (&site.inherited_label, settings.label_is_default()) {
            (Some(inherited), true) => inherited.clone(),
            _ => settings.label,
        };
        let hidden = site.hidden || settings.hide;

        let mut errors = Vec::new();
        if self.mode == Mode::Edit {
            if let Some(v) = value {
                if v.conforms_in(node, scope, &site.path, false).is_err() {
                    errors.push(COLLAPSED_INCOMPLETE.to_string());
                }
            }
        }
        if self.mode == Mode::Edit && !hidden && !errors.is_empty() {
            self.errors
                .entry(site.path.clone())
                .or_default()
                .extend(errors.iter().cloned());
        }

        RenderNode {
            key: site.key.clone(),
            path: site.path.clone(),
            label,
            hidden,
            disabled: site.disabled || settings.disabled,
            errors,
            control: Control::LoadMore {
                type_id: id.to_string(),
            },
            end: None,
        }
    }

    fn bare(&self, site: &Site, control: Control) -> RenderNode {
        RenderNode {
            key: site.key.clone(),
            path: site.path.clone(),
            label: self.builtins.default_label(&site.path),
            hidden: site.hidden,
            disabled: site.disabled,
            errors: Vec::new(),
            control,
            end: None,
        }
    }
}
