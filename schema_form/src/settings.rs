/* Field settings: caller tables and per-instance resolution
 *
 * A settings table maps declared paths (possibly with wildcards) to partial
 * settings. Resolution for one concrete field instance starts from the
 * constructor defaults, applies every matching entry from least to most
 * specific (declaration order breaks ties, later wins), and finally derives
 * the label from the field name when no entry set one. */

use crate::adornment::Adornment;
use crate::bridge::PayloadBinding;
use crate::path::{FieldPath, Segment};
use crate::value::Value;
use indexmap::IndexMap;
use regex::Regex;
use schema_types::TypeNode;
use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/* Turns a field name into a display label */
pub type LabelTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/* ============================================================================
   Validators
   ============================================================================ */

pub type ValidateFn = dyn Fn(&Value) -> Option<String> + Send + Sync;

/* A validation rule closure attached in code */
#[derive(Clone)]
pub struct CustomValidator(pub Arc<ValidateFn>);

impl CustomValidator {
    pub fn new(f: impl Fn(&Value) -> Option<String> + Send + Sync + 'static) -> Self {
        CustomValidator(Arc::new(f))
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidator(..)")
    }
}

impl PartialEq for CustomValidator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/* A regular expression compiled when the rule is declared. Serializes as
 * its source text; an invalid expression fails table loading. */
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source)
            .map_err(|e| D::Error::custom(format!("invalid pattern '{}': {}", source, e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Validator {
    Required,
    MinLength {
        value: usize,
    },
    MaxLength {
        value: usize,
    },
    Pattern {
        regex: Pattern,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Min {
        value: f64,
    },
    Max {
        value: f64,
    },
    MinItems {
        value: usize,
    },
    MaxItems {
        value: usize,
    },
    #[serde(skip)]
    Custom(CustomValidator),
}

impl Validator {
    pub fn custom(f: impl Fn(&Value) -> Option<String> + Send + Sync + 'static) -> Self {
        Validator::Custom(CustomValidator::new(f))
    }

    pub fn pattern(source: &str, message: Option<String>) -> Result<Self, regex::Error> {
        Ok(Validator::Pattern {
            regex: Pattern::new(source)?,
            message,
        })
    }

    /* Error message when the value breaks the rule. Rules that do not
     * apply to the value's kind pass. */
    pub fn check(&self, value: &Value) -> Option<String> {
        match self {
            Validator::Required => value
                .is_blank()
                .then(|| "This field is required".to_string()),
            Validator::MinLength { value: min } => match value {
                Value::Text(_) | Value::Blob(_) => value
                    .length()
                    .filter(|len| len < min)
                    .map(|_| format!("Must be at least {} characters", min)),
                _ => None,
            },
            Validator::MaxLength { value: max } => match value {
                Value::Text(_) | Value::Blob(_) => value
                    .length()
                    .filter(|len| len > max)
                    .map(|_| format!("Must be at most {} characters", max)),
                _ => None,
            },
            Validator::Pattern { regex, message } => {
                let text = match value {
                    Value::Text(s) => s.clone(),
                    Value::Principal(p) => p.to_text(),
                    _ => return None,
                };
                if regex.is_match(&text) {
                    None
                } else {
                    Some(
                        message
                            .clone()
                            .unwrap_or_else(|| format!("Must match {}", regex.as_str())),
                    )
                }
            }
            Validator::Min { value: min } => value
                .as_f64()
                .filter(|v| v < min)
                .map(|_| format!("Must be at least {}", min)),
            Validator::Max { value: max } => value
                .as_f64()
                .filter(|v| v > max)
                .map(|_| format!("Must be at most {}", max)),
            Validator::MinItems { value: min } => match value {
                Value::Vector(items) if items.len() < *min => {
                    Some(format!("Add at least {} items", min))
                }
                _ => None,
            },
            Validator::MaxItems { value: max } => match value {
                Value::Vector(items) if items.len() > *max => {
                    Some(format!("No more than {} items allowed", max))
                }
                _ => None,
            },
            Validator::Custom(custom) => (custom.0)(value),
        }
    }
}

/* ============================================================================
   Settings Patch & Resolved Settings
   ============================================================================ */

/* Partial settings as declared by the caller; unset keys leave the
 * inherited value alone */
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Validator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_cases: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadBinding>,
    #[serde(skip)]
    pub adornment: Option<Adornment>,
}

impl SettingsPatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn hidden() -> Self {
        Self {
            hide: Some(true),
            ..Self::default()
        }
    }

    pub fn with_validator(mut self, name: impl Into<String>, validator: Validator) -> Self {
        self.options.insert(name.into(), validator);
        self
    }

    pub fn with_adornment(mut self, adornment: Adornment) -> Self {
        self.adornment = Some(adornment);
        self
    }
}

/* Fully resolved settings for one field instance */
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSettings {
    pub order: Option<i64>,
    pub label: String,
    pub hide: bool,
    pub disabled: bool,
    pub placeholder: Option<String>,
    pub multiline: bool,
    pub required: bool,
    pub default_value: Option<JsonValue>,
    pub options: BTreeMap<String, Validator>,
    pub exclude_cases: Vec<String>,
    pub payload: Option<PayloadBinding>,
    pub adornment: Option<Adornment>,
    pub(crate) label_is_default: bool,
}

impl FieldSettings {
    /* Constructor defaults for a node */
    fn defaults_for(node: &TypeNode) -> Self {
        let required = match node.unwrap_named() {
            TypeNode::Primitive { kind } => kind.is_text_shaped(),
            _ => false,
        };
        Self {
            order: None,
            label: String::new(),
            hide: false,
            disabled: false,
            placeholder: None,
            multiline: false,
            required,
            default_value: None,
            options: BTreeMap::new(),
            exclude_cases: Vec::new(),
            payload: None,
            adornment: None,
            label_is_default: true,
        }
    }

    /* One-level merge: set keys override, validators merge by name */
    fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(order) = patch.order {
            self.order = Some(order);
        }
        if let Some(label) = &patch.label {
            self.label = label.clone();
            self.label_is_default = false;
        }
        if let Some(hide) = patch.hide {
            self.hide = hide;
        }
        if let Some(disabled) = patch.disabled {
            self.disabled = disabled;
        }
        if let Some(placeholder) = &patch.placeholder {
            self.placeholder = Some(placeholder.clone());
        }
        if let Some(multiline) = patch.multiline {
            self.multiline = multiline;
        }
        if let Some(required) = patch.required {
            self.required = required;
        }
        if let Some(default_value) = &patch.default_value {
            self.default_value = Some(default_value.clone());
        }
        for (name, validator) in &patch.options {
            self.options.insert(name.clone(), validator.clone());
        }
        if let Some(exclude) = &patch.exclude_cases {
            self.exclude_cases = exclude.clone();
        }
        if let Some(payload) = &patch.payload {
            self.payload = Some(payload.clone());
        }
        if let Some(adornment) = &patch.adornment {
            self.adornment = Some(adornment.clone());
        }
    }

    pub fn label_is_default(&self) -> bool {
        self.label_is_default
    }

    pub fn is_case_excluded(&self, case: &str) -> bool {
        self.exclude_cases.iter().any(|c| c == case)
    }
}

/* ============================================================================
   Settings Table
   ============================================================================ */

/* Caller table of declared path -> partial settings, in declaration order */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsTable {
    entries: Vec<(FieldPath, SettingsPatch)>,
}

impl SettingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(content)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /* Append an entry; a later entry for an equally specific path wins */
    pub fn insert(&mut self, path: impl Into<FieldPath>, patch: SettingsPatch) -> &mut Self {
        self.entries.push((path.into(), patch));
        self
    }

    pub fn with(mut self, path: impl Into<FieldPath>, patch: SettingsPatch) -> Self {
        self.insert(path, patch);
        self
    }

    /* Attach an adornment to the last entry declared for `path`, adding an
     * entry when there is none */
    pub fn adorn(&mut self, path: impl Into<FieldPath>, adornment: Adornment) -> &mut Self {
        let path = path.into();
        self.patch_mut(path).adornment = Some(adornment);
        self
    }

    /* Add a named validator to the entry for `path` */
    pub fn validate(
        &mut self,
        path: impl Into<FieldPath>,
        name: impl Into<String>,
        validator: Validator,
    ) -> &mut Self {
        let path = path.into();
        self.patch_mut(path).options.insert(name.into(), validator);
        self
    }

    fn patch_mut(&mut self, path: FieldPath) -> &mut SettingsPatch {
        let idx = match self.entries.iter().rposition(|(p, _)| *p == path) {
            Some(idx) => idx,
            None => {
                self.entries.push((path, SettingsPatch::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn entries(&self) -> &[(FieldPath, SettingsPatch)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /* Entries matching a concrete path, least specific first */
    pub fn matching(&self, concrete: &FieldPath) -> Vec<&SettingsPatch> {
        let mut hits: Vec<(usize, &FieldPath, &SettingsPatch)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, (declared, _))| declared.matches(concrete))
            .map(|(idx, (declared, patch))| (idx, declared, patch))
            .collect();
        hits.sort_by(|a, b| a.1.specificity_cmp(b.1).then(a.0.cmp(&b.0)));
        hits.into_iter().map(|(_, _, patch)| patch).collect()
    }
}

impl Serialize for SettingsTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, patch) in &self.entries {
            map.serialize_entry(&path.to_key(), patch)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SettingsTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = IndexMap::<String, SettingsPatch>::deserialize(deserializer)?;
        Ok(SettingsTable {
            entries: map
                .into_iter()
                .map(|(path, patch)| (FieldPath::parse(&path), patch))
                .collect(),
        })
    }
}

/* ============================================================================
   Resolution
   ============================================================================ */

/* Engine-wide inputs to resolution that do not come from the table */
#[derive(Clone)]
pub struct SettingsBuiltins {
    pub transform_label: LabelTransform,
}

impl Default for SettingsBuiltins {
    fn default() -> Self {
        Self {
            transform_label: Arc::new(humanize),
        }
    }
}

impl fmt::Debug for SettingsBuiltins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsBuiltins").finish_non_exhaustive()
    }
}

impl SettingsBuiltins {
    pub fn default_label(&self, path: &FieldPath) -> String {
        match path.last() {
            None => String::new(),
            Some(Segment::Name(name)) => (self.transform_label)(name),
            Some(Segment::Index(i)) => format!("Item {}", i + 1),
            Some(Segment::AnyIndex) => "Item".to_string(),
        }
    }
}

/* Resolve the settings of the field instance at `path` whose type is `node` */
pub fn resolve_field_settings(
    node: &TypeNode,
    path: &FieldPath,
    table: &SettingsTable,
    builtins: &SettingsBuiltins,
) -> FieldSettings {
    let mut settings = FieldSettings::defaults_for(node);
    for patch in table.matching(path) {
        settings.apply(patch);
    }
    if settings.label_is_default {
        settings.label = builtins.default_label(path);
    }
    settings
}

/* "first_name" -> "First name" */
pub fn humanize(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    let trimmed = spaced.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_types::PrimitiveKind;

    fn text() -> TypeNode {
        TypeNode::primitive(PrimitiveKind::Text)
    }

    #[test]
    fn exact_index_beats_wildcard() {
        let table = SettingsTable::new()
            .with("tags.*", SettingsPatch::label("Item"))
            .with("tags.0", SettingsPatch::label("First"));
        let builtins = SettingsBuiltins::default();

        let first = resolve_field_settings(&text(), &FieldPath::parse("tags.0"), &table, &builtins);
        let second = resolve_field_settings(&text(), &FieldPath::parse("tags.1"), &table, &builtins);
        assert_eq!(first.label, "First");
        assert_eq!(second.label, "Item");
    }

    #[test]
    fn declaration_order_does_not_beat_specificity() {
        let table = SettingsTable::new()
            .with("tags.0", SettingsPatch::label("First"))
            .with("tags.*", SettingsPatch::label("Item"));
        let settings = resolve_field_settings(
            &text(),
            &FieldPath::parse("tags.0"),
            &table,
            &SettingsBuiltins::default(),
        );
        assert_eq!(settings.label, "First");
    }

    #[test]
    fn equally_specific_entries_last_wins_per_key() {
        let table = SettingsTable::new()
            .with(
                "name",
                SettingsPatch {
                    label: Some("A".into()),
                    placeholder: Some("type here".into()),
                    ..SettingsPatch::default()
                },
            )
            .with("name", SettingsPatch::label("B"));
        let settings = resolve_field_settings(
            &text(),
            &FieldPath::parse("name"),
            &table,
            &SettingsBuiltins::default(),
        );
        assert_eq!(settings.label, "B");
        assert_eq!(settings.placeholder.as_deref(), Some("type here"));
    }

    #[test]
    fn validators_merge_by_name() {
        let table = SettingsTable::new()
            .with(
                "tags.*",
                SettingsPatch::default()
                    .with_validator("len", Validator::MaxLength { value: 5 })
                    .with_validator("shape", Validator::Required),
            )
            .with(
                "tags.0",
                SettingsPatch::default().with_validator("len", Validator::MaxLength { value: 2 }),
            );
        let settings = resolve_field_settings(
            &text(),
            &FieldPath::parse("tags.0"),
            &table,
            &SettingsBuiltins::default(),
        );
        assert_eq!(settings.options.len(), 2);
        assert_eq!(
            settings.options.get("len"),
            Some(&Validator::MaxLength { value: 2 })
        );
    }

    #[test]
    fn default_labels_and_transform() {
        let builtins = SettingsBuiltins {
            transform_label: Arc::new(|name: &str| name.to_uppercase()),
        };
        let table = SettingsTable::new().with("kept", SettingsPatch::label("Kept as is"));
        let a = resolve_field_settings(&text(), &FieldPath::parse("first_name"), &table, &builtins);
        let b = resolve_field_settings(&text(), &FieldPath::parse("kept"), &table, &builtins);
        let c = resolve_field_settings(&text(), &FieldPath::parse("list.2"), &table, &builtins);
        assert_eq!(a.label, "FIRST_NAME");
        assert_eq!(b.label, "Kept as is");
        assert_eq!(c.label, "Item 3");
        assert_eq!(humanize("first_name"), "First name");
    }

    #[test]
    fn resolution_is_idempotent() {
        let table = SettingsTable::new()
            .with("*", SettingsPatch::hidden())
            .with("0", SettingsPatch::label("Zero"));
        let builtins = SettingsBuiltins::default();
        let path = FieldPath::parse("0");
        let once = resolve_field_settings(&text(), &path, &table, &builtins);
        let twice = resolve_field_settings(&text(), &path, &table, &builtins);
        assert_eq!(once, twice);
        assert!(once.hide);
        assert!(once.required);
    }

    #[test]
    fn table_loads_from_yaml_in_order() {
        let yaml = r#"
name:
  label: Full name
  options:
    short:
      rule: max_length
      value: 10
"tags.*":
  placeholder: tag
arg:
  payload:
    method_field: method
"#;
        let table = SettingsTable::from_yaml(yaml).expect("parse table");
        let paths: Vec<String> = table.entries().iter().map(|(p, _)| p.to_key()).collect();
        assert_eq!(paths, vec!["name", "tags.*", "arg"]);
        assert_eq!(
            table.entries()[0].1.options.get("short"),
            Some(&Validator::MaxLength { value: 10 })
        );
        assert!(table.entries()[2].1.payload.is_some());
    }

    #[test]
    fn invalid_pattern_fails_table_loading() {
        let yaml = r#"
name:
  options:
    shape:
      rule: pattern
      regex: "[a-"
"#;
        let err = SettingsTable::from_yaml(yaml).expect_err("invalid pattern");
        assert!(err.to_string().contains("invalid pattern"), "{}", err);

        let ok = SettingsTable::from_yaml(
            "name:\n  options:\n    shape:\n      rule: pattern\n      regex: \"^[a-z]+$\"\n",
        )
        .expect("valid pattern");
        let round = serde_json::to_value(&ok).expect("serialize");
        assert_eq!(round["name"]["options"]["shape"]["regex"], "^[a-z]+$");
        assert!(Validator::pattern("(", None).is_err());
    }

    #[test]
    fn validator_messages() {
        assert!(Validator::Required.check(&Value::text("  ")).is_some());
        assert!(Validator::MinLength { value: 3 }.check(&Value::text("ab")).is_some());
        assert!(Validator::Max { value: 10.0 }.check(&Value::Nat(11)).is_some());
        assert!(Validator::Max { value: 10.0 }.check(&Value::Nat(10)).is_none());
        assert!(Validator::MinItems { value: 1 }
            .check(&Value::Vector(vec![]))
            .is_some());
        let pattern = Validator::pattern("^[a-z]+$", Some("lowercase only".into()))
            .expect("valid pattern");
        assert_eq!(pattern.check(&Value::text("Abc")), Some("lowercase only".into()));
        let custom = Validator::custom(|v| (v == &Value::text("no")).then(|| "nope".to_string()));
        assert_eq!(custom.check(&Value::text("no")), Some("nope".into()));
    }
}
