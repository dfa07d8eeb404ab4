/* Engine configuration */

use crate::codec::DecodeLimits;
use crate::leaf::LeafRendererRegistry;
use crate::settings::{humanize, LabelTransform, SettingsBuiltins};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/* How default labels are derived from field names */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelStyle {
    /* "first_name" -> "First name" */
    #[default]
    Humanize,
    /* The field name as declared */
    Raw,
}

/* Serializable knobs, loadable from YAML */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /* How many times a recursive definition is re-entered on one branch
     * before its subtree collapses behind a load-more control */
    pub max_recursion_depth: usize,
    /* Nesting limit for payload decoding */
    pub max_decode_depth: usize,
    /* Vector elements one payload may decode into */
    pub max_decode_items: usize,
    pub label_style: LabelStyle,
    /* Schema endpoint used for payload bindings that name none */
    pub payload_endpoint: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: 1,
            max_decode_depth: crate::codec::DEFAULT_MAX_DEPTH,
            max_decode_items: crate::codec::DEFAULT_MAX_ITEMS,
            label_style: LabelStyle::Humanize,
            payload_endpoint: None,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(content)
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_depth: self.max_decode_depth,
            max_items: self.max_decode_items,
        }
    }
}

/* Everything a form editor or viewer needs besides the type, value and
 * settings table */
#[derive(Clone, Default)]
pub struct EngineOptions {
    pub config: EngineConfig,
    /* Overrides `config.label_style` when set */
    pub transform_label: Option<LabelTransform>,
    pub leaves: LeafRendererRegistry,
}

impl EngineOptions {
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_label_transform(
        mut self,
        transform: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.transform_label = Some(Arc::new(transform));
        self
    }

    pub fn builtins(&self) -> SettingsBuiltins {
        let transform_label = match (&self.transform_label, self.config.label_style) {
            (Some(transform), _) => transform.clone(),
            (None, LabelStyle::Humanize) => Arc::new(humanize) as LabelTransform,
            (None, LabelStyle::Raw) => Arc::new(|name: &str| name.to_string()) as LabelTransform,
        };
        SettingsBuiltins { transform_label }
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("config", &self.config)
            .field("transform_label", &self.transform_label.as_ref().map(|_| ".."))
            .field("leaves", &self.leaves)
            .finish()
    }
}
