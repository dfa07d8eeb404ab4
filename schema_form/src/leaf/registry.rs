/* Registry of leaf renderers keyed by primitive kind */

use super::handlers;
use super::traits::{LeafRenderer, Widget};
use crate::value::Value;
use schema_types::PrimitiveKind;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct LeafRendererRegistry {
    renderers: HashMap<PrimitiveKind, Arc<dyn LeafRenderer>>,
}

impl std::fmt::Debug for LeafRendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafRendererRegistry")
            .field("kinds", &self.registered_kinds())
            .finish()
    }
}

impl LeafRendererRegistry {
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /* Create registry with the built-in renderers */
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /* Register a renderer for every kind it handles, replacing earlier ones */
    pub fn register(&mut self, renderer: Arc<dyn LeafRenderer>) {
        for kind in renderer.kinds() {
            self.renderers.insert(*kind, renderer.clone());
        }
    }

    pub fn get(&self, kind: PrimitiveKind) -> Option<&Arc<dyn LeafRenderer>> {
        self.renderers.get(&kind)
    }

    pub fn registered_kinds(&self) -> Vec<PrimitiveKind> {
        let mut kinds: Vec<_> = self.renderers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn widget(&self, kind: PrimitiveKind, multiline: bool) -> Widget {
        match self.get(kind) {
            Some(renderer) => renderer.widget(kind, multiline),
            None => Widget::Static,
        }
    }

    /* Unregistered kinds fall back to the JSON form of the value */
    pub fn format(&self, kind: PrimitiveKind, value: &Value) -> String {
        match self.get(kind) {
            Some(renderer) => renderer.format(kind, value),
            None => match value.to_json() {
                JsonValue::String(s) => s,
                other => other.to_string(),
            },
        }
    }

    pub fn parse(&self, kind: PrimitiveKind, input: &str) -> Result<Value, String> {
        match self.get(kind) {
            Some(renderer) => renderer.parse(kind, input),
            None => Err(format!("{} fields cannot be typed into", kind)),
        }
    }

    pub fn enrich(&self, kind: PrimitiveKind, value: &Value) -> Map<String, JsonValue> {
        match self.get(kind) {
            Some(renderer) => renderer.enrich(kind, value),
            None => Map::new(),
        }
    }

    fn register_defaults(&mut self) {
        self.register(Arc::new(handlers::NullHandler));
        self.register(Arc::new(handlers::BoolHandler));
        self.register(Arc::new(handlers::TextHandler));
        self.register(Arc::new(handlers::NumberHandler));
        self.register(Arc::new(handlers::PrincipalHandler));
        self.register(Arc::new(handlers::BlobHandler));
        self.register(Arc::new(handlers::TimestampHandler));
    }
}

impl Default for LeafRendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shouting;

    impl LeafRenderer for Shouting {
        fn kinds(&self) -> &'static [PrimitiveKind] {
            &[PrimitiveKind::Text]
        }

        fn format(&self, _kind: PrimitiveKind, value: &Value) -> String {
            match value {
                Value::Text(s) => s.to_uppercase(),
                _ => String::new(),
            }
        }

        fn parse(&self, _kind: PrimitiveKind, input: &str) -> Result<Value, String> {
            Ok(Value::text(input.to_lowercase()))
        }
    }

    #[test]
    fn defaults_cover_every_kind() {
        let registry = LeafRendererRegistry::with_defaults();
        assert_eq!(registry.registered_kinds(), PrimitiveKind::ALL.to_vec());
    }

    #[test]
    fn caller_renderer_replaces_builtin() {
        let mut registry = LeafRendererRegistry::with_defaults();
        registry.register(Arc::new(Shouting));
        assert_eq!(registry.format(PrimitiveKind::Text, &Value::text("hi")), "HI");
        assert_eq!(registry.parse(PrimitiveKind::Text, "HI"), Ok(Value::text("hi")));
    }

    #[test]
    fn empty_registry_falls_back() {
        let registry = LeafRendererRegistry::new();
        assert_eq!(registry.format(PrimitiveKind::Nat, &Value::Nat(3)), "3");
        assert!(registry.parse(PrimitiveKind::Nat, "3").is_err());
        assert_eq!(registry.widget(PrimitiveKind::Nat, false), Widget::Static);
    }
}
