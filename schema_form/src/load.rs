//! Mounting from a Schema Endpoint
//!
//! Forms and views mount on a type fetched from an endpoint. The fetch is
//! asynchronous and may be overtaken by a newer mount at the same place; a
//! mount whose ticket is no longer current is abandoned. An endpoint that
//! cannot be fetched renders a neutral unavailable state, while a type
//! missing from a fetched program is reported as an error.

use crate::config::EngineOptions;
use crate::editor::FormEditor;
use crate::errors::EngineError;
use crate::render::RenderNode;
use crate::settings::SettingsTable;
use crate::viewer::FormViewer;
use schema_loader::{
    LatestRequest, ResolveError, SchemaResolver, SchemaSource, Ticket, TypeSelector,
};
use schema_types::TypeNode;
use serde_json::Value as JsonValue;

/// The type a mount asks for, and the ticket it was issued
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest<'a> {
    pub endpoint: &'a str,
    pub selector: &'a TypeSelector,
    pub latest: &'a LatestRequest,
    pub ticket: Ticket,
}

impl<'a> LoadRequest<'a> {
    /// Start a new mount, superseding every earlier one on `latest`
    pub fn issue(latest: &'a LatestRequest, endpoint: &'a str, selector: &'a TypeSelector) -> Self {
        Self {
            endpoint,
            selector,
            latest,
            ticket: latest.issue(),
        }
    }
}

/// Outcome of a mount that did not fail outright
#[derive(Debug)]
pub enum Loaded<T> {
    Ready(T),
    /// The endpoint could not be fetched or parsed
    Unavailable(ResolveError),
    /// A newer mount was issued while this one was in flight
    Superseded,
}

impl<T> Loaded<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Loaded::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Placeholder tree for an unavailable endpoint
    pub fn placeholder(&self) -> Option<RenderNode> {
        match self {
            Loaded::Unavailable(e) => Some(RenderNode::unavailable(e.to_string())),
            _ => None,
        }
    }

    fn try_map<U>(self, f: impl FnOnce(T) -> Result<U, EngineError>) -> Result<Loaded<U>, EngineError> {
        Ok(match self {
            Loaded::Ready(value) => Loaded::Ready(f(value)?),
            Loaded::Unavailable(e) => Loaded::Unavailable(e),
            Loaded::Superseded => Loaded::Superseded,
        })
    }
}

async fn load_type<S: SchemaSource>(
    resolver: &SchemaResolver<S>,
    request: LoadRequest<'_>,
) -> Result<Loaded<TypeNode>, EngineError> {
    let LoadRequest {
        endpoint,
        selector,
        latest,
        ticket,
    } = request;
    match resolver.resolve_latest(latest, ticket, endpoint, selector).await {
        Ok(resolved) => Ok(Loaded::Ready(resolved.node)),
        Err(ResolveError::Superseded) => Ok(Loaded::Superseded),
        Err(e @ ResolveError::SchemaUnavailable { .. }) => {
            tracing::warn!(endpoint, error = %e, "schema unavailable");
            Ok(Loaded::Unavailable(e))
        }
        Err(e) => Err(e.into()),
    }
}

impl FormEditor {
    /// Fetch the requested type and mount an editor on it
    pub async fn load<S: SchemaSource>(
        resolver: &SchemaResolver<S>,
        request: LoadRequest<'_>,
        initial: Option<&JsonValue>,
        table: SettingsTable,
        options: EngineOptions,
    ) -> Result<Loaded<FormEditor>, EngineError> {
        load_type(resolver, request).await?.try_map(|node| match initial {
            Some(json) => FormEditor::mount_json(node, json, table, options),
            None => FormEditor::mount_with(node, None, table, options),
        })
    }
}

impl FormViewer {
    /// Fetch the requested type and mount a viewer of `value` on it
    pub async fn load<S: SchemaSource>(
        resolver: &SchemaResolver<S>,
        request: LoadRequest<'_>,
        value: &JsonValue,
        table: SettingsTable,
        options: EngineOptions,
    ) -> Result<Loaded<FormViewer>, EngineError> {
        load_type(resolver, request)
            .await?
            .try_map(|node| Ok(FormViewer::from_json(node, value, table)?.with_options(options)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Control;
    use assert_matches::assert_matches;
    use schema_loader::MemorySource;

    const PROGRAM: &str = r#"
package: tiny
version: "1"
types:
  - name: Name
    kind:
      primitive: text
"#;

    #[tokio::test]
    async fn unreachable_endpoint_gives_a_placeholder() {
        let resolver = SchemaResolver::new(MemorySource::new());
        let latest = LatestRequest::new();
        let selector = TypeSelector::name("Name");
        let loaded = FormEditor::load(
            &resolver,
            LoadRequest::issue(&latest, "gone", &selector),
            None,
            SettingsTable::new(),
            EngineOptions::default(),
        )
        .await
        .expect("load");
        assert_matches!(
            loaded.placeholder().map(|n| n.control),
            Some(Control::Unavailable { .. })
        );
        assert!(loaded.ready().is_none());
    }

    #[tokio::test]
    async fn only_the_latest_mount_is_ready() {
        let resolver = SchemaResolver::new(MemorySource::new().with("tiny", PROGRAM));
        let latest = LatestRequest::new();
        let selector = TypeSelector::name("Name");
        let first = LoadRequest::issue(&latest, "tiny", &selector);
        let second = LoadRequest::issue(&latest, "tiny", &selector);

        let json = JsonValue::from("ada");
        let stale = FormViewer::load(&resolver, first, &json, SettingsTable::new(), EngineOptions::default())
            .await
            .expect("load");
        assert_matches!(stale, Loaded::Superseded);

        let fresh = FormViewer::load(&resolver, second, &json, SettingsTable::new(), EngineOptions::default())
            .await
            .expect("load")
            .ready()
            .expect("ready");
        assert_eq!(fresh.render().leaf().map(|l| l.text.clone()).as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn missing_type_is_an_error() {
        let resolver = SchemaResolver::new(MemorySource::new().with("tiny", PROGRAM));
        let latest = LatestRequest::new();
        let selector = TypeSelector::name("Nope");
        let result = FormEditor::load(
            &resolver,
            LoadRequest::issue(&latest, "tiny", &selector),
            None,
            SettingsTable::new(),
            EngineOptions::default(),
        )
        .await;
        assert_matches!(
            result,
            Err(EngineError::Resolve(ResolveError::UnknownType(name))) if name == "Nope"
        );
    }
}
