//! Read-only rendering of stored values

use super::{load_settings, read_document, selector, Context};
use crate::cli::TypeArgs;
use crate::error::CliError;
use crate::output;
use schema_form::{FieldPath, FormViewer, Loaded, PayloadCatalog, RenderNode, SettingsTable};
use schema_loader::{LatestRequest, ResolveError};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

/// Inputs of a view render
pub struct ViewRequest<'a> {
    pub target: &'a TypeArgs,
    pub value: &'a JsonValue,
    pub settings: SettingsTable,
    pub expand: &'a [String],
}

/// Render a value against its type. An endpoint that cannot be fetched
/// renders as unavailable. Payload leaves are decoded when the payload
/// endpoint's program can be loaded; otherwise they show raw bytes.
pub async fn view(ctx: &Context, request: ViewRequest<'_>) -> Result<RenderNode, CliError> {
    let selector = selector(request.target)?;
    let latest = LatestRequest::new();
    let options = ctx.options();
    let payload_endpoint = options.config.payload_endpoint.clone();

    let loaded = FormViewer::load(
        &ctx.resolver,
        ctx.load_request(&latest, &selector)?,
        request.value,
        request.settings,
        options,
    )
    .await?;
    let mut viewer = match loaded {
        Loaded::Ready(viewer) => viewer,
        Loaded::Unavailable(e) => return Ok(RenderNode::unavailable(e.to_string())),
        Loaded::Superseded => return Err(ResolveError::Superseded.into()),
    };
    if let Some(endpoint) = payload_endpoint {
        match PayloadCatalog::load(&ctx.resolver, &endpoint).await {
            Ok(catalog) => viewer = viewer.with_catalog(catalog),
            Err(e) => tracing::warn!(endpoint, error = %e, "payload tuples unavailable"),
        }
    }
    for path in request.expand {
        viewer.expand(&FieldPath::parse(path));
    }
    Ok(viewer.render())
}

pub async fn handle_view(
    ctx: &Context,
    target: &TypeArgs,
    value: &Path,
    settings: Option<&PathBuf>,
    expand: &[String],
    json_format: bool,
) -> Result<(), CliError> {
    let value = read_document(value).await?;
    let settings = load_settings(settings.map(PathBuf::as_path)).await?;
    let rendered = view(
        ctx,
        ViewRequest {
            target,
            value: &value,
            settings,
            expand,
        },
    )
    .await?;

    if json_format {
        output::print_output(rendered.to_json(), true);
    } else {
        output::print_render_tree(&rendered);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::station_context;
    use crate::config::Config;
    use schema_form::Control;
    use schema_loader::{AnySource, MemorySource};
    use serde_json::json;

    fn group_type() -> TypeArgs {
        TypeArgs {
            type_name: Some("Group".into()),
            method: None,
            results: false,
        }
    }

    #[tokio::test]
    async fn expand_paths_open_collapsed_recursion() {
        let ctx = station_context();
        let value = json!({
            "title": "a",
            "members": [],
            "subgroups": [{
                "title": "b",
                "members": [],
                "subgroups": [{"title": "c", "members": [], "subgroups": []}]
            }]
        });
        let target = group_type();
        let collapsed = view(
            &ctx,
            ViewRequest {
                target: &target,
                value: &value,
                settings: SettingsTable::new(),
                expand: &[],
            },
        )
        .await
        .expect("view");
        assert!(matches!(
            collapsed.find(&FieldPath::parse("subgroups.0.subgroups.0")).map(|n| &n.control),
            Some(Control::LoadMore { .. })
        ));

        let expand = vec!["subgroups.0.subgroups.0".to_string()];
        let expanded = view(
            &ctx,
            ViewRequest {
                target: &target,
                value: &value,
                settings: SettingsTable::new(),
                expand: &expand,
            },
        )
        .await
        .expect("view");
        assert_eq!(
            expanded
                .find(&FieldPath::parse("subgroups.0.subgroups.0.title"))
                .and_then(|n| n.leaf())
                .map(|l| l.text.as_str()),
            Some("c")
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_renders_unavailable() {
        let config = Config {
            default_endpoint: Some("gone".into()),
            ..Config::default()
        };
        let ctx = Context::with_source(config, AnySource::Memory(MemorySource::new()));
        let target = group_type();
        let rendered = view(
            &ctx,
            ViewRequest {
                target: &target,
                value: &json!({}),
                settings: SettingsTable::new(),
                expand: &[],
            },
        )
        .await
        .expect("view");
        assert!(matches!(rendered.control, Control::Unavailable { .. }));
    }
}
