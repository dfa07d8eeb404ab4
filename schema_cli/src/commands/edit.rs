//! Scripted edit sessions
//!
//! A script is a list of edit operations applied in order to a freshly
//! mounted form. Payload lookups are settled after every step so later
//! steps see decoded payloads.

use super::{load_settings, read_document, read_input, selector, Context};
use crate::cli::TypeArgs;
use crate::error::CliError;
use crate::output;
use schema_form::{EditOp, FormEditor, Loaded, SettingsTable};
use schema_loader::{LatestRequest, ResolveError};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Outcome of a scripted session
#[derive(Debug, Serialize)]
pub struct EditReport {
    pub values: JsonValue,
    pub valid: bool,
    pub errors: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<JsonValue>,
}

/// Parse a script from YAML or JSON
pub fn parse_script(content: &str) -> Result<Vec<EditOp>, CliError> {
    serde_yml::from_str(content).map_err(|e| CliError::Input(format!("script: {}", e)))
}

pub async fn run_session(
    ctx: &Context,
    target: &TypeArgs,
    initial: Option<&JsonValue>,
    settings: SettingsTable,
    script: &[EditOp],
    render: bool,
) -> Result<(FormEditor, EditReport), CliError> {
    let selector = selector(target)?;
    let latest = LatestRequest::new();
    let loaded = FormEditor::load(
        &ctx.resolver,
        ctx.load_request(&latest, &selector)?,
        initial,
        settings,
        ctx.options(),
    )
    .await?;
    // A script has nothing to edit without a type
    let mut editor = match loaded {
        Loaded::Ready(editor) => editor,
        Loaded::Unavailable(e) => return Err(e.into()),
        Loaded::Superseded => return Err(ResolveError::Superseded.into()),
    };
    editor.resolve_payloads(&ctx.resolver).await;

    for (i, op) in script.iter().enumerate() {
        editor
            .apply(op)
            .map_err(|source| CliError::Script { step: i + 1, source })?;
        let settled = editor.resolve_payloads(&ctx.resolver).await;
        tracing::debug!(step = i + 1, settled, "edit applied");
    }

    let (rendered, errors) = editor.render_with_errors();
    let report = EditReport {
        values: editor.get_json(),
        valid: errors.is_empty(),
        errors: errors
            .into_iter()
            .map(|(path, messages)| (path.to_string(), messages))
            .collect(),
        render: render.then(|| rendered.to_json()),
    };
    Ok((editor, report))
}

pub async fn handle_edit(
    ctx: &Context,
    target: &TypeArgs,
    script: &Path,
    value: Option<&PathBuf>,
    settings: Option<&PathBuf>,
    render: bool,
    json_format: bool,
) -> Result<(), CliError> {
    let ops = parse_script(&read_input(script).await?)?;
    let initial = match value {
        Some(path) => Some(read_document(path).await?),
        None => None,
    };
    let settings = load_settings(settings.map(PathBuf::as_path)).await?;

    let (editor, report) = run_session(ctx, target, initial.as_ref(), settings, &ops, render).await?;

    if json_format {
        let data = serde_json::to_value(&report).map_err(|e| CliError::Input(e.to_string()))?;
        output::print_output(data, true);
        return Ok(());
    }

    if render {
        output::print_render_tree(&editor.render());
        println!();
    }
    output::print_output(
        serde_json::json!({
            "values": report.values,
            "valid": report.valid,
            "errors": report.errors,
        }),
        false,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::station_context;
    use crate::config::Config;
    use assert_matches::assert_matches;
    use schema_loader::{AnySource, MemorySource};
    use schema_form::EditError;
    use serde_json::json;

    fn user_type() -> TypeArgs {
        TypeArgs {
            type_name: Some("User".into()),
            method: None,
            results: false,
        }
    }

    #[tokio::test]
    async fn script_builds_a_valid_user() {
        let script = parse_script(
            r#"
- op: set_input
  path: name
  text: ada
- op: set_input
  path: identity
  text: aaaaa-aa
- op: select_case
  path: status
  tag: Suspended
- op: set_input
  path: status.Suspended
  text: audit
"#,
        )
        .expect("script");

        let (_, report) = run_session(
            &station_context(),
            &user_type(),
            None,
            SettingsTable::new(),
            &script,
            false,
        )
        .await
        .expect("session");

        assert!(report.valid, "errors: {:?}", report.errors);
        assert_eq!(
            report.values,
            json!({"name": "ada", "identity": "aaaaa-aa", "status": {"Suspended": "audit"}})
        );
        assert!(report.render.is_none());
    }

    #[tokio::test]
    async fn failing_step_is_numbered() {
        let script = parse_script(
            r#"
- op: set_input
  path: name
  text: ada
- op: select_case
  path: status
  tag: Retired
"#,
        )
        .expect("script");

        let result = run_session(
            &station_context(),
            &user_type(),
            None,
            SettingsTable::new(),
            &script,
            false,
        )
        .await;
        assert_matches!(
            result,
            Err(CliError::Script {
                step: 2,
                source: EditError::UnknownCase { .. }
            })
        );
    }

    #[tokio::test]
    async fn incomplete_initial_value_reports_errors() {
        let initial = json!({"name": "", "identity": "aaaaa-aa", "status": "Active"});
        let (_, report) = run_session(
            &station_context(),
            &user_type(),
            Some(&initial),
            SettingsTable::new(),
            &[],
            true,
        )
        .await
        .expect("session");

        assert!(!report.valid);
        assert!(report.errors.contains_key("name"));
        assert!(report.render.is_some());
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_the_session() {
        let config = Config {
            default_endpoint: Some("gone".into()),
            ..Config::default()
        };
        let ctx = Context::with_source(config, AnySource::Memory(MemorySource::new()));
        let result = run_session(&ctx, &user_type(), None, SettingsTable::new(), &[], false).await;
        assert_matches!(
            result,
            Err(CliError::Resolve(ResolveError::SchemaUnavailable { endpoint, .. })) if endpoint == "gone"
        );
    }
}
