//! Command implementations for the schema-form CLI

pub mod codec;
pub mod edit;
pub mod inspect;
pub mod view;

use crate::cli::TypeArgs;
use crate::config::Config;
use crate::error::CliError;
use schema_form::{EngineOptions, LoadRequest, SettingsTable};
use schema_loader::{AnySource, LatestRequest, Resolved, SchemaResolver, TypeSelector};
use serde_json::Value as JsonValue;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Resolver and settings shared by every command
pub struct Context {
    pub config: Config,
    pub resolver: SchemaResolver<AnySource>,
}

impl Context {
    pub fn new(config: Config) -> Result<Self, CliError> {
        let resolver = SchemaResolver::new(config.source()?);
        Ok(Self { config, resolver })
    }

    /// Context over an explicit source, bypassing the configured one
    pub fn with_source(config: Config, source: AnySource) -> Self {
        Self {
            config,
            resolver: SchemaResolver::new(source),
        }
    }

    pub fn endpoint(&self) -> Result<&str, CliError> {
        self.config.endpoint()
    }

    pub fn options(&self) -> EngineOptions {
        EngineOptions::with_config(self.config.engine())
    }

    /// Issue a mount of `selector` against the configured endpoint. The CLI
    /// mounts one form at a time, so the ticket stays current.
    pub fn load_request<'a>(
        &'a self,
        latest: &'a LatestRequest,
        selector: &'a TypeSelector,
    ) -> Result<LoadRequest<'a>, CliError> {
        Ok(LoadRequest::issue(latest, self.endpoint()?, selector))
    }

    pub async fn resolve(&self, selector: &TypeSelector) -> Result<Resolved, CliError> {
        let endpoint = self.endpoint()?;
        Ok(self.resolver.resolve(endpoint, selector).await?)
    }
}

/// Map `--type` / `--method` / `--results` onto a selector
pub fn selector(target: &TypeArgs) -> Result<TypeSelector, CliError> {
    match (&target.type_name, &target.method) {
        (Some(name), None) => Ok(TypeSelector::name(name.clone())),
        (None, Some(method)) if target.results => Ok(TypeSelector::method_results(method.clone())),
        (None, Some(method)) => Ok(TypeSelector::method_args(method.clone())),
        _ => Err(CliError::Input("pass exactly one of --type or --method".into())),
    }
}

/// Selector for a method tuple
pub fn method_selector(method: &str, results: bool) -> TypeSelector {
    if results {
        TypeSelector::method_results(method)
    } else {
        TypeSelector::method_args(method)
    }
}

/// Read a file, or stdin when the path is `-`
pub async fn read_input(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await?;
        Ok(content)
    } else {
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

/// Read a JSON or YAML document into plain JSON
pub async fn read_document(path: &Path) -> Result<JsonValue, CliError> {
    let content = read_input(path).await?;
    parse_document(&content)
        .map_err(|e| CliError::Input(format!("{}: {}", path.display(), e)))
}

pub fn parse_document(content: &str) -> Result<JsonValue, serde_yml::Error> {
    serde_yml::from_str(content)
}

/// Load a settings table; an absent path gives an empty table
pub async fn load_settings(path: Option<&Path>) -> Result<SettingsTable, CliError> {
    let Some(path) = path else {
        return Ok(SettingsTable::new());
    };
    let content = read_input(path).await?;
    SettingsTable::from_yaml(&content)
        .map_err(|e| CliError::Input(format!("settings {}: {}", path.display(), e)))
}

#[cfg(test)]
pub(crate) fn station_context() -> Context {
    use schema_loader::MemorySource;
    let config = Config {
        default_endpoint: Some("station".into()),
        ..Config::default()
    };
    let source = MemorySource::new().with(
        "station",
        include_str!("../../tests/fixtures/station.schema.yaml"),
    );
    Context::with_source(config, AnySource::Memory(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn documents_accept_json_and_yaml() {
        assert_eq!(
            parse_document(r#"{"name": "ada", "tags": [1, 2]}"#).expect("json"),
            json!({"name": "ada", "tags": [1, 2]})
        );
        assert_eq!(
            parse_document("name: ada\ntags:\n  - 1\n  - 2\n").expect("yaml"),
            json!({"name": "ada", "tags": [1, 2]})
        );
    }

    #[test]
    fn selector_follows_flags() {
        let by_method = TypeArgs {
            type_name: None,
            method: Some("transfer".into()),
            results: true,
        };
        assert_matches!(selector(&by_method), Ok(TypeSelector::MethodResults(m)) if m == "transfer");

        let neither = TypeArgs {
            type_name: None,
            method: None,
            results: false,
        };
        assert_matches!(selector(&neither), Err(CliError::Input(_)));
    }
}
