//! Payload encode and decode commands

use super::{method_selector, Context};
use crate::error::CliError;
use crate::output;
use schema_form::{codec, value::parse_blob, Value};
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};

/// Decode payload bytes against a method tuple
pub async fn decode(
    ctx: &Context,
    method: &str,
    results: bool,
    bytes: &[u8],
) -> Result<JsonValue, CliError> {
    let resolved = ctx.resolve(&method_selector(method, results)).await?;
    let value = codec::decode_with_limits(bytes, &resolved.node, ctx.config.engine.decode_limits())?;
    tracing::debug!(method, len = bytes.len(), "payload decoded");
    Ok(value.to_json())
}

/// Encode a JSON tuple value against a method tuple
pub async fn encode(
    ctx: &Context,
    method: &str,
    results: bool,
    value: &JsonValue,
) -> Result<Vec<u8>, CliError> {
    let resolved = ctx.resolve(&method_selector(method, results)).await?;
    let value = Value::from_json(value, &resolved.node).map_err(schema_form::EngineError::from)?;
    Ok(codec::encode(&value, &resolved.node)?)
}

pub async fn handle_decode(
    ctx: &Context,
    method: &str,
    results: bool,
    hex: Option<&str>,
    file: Option<&Path>,
    json_format: bool,
) -> Result<(), CliError> {
    let bytes = match (hex, file) {
        (Some(text), _) => parse_blob(text).map_err(CliError::Input)?,
        (None, Some(path)) => tokio::fs::read(path).await?,
        (None, None) => return Err(CliError::Input("pass hex bytes or --file".into())),
    };
    let value = decode(ctx, method, results, &bytes).await?;
    output::print_output(json!({ "method": method, "value": value }), json_format);
    Ok(())
}

pub async fn handle_encode(
    ctx: &Context,
    method: &str,
    results: bool,
    value: &str,
    output_path: Option<&PathBuf>,
    json_format: bool,
) -> Result<(), CliError> {
    let value = super::parse_document(value).map_err(|e| CliError::Input(e.to_string()))?;
    let bytes = encode(ctx, method, results, &value).await?;
    match output_path {
        Some(path) => {
            tokio::fs::write(path, &bytes).await?;
            output::print_output(
                json!({
                    "method": method,
                    "length": bytes.len(),
                    "written": path.display().to_string(),
                }),
                json_format,
            );
        }
        None => {
            output::print_output(
                json!({ "method": method, "payload": format!("0x{}", hex::encode(&bytes)) }),
                json_format,
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::station_context;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn encode_then_decode_transfer_args() {
        let ctx = station_context();
        let bytes = encode(&ctx, "transfer", false, &json!([7, 9])).await.expect("encode");
        let decoded = decode(&ctx, "transfer", false, &bytes).await.expect("decode");
        assert_eq!(decoded, json!({"0": 7, "1": 9}));
    }

    #[tokio::test]
    async fn decode_against_the_wrong_method_fails() {
        let ctx = station_context();
        let bytes = encode(&ctx, "set_name", false, &json!(["ada"])).await.expect("encode");
        assert_matches!(
            decode(&ctx, "transfer", false, &bytes).await,
            Err(CliError::Decode(_))
        );
    }

    #[tokio::test]
    async fn unknown_method_is_a_resolve_error() {
        let ctx = station_context();
        assert_matches!(
            encode(&ctx, "nope", false, &json!([])).await,
            Err(CliError::Resolve(_))
        );
    }
}
