//! Type inspection commands

use super::{selector, Context};
use crate::cli::TypeArgs;
use crate::error::CliError;
use crate::output;
use serde_json::{json, Value};

/// Resolve a type and show its tree
pub async fn handle_inspect(ctx: &Context, target: &TypeArgs, json_format: bool) -> Result<(), CliError> {
    let resolved = ctx.resolve(&selector(target)?).await?;
    if json_format {
        let node = serde_json::to_value(&resolved.node)
            .map_err(|e| CliError::Input(e.to_string()))?;
        output::print_output(
            json!({
                "endpoint": ctx.endpoint()?,
                "package": resolved.program.package(),
                "type": node,
            }),
            true,
        );
    } else {
        println!("{}", resolved.node);
    }
    Ok(())
}

/// Types and methods published by the endpoint
pub async fn list(ctx: &Context) -> Result<Value, CliError> {
    let endpoint = ctx.endpoint()?;
    let program = ctx.resolver.program(endpoint).await?;
    let types: Vec<&str> = program.type_names().collect();
    let methods: Vec<&str> = program.method_names().collect();
    Ok(json!({
        "endpoint": endpoint,
        "package": program.package(),
        "types": types,
        "methods": methods,
    }))
}

pub async fn handle_list(ctx: &Context, json_format: bool) -> Result<(), CliError> {
    output::print_output(list(ctx).await?, json_format);
    Ok(())
}
