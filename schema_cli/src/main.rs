//! schema-form - command-line front end for schema-driven forms
//!
//! Resolves types from schema programs, renders read-only views of stored
//! values, runs scripted edit sessions and encodes or decodes tuple payloads.

use anyhow::Result;

use clap::Parser;
use serde_json::{json, Value};
use std::process;

mod cli;
mod commands;
mod config;
mod error;
mod output;

use cli::{Cli, Commands};
use commands::Context;
use config::Config;
use error::CliError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let result = run(cli.command, cli.config, cli.schema_dir, cli.url, cli.endpoint, cli.json).await;

    if let Err(err) = result {
        if cli.json {
            output::print_output(format_error_json(&err), true);
        } else {
            eprintln!("Error: {}", err);
        }
        process::exit(1);
    }
    Ok(())
}

async fn run(
    command: Commands,
    config_path: Option<std::path::PathBuf>,
    schema_dir: Option<std::path::PathBuf>,
    url: Option<String>,
    endpoint: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let config = match config_path {
        Some(path) => Config::load_from(&path).await?,
        None => Config::load().await?,
    };
    let config = config.with_overrides(schema_dir, url, endpoint)?;
    let ctx = Context::new(config)?;

    match command {
        Commands::Inspect { target } => commands::inspect::handle_inspect(&ctx, &target, json).await,
        Commands::List => commands::inspect::handle_list(&ctx, json).await,
        Commands::View {
            target,
            value,
            settings,
            expand,
        } => {
            commands::view::handle_view(&ctx, &target, &value, settings.as_ref(), &expand, json)
                .await
        }
        Commands::Decode {
            method,
            results,
            hex,
            file,
        } => {
            commands::codec::handle_decode(
                &ctx,
                &method,
                results,
                hex.as_deref(),
                file.as_deref(),
                json,
            )
            .await
        }
        Commands::Encode {
            method,
            results,
            value,
            output,
        } => {
            commands::codec::handle_encode(&ctx, &method, results, &value, output.as_ref(), json)
                .await
        }
        Commands::Edit {
            target,
            script,
            value,
            settings,
            render,
        } => {
            commands::edit::handle_edit(
                &ctx,
                &target,
                &script,
                value.as_ref(),
                settings.as_ref(),
                render,
                json,
            )
            .await
        }
    }
}

fn format_error_json(err: &CliError) -> Value {
    let kind = match err {
        CliError::Config(_) => "config",
        CliError::Resolve(_) => "resolve",
        CliError::Engine(_) => "engine",
        CliError::Script { .. } => "script",
        CliError::Decode(_) => "decode",
        CliError::Encode(_) => "encode",
        CliError::Input(_) => "input",
        CliError::Io(_) => "io",
        CliError::NoEndpoint => "no_endpoint",
    };
    let mut error = json!({ "kind": kind, "message": err.to_string() });
    if let CliError::Script { step, .. } = err {
        error["step"] = json!(step);
    }
    json!({ "error": error })
}
