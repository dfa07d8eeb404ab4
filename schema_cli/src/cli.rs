//! CLI argument parsing and command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// schema-form - inspect types, render views and work with tuple payloads
#[derive(Parser)]
#[command(name = "schema-form")]
#[command(about = "Schema-driven forms, views and payload codec")]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different configuration file
    #[arg(long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read schema programs from this directory
    #[arg(long = "schema-dir", global = true, value_name = "DIR", env = "SCHEMA_FORM_DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Fetch schema programs from this base URL instead of a directory
    #[arg(long = "url", global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Endpoint whose schema program is used
    #[arg(short = 'e', long = "endpoint", global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where a type comes from: a named definition or a method tuple
#[derive(clap::Args, Debug, Clone)]
pub struct TypeArgs {
    /// Named type of the schema program
    #[arg(short = 't', long = "type", conflicts_with = "method", required_unless_present = "method")]
    pub type_name: Option<String>,

    /// Use the argument tuple of this method
    #[arg(short = 'm', long = "method")]
    pub method: Option<String>,

    /// With --method, use the result tuple instead of the arguments
    #[arg(long = "results", requires = "method")]
    pub results: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the resolved type tree
    Inspect {
        #[command(flatten)]
        target: TypeArgs,
    },

    /// List the types and methods an endpoint publishes
    List,

    /// Render a read-only view of a JSON or YAML value
    View {
        #[command(flatten)]
        target: TypeArgs,

        /// File holding the value (JSON or YAML); '-' reads stdin
        #[arg(short = 'v', long = "value", value_name = "FILE")]
        value: PathBuf,

        /// Settings table (YAML or JSON)
        #[arg(short = 's', long = "settings", value_name = "FILE")]
        settings: Option<PathBuf>,

        /// Recursion points to expand, as field paths
        #[arg(long = "expand", value_name = "PATH")]
        expand: Vec<String>,
    },

    /// Decode a tuple payload against a method's argument or result tuple
    Decode {
        /// Method whose tuple the payload carries
        #[arg(short = 'm', long = "method")]
        method: String,

        /// Decode against the result tuple
        #[arg(long = "results")]
        results: bool,

        /// Payload as hex (with or without 0x)
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        hex: Option<String>,

        /// Read the raw payload bytes from a file
        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Encode a JSON value into a tuple payload
    Encode {
        /// Method whose tuple the payload carries
        #[arg(short = 'm', long = "method")]
        method: String,

        /// Encode against the result tuple
        #[arg(long = "results")]
        results: bool,

        /// Tuple value as a JSON array or object with fields "0", "1", ...
        #[arg(value_name = "JSON")]
        value: String,

        /// Write the raw bytes to a file instead of printing hex
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Run a scripted edit session and report values, validity and errors
    Edit {
        #[command(flatten)]
        target: TypeArgs,

        /// Edit script: a YAML or JSON list of operations
        #[arg(long = "script", value_name = "FILE")]
        script: PathBuf,

        /// Initial value (JSON or YAML); defaults are used without it
        #[arg(short = 'v', long = "value", value_name = "FILE")]
        value: Option<PathBuf>,

        /// Settings table (YAML or JSON)
        #[arg(short = 's', long = "settings", value_name = "FILE")]
        settings: Option<PathBuf>,

        /// Print the render tree after the session
        #[arg(long = "render")]
        render: bool,
    },
}
