use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ParseArgs {
    /// Accept `x-oai-`, `x-oas-` and `x-arazzo-` extension keys.
    #[arg(long)]
    pub permit_reserved_author: bool,
}

#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// JSON or YAML file holding the workflow inputs.
    #[arg(long)]
    pub inputs: Option<PathBuf>,
    /// Sets one input; the value is read as JSON when it parses, otherwise as a string.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set_inputs: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct OpenApiArgs {
    /// Loads source description NAME from PATH instead of its `url`.
    #[arg(long = "openapi", value_name = "NAME=PATH")]
    pub openapi_sources: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ExecArgs {
    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 30000)]
    pub timeout: u64,
    /// Deadline for the whole run in seconds.
    #[arg(long)]
    pub deadline: Option<u64>,
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    pub max_response_bytes: usize,
    /// Upper bound for a single retry wait in seconds.
    #[arg(long, default_value_t = 60)]
    pub max_retry_delay: u64,
    #[arg(long, default_value_t = 1000)]
    pub max_steps: usize,
    /// Port for server urls naming `localhost` without one.
    #[arg(long, default_value_t = 8080)]
    pub localhost_port: u16,
    #[arg(long, default_value = "application/json")]
    pub content_type: String,
}
