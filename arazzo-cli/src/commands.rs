use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parses and validates a document, reporting every diagnostic.
    Validate {
        path: PathBuf,
        #[command(flatten)]
        parse: ParseArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Lists the workflows of a document.
    Workflows {
        path: PathBuf,
        #[command(flatten)]
        parse: ParseArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Runs a workflow and prints its outputs.
    Execute {
        path: PathBuf,
        /// Defaults to the first workflow of the document.
        #[arg(long)]
        workflow: Option<String>,
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        openapi: OpenApiArgs,
        #[command(flatten)]
        exec: ExecArgs,
        #[command(flatten)]
        parse: ParseArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}
