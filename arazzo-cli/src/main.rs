use clap::Parser;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "arazzo", version, about = "Validate and run Arazzo workflows")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Validate { path, parse, output } => cmd::validate::validate_cmd(&path, &parse, output),
        Command::Workflows { path, parse, output } => {
            cmd::workflows::workflows_cmd(&path, &parse, output)
        }
        Command::Execute {
            path,
            workflow,
            inputs,
            openapi,
            exec,
            parse,
            output,
        } => {
            cmd::execute::execute_cmd(
                &path,
                workflow.as_deref(),
                &inputs,
                &openapi,
                &exec,
                &parse,
                output,
            )
            .await
        }
    }
}
