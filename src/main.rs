mod cli;
mod compilation_pipeline;
mod error;
mod exit;

use clap::Parser;

fn main() {
    let args = cli::Cli::parse();

    if let Err(err) = cli::run(args) {
        let message = match &err {
            error::CliError::Diagnostics { .. } => String::new(),
            other => other.to_string(),
        };
        exit::with_code(err.exit_code(), &message);
    }
}
