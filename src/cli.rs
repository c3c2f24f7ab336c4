use std::fs;
use std::path::PathBuf;

use caps_backend::{init_runtime, run_group, RunStatus, TextTraceSink, DEFAULT_MAX_TICKS};
use clap::{Parser as ClapParser, ValueEnum};
use colored::Colorize;

use crate::compilation_pipeline::{compile_source, CompilationResult};
use crate::error::{CliError, CliResult};
use crate::exit;

/// Reference front-end and deterministic interpreter for the CAPS pipeline
/// language.
#[derive(ClapParser)]
#[command(version, about, arg_required_else_help = true)]
pub struct Cli {
    /// Path to a `.caps` source file.
    pub source: PathBuf,

    /// Print the post-semantic-analysis AST to standard output.
    #[arg(long)]
    pub dump_ast: bool,

    /// Print the raw token stream to standard output.
    #[arg(long)]
    pub dump_tokens: bool,

    /// Print the `@pipeline_safe` channel topology for each group in the
    /// given format.
    #[arg(long, value_enum)]
    pub dump_topology: Option<TopologyFormat>,

    /// Run diagnostics only; do not execute any group.
    #[arg(long)]
    pub check_only: bool,

    /// Ceiling on scheduler ticks before a run aborts as a deadlock (§4.11).
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    pub max_ticks: u64,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TopologyFormat {
    Dot,
    Text,
}

pub fn run(cli: Cli) -> CliResult<()> {
    let source = read_source_file(&cli.source)?;

    dump_tokens_if_requested(&cli, &source);

    match compile_source(&source) {
        CompilationResult::Failed { diagnostics } => {
            diagnostics.report_all(&source);
            Err(CliError::Diagnostics { exit_code: exit::Code::DiagnosticError })
        }
        CompilationResult::Success(output) => {
            if output.diagnostics.error_count() > 0 || output.diagnostics.warning_count() > 0 {
                output.diagnostics.report_all(&source);
            }

            dump_ast_if_requested(&cli, &output.program);
            dump_topology_if_requested(&cli, &output.program);

            if cli.check_only {
                return Ok(());
            }

            for group in &output.ir.groups {
                let mut rt = init_runtime(group);
                let mut trace = TextTraceSink;
                let result = run_group(&mut rt, &mut trace, cli.max_ticks);
                if result.status == RunStatus::Deadlock {
                    return Err(CliError::Generic {
                        message: format!("group '{}' ended in deadlock: {}", group.name, result.reason),
                        exit_code: exit::Code::DiagnosticError,
                    });
                }
            }

            Ok(())
        }
    }
}

#[cfg(feature = "print-tokens")]
fn dump_tokens_if_requested(cli: &Cli, source: &str) {
    if cli.dump_tokens {
        let (tokens, _) = caps_frontend::tokenize(source);
        caps_frontend::print_tokens(&tokens);
    }
}

#[cfg(not(feature = "print-tokens"))]
fn dump_tokens_if_requested(cli: &Cli, _source: &str) {
    if cli.dump_tokens {
        eprintln!("{}", "--dump-tokens requires the `print-tokens` feature".yellow());
    }
}

#[cfg(feature = "print-ast")]
fn dump_ast_if_requested(cli: &Cli, program: &caps_ir::ast::Program) {
    if cli.dump_ast {
        caps_ir::ast_printer::AstPrinter::new().print(program);
    }
}

#[cfg(not(feature = "print-ast"))]
fn dump_ast_if_requested(cli: &Cli, _program: &caps_ir::ast::Program) {
    if cli.dump_ast {
        eprintln!("{}", "--dump-ast requires the `print-ast` feature".yellow());
    }
}

fn dump_topology_if_requested(cli: &Cli, program: &caps_ir::ast::Program) {
    let Some(format) = cli.dump_topology else { return };

    for group in &program.groups {
        if !group.has_annotation("pipeline_safe") {
            continue;
        }
        let topology = caps_frontend::build_topology(group);
        println!("{}", format!("# topology for group '{}'", group.name).bold());
        match format {
            TopologyFormat::Dot => print!("{}", topology.to_dot()),
            TopologyFormat::Text => print!("{}", topology.to_text()),
        }
    }
}

fn read_source_file(path: &PathBuf) -> CliResult<String> {
    fs::read_to_string(path).map_err(|e| CliError::from_io_error(e, &path.display().to_string()))
}
