use caps_backend::ir::IRProgram;
use caps_error::CompilerError;
use caps_frontend::{analyze_program, parse, tokenize};
use caps_ir::ast::Program;
use caps_ir::SourceLocation;
use caps_shared::{Diagnostic, DiagnosticEngine};

/// The front-end pipeline's successful output: the post-sema AST (for
/// `--dump-ast`), its lowered IR (for execution), and every diagnostic
/// (including warnings) accumulated along the way.
pub struct CompilationOutput {
    pub program: Program,
    pub ir: IRProgram,
    pub diagnostics: DiagnosticEngine,
}

pub enum CompilationResult {
    Success(CompilationOutput),
    Failed { diagnostics: DiagnosticEngine },
}

/// Runs the full front-end pipeline: lex, parse, analyze, lower. Every stage
/// accumulates into one `DiagnosticEngine` rather than bailing out early, per
/// §7's "errors are accumulated, never thrown" rule; the pipeline only stops
/// advancing once it genuinely cannot (no tokens to parse, or no AST to
/// analyze because parsing failed outright).
pub fn compile_source(source: &str) -> CompilationResult {
    let mut diagnostics = DiagnosticEngine::new();

    let (tokens, lex_errors) = tokenize(source);
    extend_with_compiler_errors(&mut diagnostics, &lex_errors);

    let mut program = match parse(tokens) {
        Ok(program) => program,
        Err(parse_errors) => {
            extend_with_compiler_errors(&mut diagnostics, &parse_errors);
            return CompilationResult::Failed { diagnostics };
        }
    };

    let sema_diagnostics = analyze_program(&mut program);
    merge_diagnostics(&mut diagnostics, sema_diagnostics);

    if diagnostics.has_errors() {
        return CompilationResult::Failed { diagnostics };
    }

    let ir = caps_backend::lower_program(&program);

    CompilationResult::Success(CompilationOutput { program, ir, diagnostics })
}

fn extend_with_compiler_errors(diagnostics: &mut DiagnosticEngine, errors: &[CompilerError]) {
    for error in errors {
        diagnostics.emit(Diagnostic::error(
            error.error_code,
            error.message.clone(),
            SourceLocation::new(0, error.line, error.column),
        ));
    }
}

fn merge_diagnostics(target: &mut DiagnosticEngine, source: DiagnosticEngine) {
    for diagnostic in source.into_diagnostics() {
        target.emit(diagnostic);
    }
}
