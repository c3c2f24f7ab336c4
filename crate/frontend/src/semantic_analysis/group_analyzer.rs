use std::collections::HashSet;

use caps_error::ErrorCode;
use caps_ir::ast::{GroupDecl, Program};
use caps_shared::{CompilationContext, DiagnosticEngine};

use crate::semantic_analysis::pipeline_analysis;
use crate::semantic_analysis::process_analyzer::analyze_process;

/// Checks every group of `program` in turn (§4.5), mutating each process's
/// AST in place (inferred types, injected `__last_error` locals).
pub fn analyze_program(program: &mut Program) -> DiagnosticEngine {
    let mut diagnostics = DiagnosticEngine::new();
    for group in &mut program.groups {
        analyze_group(group, &mut diagnostics);
    }
    diagnostics
}

fn analyze_group(group: &mut GroupDecl, diagnostics: &mut DiagnosticEngine) {
    let mut seen = HashSet::new();
    for process in &group.processes {
        if !seen.insert(process.name.clone()) {
            diagnostics.emit_error(
                ErrorCode::DuplicateDeclaration,
                format!("process '{}' is declared more than once in group '{}'", process.name, group.name),
                process.pos,
            );
        }
    }

    let ctx = CompilationContext::for_group(group);

    for step in &group.schedule.steps {
        if !ctx.has_process(step) {
            diagnostics.emit_error(
                ErrorCode::UnknownScheduledProcess,
                format!("schedule references undeclared process '{step}'"),
                group.schedule.pos,
            );
        }
    }

    let realtimesafe = group.has_annotation("realtimesafe");
    for process in &mut group.processes {
        analyze_process(process, &ctx, realtimesafe, diagnostics);
    }

    if group.has_annotation("pipeline_safe") {
        pipeline_analysis::check_pipeline_safety(group, diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caps_ir::SourceLocation;
    use caps_ir::ast::ScheduleDecl;

    fn pos() -> SourceLocation {
        SourceLocation::default()
    }

    #[test]
    fn schedule_referencing_unknown_process_is_an_error() {
        let mut program = Program {
            pos: pos(),
            module_name: "m".to_string(),
            groups: vec![GroupDecl {
                pos: pos(),
                name: "g".to_string(),
                annotations: Vec::new(),
                channels: Vec::new(),
                processes: Vec::new(),
                schedule: ScheduleDecl {
                    pos: pos(),
                    steps: vec!["Ghost".to_string()],
                    repeat: false,
                },
            }],
        };
        let diagnostics = analyze_program(&mut program);
        assert!(diagnostics
            .diagnostics()
            .iter()
            .any(|d| d.error_code == ErrorCode::UnknownScheduledProcess));
    }
}
