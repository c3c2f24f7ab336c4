use caps_error::ErrorCode;
use caps_ir::SourceLocation;
use caps_ir::ast::{Action, DoStmt, ExpressionKind, OnBlock, ProcessDecl, Transition, TypeRef};
use caps_shared::{CompilationContext, DiagnosticEngine};
use caps_types::Type;

use crate::semantic_analysis::type_system::{self, LocalEnv};

const ERROR_STATE: &str = "__Error";
const LAST_ERROR_LOCAL: &str = "__last_error";

/// Checks one process against its enclosing group (§4.5.1/§4.5.2), mutating
/// `process` to inject the `__last_error` local when `?` requires one.
pub fn analyze_process(
    process: &mut ProcessDecl,
    ctx: &CompilationContext,
    realtimesafe: bool,
    diagnostics: &mut DiagnosticEngine,
) {
    if process.states.is_empty() {
        diagnostics.emit_error(ErrorCode::EmptyProcess, format!("process '{}' declares no states", process.name), process.pos);
        return;
    }

    check_try_placement(process, diagnostics);
    if process_uses_try(process) {
        ensure_error_handling(process, diagnostics);
    }

    check_fsm_shape(process, diagnostics);

    let mut env = LocalEnv::new();
    for param in process.inputs.iter().chain(process.outputs.iter()) {
        env.bind(param.name.clone(), param.type_ref.resolve());
    }

    for local in &process.locals {
        bind_do_stmt(local, &mut env, ctx, diagnostics);
    }

    for block in &process.on_blocks {
        analyze_on_block(block, &env, ctx, realtimesafe, diagnostics);
    }
}

fn process_uses_try(process: &ProcessDecl) -> bool {
    process.locals.iter().any(|stmt| type_system::contains_try(stmt.expr()))
        || process.on_blocks.iter().any(on_block_uses_try)
}

fn on_block_uses_try(block: &OnBlock) -> bool {
    block.actions.iter().any(action_uses_try) || transition_uses_try(&block.transition)
}

fn action_uses_try(action: &Action) -> bool {
    match action {
        Action::Do(stmt) => type_system::contains_try(stmt.expr()),
        Action::Send { expr, .. } => type_system::contains_try(expr),
        Action::Receive { .. } => false,
        Action::TrySend { expr, .. } => type_system::contains_try(expr),
        Action::TryReceive { .. } => false,
    }
}

fn transition_uses_try(transition: &Transition) -> bool {
    match transition {
        Transition::Unconditional { .. } => false,
        Transition::IfElse {
            cond,
            then_actions,
            else_actions,
            ..
        } => {
            type_system::contains_try(cond)
                || then_actions.iter().any(action_uses_try)
                || else_actions.iter().any(action_uses_try)
        }
    }
}

/// Enforces §4.5.1's placement rule: `?` is legal only inside the RHS of a
/// `do`-action `let`/`var`/`assign`, including within an if/else branch's
/// action list. It is illegal in process locals, transition conditions, and
/// the expression operands of `send`/`try_send`.
fn check_try_placement(process: &ProcessDecl, diagnostics: &mut DiagnosticEngine) {
    for local in &process.locals {
        if type_system::contains_try(local.expr()) {
            diagnostics.emit_error(
                ErrorCode::IllegalTryOperator,
                "'?' is not allowed in a process-local initializer",
                local.pos(),
            );
        }
    }

    for block in &process.on_blocks {
        for action in &block.actions {
            check_action_try_placement(action, diagnostics);
        }
        if let Transition::IfElse {
            cond,
            then_actions,
            else_actions,
            ..
        } = &block.transition
        {
            if type_system::contains_try(cond) {
                diagnostics.emit_error(
                    ErrorCode::IllegalTryOperator,
                    "'?' is not allowed in a transition condition",
                    cond.pos,
                );
            }
            for action in then_actions.iter().chain(else_actions.iter()) {
                check_action_try_placement(action, diagnostics);
            }
        }
    }
}

fn check_action_try_placement(action: &Action, diagnostics: &mut DiagnosticEngine) {
    match action {
        Action::Do(stmt) => {
            let expr = stmt.expr();
            if type_system::contains_try(expr) && !matches!(expr.kind, ExpressionKind::Try { .. }) {
                diagnostics.emit_error(
                    ErrorCode::IllegalTryOperator,
                    "'?' is only allowed as the entire right-hand side of a let/var/assign",
                    expr.pos,
                );
            }
        }
        Action::Send { expr, .. } | Action::TrySend { expr, .. } => {
            if type_system::contains_try(expr) {
                diagnostics.emit_error(
                    ErrorCode::IllegalTryOperator,
                    "'?' is only allowed as the right-hand side of a let/var/assign",
                    expr.pos,
                );
            }
        }
        Action::Receive { .. } | Action::TryReceive { .. } => {}
    }
}

fn ensure_error_handling(process: &mut ProcessDecl, diagnostics: &mut DiagnosticEngine) {
    let pos = process.pos;
    if !process.states.iter().any(|s| s == ERROR_STATE) || process.on_block_for(ERROR_STATE).is_none() {
        diagnostics.emit_error(
            ErrorCode::MissingErrorState,
            format!("process '{}' uses '?' but declares no '{ERROR_STATE}' state with an on-block", process.name),
            pos,
        );
    }

    let already_declared = process.locals.iter().any(|local| local.name() == LAST_ERROR_LOCAL);
    if !already_declared {
        process.locals.insert(
            0,
            DoStmt::Var {
                pos,
                name: LAST_ERROR_LOCAL.to_string(),
                explicit_type: Some(TypeRef::primitive(pos, "text")),
                expr: caps_ir::ast::Expression::new(pos, ExpressionKind::TextLit(String::new())),
            },
        );
    }
}

fn check_fsm_shape(process: &ProcessDecl, diagnostics: &mut DiagnosticEngine) {
    for state in &process.states {
        if process.on_block_for(state).is_none() {
            diagnostics.emit_error(
                ErrorCode::MissingOnBlockForState,
                format!("state '{state}' has no on-block"),
                process.pos,
            );
        }
    }

    let mut seen = std::collections::HashSet::new();
    for block in &process.on_blocks {
        if !seen.insert(block.state_name.clone()) {
            diagnostics.emit_error(
                ErrorCode::DuplicateOnBlock,
                format!("state '{}' has more than one on-block", block.state_name),
                block.pos,
            );
        }
    }

    let mut targets = std::collections::HashSet::new();
    for block in &process.on_blocks {
        collect_targets(&block.transition, &mut targets);
    }
    for target in &targets {
        if !process.states.contains(target) {
            diagnostics.emit_error(
                ErrorCode::UnknownStateTarget,
                format!("transition targets undeclared state '{target}'"),
                process.pos,
            );
        }
    }

    for state in process.states.iter().skip(1) {
        if !targets.contains(state) {
            diagnostics.emit_error(
                ErrorCode::UnreachableState,
                format!("state '{state}' is never reached by any transition"),
                process.pos,
            );
        }
    }
}

fn collect_targets(transition: &Transition, out: &mut std::collections::HashSet<String>) {
    match transition {
        Transition::Unconditional { to, .. } => {
            out.insert(to.clone());
        }
        Transition::IfElse { then_to, else_to, .. } => {
            out.insert(then_to.clone());
            out.insert(else_to.clone());
        }
    }
}

fn bind_do_stmt(stmt: &DoStmt, env: &mut LocalEnv, ctx: &CompilationContext, diagnostics: &mut DiagnosticEngine) {
    match stmt {
        DoStmt::Let { name, explicit_type, expr, .. } | DoStmt::Var { name, explicit_type, expr, .. } => {
            let inferred = type_system::infer_expression_type(expr, env, ctx, diagnostics);
            let declared = match explicit_type {
                Some(type_ref) => {
                    let resolved = type_ref.resolve();
                    if resolved != Type::Unknown && inferred != Type::Unknown && !resolved.type_equals(&inferred) {
                        diagnostics.emit_error(
                            ErrorCode::TypeMismatch,
                            format!("'{name}' declared as '{resolved}' but initializer has type '{inferred}'"),
                            stmt.pos(),
                        );
                    }
                    resolved
                }
                None => inferred,
            };
            if env.contains(name) {
                diagnostics.emit_error(
                    ErrorCode::DuplicateDeclaration,
                    format!("'{name}' is already declared in this scope"),
                    stmt.pos(),
                );
            }
            env.bind(name.clone(), declared);
        }
        DoStmt::Assign { name, expr, .. } => {
            let inferred = type_system::infer_expression_type(expr, env, ctx, diagnostics);
            match env.get(name).cloned() {
                Some(existing) => {
                    if existing != Type::Unknown && inferred != Type::Unknown && !existing.type_equals(&inferred) {
                        diagnostics.emit_error(
                            ErrorCode::TypeMismatch,
                            format!("cannot assign '{inferred}' to '{name}' of type '{existing}'"),
                            stmt.pos(),
                        );
                    }
                }
                None => {
                    diagnostics.emit_error(
                        ErrorCode::UndefinedVariable,
                        format!("'{name}' is not bound in this scope"),
                        stmt.pos(),
                    );
                }
            }
        }
    }
}

fn analyze_on_block(
    block: &OnBlock,
    outer_env: &LocalEnv,
    ctx: &CompilationContext,
    realtimesafe: bool,
    diagnostics: &mut DiagnosticEngine,
) {
    let mut env = outer_env.clone();
    for action in &block.actions {
        analyze_action(action, &mut env, ctx, realtimesafe, diagnostics);
    }

    match &block.transition {
        Transition::Unconditional { .. } => {}
        Transition::IfElse {
            cond,
            then_actions,
            else_actions,
            ..
        } => {
            let cond_ty = type_system::infer_expression_type(cond, &env, ctx, diagnostics);
            if cond_ty != Type::Unknown && cond_ty != Type::Bool {
                diagnostics.emit_error(
                    ErrorCode::TypeMismatch,
                    format!("transition condition must be 'bool', found '{cond_ty}'"),
                    cond.pos,
                );
            }

            let mut then_env = env.clone();
            for action in then_actions {
                analyze_action(action, &mut then_env, ctx, realtimesafe, diagnostics);
            }
            let mut else_env = env.clone();
            for action in else_actions {
                analyze_action(action, &mut else_env, ctx, realtimesafe, diagnostics);
            }
        }
    }
}

fn analyze_action(
    action: &Action,
    env: &mut LocalEnv,
    ctx: &CompilationContext,
    realtimesafe: bool,
    diagnostics: &mut DiagnosticEngine,
) {
    match action {
        Action::Do(stmt) => bind_do_stmt(stmt, env, ctx, diagnostics),

        Action::Send { channel, expr, pos } => {
            if realtimesafe {
                diagnostics.emit_error(
                    ErrorCode::BlockingOperationUnderRealtimeSafe,
                    format!("blocking 'send' on '{channel}' inside an @realtimesafe group"),
                    *pos,
                );
            }
            let expr_ty = type_system::infer_expression_type(expr, env, ctx, diagnostics);
            check_channel_element_type(channel, &expr_ty, ctx, *pos, diagnostics);
        }

        Action::Receive {
            channel,
            target,
            declares,
            pos,
        } => {
            if realtimesafe {
                diagnostics.emit_error(
                    ErrorCode::BlockingOperationUnderRealtimeSafe,
                    format!("blocking 'receive' on '{channel}' inside an @realtimesafe group"),
                    *pos,
                );
            }
            let element_ty = channel_element_or_report(channel, ctx, *pos, diagnostics);
            if *declares {
                if env.contains(target) {
                    diagnostics.emit_error(
                        ErrorCode::DuplicateDeclaration,
                        format!("'{target}' is already declared in this scope"),
                        *pos,
                    );
                }
                env.bind(target.clone(), element_ty);
            } else {
                match env.get(target).cloned() {
                    Some(existing) => {
                        if existing != Type::Unknown && element_ty != Type::Unknown && !existing.type_equals(&element_ty) {
                            diagnostics.emit_error(
                                ErrorCode::TypeMismatch,
                                format!("cannot receive '{element_ty}' into '{target}' of type '{existing}'"),
                                *pos,
                            );
                        }
                    }
                    None => {
                        diagnostics.emit_error(
                            ErrorCode::UndefinedVariable,
                            format!("'{target}' is not bound in this scope"),
                            *pos,
                        );
                    }
                }
            }
        }

        Action::TrySend { channel, expr, out, pos } => {
            let expr_ty = type_system::infer_expression_type(expr, env, ctx, diagnostics);
            check_channel_element_type(channel, &expr_ty, ctx, *pos, diagnostics);
            bind_or_check_result_type(out, Type::result(Type::Bool, Type::Text), env, *pos, diagnostics);
        }

        Action::TryReceive { channel, out, pos } => {
            let element_ty = channel_element_or_report(channel, ctx, *pos, diagnostics);
            bind_or_check_result_type(out, Type::result(element_ty, Type::Text), env, *pos, diagnostics);
        }
    }
}

fn channel_element_or_report(
    channel: &str,
    ctx: &CompilationContext,
    pos: SourceLocation,
    diagnostics: &mut DiagnosticEngine,
) -> Type {
    match ctx.channel_element_type(channel) {
        Some(ty) => ty.clone(),
        None => {
            diagnostics.emit_error(ErrorCode::UndefinedChannel, format!("undefined channel '{channel}'"), pos);
            Type::Unknown
        }
    }
}

fn check_channel_element_type(
    channel: &str,
    expr_ty: &Type,
    ctx: &CompilationContext,
    pos: SourceLocation,
    diagnostics: &mut DiagnosticEngine,
) {
    let element_ty = channel_element_or_report(channel, ctx, pos, diagnostics);
    if element_ty != Type::Unknown && *expr_ty != Type::Unknown && !element_ty.type_equals(expr_ty) {
        diagnostics.emit_error(
            ErrorCode::ChannelTypeMismatch,
            format!("channel '{channel}' carries '{element_ty}', found '{expr_ty}'"),
            pos,
        );
    }
}

fn bind_or_check_result_type(
    name: &str,
    expected: Type,
    env: &mut LocalEnv,
    pos: SourceLocation,
    diagnostics: &mut DiagnosticEngine,
) {
    match env.get(name).cloned() {
        Some(existing) => {
            if !existing.type_equals(&expected) {
                diagnostics.emit_error(
                    ErrorCode::TypeMismatch,
                    format!("'{name}' must be '{expected}', found '{existing}'"),
                    pos,
                );
            }
        }
        None => env.bind(name.to_string(), expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caps_ir::SourceLocation;
    use caps_ir::ast::{Expression, GroupDecl, ScheduleDecl};

    fn pos() -> SourceLocation {
        SourceLocation::default()
    }

    fn empty_group_ctx() -> CompilationContext {
        CompilationContext::for_group(&GroupDecl {
            pos: pos(),
            name: "g".to_string(),
            annotations: Vec::new(),
            channels: Vec::new(),
            processes: Vec::new(),
            schedule: ScheduleDecl {
                pos: pos(),
                steps: Vec::new(),
                repeat: false,
            },
        })
    }

    fn simple_process() -> ProcessDecl {
        ProcessDecl {
            pos: pos(),
            name: "Worker".to_string(),
            annotations: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            states: vec!["Running".to_string()],
            locals: Vec::new(),
            on_blocks: vec![OnBlock {
                pos: pos(),
                state_name: "Running".to_string(),
                actions: Vec::new(),
                transition: Transition::Unconditional { pos: pos(), to: "Running".to_string() },
            }],
        }
    }

    #[test]
    fn well_formed_process_has_no_diagnostics() {
        let mut process = simple_process();
        let ctx = empty_group_ctx();
        let mut diagnostics = DiagnosticEngine::new();
        analyze_process(&mut process, &ctx, false, &mut diagnostics);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn transition_to_unknown_state_is_an_error() {
        let mut process = simple_process();
        process.on_blocks[0].transition = Transition::Unconditional { pos: pos(), to: "Nope".to_string() };
        let ctx = empty_group_ctx();
        let mut diagnostics = DiagnosticEngine::new();
        analyze_process(&mut process, &ctx, false, &mut diagnostics);
        assert!(diagnostics
            .diagnostics()
            .iter()
            .any(|d| d.error_code == ErrorCode::UnknownStateTarget));
    }

    #[test]
    fn try_in_locals_initializer_is_illegal() {
        let mut process = simple_process();
        process.locals.push(DoStmt::Let {
            pos: pos(),
            name: "x".to_string(),
            explicit_type: None,
            expr: Expression::new(
                pos(),
                ExpressionKind::Try {
                    operand: Box::new(Expression::new(
                        pos(),
                        ExpressionKind::Identifier("whatever".to_string()),
                    )),
                },
            ),
        });
        let ctx = empty_group_ctx();
        let mut diagnostics = DiagnosticEngine::new();
        analyze_process(&mut process, &ctx, false, &mut diagnostics);
        assert!(diagnostics
            .diagnostics()
            .iter()
            .any(|d| d.error_code == ErrorCode::IllegalTryOperator));
    }

    #[test]
    fn try_usage_requires_error_state_and_injects_last_error_local() {
        let mut process = simple_process();
        process.on_blocks[0].actions.push(Action::Do(DoStmt::Let {
            pos: pos(),
            name: "x".to_string(),
            explicit_type: None,
            expr: Expression::new(
                pos(),
                ExpressionKind::Try {
                    operand: Box::new(Expression::new(
                        pos(),
                        ExpressionKind::Call {
                            func_name: "len".to_string(),
                            args: Vec::new(),
                        },
                    )),
                },
            ),
        }));
        let ctx = empty_group_ctx();
        let mut diagnostics = DiagnosticEngine::new();
        analyze_process(&mut process, &ctx, false, &mut diagnostics);
        assert!(diagnostics
            .diagnostics()
            .iter()
            .any(|d| d.error_code == ErrorCode::MissingErrorState));
        assert_eq!(process.locals[0].name(), LAST_ERROR_LOCAL);
    }

    #[test]
    fn realtimesafe_rejects_blocking_send() {
        let mut process = simple_process();
        process.on_blocks[0].actions.push(Action::Send {
            pos: pos(),
            channel: "c".to_string(),
            expr: Expression::new(pos(), ExpressionKind::IntLit(1)),
        });
        let ctx = empty_group_ctx();
        let mut diagnostics = DiagnosticEngine::new();
        analyze_process(&mut process, &ctx, true, &mut diagnostics);
        assert!(diagnostics
            .diagnostics()
            .iter()
            .any(|d| d.error_code == ErrorCode::BlockingOperationUnderRealtimeSafe));
    }
}
