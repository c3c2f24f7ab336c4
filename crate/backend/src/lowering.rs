use caps_ir::ast::{self, Action, DoStmt, ExpressionKind, GroupDecl, OnBlock, ProcessDecl, Program, Transition};

use crate::ir::{IRAction, IRChannel, IRExpr, IRGroup, IRProcess, IRProgram, IRState, IRTransition};

const ERROR_STATE: &str = "__Error";
const LAST_ERROR_LOCAL: &str = "__last_error";

/// Lowers an already-analyzed [`Program`] to the backend's IR. Assumes
/// semantic analysis has already run and accepted the program: illegal `?`
/// placement and unknown identifiers are not re-checked here.
pub fn lower_program(program: &Program) -> IRProgram {
    IRProgram {
        module_name: program.module_name.clone(),
        groups: program.groups.iter().map(lower_group).collect(),
    }
}

fn lower_group(group: &GroupDecl) -> IRGroup {
    IRGroup {
        name: group.name.clone(),
        channels: group
            .channels
            .iter()
            .map(|c| IRChannel {
                name: c.name.clone(),
                capacity: c.capacity,
            })
            .collect(),
        processes: group.processes.iter().map(lower_process).collect(),
        schedule_steps: group.schedule.steps.clone(),
        repeat: group.schedule.repeat,
    }
}

fn lower_process(process: &ProcessDecl) -> IRProcess {
    let states = process
        .states
        .iter()
        .map(|state_name| {
            let on_block = process
                .on_block_for(state_name)
                .unwrap_or_else(|| panic!("state `{state_name}` has no on-block at lowering time"));
            (state_name.clone(), lower_state(state_name, on_block))
        })
        .collect();

    IRProcess {
        name: process.name.clone(),
        initial_state: process
            .states
            .first()
            .cloned()
            .unwrap_or_else(|| panic!("process `{}` declares no states", process.name)),
        states,
        local_names: process.locals.iter().map(|stmt| stmt.name().to_string()).collect(),
        output_names: process.outputs.iter().map(|p| p.name.clone()).collect(),
        realtimesafe: process.has_annotation("realtimesafe"),
    }
}

fn lower_state(name: &str, on_block: &OnBlock) -> IRState {
    let actions: Vec<IRAction> = on_block.actions.iter().map(lower_action).collect();
    let transition = lower_transition(&on_block.transition);
    let terminal = actions.is_empty() && is_self_loop(&transition, name);

    IRState {
        name: name.to_string(),
        actions,
        transition,
        terminal,
    }
}

fn is_self_loop(transition: &IRTransition, state_name: &str) -> bool {
    matches!(transition, IRTransition::Unconditional { to } if to == state_name)
}

fn lower_action(action: &Action) -> IRAction {
    match action {
        Action::Do(stmt) => lower_do_stmt(stmt),
        Action::Send { channel, expr, .. } => IRAction::Send {
            chan: channel.clone(),
            expr: lower_expr(expr),
        },
        Action::Receive { channel, target, .. } => IRAction::Receive {
            chan: channel.clone(),
            dst: target.clone(),
        },
        Action::TrySend { channel, expr, out, .. } => IRAction::TrySend {
            chan: channel.clone(),
            expr: lower_expr(expr),
            out: out.clone(),
        },
        Action::TryReceive { channel, out, .. } => IRAction::TryReceive {
            chan: channel.clone(),
            out: out.clone(),
        },
    }
}

fn lower_do_stmt(stmt: &DoStmt) -> IRAction {
    let dst = stmt.name().to_string();
    match &stmt.expr().kind {
        ExpressionKind::Try { operand } => IRAction::TryUnwrapAssign {
            dst,
            result_expr: lower_expr(operand),
            error_state: ERROR_STATE.to_string(),
            last_error_local: LAST_ERROR_LOCAL.to_string(),
        },
        _ => IRAction::Assign {
            dst,
            expr: lower_expr(stmt.expr()),
        },
    }
}

fn lower_transition(transition: &Transition) -> IRTransition {
    match transition {
        Transition::Unconditional { to, .. } => IRTransition::Unconditional { to: to.clone() },
        Transition::IfElse {
            cond,
            then_actions,
            then_to,
            else_actions,
            else_to,
            ..
        } => IRTransition::IfElse {
            cond: lower_expr(cond),
            then_actions: then_actions.iter().map(lower_action).collect(),
            then_to: then_to.clone(),
            else_actions: else_actions.iter().map(lower_action).collect(),
            else_to: else_to.clone(),
        },
    }
}

fn lower_expr(expr: &ast::Expression) -> IRExpr {
    match &expr.kind {
        ExpressionKind::IntLit(v) => IRExpr::IntLit(*v),
        ExpressionKind::RealLit(v) => IRExpr::RealLit(*v),
        ExpressionKind::TextLit(v) => IRExpr::TextLit(v.clone()),
        ExpressionKind::BoolLit(v) => IRExpr::BoolLit(*v),
        ExpressionKind::Identifier(name) => IRExpr::Var(name.clone()),
        ExpressionKind::Binary { op, left, right } => IRExpr::Binary {
            op: *op,
            left: Box::new(lower_expr(left)),
            right: Box::new(lower_expr(right)),
        },
        ExpressionKind::Unary { op, operand } => IRExpr::Unary {
            op: *op,
            operand: Box::new(lower_expr(operand)),
        },
        ExpressionKind::Call { func_name, args } if func_name == "len" && args.len() == 1 => match &args[0].kind {
            ExpressionKind::Identifier(name) => IRExpr::Len(name.clone()),
            _ => panic!("len() argument must be a channel identifier (should have been rejected by semantic analysis)"),
        },
        ExpressionKind::Call { func_name, .. } => {
            panic!("unknown call `{func_name}` survived to lowering (should have been rejected by semantic analysis)")
        }
        ExpressionKind::Try { .. } => {
            panic!("`?` outside a do-statement RHS survived to lowering (should have been rejected by semantic analysis)")
        }
    }
}
