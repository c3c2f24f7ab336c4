use std::collections::HashMap;

use caps_error::ErrorCode;
use caps_ir::ast::{BinaryOp, Expression, ExpressionKind, UnaryOp};
use caps_shared::{CompilationContext, DiagnosticEngine};
use caps_types::Type;

/// The bindings visible while typing expressions inside one process: its
/// parameters, outputs, and locals (§4.5.1). Channels are looked up through
/// [`CompilationContext`] instead, since they live at group scope.
#[derive(Default, Clone)]
pub struct LocalEnv {
    bindings: HashMap<String, Type>,
}

impl LocalEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn bind(&mut self, name: impl Into<String>, ty: Type) {
        self.bindings.insert(name.into(), ty);
    }
}

/// Infers the type of `expr` against `env`/`ctx`, writes the result into
/// `expr.inferred_type`, and appends diagnostics for anything that doesn't
/// type-check (§4.5.3). Always returns a `Type`, using `Type::Unknown` for
/// anything it could not resolve so callers can keep walking the tree.
pub fn infer_expression_type(
    expr: &Expression,
    env: &LocalEnv,
    ctx: &CompilationContext,
    diagnostics: &mut DiagnosticEngine,
) -> Type {
    let ty = match &expr.kind {
        ExpressionKind::IntLit(_) => Type::Int,
        ExpressionKind::RealLit(_) => Type::Real,
        ExpressionKind::TextLit(_) => Type::Text,
        ExpressionKind::BoolLit(_) => Type::Bool,

        ExpressionKind::Identifier(name) => match env.get(name) {
            Some(ty) => ty.clone(),
            None => {
                diagnostics.emit_error(
                    ErrorCode::UndefinedVariable,
                    format!("undefined variable '{name}'"),
                    expr.pos,
                );
                Type::Unknown
            }
        },

        ExpressionKind::Binary { op, left, right } => {
            let left_ty = infer_expression_type(left, env, ctx, diagnostics);
            let right_ty = infer_expression_type(right, env, ctx, diagnostics);
            type_binary_op(*op, &left_ty, &right_ty, expr, diagnostics)
        }

        ExpressionKind::Unary { op, operand } => {
            let operand_ty = infer_expression_type(operand, env, ctx, diagnostics);
            type_unary_op(*op, &operand_ty, expr, diagnostics)
        }

        ExpressionKind::Call { func_name, args } => {
            type_call(func_name, args, env, ctx, expr, diagnostics)
        }

        ExpressionKind::Try { operand } => {
            let operand_ty = infer_expression_type(operand, env, ctx, diagnostics);
            match operand_ty {
                Type::Result { ok, .. } => *ok,
                _ => {
                    diagnostics.emit_error(
                        ErrorCode::IllegalTryOperator,
                        format!("'?' applied to non-Result type '{operand_ty}'"),
                        expr.pos,
                    );
                    Type::Unknown
                }
            }
        }
    };
    expr.set_inferred_type(ty.clone());
    ty
}

fn type_binary_op(
    op: BinaryOp,
    left: &Type,
    right: &Type,
    expr: &Expression,
    diagnostics: &mut DiagnosticEngine,
) -> Type {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            match (left, right) {
                (Type::Int, Type::Int) => Type::Int,
                (Type::Real, Type::Real) => Type::Real,
                _ if *left == Type::Unknown || *right == Type::Unknown => Type::Unknown,
                _ => {
                    diagnostics.emit_error(
                        ErrorCode::InvalidOperandType,
                        format!("arithmetic requires matching int/real operands, found '{left}' and '{right}'"),
                        expr.pos,
                    );
                    Type::Unknown
                }
            }
        }
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            match (left, right) {
                (Type::Int, Type::Int) | (Type::Real, Type::Real) => Type::Bool,
                _ if *left == Type::Unknown || *right == Type::Unknown => Type::Bool,
                _ => {
                    diagnostics.emit_error(
                        ErrorCode::InvalidOperandType,
                        format!("comparison requires matching int/real operands, found '{left}' and '{right}'"),
                        expr.pos,
                    );
                    Type::Bool
                }
            }
        }
        BinaryOp::Eq | BinaryOp::NotEq => {
            if *left == Type::Unknown || *right == Type::Unknown || left.type_equals(right) {
                Type::Bool
            } else {
                diagnostics.emit_error(
                    ErrorCode::InvalidOperandType,
                    format!("cannot compare '{left}' with '{right}'"),
                    expr.pos,
                );
                Type::Bool
            }
        }
        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (Type::Bool, Type::Bool) => Type::Bool,
            _ if *left == Type::Unknown || *right == Type::Unknown => Type::Bool,
            _ => {
                diagnostics.emit_error(
                    ErrorCode::InvalidOperandType,
                    format!("logical operators require bool operands, found '{left}' and '{right}'"),
                    expr.pos,
                );
                Type::Bool
            }
        },
    }
}

fn type_unary_op(op: UnaryOp, operand: &Type, expr: &Expression, diagnostics: &mut DiagnosticEngine) -> Type {
    match op {
        UnaryOp::Neg => match operand {
            Type::Int | Type::Real => operand.clone(),
            Type::Unknown => Type::Unknown,
            _ => {
                diagnostics.emit_error(
                    ErrorCode::InvalidOperandType,
                    format!("unary '-' requires int or real, found '{operand}'"),
                    expr.pos,
                );
                Type::Unknown
            }
        },
        UnaryOp::Not => match operand {
            Type::Bool => Type::Bool,
            Type::Unknown => Type::Bool,
            _ => {
                diagnostics.emit_error(
                    ErrorCode::InvalidOperandType,
                    format!("unary '!' requires bool, found '{operand}'"),
                    expr.pos,
                );
                Type::Bool
            }
        },
    }
}

fn type_call(
    func_name: &str,
    args: &[Expression],
    env: &LocalEnv,
    ctx: &CompilationContext,
    expr: &Expression,
    diagnostics: &mut DiagnosticEngine,
) -> Type {
    if func_name != "len" {
        diagnostics.emit_error(
            ErrorCode::ArgumentMismatch,
            format!("unknown function '{func_name}'"),
            expr.pos,
        );
        for arg in args {
            infer_expression_type(arg, env, ctx, diagnostics);
        }
        return Type::Unknown;
    }

    if args.len() != 1 {
        diagnostics.emit_error(
            ErrorCode::ArgumentMismatch,
            format!("'len' takes exactly one argument, found {}", args.len()),
            expr.pos,
        );
        for arg in args {
            infer_expression_type(arg, env, ctx, diagnostics);
        }
        return Type::Unknown;
    }

    let arg = &args[0];
    let names_a_channel = matches!(&arg.kind, ExpressionKind::Identifier(name) if ctx.channel_type(name).is_some());
    if !names_a_channel {
        diagnostics.emit_error(
            ErrorCode::ArgumentMismatch,
            "'len' requires a channel argument",
            arg.pos,
        );
    }
    infer_expression_type(arg, env, ctx, diagnostics);
    Type::Int
}

/// True if `expr` contains a postfix `?` anywhere in its tree (§4.5.1).
pub fn contains_try(expr: &Expression) -> bool {
    match &expr.kind {
        ExpressionKind::Try { .. } => true,
        ExpressionKind::Binary { left, right, .. } => contains_try(left) || contains_try(right),
        ExpressionKind::Unary { operand, .. } => contains_try(operand),
        ExpressionKind::Call { args, .. } => args.iter().any(contains_try),
        ExpressionKind::IntLit(_)
        | ExpressionKind::RealLit(_)
        | ExpressionKind::TextLit(_)
        | ExpressionKind::BoolLit(_)
        | ExpressionKind::Identifier(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caps_ir::SourceLocation;

    fn lit_int(v: i64) -> Expression {
        Expression::new(SourceLocation::default(), ExpressionKind::IntLit(v))
    }

    #[test]
    fn int_plus_int_is_int() {
        let mut diagnostics = DiagnosticEngine::new();
        let expr = Expression::new(
            SourceLocation::default(),
            ExpressionKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(lit_int(1)),
                right: Box::new(lit_int(2)),
            },
        );
        let env = LocalEnv::new();
        let ctx = CompilationContext::for_group(&test_group());
        let ty = infer_expression_type(&expr, &env, &ctx, &mut diagnostics);
        assert_eq!(ty, Type::Int);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn mixed_arithmetic_is_an_error() {
        let mut diagnostics = DiagnosticEngine::new();
        let real_lit = Expression::new(SourceLocation::default(), ExpressionKind::RealLit(1.0));
        let expr = Expression::new(
            SourceLocation::default(),
            ExpressionKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(lit_int(1)),
                right: Box::new(real_lit),
            },
        );
        let env = LocalEnv::new();
        let ctx = CompilationContext::for_group(&test_group());
        infer_expression_type(&expr, &env, &ctx, &mut diagnostics);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        let mut diagnostics = DiagnosticEngine::new();
        let expr = Expression::new(SourceLocation::default(), ExpressionKind::Identifier("nope".to_string()));
        let env = LocalEnv::new();
        let ctx = CompilationContext::for_group(&test_group());
        let ty = infer_expression_type(&expr, &env, &ctx, &mut diagnostics);
        assert_eq!(ty, Type::Unknown);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn try_on_non_result_is_illegal() {
        let mut diagnostics = DiagnosticEngine::new();
        let expr = Expression::new(
            SourceLocation::default(),
            ExpressionKind::Try {
                operand: Box::new(lit_int(1)),
            },
        );
        let env = LocalEnv::new();
        let ctx = CompilationContext::for_group(&test_group());
        infer_expression_type(&expr, &env, &ctx, &mut diagnostics);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn contains_try_walks_nested_expressions() {
        let try_expr = Expression::new(
            SourceLocation::default(),
            ExpressionKind::Try {
                operand: Box::new(lit_int(1)),
            },
        );
        let wrapped = Expression::new(
            SourceLocation::default(),
            ExpressionKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(lit_int(1)),
                right: Box::new(try_expr),
            },
        );
        assert!(contains_try(&wrapped));
        assert!(!contains_try(&lit_int(1)));
    }

    fn test_group() -> caps_ir::ast::GroupDecl {
        let pos = SourceLocation::default();
        caps_ir::ast::GroupDecl {
            pos,
            name: "g".to_string(),
            annotations: Vec::new(),
            channels: Vec::new(),
            processes: Vec::new(),
            schedule: caps_ir::ast::ScheduleDecl {
                pos,
                steps: Vec::new(),
                repeat: false,
            },
        }
    }
}
