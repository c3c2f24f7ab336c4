use crate::ast::{
    Action, DoStmt, Expression, ExpressionKind, GroupDecl, OnBlock, ProcessDecl, Program, Transition,
};

/// Trait implementing the visitor pattern for traversing the AST.
///
/// This trait allows implementing different behaviors over the same tree —
/// semantic analysis, pretty-printing, or lowering — without threading a
/// match statement through every call site. The generic parameter `T` is the
/// return type of the visit methods.
pub trait Visitor<T> {
    fn visit_program(&mut self, program: &Program) -> T;

    fn visit_group(&mut self, group: &GroupDecl) -> T;

    fn visit_process(&mut self, process: &ProcessDecl) -> T;

    fn visit_on_block(&mut self, on_block: &OnBlock) -> T;

    fn visit_action(&mut self, action: &Action) -> T {
        match action {
            Action::Do(stmt) => self.visit_do_stmt(stmt),
            Action::Send { .. } => self.visit_send(action),
            Action::Receive { .. } => self.visit_receive(action),
            Action::TrySend { .. } => self.visit_try_send(action),
            Action::TryReceive { .. } => self.visit_try_receive(action),
        }
    }

    fn visit_do_stmt(&mut self, stmt: &DoStmt) -> T;

    fn visit_send(&mut self, action: &Action) -> T;

    fn visit_receive(&mut self, action: &Action) -> T;

    fn visit_try_send(&mut self, action: &Action) -> T;

    fn visit_try_receive(&mut self, action: &Action) -> T;

    fn visit_transition(&mut self, transition: &Transition) -> T;

    fn visit_expression(&mut self, expr: &Expression) -> T {
        match &expr.kind {
            ExpressionKind::IntLit(_)
            | ExpressionKind::RealLit(_)
            | ExpressionKind::TextLit(_)
            | ExpressionKind::BoolLit(_) => self.visit_literal(expr),
            ExpressionKind::Identifier(_) => self.visit_identifier(expr),
            ExpressionKind::Binary { .. } => self.visit_binary(expr),
            ExpressionKind::Unary { .. } => self.visit_unary(expr),
            ExpressionKind::Call { .. } => self.visit_call(expr),
            ExpressionKind::Try { .. } => self.visit_try(expr),
        }
    }

    fn visit_literal(&mut self, expr: &Expression) -> T;

    fn visit_identifier(&mut self, expr: &Expression) -> T;

    fn visit_binary(&mut self, expr: &Expression) -> T;

    fn visit_unary(&mut self, expr: &Expression) -> T;

    fn visit_call(&mut self, expr: &Expression) -> T;

    fn visit_try(&mut self, expr: &Expression) -> T;
}
