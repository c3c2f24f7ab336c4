use crate::Visitor;
use crate::ast::{
    Action, DoStmt, Expression, ExpressionKind, GroupDecl, OnBlock, ProcessDecl, Program, Transition,
};

/// A visitor implementation that prints the AST in a human-readable,
/// indented tree, for the `--dump-ast` CLI flag.
pub struct AstPrinter {
    indent_level: usize,
}

impl AstPrinter {
    pub fn new() -> Self {
        AstPrinter { indent_level: 0 }
    }

    pub fn print(&mut self, program: &Program) {
        self.visit_program(program);
    }

    fn indent(&self) -> String {
        "  ".repeat(self.indent_level)
    }

    fn with_indent<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.indent_level += 1;
        f(self);
        self.indent_level -= 1;
    }
}

impl Default for AstPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Visitor<()> for AstPrinter {
    fn visit_program(&mut self, program: &Program) {
        println!("Program: module {}", program.module_name);
        self.with_indent(|this| {
            for group in &program.groups {
                this.visit_group(group);
            }
        });
    }

    fn visit_group(&mut self, group: &GroupDecl) {
        let annotations: Vec<&str> = group.annotations.iter().map(|a| a.name.as_str()).collect();
        println!("{}Group: {} {:?}", self.indent(), group.name, annotations);
        self.with_indent(|this| {
            for channel in &group.channels {
                println!(
                    "{}channel {} : {} [cap {}]",
                    this.indent(),
                    channel.name,
                    channel.element_type.name,
                    channel.capacity
                );
            }
            for process in &group.processes {
                this.visit_process(process);
            }
            println!(
                "{}schedule: {:?}{}",
                this.indent(),
                group.schedule.steps,
                if group.schedule.repeat { " repeat" } else { "" }
            );
        });
    }

    fn visit_process(&mut self, process: &ProcessDecl) {
        let annotations: Vec<&str> = process.annotations.iter().map(|a| a.name.as_str()).collect();
        println!("{}Process: {} {:?}", self.indent(), process.name, annotations);
        self.with_indent(|this| {
            for local in &process.locals {
                this.visit_do_stmt(local);
            }
            for on_block in &process.on_blocks {
                this.visit_on_block(on_block);
            }
        });
    }

    fn visit_on_block(&mut self, on_block: &OnBlock) {
        println!("{}on {}:", self.indent(), on_block.state_name);
        self.with_indent(|this| {
            for action in &on_block.actions {
                this.visit_action(action);
            }
            this.visit_transition(&on_block.transition);
        });
    }

    fn visit_do_stmt(&mut self, stmt: &DoStmt) {
        match stmt {
            DoStmt::Let { name, expr, .. } => {
                print!("{}let {} = ", self.indent(), name);
                self.visit_expression(expr);
                println!();
            }
            DoStmt::Var { name, expr, .. } => {
                print!("{}var {} = ", self.indent(), name);
                self.visit_expression(expr);
                println!();
            }
            DoStmt::Assign { name, expr, .. } => {
                print!("{}{} = ", self.indent(), name);
                self.visit_expression(expr);
                println!();
            }
        }
    }

    fn visit_send(&mut self, action: &Action) {
        if let Action::Send { channel, expr, .. } = action {
            print!("{}send {} <- ", self.indent(), channel);
            self.visit_expression(expr);
            println!();
        }
    }

    fn visit_receive(&mut self, action: &Action) {
        if let Action::Receive { channel, target, declares, .. } = action {
            println!(
                "{}receive {} -> {}{}",
                self.indent(),
                channel,
                target,
                if *declares { " (new)" } else { "" }
            );
        }
    }

    fn visit_try_send(&mut self, action: &Action) {
        if let Action::TrySend { channel, expr, out, .. } = action {
            print!("{}try_send {} <- ", self.indent(), channel);
            self.visit_expression(expr);
            println!(" -> {}", out);
        }
    }

    fn visit_try_receive(&mut self, action: &Action) {
        if let Action::TryReceive { channel, out, .. } = action {
            println!("{}try_receive {} -> {}", self.indent(), channel, out);
        }
    }

    fn visit_transition(&mut self, transition: &Transition) {
        match transition {
            Transition::Unconditional { to, .. } => println!("{}-> {}", self.indent(), to),
            Transition::IfElse {
                cond,
                then_actions,
                then_to,
                else_actions,
                else_to,
                ..
            } => {
                print!("{}if ", self.indent());
                self.visit_expression(cond);
                println!(" -> {}", then_to);
                self.with_indent(|this| {
                    for action in then_actions {
                        this.visit_action(action);
                    }
                });
                println!("{}else -> {}", self.indent(), else_to);
                self.with_indent(|this| {
                    for action in else_actions {
                        this.visit_action(action);
                    }
                });
            }
        }
    }

    fn visit_literal(&mut self, expr: &Expression) {
        match &expr.kind {
            ExpressionKind::IntLit(v) => print!("{}", v),
            ExpressionKind::RealLit(v) => print!("{}", v),
            ExpressionKind::TextLit(v) => print!("{:?}", v),
            ExpressionKind::BoolLit(v) => print!("{}", v),
            _ => unreachable!("visit_literal dispatched to a non-literal expression"),
        }
    }

    fn visit_identifier(&mut self, expr: &Expression) {
        if let ExpressionKind::Identifier(name) = &expr.kind {
            print!("{}", name);
        }
    }

    fn visit_binary(&mut self, expr: &Expression) {
        if let ExpressionKind::Binary { op, left, right } = &expr.kind {
            print!("(");
            self.visit_expression(left);
            print!(" {:?} ", op);
            self.visit_expression(right);
            print!(")");
        }
    }

    fn visit_unary(&mut self, expr: &Expression) {
        if let ExpressionKind::Unary { op, operand } = &expr.kind {
            print!("{:?}", op);
            self.visit_expression(operand);
        }
    }

    fn visit_call(&mut self, expr: &Expression) {
        if let ExpressionKind::Call { func_name, args } = &expr.kind {
            print!("{}(", func_name);
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    print!(", ");
                }
                self.visit_expression(arg);
            }
            print!(")");
        }
    }

    fn visit_try(&mut self, expr: &Expression) {
        if let ExpressionKind::Try { operand } = &expr.kind {
            self.visit_expression(operand);
            print!("?");
        }
    }
}
