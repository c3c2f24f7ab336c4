use caps_ir::ast::{BinaryOp, UnaryOp};

use crate::ir::IRExpr;
use crate::runtime::{ProcessInstance, Runtime};
use crate::value::Value;

/// Evaluates a lowered expression against a process's locals/outputs and the
/// runtime's channels. Grounded in `eval_expr`/`eval_binop`'s dispatch: the
/// only channel-sensitive expression is `len(ch)`, everything else reads
/// from the process's own bindings (original_source/src/backend/eval.cpp).
pub fn eval_expr(rt: &Runtime, proc: &ProcessInstance, expr: &IRExpr) -> Value {
    match expr {
        IRExpr::IntLit(v) => Value::Int(*v),
        IRExpr::RealLit(v) => Value::Real(*v),
        IRExpr::TextLit(v) => Value::Text(v.clone()),
        IRExpr::BoolLit(v) => Value::Bool(*v),
        IRExpr::Var(name) => proc
            .lookup(name)
            .cloned()
            .unwrap_or_else(|| panic!("unbound variable `{name}` at evaluation time")),
        IRExpr::Len(chan) => {
            let channel = rt
                .channels
                .get(chan)
                .unwrap_or_else(|| panic!("unknown channel `{chan}` at evaluation time"));
            Value::Int(channel.len() as i64)
        }
        IRExpr::Binary { op, left, right } => {
            let l = eval_expr(rt, proc, left);
            let r = eval_expr(rt, proc, right);
            eval_binary(*op, l, r)
        }
        IRExpr::Unary { op, operand } => {
            let v = eval_expr(rt, proc, operand);
            eval_unary(*op, v)
        }
    }
}

fn eval_binary(op: BinaryOp, l: Value, r: Value) -> Value {
    match op {
        BinaryOp::Add => numeric(l, r, |a, b| a + b, |a, b| a + b),
        BinaryOp::Sub => numeric(l, r, |a, b| a - b, |a, b| a - b),
        BinaryOp::Mul => numeric(l, r, |a, b| a * b, |a, b| a * b),
        BinaryOp::Div => numeric(l, r, |a, b| a / b, |a, b| a / b),
        BinaryOp::Lt => Value::Bool(compare(l, r, |o| o.is_lt())),
        BinaryOp::LtEq => Value::Bool(compare(l, r, |o| o.is_le())),
        BinaryOp::Gt => Value::Bool(compare(l, r, |o| o.is_gt())),
        BinaryOp::GtEq => Value::Bool(compare(l, r, |o| o.is_ge())),
        BinaryOp::Eq => Value::Bool(l == r),
        BinaryOp::NotEq => Value::Bool(l != r),
        BinaryOp::And => Value::Bool(l.as_bool() && r.as_bool()),
        BinaryOp::Or => Value::Bool(l.as_bool() || r.as_bool()),
    }
}

fn eval_unary(op: UnaryOp, v: Value) -> Value {
    match op {
        UnaryOp::Neg => match v {
            Value::Int(n) => Value::Int(-n),
            Value::Real(n) => Value::Real(-n),
            other => panic!("cannot negate {other}"),
        },
        UnaryOp::Not => Value::Bool(!v.as_bool()),
    }
}

fn numeric(l: Value, r: Value, fi: fn(i64, i64) -> i64, fr: fn(f64, f64) -> f64) -> Value {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Value::Int(fi(a, b)),
        (Value::Real(a), Value::Real(b)) => Value::Real(fr(a, b)),
        (a, b) => panic!("invalid operand types for arithmetic: {a} and {b}"),
    }
}

fn compare(l: Value, r: Value, pred: fn(std::cmp::Ordering) -> bool) -> bool {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => pred(a.cmp(&b)),
        (Value::Real(a), Value::Real(b)) => pred(a.partial_cmp(&b).expect("non-NaN real comparison")),
        (a, b) => panic!("invalid operand types for comparison: {a} and {b}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IRGroup;

    fn test_runtime() -> (IRGroup, ProcessInstance) {
        let group = IRGroup {
            name: "g".to_string(),
            channels: Vec::new(),
            processes: Vec::new(),
            schedule_steps: Vec::new(),
            repeat: false,
        };
        let mut proc = ProcessInstance::new("P", "S0");
        proc.locals.insert("x".to_string(), Value::Int(4));
        (group, proc)
    }

    #[test]
    fn adds_two_integer_literals() {
        let (group, proc) = test_runtime();
        let rt = Runtime::new(&group);
        let expr = IRExpr::Binary {
            op: BinaryOp::Add,
            left: Box::new(IRExpr::IntLit(1)),
            right: Box::new(IRExpr::IntLit(2)),
        };
        assert_eq!(eval_expr(&rt, &proc, &expr), Value::Int(3));
    }

    #[test]
    fn reads_a_bound_local() {
        let (group, proc) = test_runtime();
        let rt = Runtime::new(&group);
        assert_eq!(eval_expr(&rt, &proc, &IRExpr::Var("x".to_string())), Value::Int(4));
    }

    #[test]
    fn len_of_empty_channel_is_zero() {
        let mut group = test_runtime().0;
        group.channels.push(crate::ir::IRChannel {
            name: "c".to_string(),
            capacity: 4,
        });
        let rt = Runtime::new(&group);
        let proc = ProcessInstance::new("P", "S0");
        assert_eq!(eval_expr(&rt, &proc, &IRExpr::Len("c".to_string())), Value::Int(0));
    }
}
