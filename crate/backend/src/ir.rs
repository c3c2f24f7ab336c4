use std::collections::HashMap;

use caps_ir::ast::{BinaryOp, UnaryOp};

/// A lowered expression. Unlike the surface [`caps_ir::ast::Expression`],
/// there is no `Try` variant: a postfix `?` is desugared entirely into
/// [`IRAction::TryUnwrapAssign`] during lowering, so by the time an
/// expression reaches the IR it is always a plain value computation.
#[derive(Debug, Clone)]
pub enum IRExpr {
    IntLit(i64),
    RealLit(f64),
    TextLit(String),
    BoolLit(bool),
    Var(String),
    /// `len(ch)`, the one built-in call (§4.5.3/§4.7).
    Len(String),
    Binary {
        op: BinaryOp,
        left: Box<IRExpr>,
        right: Box<IRExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<IRExpr>,
    },
}

/// One lowered intra-state operation (§4.7/§4.10).
#[derive(Debug, Clone)]
pub enum IRAction {
    Assign {
        dst: String,
        expr: IRExpr,
    },
    Send {
        chan: String,
        expr: IRExpr,
    },
    Receive {
        chan: String,
        dst: String,
    },
    TrySend {
        chan: String,
        expr: IRExpr,
        out: String,
    },
    TryReceive {
        chan: String,
        out: String,
    },
    /// The desugaring of postfix `?`: evaluate `result_expr`; on `Ok`,
    /// assign its value to `dst`; on `Err`, write the error text into
    /// `last_error_local` and force the enclosing step to redirect to
    /// `error_state` instead of its normal transition target (§4.10).
    TryUnwrapAssign {
        dst: String,
        result_expr: IRExpr,
        error_state: String,
        last_error_local: String,
    },
}

#[derive(Debug, Clone)]
pub enum IRTransition {
    Unconditional {
        to: String,
    },
    IfElse {
        cond: IRExpr,
        then_actions: Vec<IRAction>,
        then_to: String,
        else_actions: Vec<IRAction>,
        else_to: String,
    },
}

/// One state's on-block, lowered. `terminal` is computed during lowering
/// (§4.11.1): a state is terminal when it is a self-loop sink — no actions
/// and an unconditional transition back to itself.
#[derive(Debug, Clone)]
pub struct IRState {
    pub name: String,
    pub actions: Vec<IRAction>,
    pub transition: IRTransition,
    pub terminal: bool,
}

#[derive(Debug, Clone)]
pub struct IRProcess {
    pub name: String,
    pub initial_state: String,
    pub states: HashMap<String, IRState>,
    pub local_names: Vec<String>,
    pub output_names: Vec<String>,
    pub realtimesafe: bool,
}

impl IRProcess {
    pub fn state(&self, name: &str) -> Option<&IRState> {
        self.states.get(name)
    }
}

#[derive(Debug, Clone)]
pub struct IRChannel {
    pub name: String,
    pub capacity: u32,
}

#[derive(Debug, Clone)]
pub struct IRGroup {
    pub name: String,
    pub channels: Vec<IRChannel>,
    pub processes: Vec<IRProcess>,
    pub schedule_steps: Vec<String>,
    pub repeat: bool,
}

impl IRGroup {
    pub fn process(&self, name: &str) -> Option<&IRProcess> {
        self.processes.iter().find(|p| p.name == name)
    }

    pub fn channel(&self, name: &str) -> Option<&IRChannel> {
        self.channels.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct IRProgram {
    pub module_name: String,
    pub groups: Vec<IRGroup>,
}
