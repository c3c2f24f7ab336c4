use std::cell::RefCell;

use caps_types::Type;

use crate::source_location::SourceLocation;

/// The root of a parsed program: a module name plus an ordered list of groups.
#[derive(Debug, Clone)]
pub struct Program {
    pub pos: SourceLocation,
    pub module_name: String,
    pub groups: Vec<GroupDecl>,
}

/// A named binary/unary annotation attached to a group or process, e.g.
/// `@pipeline_safe` or `@realtimesafe`.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub pos: SourceLocation,
    pub name: String,
    pub args: Vec<String>,
}

/// A reference to a type as written in source: a primitive name, or
/// `Channel<T; N>` / `Result<T, E>` with their type arguments.
#[derive(Debug, Clone)]
pub struct TypeRef {
    pub pos: SourceLocation,
    pub name: String,
    pub args: Vec<TypeRef>,
    /// Present only when `name == "Channel"`; the declared capacity `N`.
    pub channel_capacity: Option<u32>,
}

impl TypeRef {
    pub fn primitive(pos: SourceLocation, name: impl Into<String>) -> Self {
        Self {
            pos,
            name: name.into(),
            args: Vec::new(),
            channel_capacity: None,
        }
    }

    pub fn channel(pos: SourceLocation, element: TypeRef, capacity: u32) -> Self {
        Self {
            pos,
            name: "Channel".to_string(),
            args: vec![element],
            channel_capacity: Some(capacity),
        }
    }

    pub fn result(pos: SourceLocation, ok: TypeRef, err: TypeRef) -> Self {
        Self {
            pos,
            name: "Result".to_string(),
            args: vec![ok, err],
            channel_capacity: None,
        }
    }

    /// Resolves this surface reference against the type algebra, per §4.4.
    /// Unrecognized names (and arity mismatches) yield `Type::Unknown`; the
    /// caller is responsible for reporting that as a diagnostic.
    pub fn resolve(&self) -> Type {
        if let Some(primitive) = caps_types::resolve_primitive(&self.name) {
            return primitive;
        }
        match self.name.as_str() {
            "Channel" => match (self.args.first(), self.channel_capacity) {
                (Some(element), Some(capacity)) => Type::channel(element.resolve(), capacity),
                _ => Type::Unknown,
            },
            "Result" => match (self.args.first(), self.args.get(1)) {
                (Some(ok), Some(err)) => Type::result(ok.resolve(), err.resolve()),
                _ => Type::Unknown,
            },
            _ => Type::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelDecl {
    pub pos: SourceLocation,
    pub name: String,
    pub element_type: TypeRef,
    pub capacity: u32,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub pos: SourceLocation,
    pub name: String,
    pub type_ref: TypeRef,
}

/// One FSM process: inputs/outputs, declared states, locals, and a per-state
/// on-block. `locals` holds only `let`/`var`-shaped initializers (§3).
#[derive(Debug, Clone)]
pub struct ProcessDecl {
    pub pos: SourceLocation,
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub states: Vec<String>,
    pub locals: Vec<DoStmt>,
    pub on_blocks: Vec<OnBlock>,
}

impl ProcessDecl {
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }

    pub fn on_block_for(&self, state: &str) -> Option<&OnBlock> {
        self.on_blocks.iter().find(|block| block.state_name == state)
    }
}

/// The body executed while a process occupies a given state: a sequence of
/// base actions followed by exactly one transition (§4.3).
#[derive(Debug, Clone)]
pub struct OnBlock {
    pub pos: SourceLocation,
    pub state_name: String,
    pub actions: Vec<Action>,
    pub transition: Transition,
}

/// A `let`/`var`/`assign` statement, as it can appear among process locals
/// or as the `Do` form of an [`Action`].
#[derive(Debug, Clone)]
pub enum DoStmt {
    Let {
        pos: SourceLocation,
        name: String,
        explicit_type: Option<TypeRef>,
        expr: Expression,
    },
    Var {
        pos: SourceLocation,
        name: String,
        explicit_type: Option<TypeRef>,
        expr: Expression,
    },
    Assign {
        pos: SourceLocation,
        name: String,
        expr: Expression,
    },
}

impl DoStmt {
    pub fn pos(&self) -> SourceLocation {
        match self {
            DoStmt::Let { pos, .. } | DoStmt::Var { pos, .. } | DoStmt::Assign { pos, .. } => *pos,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DoStmt::Let { name, .. } | DoStmt::Var { name, .. } | DoStmt::Assign { name, .. } => name,
        }
    }

    pub fn expr(&self) -> &Expression {
        match self {
            DoStmt::Let { expr, .. } | DoStmt::Var { expr, .. } | DoStmt::Assign { expr, .. } => expr,
        }
    }
}

/// One step of process behavior, per §3: a plain statement, or one of the
/// four channel operations.
#[derive(Debug, Clone)]
pub enum Action {
    Do(DoStmt),
    Send {
        pos: SourceLocation,
        channel: String,
        expr: Expression,
    },
    /// `recv ch -> x` (declares a new binding) or `recv ch -> x` re-using an
    /// already-bound name, distinguished by `declares`.
    Receive {
        pos: SourceLocation,
        channel: String,
        target: String,
        declares: bool,
    },
    TrySend {
        pos: SourceLocation,
        channel: String,
        expr: Expression,
        out: String,
    },
    TryReceive {
        pos: SourceLocation,
        channel: String,
        out: String,
    },
}

impl Action {
    pub fn pos(&self) -> SourceLocation {
        match self {
            Action::Do(stmt) => stmt.pos(),
            Action::Send { pos, .. }
            | Action::Receive { pos, .. }
            | Action::TrySend { pos, .. }
            | Action::TryReceive { pos, .. } => *pos,
        }
    }
}

/// The single mandatory exit of an on-block (§3): either an unconditional
/// jump, or a two-armed branch whose actions run before the state changes.
#[derive(Debug, Clone)]
pub enum Transition {
    Unconditional {
        pos: SourceLocation,
        to: String,
    },
    IfElse {
        pos: SourceLocation,
        cond: Expression,
        then_actions: Vec<Action>,
        then_to: String,
        else_actions: Vec<Action>,
        else_to: String,
    },
}

impl Transition {
    pub fn pos(&self) -> SourceLocation {
        match self {
            Transition::Unconditional { pos, .. } | Transition::IfElse { pos, .. } => *pos,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleDecl {
    pub pos: SourceLocation,
    pub steps: Vec<String>,
    pub repeat: bool,
}

#[derive(Debug, Clone)]
pub struct GroupDecl {
    pub pos: SourceLocation,
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub channels: Vec<ChannelDecl>,
    pub processes: Vec<ProcessDecl>,
    pub schedule: ScheduleDecl,
}

impl GroupDecl {
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelDecl> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn process(&self, name: &str) -> Option<&ProcessDecl> {
        self.processes.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// An expression, along with its once-assigned inferred type.
///
/// Per §3's lifecycle rule, `inferred_type` starts `None` and is written
/// exactly once by the semantic analyzer; nothing downstream mutates it.
#[derive(Debug, Clone)]
pub struct Expression {
    pub pos: SourceLocation,
    pub kind: ExpressionKind,
    pub inferred_type: RefCell<Option<Type>>,
}

impl Expression {
    pub fn new(pos: SourceLocation, kind: ExpressionKind) -> Self {
        Self {
            pos,
            kind,
            inferred_type: RefCell::new(None),
        }
    }

    pub fn set_inferred_type(&self, ty: Type) {
        *self.inferred_type.borrow_mut() = Some(ty);
    }

    pub fn inferred_type(&self) -> Option<Type> {
        self.inferred_type.borrow().clone()
    }
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    IntLit(i64),
    RealLit(f64),
    TextLit(String),
    BoolLit(bool),
    Identifier(String),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    /// The one built-in call form, `len(ch)` (§4.5.3); `func_name` is kept
    /// general so an unrecognized callee can still be diagnosed by name.
    Call {
        func_name: String,
        args: Vec<Expression>,
    },
    /// Postfix `?`, restricted to the positions named in §3.
    Try {
        operand: Box<Expression>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ref_resolves_primitives() {
        let pos = SourceLocation::default();
        assert_eq!(TypeRef::primitive(pos, "int").resolve(), Type::Int);
        assert_eq!(TypeRef::primitive(pos, "text").resolve(), Type::Text);
    }

    #[test]
    fn type_ref_resolves_channel_and_result() {
        let pos = SourceLocation::default();
        let channel = TypeRef::channel(pos, TypeRef::primitive(pos, "int"), 4);
        assert_eq!(channel.resolve(), Type::channel(Type::Int, 4));

        let result = TypeRef::result(pos, TypeRef::primitive(pos, "int"), TypeRef::primitive(pos, "text"));
        assert_eq!(result.resolve(), Type::result(Type::Int, Type::Text));
    }

    #[test]
    fn unknown_type_name_resolves_to_unknown() {
        let pos = SourceLocation::default();
        assert_eq!(TypeRef::primitive(pos, "frobnicate").resolve(), Type::Unknown);
    }

    #[test]
    fn expression_inferred_type_is_write_once_in_practice() {
        let expr = Expression::new(SourceLocation::default(), ExpressionKind::IntLit(1));
        assert_eq!(expr.inferred_type(), None);
        expr.set_inferred_type(Type::Int);
        assert_eq!(expr.inferred_type(), Some(Type::Int));
    }
}
