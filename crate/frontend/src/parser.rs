use caps_error::{CompileResult, CompilerError, ErrorCode, ErrorCollector};
use caps_ir::SourceLocation;
use caps_ir::ast::{
    Action, Annotation, BinaryOp, ChannelDecl, DoStmt, Expression, ExpressionKind, GroupDecl, OnBlock,
    Param, ProcessDecl, Program, ScheduleDecl, Transition, TypeRef, UnaryOp,
};

use crate::token::{Token, Tokentype};

/// Recursive-descent parser with a precedence-climbing expression parser
/// (§4.3). Parses the full token stream for a module at once; on a
/// malformed construct it reports an error and attempts to resynchronize at
/// the next statement-ish boundary rather than aborting outright.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: ErrorCollector,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: ErrorCollector::new(),
        }
    }

    pub fn parse_program(mut self) -> CompileResult<Program> {
        let pos = self.peek().pos;
        self.expect(Tokentype::Module, ErrorCode::ExpectedToken, "expected 'module'");
        let module_name = self.expect_identifier();
        self.consume_semicolon();

        let mut groups = Vec::new();
        while !self.is_at_end() {
            match self.parse_group() {
                Ok(group) => groups.push(group),
                Err(()) => self.synchronize_to_group(),
            }
        }

        self.errors.into_result(Program {
            pos,
            module_name,
            groups,
        })
    }

    // ---- groups ----

    fn parse_group(&mut self) -> Result<GroupDecl, ()> {
        let annotations = self.parse_annotations();
        let pos = self.peek().pos;
        self.expect(Tokentype::Group, ErrorCode::ExpectedToken, "expected 'group'");
        let name = self.expect_identifier();
        self.expect(Tokentype::LeftBrace, ErrorCode::ExpectedToken, "expected '{'");

        let mut channels = Vec::new();
        while self.check(Tokentype::Channel) {
            channels.push(self.parse_channel_decl());
        }

        let mut processes = Vec::new();
        while self.check(Tokentype::At) || self.check(Tokentype::Process) {
            processes.push(self.parse_process());
        }

        let schedule = self.parse_schedule();
        self.expect(Tokentype::RightBrace, ErrorCode::ExpectedToken, "expected '}'");

        Ok(GroupDecl {
            pos,
            name,
            annotations,
            channels,
            processes,
            schedule,
        })
    }

    fn parse_annotations(&mut self) -> Vec<Annotation> {
        let mut out = Vec::new();
        while self.check(Tokentype::At) {
            let pos = self.peek().pos;
            self.advance();
            let name = self.expect_identifier();
            let mut args = Vec::new();
            if self.match_token(Tokentype::LeftParen) {
                if !self.check(Tokentype::RightParen) {
                    loop {
                        args.push(self.advance().lexeme.clone());
                        if !self.match_token(Tokentype::Comma) {
                            break;
                        }
                    }
                }
                self.expect(Tokentype::RightParen, ErrorCode::ExpectedToken, "expected ')'");
            }
            out.push(Annotation { pos, name, args });
        }
        out
    }

    fn parse_channel_decl(&mut self) -> ChannelDecl {
        let pos = self.peek().pos;
        self.advance(); // 'channel'
        self.expect(Tokentype::Less, ErrorCode::ExpectedToken, "expected '<'");
        let element_type = self.parse_type_ref();
        self.expect(Tokentype::Semicolon, ErrorCode::ExpectedToken, "expected ';'");
        let capacity = self.expect_int_literal();
        self.expect(Tokentype::Greater, ErrorCode::ExpectedToken, "expected '>'");
        let name = self.expect_identifier();
        self.consume_semicolon();
        ChannelDecl {
            pos,
            name,
            element_type,
            capacity,
        }
    }

    // ---- processes ----

    fn parse_process(&mut self) -> ProcessDecl {
        let annotations = self.parse_annotations();
        let pos = self.peek().pos;
        self.advance(); // 'process'
        let name = self.expect_identifier();

        self.expect(Tokentype::LeftParen, ErrorCode::ExpectedToken, "expected '('");
        let inputs = self.parse_param_list();
        self.expect(Tokentype::RightParen, ErrorCode::ExpectedToken, "expected ')'");

        let mut outputs = Vec::new();
        if self.match_token(Tokentype::Arrow) {
            self.expect(Tokentype::LeftParen, ErrorCode::ExpectedToken, "expected '('");
            outputs = self.parse_param_list();
            self.expect(Tokentype::RightParen, ErrorCode::ExpectedToken, "expected ')'");
        }

        self.expect(Tokentype::LeftBrace, ErrorCode::ExpectedToken, "expected '{'");

        let mut states = Vec::new();
        if self.match_token(Tokentype::State) {
            loop {
                states.push(self.expect_identifier());
                if !self.match_token(Tokentype::Comma) {
                    break;
                }
            }
            self.consume_semicolon();
        }

        let mut locals = Vec::new();
        while self.check(Tokentype::Let) || self.check(Tokentype::Var) {
            locals.push(self.parse_let_or_var());
        }

        let mut on_blocks = Vec::new();
        while self.check(Tokentype::On) {
            on_blocks.push(self.parse_on_block());
        }

        self.expect(Tokentype::RightBrace, ErrorCode::ExpectedToken, "expected '}'");

        ProcessDecl {
            pos,
            name,
            annotations,
            inputs,
            outputs,
            states,
            locals,
            on_blocks,
        }
    }

    fn parse_param_list(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.check(Tokentype::RightParen) {
            return params;
        }
        loop {
            let pos = self.peek().pos;
            let name = self.expect_identifier();
            self.expect(Tokentype::Colon, ErrorCode::ExpectedToken, "expected ':'");
            let type_ref = self.parse_type_ref();
            params.push(Param { pos, name, type_ref });
            if !self.match_token(Tokentype::Comma) {
                break;
            }
        }
        params
    }

    fn parse_type_ref(&mut self) -> TypeRef {
        let pos = self.peek().pos;
        let name = self.expect_identifier_or_keyword_name();
        let mut args = Vec::new();
        let mut channel_capacity = None;
        if self.match_token(Tokentype::Less) {
            args.push(self.parse_type_ref());
            if name == "Channel" {
                self.expect(Tokentype::Semicolon, ErrorCode::ExpectedToken, "expected ';'");
                channel_capacity = Some(self.expect_int_literal());
            } else {
                while self.match_token(Tokentype::Comma) {
                    args.push(self.parse_type_ref());
                }
            }
            self.expect(Tokentype::Greater, ErrorCode::ExpectedToken, "expected '>'");
        }
        TypeRef {
            pos,
            name,
            args,
            channel_capacity,
        }
    }

    fn parse_let_or_var(&mut self) -> DoStmt {
        let pos = self.peek().pos;
        let is_let = self.check(Tokentype::Let);
        self.advance(); // 'let' or 'var'
        let name = self.expect_identifier();
        let explicit_type = if self.match_token(Tokentype::Colon) {
            Some(self.parse_type_ref())
        } else {
            None
        };
        self.expect(Tokentype::Equal, ErrorCode::ExpectedToken, "expected '='");
        let expr = self.parse_expr();
        self.consume_semicolon();
        if is_let {
            DoStmt::Let {
                pos,
                name,
                explicit_type,
                expr,
            }
        } else {
            DoStmt::Var {
                pos,
                name,
                explicit_type,
                expr,
            }
        }
    }

    // ---- on-blocks, actions, transitions ----

    fn parse_on_block(&mut self) -> OnBlock {
        let pos = self.peek().pos;
        self.advance(); // 'on'
        let state_name = self.expect_identifier();
        self.expect(Tokentype::LeftBrace, ErrorCode::ExpectedToken, "expected '{'");

        let mut actions = Vec::new();
        while self.is_action_start() {
            actions.push(self.parse_action());
        }

        if !self.check(Tokentype::Arrow) && !self.check(Tokentype::If) {
            self.error_here(ErrorCode::MissingTransition, "on-block is missing its transition");
        }
        let transition = self.parse_transition();

        self.expect(Tokentype::RightBrace, ErrorCode::ExpectedToken, "expected '}'");

        OnBlock {
            pos,
            state_name,
            actions,
            transition,
        }
    }

    fn is_action_start(&self) -> bool {
        matches!(
            self.peek().token_type,
            Tokentype::Let | Tokentype::Var | Tokentype::Send | Tokentype::Receive | Tokentype::TrySend | Tokentype::TryReceive
        ) || (self.check(Tokentype::Identifier) && self.check_next(Tokentype::Equal))
    }

    fn parse_action(&mut self) -> Action {
        match self.peek().token_type {
            Tokentype::Let | Tokentype::Var => Action::Do(self.parse_let_or_var()),
            Tokentype::Identifier => Action::Do(self.parse_assign()),
            Tokentype::Send => self.parse_send(),
            Tokentype::Receive => self.parse_receive(),
            Tokentype::TrySend => self.parse_try_send(),
            Tokentype::TryReceive => self.parse_try_receive(),
            _ => {
                self.error_here(ErrorCode::UnexpectedToken, "expected an action");
                self.advance();
                Action::Do(DoStmt::Assign {
                    pos: self.previous().pos,
                    name: String::new(),
                    expr: self.error_expr(),
                })
            }
        }
    }

    fn parse_assign(&mut self) -> DoStmt {
        let pos = self.peek().pos;
        let name = self.expect_identifier();
        self.expect(Tokentype::Equal, ErrorCode::ExpectedToken, "expected '='");
        let expr = self.parse_expr();
        self.consume_semicolon();
        DoStmt::Assign { pos, name, expr }
    }

    fn parse_send(&mut self) -> Action {
        let pos = self.peek().pos;
        self.advance(); // 'send'
        let expr = self.parse_expr();
        self.expect(Tokentype::Arrow, ErrorCode::ExpectedToken, "expected '->'");
        let channel = self.expect_identifier();
        self.consume_semicolon();
        Action::Send { pos, channel, expr }
    }

    fn parse_receive(&mut self) -> Action {
        let pos = self.peek().pos;
        self.advance(); // 'receive'
        let channel = self.expect_identifier();
        self.expect(Tokentype::Arrow, ErrorCode::ExpectedToken, "expected '->'");
        let declares = self.match_token(Tokentype::Var) || self.match_token(Tokentype::Let);
        let target = self.expect_identifier();
        self.consume_semicolon();
        Action::Receive {
            pos,
            channel,
            target,
            declares,
        }
    }

    fn parse_try_send(&mut self) -> Action {
        let pos = self.peek().pos;
        self.advance(); // 'try_send'
        let expr = self.parse_expr();
        self.expect(Tokentype::Arrow, ErrorCode::ExpectedToken, "expected '->'");
        let channel = self.expect_identifier();
        self.expect(Tokentype::Arrow, ErrorCode::ExpectedToken, "expected '->'");
        let out = self.expect_identifier();
        self.consume_semicolon();
        Action::TrySend {
            pos,
            channel,
            expr,
            out,
        }
    }

    fn parse_try_receive(&mut self) -> Action {
        let pos = self.peek().pos;
        self.advance(); // 'try_receive'
        let channel = self.expect_identifier();
        self.expect(Tokentype::Arrow, ErrorCode::ExpectedToken, "expected '->'");
        let out = self.expect_identifier();
        self.consume_semicolon();
        Action::TryReceive { pos, channel, out }
    }

    fn parse_transition(&mut self) -> Transition {
        let pos = self.peek().pos;
        if self.match_token(Tokentype::If) {
            let cond = self.parse_expr();
            self.expect(Tokentype::LeftBrace, ErrorCode::ExpectedToken, "expected '{'");
            let mut then_actions = Vec::new();
            while self.is_action_start() {
                then_actions.push(self.parse_action());
            }
            self.expect(Tokentype::Arrow, ErrorCode::ExpectedToken, "expected '->'");
            let then_to = self.expect_identifier();
            self.consume_semicolon();
            self.expect(Tokentype::RightBrace, ErrorCode::ExpectedToken, "expected '}'");

            self.expect(Tokentype::Else, ErrorCode::ExpectedToken, "expected 'else'");
            self.expect(Tokentype::LeftBrace, ErrorCode::ExpectedToken, "expected '{'");
            let mut else_actions = Vec::new();
            while self.is_action_start() {
                else_actions.push(self.parse_action());
            }
            self.expect(Tokentype::Arrow, ErrorCode::ExpectedToken, "expected '->'");
            let else_to = self.expect_identifier();
            self.consume_semicolon();
            self.expect(Tokentype::RightBrace, ErrorCode::ExpectedToken, "expected '}'");

            Transition::IfElse {
                pos,
                cond,
                then_actions,
                then_to,
                else_actions,
                else_to,
            }
        } else {
            self.expect(Tokentype::Arrow, ErrorCode::ExpectedToken, "expected '->'");
            let to = self.expect_identifier();
            self.consume_semicolon();
            Transition::Unconditional { pos, to }
        }
    }

    fn parse_schedule(&mut self) -> ScheduleDecl {
        let pos = self.peek().pos;
        self.expect(Tokentype::Schedule, ErrorCode::ExpectedToken, "expected 'schedule'");
        self.expect(Tokentype::LeftBrace, ErrorCode::ExpectedToken, "expected '{'");
        let mut steps = Vec::new();
        while self.match_token(Tokentype::Step) {
            steps.push(self.expect_identifier());
            self.consume_semicolon();
        }
        let repeat = self.match_token(Tokentype::Repeat);
        if repeat {
            self.consume_semicolon();
        }
        self.expect(Tokentype::RightBrace, ErrorCode::ExpectedToken, "expected '}'");
        ScheduleDecl { pos, steps, repeat }
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> Expression {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Expression {
        let mut left = self.parse_and();
        while self.check(Tokentype::OrOr) {
            let pos = self.peek().pos;
            self.advance();
            let right = self.parse_and();
            left = Expression::new(
                pos,
                ExpressionKind::Binary {
                    op: BinaryOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        left
    }

    fn parse_and(&mut self) -> Expression {
        let mut left = self.parse_equality();
        while self.check(Tokentype::AndAnd) {
            let pos = self.peek().pos;
            self.advance();
            let right = self.parse_equality();
            left = Expression::new(
                pos,
                ExpressionKind::Binary {
                    op: BinaryOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        left
    }

    fn parse_equality(&mut self) -> Expression {
        let mut left = self.parse_comparison();
        loop {
            let op = match self.peek().token_type {
                Tokentype::EqualEqual => BinaryOp::Eq,
                Tokentype::NotEqual => BinaryOp::NotEq,
                _ => break,
            };
            let pos = self.peek().pos;
            self.advance();
            let right = self.parse_comparison();
            left = Expression::new(
                pos,
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        left
    }

    fn parse_comparison(&mut self) -> Expression {
        let mut left = self.parse_term();
        loop {
            let op = match self.peek().token_type {
                Tokentype::Less => BinaryOp::Lt,
                Tokentype::LessEqual => BinaryOp::LtEq,
                Tokentype::Greater => BinaryOp::Gt,
                Tokentype::GreaterEqual => BinaryOp::GtEq,
                _ => break,
            };
            let pos = self.peek().pos;
            self.advance();
            let right = self.parse_term();
            left = Expression::new(
                pos,
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        left
    }

    fn parse_term(&mut self) -> Expression {
        let mut left = self.parse_factor();
        loop {
            let op = match self.peek().token_type {
                Tokentype::Plus => BinaryOp::Add,
                Tokentype::Minus => BinaryOp::Sub,
                _ => break,
            };
            let pos = self.peek().pos;
            self.advance();
            let right = self.parse_factor();
            left = Expression::new(
                pos,
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        left
    }

    fn parse_factor(&mut self) -> Expression {
        let mut left = self.parse_unary();
        loop {
            let op = match self.peek().token_type {
                Tokentype::Star => BinaryOp::Mul,
                Tokentype::Slash => BinaryOp::Div,
                _ => break,
            };
            let pos = self.peek().pos;
            self.advance();
            let right = self.parse_unary();
            left = Expression::new(
                pos,
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        left
    }

    fn parse_unary(&mut self) -> Expression {
        let op = match self.peek().token_type {
            Tokentype::Minus => Some(UnaryOp::Neg),
            Tokentype::Not => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let pos = self.peek().pos;
            self.advance();
            let operand = self.parse_unary();
            return Expression::new(
                pos,
                ExpressionKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
            );
        }
        self.parse_try_postfix()
    }

    fn parse_try_postfix(&mut self) -> Expression {
        let mut expr = self.parse_primary();
        while self.check(Tokentype::Question) {
            let pos = self.peek().pos;
            self.advance();
            expr = Expression::new(
                pos,
                ExpressionKind::Try {
                    operand: Box::new(expr),
                },
            );
        }
        expr
    }

    fn parse_primary(&mut self) -> Expression {
        let token = self.peek().clone();
        match token.token_type {
            Tokentype::IntLiteral => {
                self.advance();
                let value = token.lexeme.parse::<i64>().unwrap_or_else(|_| {
                    self.error_at(ErrorCode::InvalidNumberLiteral, "invalid integer literal", token.pos);
                    0
                });
                Expression::new(token.pos, ExpressionKind::IntLit(value))
            }
            Tokentype::RealLiteral => {
                self.advance();
                let value = token.lexeme.parse::<f64>().unwrap_or_else(|_| {
                    self.error_at(ErrorCode::InvalidNumberLiteral, "invalid real literal", token.pos);
                    0.0
                });
                Expression::new(token.pos, ExpressionKind::RealLit(value))
            }
            Tokentype::TextLiteral => {
                self.advance();
                Expression::new(token.pos, ExpressionKind::TextLit(token.lexeme.clone()))
            }
            Tokentype::BoolLiteral => {
                self.advance();
                Expression::new(token.pos, ExpressionKind::BoolLit(token.lexeme == "true"))
            }
            Tokentype::Identifier => {
                self.advance();
                if self.match_token(Tokentype::LeftParen) {
                    let mut args = Vec::new();
                    if !self.check(Tokentype::RightParen) {
                        loop {
                            args.push(self.parse_expr());
                            if !self.match_token(Tokentype::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(Tokentype::RightParen, ErrorCode::ExpectedToken, "expected ')'");
                    Expression::new(
                        token.pos,
                        ExpressionKind::Call {
                            func_name: token.lexeme.clone(),
                            args,
                        },
                    )
                } else {
                    Expression::new(token.pos, ExpressionKind::Identifier(token.lexeme.clone()))
                }
            }
            Tokentype::LeftParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(Tokentype::RightParen, ErrorCode::ExpectedToken, "expected ')'");
                inner
            }
            _ => {
                self.error_at(ErrorCode::ExpectedToken, "expected an expression", token.pos);
                self.advance();
                self.error_expr()
            }
        }
    }

    fn error_expr(&self) -> Expression {
        Expression::new(self.previous().pos, ExpressionKind::IntLit(0))
    }

    // ---- token-stream helpers ----

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn check(&self, token_type: Tokentype) -> bool {
        self.peek().token_type == token_type
    }

    fn check_next(&self, token_type: Tokentype) -> bool {
        self.tokens
            .get(self.current + 1)
            .map(|t| t.token_type == token_type)
            .unwrap_or(false)
    }

    fn is_at_end(&self) -> bool {
        self.check(Tokentype::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    fn match_token(&mut self, token_type: Tokentype) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token_type: Tokentype, error_code: ErrorCode, message: &str) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            self.error_here(error_code, message);
            false
        }
    }

    fn expect_identifier(&mut self) -> String {
        if self.check(Tokentype::Identifier) {
            self.advance().lexeme.clone()
        } else {
            self.error_here(ErrorCode::ExpectedIdentifier, "expected an identifier");
            String::new()
        }
    }

    /// Type names can shadow a handful of keywords (none currently do, but
    /// this keeps type-ref parsing independent from keyword growth).
    fn expect_identifier_or_keyword_name(&mut self) -> String {
        self.expect_identifier()
    }

    fn expect_int_literal(&mut self) -> u32 {
        if self.check(Tokentype::IntLiteral) {
            let lexeme = self.advance().lexeme.clone();
            lexeme.parse::<u32>().unwrap_or(0)
        } else {
            self.error_here(ErrorCode::ExpectedToken, "expected an integer literal");
            0
        }
    }

    fn consume_semicolon(&mut self) {
        self.expect(Tokentype::Semicolon, ErrorCode::ExpectedToken, "expected ';'");
    }

    fn error_here(&mut self, error_code: ErrorCode, message: &str) {
        let pos = self.peek().pos;
        self.error_at(error_code, message, pos);
    }

    fn error_at(&mut self, error_code: ErrorCode, message: &str, pos: SourceLocation) {
        self.errors.add_error(CompilerError::new(error_code, message, pos.line, pos.column));
    }

    /// Best-effort recovery: skip to the next `group`/`@` at the top level
    /// so one malformed group doesn't hide errors in the rest of the file.
    fn synchronize_to_group(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.check(Tokentype::Group) || self.check(Tokentype::At) {
                return;
            }
            self.advance();
        }
    }
}

/// Parses a full token stream into a [`Program`].
pub fn parse(tokens: Vec<Token>) -> CompileResult<Program> {
    Parser::new(tokens).parse_program()
}
