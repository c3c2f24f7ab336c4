use std::fmt::Display;

use caps_ir::SourceLocation;

/// Every kind of token the lexer can produce (§4.2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tokentype {
    Identifier,
    IntLiteral,
    RealLiteral,
    TextLiteral,
    BoolLiteral,

    // Keywords
    Module,
    Group,
    Process,
    State,
    On,
    Do,
    Let,
    Var,
    Channel,
    Schedule,
    Step,
    Repeat,
    If,
    Else,
    Send,
    Receive,
    TrySend,
    TryReceive,

    // Punctuation / operators
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Arrow,
    Equal,
    At,
    Question,
    Plus,
    Minus,
    Star,
    Slash,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,
    Not,

    Eof,
}

impl Display for Tokentype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Tokentype::Identifier => "identifier",
                Tokentype::IntLiteral => "integer literal",
                Tokentype::RealLiteral => "real literal",
                Tokentype::TextLiteral => "text literal",
                Tokentype::BoolLiteral => "boolean literal",
                Tokentype::Module => "'module'",
                Tokentype::Group => "'group'",
                Tokentype::Process => "'process'",
                Tokentype::State => "'state'",
                Tokentype::On => "'on'",
                Tokentype::Do => "'do'",
                Tokentype::Let => "'let'",
                Tokentype::Var => "'var'",
                Tokentype::Channel => "'channel'",
                Tokentype::Schedule => "'schedule'",
                Tokentype::Step => "'step'",
                Tokentype::Repeat => "'repeat'",
                Tokentype::If => "'if'",
                Tokentype::Else => "'else'",
                Tokentype::Send => "'send'",
                Tokentype::Receive => "'receive'",
                Tokentype::TrySend => "'try_send'",
                Tokentype::TryReceive => "'try_receive'",
                Tokentype::LeftParen => "'('",
                Tokentype::RightParen => "')'",
                Tokentype::LeftBrace => "'{'",
                Tokentype::RightBrace => "'}'",
                Tokentype::LeftBracket => "'['",
                Tokentype::RightBracket => "']'",
                Tokentype::Comma => "','",
                Tokentype::Colon => "':'",
                Tokentype::Semicolon => "';'",
                Tokentype::Dot => "'.'",
                Tokentype::Arrow => "'->'",
                Tokentype::Equal => "'='",
                Tokentype::At => "'@'",
                Tokentype::Question => "'?'",
                Tokentype::Plus => "'+'",
                Tokentype::Minus => "'-'",
                Tokentype::Star => "'*'",
                Tokentype::Slash => "'/'",
                Tokentype::EqualEqual => "'=='",
                Tokentype::NotEqual => "'!='",
                Tokentype::Less => "'<'",
                Tokentype::LessEqual => "'<='",
                Tokentype::Greater => "'>'",
                Tokentype::GreaterEqual => "'>='",
                Tokentype::AndAnd => "'&&'",
                Tokentype::OrOr => "'||'",
                Tokentype::Not => "'!'",
                Tokentype::Eof => "<EOF>",
            }
        )
    }
}

/// A single lexical token: its type, the exact source text it came from,
/// and its position.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: Tokentype,
    pub lexeme: String,
    pub pos: SourceLocation,
}

impl Token {
    pub fn new(token_type: Tokentype, lexeme: String, pos: SourceLocation) -> Token {
        Token {
            token_type,
            lexeme,
            pos,
        }
    }

    /// Looks up the keyword token type for an identifier-shaped lexeme, if
    /// any; `None` means the lexeme is a plain identifier.
    pub fn keyword_for(lexeme: &str) -> Option<Tokentype> {
        Some(match lexeme {
            "module" => Tokentype::Module,
            "group" => Tokentype::Group,
            "process" => Tokentype::Process,
            "state" => Tokentype::State,
            "on" => Tokentype::On,
            "do" => Tokentype::Do,
            "let" => Tokentype::Let,
            "var" => Tokentype::Var,
            "channel" => Tokentype::Channel,
            "schedule" => Tokentype::Schedule,
            "step" => Tokentype::Step,
            "repeat" => Tokentype::Repeat,
            "if" => Tokentype::If,
            "else" => Tokentype::Else,
            "send" => Tokentype::Send,
            "receive" => Tokentype::Receive,
            "try_send" => Tokentype::TrySend,
            "try_receive" => Tokentype::TryReceive,
            "true" | "false" => Tokentype::BoolLiteral,
            _ => return None,
        })
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.token_type, self.lexeme)
    }
}
