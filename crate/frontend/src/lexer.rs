use caps_error::{CompilerError, ErrorCode};
use caps_ir::SourceLocation;

use crate::token::{Token, Tokentype};

/// Lexer state for tracking position during tokenization.
struct LexerState<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    errors: Vec<CompilerError>,
}

impl<'a> LexerState<'a> {
    fn new(input: &'a str) -> Self {
        LexerState {
            chars: input.chars().peekable(),
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn here(&self) -> SourceLocation {
        SourceLocation::new(self.position, self.line, self.column)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn add_token(&mut self, token_type: Tokentype, lexeme: String, pos: SourceLocation) {
        self.tokens.push(Token::new(token_type, lexeme, pos));
    }

    fn error(&mut self, error_code: ErrorCode, message: impl Into<String>, pos: SourceLocation) {
        self.errors.push(CompilerError::new(error_code, message, pos.line, pos.column));
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_text_literal(&mut self) {
        let start = self.here();
        self.advance(); // opening quote
        let mut out = String::new();
        let mut terminated = false;
        while let Some(c) = self.peek() {
            if c == '"' {
                self.advance();
                terminated = true;
                break;
            }
            if c == '\n' {
                break;
            }
            if c == '\\' {
                self.advance();
                match self.peek() {
                    Some('n') => {
                        out.push('\n');
                        self.advance();
                    }
                    Some('t') => {
                        out.push('\t');
                        self.advance();
                    }
                    Some('\\') => {
                        out.push('\\');
                        self.advance();
                    }
                    Some('"') => {
                        out.push('"');
                        self.advance();
                    }
                    Some(other) => {
                        let pos = self.here();
                        self.error(
                            ErrorCode::InvalidEscapeSequence,
                            format!("invalid escape sequence '\\{other}'"),
                            pos,
                        );
                        out.push(other);
                        self.advance();
                    }
                    None => break,
                }
            } else {
                out.push(c);
                self.advance();
            }
        }
        if !terminated {
            self.error(ErrorCode::UnterminatedTextLiteral, "unterminated text literal", start);
        }
        self.add_token(Tokentype::TextLiteral, out, start);
    }

    fn lex_number(&mut self) {
        let start = self.here();
        let mut lexeme = String::new();
        let mut is_real = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            is_real = true;
            lexeme.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    lexeme.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let token_type = if is_real { Tokentype::RealLiteral } else { Tokentype::IntLiteral };
        self.add_token(token_type, lexeme, start);
    }

    fn lex_identifier_or_keyword(&mut self) {
        let start = self.here();
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let token_type = Token::keyword_for(&lexeme).unwrap_or(Tokentype::Identifier);
        self.add_token(token_type, lexeme, start);
    }

    fn lex_one(&mut self) {
        self.skip_whitespace_and_comments();
        let pos = self.here();
        let Some(c) = self.peek() else {
            self.add_token(Tokentype::Eof, String::new(), pos);
            return;
        };

        if c == '"' {
            return self.lex_text_literal();
        }
        if c.is_ascii_digit() {
            return self.lex_number();
        }
        if c.is_alphabetic() || c == '_' {
            return self.lex_identifier_or_keyword();
        }

        macro_rules! two_char {
            ($second:expr, $token:expr, $text:expr) => {
                if self.peek_second() == Some($second) {
                    self.advance();
                    self.advance();
                    self.add_token($token, $text.to_string(), pos);
                    return;
                }
            };
        }

        if c == '-' {
            two_char!('>', Tokentype::Arrow, "->");
        }
        if c == '=' {
            two_char!('=', Tokentype::EqualEqual, "==");
        }
        if c == '!' {
            two_char!('=', Tokentype::NotEqual, "!=");
        }
        if c == '<' {
            two_char!('=', Tokentype::LessEqual, "<=");
        }
        if c == '>' {
            two_char!('=', Tokentype::GreaterEqual, ">=");
        }
        if c == '&' {
            two_char!('&', Tokentype::AndAnd, "&&");
        }
        if c == '|' {
            two_char!('|', Tokentype::OrOr, "||");
        }

        let single = match c {
            '(' => Some(Tokentype::LeftParen),
            ')' => Some(Tokentype::RightParen),
            '{' => Some(Tokentype::LeftBrace),
            '}' => Some(Tokentype::RightBrace),
            '[' => Some(Tokentype::LeftBracket),
            ']' => Some(Tokentype::RightBracket),
            ',' => Some(Tokentype::Comma),
            ':' => Some(Tokentype::Colon),
            ';' => Some(Tokentype::Semicolon),
            '.' => Some(Tokentype::Dot),
            '=' => Some(Tokentype::Equal),
            '@' => Some(Tokentype::At),
            '?' => Some(Tokentype::Question),
            '+' => Some(Tokentype::Plus),
            '-' => Some(Tokentype::Minus),
            '*' => Some(Tokentype::Star),
            '/' => Some(Tokentype::Slash),
            '<' => Some(Tokentype::Less),
            '>' => Some(Tokentype::Greater),
            '!' => Some(Tokentype::Not),
            _ => None,
        };

        match single {
            Some(token_type) => {
                self.advance();
                self.add_token(token_type, c.to_string(), pos);
            }
            None => {
                self.error(ErrorCode::UnexpectedCharacter, format!("unexpected character '{c}'"), pos);
                self.advance();
            }
        }
    }

    fn finish(mut self) -> (Vec<Token>, Vec<CompilerError>) {
        loop {
            let was_eof = matches!(self.tokens.last(), Some(t) if t.token_type == Tokentype::Eof);
            if was_eof {
                break;
            }
            self.lex_one();
        }
        (self.tokens, self.errors)
    }
}

/// Tokenizes `source`, returning every token produced (errors are collected
/// alongside rather than aborting the scan, per §4.1's "never throws" rule).
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<CompilerError>) {
    LexerState::new(source).finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_types(source: &str) -> Vec<Tokentype> {
        tokenize(source).0.into_iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn tokenizes_keywords_and_identifiers() {
        let types = token_types("group Pipeline process Worker");
        assert_eq!(
            types,
            vec![
                Tokentype::Group,
                Tokentype::Identifier,
                Tokentype::Process,
                Tokentype::Identifier,
                Tokentype::Eof
            ]
        );
    }

    #[test]
    fn tokenizes_multi_char_operators() {
        let types = token_types("-> == != <= >= && ||");
        assert_eq!(
            types,
            vec![
                Tokentype::Arrow,
                Tokentype::EqualEqual,
                Tokentype::NotEqual,
                Tokentype::LessEqual,
                Tokentype::GreaterEqual,
                Tokentype::AndAnd,
                Tokentype::OrOr,
                Tokentype::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_real_vs_int_literals() {
        let types = token_types("42 3.14");
        assert_eq!(types, vec![Tokentype::IntLiteral, Tokentype::RealLiteral, Tokentype::Eof]);
    }

    #[test]
    fn handles_text_literal_escapes() {
        let (tokens, errors) = tokenize("\"a\\nb\\t\\\"c\\\"\"");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].lexeme, "a\nb\t\"c\"");
    }

    #[test]
    fn reports_unterminated_text_literal() {
        let (_, errors) = tokenize("\"unterminated");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_code, ErrorCode::UnterminatedTextLiteral);
    }

    #[test]
    fn skips_line_comments() {
        let types = token_types("// a comment\ngroup");
        assert_eq!(types, vec![Tokentype::Group, Tokentype::Eof]);
    }

    #[test]
    fn reports_unexpected_character() {
        let (_, errors) = tokenize("let x = $");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_code, ErrorCode::UnexpectedCharacter);
    }

    #[test]
    fn recognizes_true_false_as_bool_literals() {
        let types = token_types("true false");
        assert_eq!(types, vec![Tokentype::BoolLiteral, Tokentype::BoolLiteral, Tokentype::Eof]);
    }
}
