use crate::token::Token;

/// Prints one line per token in `tokens`, for the `--dump-tokens` CLI flag.
pub fn print_tokens(tokens: &[Token]) {
    for token in tokens {
        println!("{:>4}:{:<4} {}", token.pos.line, token.pos.column, token);
    }
}
