//! The lexer and parser raise diagnostics through `caps_error`'s
//! accumulation types rather than a frontend-local duplicate, so tokenizer
//! and parser errors sit in the same numbered range as every other stage.
pub use caps_error::{CompileResult, CompilerError, ErrorCode, ErrorCollector};
