//! Lexing, parsing, and semantic analysis for CAPS source files.
//!
//! This crate turns source text into a fully-checked [`caps_ir::ast::Program`]:
//! lexing and parsing collect diagnostics rather than aborting on the first
//! problem (§4.1/§7), and semantic analysis then walks the parsed tree to
//! populate every expression's inferred type and enforce the FSM/pipeline
//! rules of §4.5/§4.6.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod semantic_analysis;
pub mod token;
#[cfg(feature = "print-tokens")]
pub mod token_printer;

pub use lexer::tokenize;
pub use parser::parse;
pub use semantic_analysis::{analyze_program, build_topology, TopologyGraph};
pub use token::{Token, Tokentype};
#[cfg(feature = "print-tokens")]
pub use token_printer::print_tokens;
