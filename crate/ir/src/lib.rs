#[cfg(feature = "print-ast")] 
pub mod ast_printer;
pub mod ast;
pub mod visitor;
pub mod source_location;

pub use source_location::SourceLocation;
pub use visitor::Visitor;