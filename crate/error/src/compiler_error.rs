use colored::Colorize;
use std::fmt;

use crate::error_codes::ErrorCode;

/// A single accumulated compile-time diagnostic.
///
/// Front-end stages never fail fast: they collect as many of these as
/// possible and only stop the pipeline once all accumulated `CompilerError`s
/// have been reported, per the "errors are accumulated, never thrown" rule.
#[derive(Debug, Clone)]
pub struct CompilerError {
    pub error_code: ErrorCode,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl CompilerError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            error_code,
            message: message.into(),
            line,
            column,
        }
    }

    pub fn format(&self) -> String {
        format!(
            "{} at line {}, column {}: {}",
            self.error_code, self.line, self.column, self.message
        )
    }

    /// Render with a pointer under the offending column, given the source
    /// text the error was raised against.
    pub fn report(&self, source: &str) {
        let line_info = LineInfo::new(source);
        let line_text = line_info.get_line_text(self.line).unwrap_or("<line not available>");

        eprintln!(
            "{} {}: {}",
            "error".red().bold(),
            self.error_code.to_string().bold(),
            self.message
        );
        eprintln!("  {} {}:{}", "-->".yellow(), self.line, self.column);

        let line_num_str = self.line.to_string();
        let indent = " ".repeat(line_num_str.len() + 1);
        let pipe = "|".yellow();

        eprintln!("{indent}{}", pipe);
        eprintln!("{} {} {}", line_num_str.yellow(), pipe, line_text);

        let marker = " ".repeat(self.column.saturating_sub(1)) + &"^".bold().red().to_string();
        eprintln!("{indent}{} {}", pipe, marker);
        eprintln!();
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

pub type CompileResult<T> = Result<T, Vec<CompilerError>>;

/// Splits source text into lines for diagnostic pointer rendering.
pub struct LineInfo<'a> {
    lines: Vec<&'a str>,
}

impl<'a> LineInfo<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
        }
    }

    /// Returns the 1-indexed line's text, if it exists.
    pub fn get_line_text(&self, line: usize) -> Option<&'a str> {
        line.checked_sub(1).and_then(|idx| self.lines.get(idx).copied())
    }
}

/// Reports a list of compiler errors to stderr, with source-pointer context.
pub fn report_errors(errors: &[CompilerError], source: &str) {
    for error in errors {
        error.report(source);
    }
    if !errors.is_empty() {
        let noun = if errors.len() == 1 { "error" } else { "errors" };
        eprintln!(
            "{}",
            format!("compilation failed with {} {}", errors.len(), noun).red()
        );
    }
}

/// Accumulates diagnostics across a compilation stage without aborting it.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<CompilerError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add_error(&mut self, error: CompilerError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn report_errors(&self, source: &str) {
        report_errors(&self.errors, source);
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn take_errors(&mut self) -> Vec<CompilerError> {
        std::mem::take(&mut self.errors)
    }

    /// Converts this collector into a [`CompileResult`], consuming `value` on
    /// success and the accumulated errors on failure.
    pub fn into_result<T>(mut self, value: T) -> CompileResult<T> {
        if self.has_errors() {
            Err(self.take_errors())
        } else {
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_starts_empty() {
        let collector = ErrorCollector::new();
        assert!(!collector.has_errors());
    }

    #[test]
    fn collector_accumulates_in_order() {
        let mut collector = ErrorCollector::new();
        collector.add_error(CompilerError::new(ErrorCode::UndefinedVariable, "x", 1, 1));
        collector.add_error(CompilerError::new(ErrorCode::TypeMismatch, "y", 2, 3));
        assert_eq!(collector.len(), 2);
        let errors = collector.take_errors();
        assert_eq!(errors[0].message, "x");
        assert_eq!(errors[1].message, "y");
    }

    #[test]
    fn into_result_ok_when_no_errors() {
        let collector = ErrorCollector::new();
        assert!(collector.into_result(42).is_ok());
    }

    #[test]
    fn into_result_err_when_errors_present() {
        let mut collector = ErrorCollector::new();
        collector.add_error(CompilerError::new(ErrorCode::GenericCompileError, "boom", 1, 1));
        assert!(collector.into_result(()).is_err());
    }

    #[test]
    fn line_info_is_one_indexed() {
        let info = LineInfo::new("first\nsecond\nthird");
        assert_eq!(info.get_line_text(1), Some("first"));
        assert_eq!(info.get_line_text(3), Some("third"));
        assert_eq!(info.get_line_text(0), None);
        assert_eq!(info.get_line_text(4), None);
    }
}
