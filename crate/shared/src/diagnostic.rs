use caps_error::ErrorCode;
use caps_ir::SourceLocation;
use colored::Colorize;

/// Severity of a single diagnostic, per §4.1. Only `Error` affects the
/// exit code; `Warning` is reported but never fails compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error_code: ErrorCode,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn error(error_code: ErrorCode, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Error,
            error_code,
            message: message.into(),
            location,
        }
    }

    pub fn warning(error_code: ErrorCode, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Warning,
            error_code,
            message: message.into(),
            location,
        }
    }
}

/// Accumulates diagnostics across a compilation stage in emission order.
///
/// Diagnostics are never thrown: every stage that can fail takes a
/// `&mut DiagnosticEngine`, appends as many problems as it finds, and lets
/// the caller decide (via [`DiagnosticEngine::has_errors`]) whether to stop
/// the pipeline.
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl Default for DiagnosticEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            error_count: 0,
            warning_count: 0,
        }
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn emit_error(&mut self, error_code: ErrorCode, message: impl Into<String>, location: SourceLocation) {
        self.emit(Diagnostic::error(error_code, message, location));
    }

    pub fn emit_warning(&mut self, error_code: ErrorCode, message: impl Into<String>, location: SourceLocation) {
        self.emit(Diagnostic::warning(error_code, message, location));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Prints every accumulated diagnostic to stderr with a source pointer,
    /// then a one-line summary, in the style of `rustc`/`slang`.
    pub fn report_all(&self, source: &str) {
        let lines: Vec<&str> = source.lines().collect();
        for diagnostic in &self.diagnostics {
            let severity_str = match diagnostic.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
            };
            eprintln!(
                "{} {}: {}",
                severity_str,
                diagnostic.error_code.to_string().bold(),
                diagnostic.message
            );
            eprintln!(
                "  {} {}:{}",
                "-->".yellow(),
                diagnostic.location.line,
                diagnostic.location.column
            );

            let line_text = lines.get(diagnostic.location.line.saturating_sub(1)).copied();
            if let Some(line_text) = line_text {
                let line_num_str = diagnostic.location.line.to_string();
                let indent = " ".repeat(line_num_str.len() + 1);
                let pipe = "|".yellow();
                eprintln!("{indent}{}", pipe);
                eprintln!("{} {} {}", line_num_str.yellow(), pipe, line_text);
                let marker = " ".repeat(diagnostic.location.column.saturating_sub(1))
                    + &"^".bold().red().to_string();
                eprintln!("{indent}{} {}", pipe, marker);
            }
            eprintln!();
        }

        if self.error_count > 0 || self.warning_count > 0 {
            let mut parts = Vec::new();
            if self.error_count > 0 {
                let noun = if self.error_count == 1 { "error" } else { "errors" };
                parts.push(format!("{} {}", self.error_count, noun).red().to_string());
            }
            if self.warning_count > 0 {
                let noun = if self.warning_count == 1 { "warning" } else { "warnings" };
                parts.push(format!("{} {}", self.warning_count, noun).yellow().to_string());
            }
            eprintln!("compilation finished with {}", parts.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_errors_and_warnings_separately() {
        let mut engine = DiagnosticEngine::new();
        engine.emit_error(ErrorCode::TypeMismatch, "bad type", SourceLocation::default());
        engine.emit_warning(ErrorCode::GenericCompileError, "heads up", SourceLocation::default());
        assert_eq!(engine.error_count(), 1);
        assert_eq!(engine.warning_count(), 1);
        assert!(engine.has_errors());
    }

    #[test]
    fn no_errors_means_has_errors_is_false() {
        let engine = DiagnosticEngine::new();
        assert!(!engine.has_errors());
    }
}
