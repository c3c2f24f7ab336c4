/// Exit the program with an appropriate exit code.
///
/// ### Arguments
/// * `code` - The exit code to use
///
/// ### Returns
/// This function does not return. It will terminate the program with the
/// specified exit code.
pub fn with_code(code: Code, message: &str) -> ! {
    if !message.is_empty() {
        eprintln!("{}", message);
    }
    std::process::exit(code as i32);
}

/// The CLI's exit-code contract (§6): success, a usage/IO error, or any
/// accumulated diagnostic error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Code {
    Success = 0,
    Usage = 1,
    DiagnosticError = 2,
}
