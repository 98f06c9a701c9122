//! Checker output parsing.

use std::fmt;

/// A quality warning reported by the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Source file as reported by the checker.
    pub file: String,
    /// 1-based line, when known.
    pub line: Option<usize>,
    /// Warning text.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.file, line, self.message),
            None => write!(f, "{}: {}", self.file, self.message),
        }
    }
}

/// Parse `file:line:message` lines. Lines of any other shape are ignored.
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<Diagnostic> {
    let mut parts = line.splitn(3, ':');
    let file = parts.next()?.trim();
    let line_no = parts.next()?.trim().parse().ok()?;
    let message = parts.next()?.trim();

    if file.is_empty() || message.is_empty() {
        return None;
    }

    Some(Diagnostic {
        file: file.to_string(),
        line: Some(line_no),
        message: message.to_string(),
    })
}

/// Diagnostics for one checker run over `file`.
///
/// A run that fails without printing anything parseable yields a single
/// diagnostic carrying its raw output.
pub fn diagnostics_for(file: &str, success: bool, output: &str) -> Vec<Diagnostic> {
    let diagnostics = parse_diagnostics(output);
    if diagnostics.is_empty() && !success {
        let raw = output.trim();
        return vec![Diagnostic {
            file: file.to_string(),
            line: None,
            message: if raw.is_empty() {
                "checker failed without output".to_string()
            } else {
                raw.to_string()
            },
        }];
    }
    diagnostics
}
