// src/document/diagnostics.rs

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("Warning"),
            Severity::Error => f.write_str("Error"),
            Severity::Fatal => f.write_str("Fatal Error"),
        }
    }
}

/// One syntax problem found while parsing the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDiagnostic {
    pub severity: Severity,
    /// 1-based.
    pub line: usize,
    /// 1-based, in bytes from the start of the line.
    pub column: usize,
    pub message: String,
    pub file: Option<PathBuf>,
    /// The offending source line, kept for display.
    pub source_line: String,
}

impl XmlDiagnostic {
    /// Builds a fatal diagnostic for a byte offset into the raw `source`.
    pub fn at_offset(
        source: &[u8],
        offset: usize,
        message: impl Into<String>,
        file: Option<PathBuf>,
    ) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|p| p + 1)
            .unwrap_or(0);
        let rest = &source[line_start..];
        let line_end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        let source_line = String::from_utf8_lossy(&rest[..line_end])
            .trim_end_matches('\r')
            .to_string();

        Self {
            severity: Severity::Fatal,
            line,
            column: offset - line_start + 1,
            message: message.into(),
            file,
            source_line,
        }
    }

    /// Human readable block: source line, a caret under the column, then the
    /// message and location.
    pub fn render_block(&self) -> String {
        let mut block = format!("{}\n", self.source_line);
        block.push_str(&"-".repeat(self.column));
        block.push_str("^\n");
        block.push_str(&format!(
            "{}: {}\n  Line: {}\n  Column: {}",
            self.severity,
            self.message.trim(),
            self.line,
            self.column
        ));
        if let Some(file) = &self.file {
            block.push_str(&format!("\n  File: {}", file.display()));
        }
        block.push_str("\n\n--------------------------------------------\n\n");
        block
    }
}

impl fmt::Display for XmlDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}: {}",
            self.severity, self.line, self.column, self.message
        )
    }
}
