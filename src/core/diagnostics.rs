//! Non-fatal problems found while extracting and resolving.
//!
//! These never abort a run; they are reported in verbose mode and make
//! `--strict` runs fail.

use std::fmt;

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// Malformed directive; the entity was dropped.
    StructuralParseError,
    /// Embedded or aliased type not found; the reference was dropped.
    ResolutionGap,
    /// Duplicate name; the later definition replaced the earlier one.
    RegistryConflict,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuralParseError => "parse-error",
            Self::ResolutionGap => "unresolved",
            Self::RegistryConflict => "conflict",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Diagnostic {
    pub unit: String,
    pub line: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        unit: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            line,
            kind,
            message: message.into(),
        }
    }

    /// Print as a colored `warning:` line on stderr.
    pub fn print(&self) {
        eprintln!(
            "{} {} {}",
            "warning:".bold().yellow(),
            self.message,
            format!("[{}]", self.kind.as_str()).dimmed()
        );
        if !self.unit.is_empty() {
            eprintln!("  {} {}:{}", "-->".blue(), self.unit, self.line);
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]",
            self.unit,
            self.line,
            self.message,
            self.kind.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::ResolutionGap,
            "api/user.go",
            12,
            "embedded type 'm.Base' not found",
        );
        assert_eq!(
            diagnostic.to_string(),
            "api/user.go:12: embedded type 'm.Base' not found [unresolved]"
        );
    }

    #[test]
    fn test_ordering_by_location() {
        let mut items = vec![
            Diagnostic::new(DiagnosticKind::RegistryConflict, "b.go", 1, "x"),
            Diagnostic::new(DiagnosticKind::StructuralParseError, "a.go", 9, "y"),
            Diagnostic::new(DiagnosticKind::StructuralParseError, "a.go", 2, "z"),
        ];
        items.sort();
        let order: Vec<(&str, usize)> = items.iter().map(|d| (d.unit.as_str(), d.line)).collect();
        assert_eq!(order, vec![("a.go", 2), ("a.go", 9), ("b.go", 1)]);
    }
}
