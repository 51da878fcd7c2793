//! Summary and diagnostic printing for the CLI.
//!
//! Separate from core logic so apiscribe can be used as a library.

use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;

use crate::core::diagnostics::Diagnostic;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

/// One written document.
#[derive(Debug, Clone)]
pub struct WrittenDocument {
    pub path: PathBuf,
    pub operation_count: usize,
    pub schema_count: usize,
}

#[derive(Debug, Default)]
pub struct GenerateSummary {
    pub documents: Vec<WrittenDocument>,
    pub units_scanned: usize,
    pub units_skipped: usize,
}

pub fn print_summary(summary: &GenerateSummary) {
    print_summary_to(summary, &mut io::stdout().lock());
}

pub fn print_summary_to<W: Write>(summary: &GenerateSummary, writer: &mut W) {
    let files = summary.units_scanned + summary.units_skipped;
    if summary.documents.is_empty() {
        let _ = writeln!(
            writer,
            "{} No operations found in {} source {}",
            "warning:".bold().yellow(),
            files,
            plural(files, "file", "files")
        );
        return;
    }

    let count = summary.documents.len();
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Generated {} {} from {} source {}",
            count,
            plural(count, "document", "documents"),
            files,
            plural(files, "file", "files")
        )
        .green()
    );
    for document in &summary.documents {
        let _ = writeln!(
            writer,
            "  {} {} ({} {}, {} {})",
            "-->".blue(),
            document.path.display(),
            document.operation_count,
            plural(document.operation_count, "operation", "operations"),
            document.schema_count,
            plural(document.schema_count, "schema", "schemas")
        );
    }
    if summary.units_skipped > 0 {
        let _ = writeln!(
            writer,
            "{} {} unchanged {} skipped",
            "note:".bold().cyan(),
            summary.units_skipped,
            plural(summary.units_skipped, "file", "files")
        );
    }
}

/// Print diagnostics to stderr: each one when verbose, otherwise a count.
pub fn print_diagnostics(diagnostics: &[Diagnostic], verbose: bool) {
    if verbose {
        for diagnostic in diagnostics {
            diagnostic.print();
        }
        return;
    }
    print_diagnostic_count_to(diagnostics.len(), &mut io::stderr().lock());
}

pub fn print_diagnostic_count_to<W: Write>(count: usize, writer: &mut W) {
    if count > 0 {
        let _ = writeln!(
            writer,
            "{} {} {} reported (use {} for details)",
            "warning:".bold().yellow(),
            count,
            plural(count, "diagnostic", "diagnostics"),
            "-v".cyan()
        );
    }
}
