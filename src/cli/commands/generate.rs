use std::path::PathBuf;

use anyhow::Result;

use super::super::args::GenerateCommand;
use super::super::exit_status::ExitStatus;
use super::super::report::{GenerateSummary, WrittenDocument, print_diagnostics, print_summary};
use crate::config::{Config, load_config};
use crate::core::pipeline::{PipelineOptions, run_pipeline};
use crate::core::source::FsSourceLoader;
use crate::core::writer::write_documents;

/// Apply command-line overrides on top of the loaded config (CLI > file > defaults).
fn apply_overrides(config: &mut Config, cmd: &GenerateCommand) {
    if !cmd.documents.is_empty() {
        config.documents = cmd.documents.clone();
    }
    if let Some(name) = &cmd.default_document {
        config.default_document = name.clone();
    }
    if cmd.no_clean {
        config.clean_unused = false;
    }
    if cmd.no_cache {
        config.cache = false;
    }
}

pub fn generate(cmd: GenerateCommand) -> Result<ExitStatus> {
    let verbose = cmd.common.verbose;
    let start_dir = cmd
        .common
        .source_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = load_config(&start_dir)?.config;
    apply_overrides(&mut config, &cmd);
    config.validate()?;

    let root = cmd
        .common
        .source_root
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.source_root));
    let output_dir = cmd
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output_dir));

    let loader = FsSourceLoader::from_config(&config, verbose);
    let options = PipelineOptions::from_config(&config, &root);
    let output = run_pipeline(&loader, &root, &options)?;

    let written = write_documents(&output_dir, &output.documents, &config.default_document)?;
    let summary = GenerateSummary {
        documents: output
            .documents
            .values()
            .zip(written)
            .map(|(document, path)| WrittenDocument {
                path,
                operation_count: document.operation_count(),
                schema_count: document.components.schemas.len(),
            })
            .collect(),
        units_scanned: output.units_scanned,
        units_skipped: output.units_skipped,
    };

    print_diagnostics(&output.diagnostics, verbose);
    print_summary(&summary);

    if summary.documents.is_empty() || (cmd.strict && !output.diagnostics.is_empty()) {
        return Ok(ExitStatus::Failure);
    }
    Ok(ExitStatus::Success)
}
