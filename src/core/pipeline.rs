//! One generation run: load, extract, resolve, assemble.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::core::assemble::{AssembleOptions, Assembler, Document};
use crate::core::cache::ChecksumCache;
use crate::core::diagnostics::{Diagnostic, DiagnosticKind};
use crate::core::directive::{ExtensionKind, ExtensionRegistry, ExtractOptions};
use crate::core::extract::Extractor;
use crate::core::registry::Registry;
use crate::core::resolve::TypeResolver;
use crate::core::source::{SourceLoader, UnitIndex};

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub extract: ExtractOptions,
    pub assemble: AssembleOptions,
    /// Documents to produce; empty means all.
    pub documents: Vec<String>,
    /// `None` disables the checksum cache.
    pub cache_file: Option<PathBuf>,
    pub extensions: BTreeMap<String, ExtensionKind>,
}

impl PipelineOptions {
    pub fn from_config(config: &Config, root: &Path) -> Self {
        Self {
            extract: ExtractOptions::from_config(config),
            assemble: AssembleOptions {
                default_document: config.default_document.clone(),
                clean_unused: config.clean_unused,
                list_separator: config.list_separator.clone(),
            },
            documents: config.documents.clone(),
            cache_file: config.cache.then(|| root.join(&config.cache_file)),
            extensions: config.extensions.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub documents: BTreeMap<String, Document>,
    pub units_scanned: usize,
    pub units_skipped: usize,
    /// Sorted, without duplicates.
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the full pipeline over the units `loader` finds under `root`.
///
/// Load and cache failures abort the run; everything found while extracting
/// or resolving ends up in `diagnostics`.
pub fn run_pipeline(
    loader: &dyn SourceLoader,
    root: &Path,
    options: &PipelineOptions,
) -> Result<PipelineOutput> {
    let units = loader.load(root)?;
    let mut cache = match &options.cache_file {
        Some(path) => Some(ChecksumCache::load(path)?),
        None => None,
    };

    let extensions = ExtensionRegistry::global();
    for (name, kind) in &options.extensions {
        extensions.register_kind(name, *kind);
    }

    let extractor = Extractor::new(&options.extract, extensions);
    let mut registry = Registry::new();
    let mut output = PipelineOutput::default();
    for unit in &units {
        let cached = !unit.checksum.is_empty();
        if cached
            && let Some(cache) = &cache
            && cache.can_skip(&unit.path, &unit.checksum)
        {
            output.units_skipped += 1;
            continue;
        }
        let entities = extractor.extract_unit(unit, &mut registry);
        output.units_scanned += 1;
        if cached && let Some(cache) = cache.as_mut() {
            cache.record_entities(
                &unit.path,
                &unit.checksum,
                entities.type_names,
                entities.operation_names,
            );
        }
    }

    if let Some(cache) = cache.as_mut() {
        let present: BTreeSet<&str> = units.iter().map(|unit| unit.path.as_str()).collect();
        cache.retain_units(|path| present.contains(path));
        cache.save()?;
    }

    let index = UnitIndex::new(&units);
    TypeResolver::new(&index, &options.extract).run(&mut registry);

    let assembled = Assembler::new(&registry, &options.assemble).assemble_all(&options.documents)?;

    let mut diagnostics = registry.diagnostics().to_vec();
    diagnostics.extend(assembled.unresolved.iter().map(|name| {
        Diagnostic::new(
            DiagnosticKind::ResolutionGap,
            "",
            0,
            format!("type '{}' not found; emitted as a free-form object", name),
        )
    }));
    diagnostics.sort();
    diagnostics.dedup();

    output.documents = assembled.documents;
    output.diagnostics = diagnostics;
    Ok(output)
}
