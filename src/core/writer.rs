use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::assemble::Document;

/// Output file name: `openapi.json` for the default document,
/// `openapi.<name>.json` for the others.
pub fn document_file_name(name: &str, default_document: &str) -> String {
    if name == default_document {
        "openapi.json".to_string()
    } else {
        format!("openapi.{}.json", name)
    }
}

pub fn render_document(document: &Document) -> Result<String> {
    let content = serde_json::to_string_pretty(document).context("Failed to serialize document")?;
    Ok(format!("{}\n", content))
}

/// Write every document under `output_dir`. Returns the written paths.
pub fn write_documents(
    output_dir: &Path,
    documents: &BTreeMap<String, Document>,
    default_document: &str,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(documents.len());
    for (name, document) in documents {
        let path = output_dir.join(document_file_name(name, default_document));
        let content = render_document(document)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
