//! Document Assembler.
//!
//! Builds one OpenAPI document per target document name from a resolved
//! registry. The assembler only reads the registry.

pub mod closure;
pub mod document;
pub mod metadata;
pub mod operation;
pub mod schema;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

pub use closure::reference_closure;
pub use document::{Components, Document, OPENAPI_VERSION, Schema};
pub use metadata::{info_from, merge_metadata};
pub use operation::{OperationConverter, security_objects};
pub use schema::SchemaBuilder;

use crate::core::registry::Registry;

#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub default_document: String,
    /// Keep only schemas reachable from the document's operations.
    pub clean_unused: bool,
    pub list_separator: String,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            default_document: "default".to_string(),
            clean_unused: true,
            list_separator: ",".to_string(),
        }
    }
}

/// Documents produced by one multi-document run.
#[derive(Debug, Default)]
pub struct AssemblyOutput {
    pub documents: BTreeMap<String, Document>,
    /// Type names emitted as free-form objects, across all documents.
    pub unresolved: BTreeSet<String>,
}

fn operation_references(operation: &document::Operation) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for parameter in &operation.parameters {
        names.extend(parameter.schema.references());
    }
    let bodies = operation
        .request_body
        .iter()
        .flat_map(|body| body.content.values());
    let responses = operation
        .responses
        .values()
        .flat_map(|response| response.content.values());
    for media in bodies.chain(responses) {
        names.extend(media.schema.references());
    }
    names
}

pub struct Assembler<'a> {
    registry: &'a Registry,
    options: &'a AssembleOptions,
}

impl<'a> Assembler<'a> {
    pub fn new(registry: &'a Registry, options: &'a AssembleOptions) -> Self {
        Self { registry, options }
    }

    /// Assemble the document named `target`.
    pub fn assemble_document(&self, target: &str) -> Result<Document> {
        Ok(self.build(target).0)
    }

    /// Assemble every document named by an operation, restricted to `only`
    /// when it is non-empty. Documents without operations are omitted.
    pub fn assemble_all(&self, only: &[String]) -> Result<AssemblyOutput> {
        let mut output = AssemblyOutput::default();
        for name in self.registry.document_names(&self.options.default_document) {
            if !only.is_empty() && !only.contains(&name) {
                continue;
            }
            let (document, unresolved) = self.build(&name);
            output.unresolved.extend(unresolved);
            if document.paths.is_empty() {
                continue;
            }
            output.documents.insert(name, document);
        }
        Ok(output)
    }

    fn build(&self, target: &str) -> (Document, BTreeSet<String>) {
        let registry = self.registry;
        let metadata = merge_metadata(
            registry.general_metadata(),
            registry.specific_metadata(target),
        );
        let mut schemas = SchemaBuilder::new(registry, target, &self.options.list_separator);

        let mut paths: BTreeMap<String, BTreeMap<String, document::Operation>> = BTreeMap::new();
        let mut referenced = BTreeSet::new();
        let mut converter = OperationConverter::new(registry, &mut schemas);
        let default_document = &self.options.default_document;
        for record in registry.all_operations_with_document(target, default_document) {
            let operation = converter.convert(record);
            referenced.extend(operation_references(&operation));
            paths
                .entry(record.path.clone())
                .or_default()
                .insert(record.method.as_str().to_string(), operation);
        }

        if !self.options.clean_unused {
            referenced.extend(
                registry
                    .all_types_with_document(target)
                    .into_iter()
                    .map(|record| record.name.clone()),
            );
            referenced.extend(
                registry
                    .all_enums_with_document(target)
                    .into_iter()
                    .map(|record| record.name.clone()),
            );
        }
        let components = reference_closure(&mut schemas, referenced);

        let document = Document {
            openapi: OPENAPI_VERSION.to_string(),
            info: info_from(&metadata),
            servers: metadata.servers,
            paths,
            components: Components {
                schemas: components,
                security_schemes: metadata.security_schemes,
            },
            security: security_objects(&metadata.security),
            tags: metadata.tags,
            external_docs: metadata.external_docs,
        };
        (document, schemas.unresolved().clone())
    }
}
