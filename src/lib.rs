//! apiscribe - OpenAPI documents from annotated Go sources
//!
//! apiscribe reads `api:` directives from the doc comments of Go declarations
//! (routes, models, enums, parameter structs, package metadata), resolves
//! embedded and aliased types, and assembles one OpenAPI 3.0 document per
//! target document name.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (user-facing commands)
//! - `config`: Configuration file loading and parsing
//! - `core`: Extraction, resolution and assembly pipeline

pub mod cli;
pub mod config;
pub mod core;
