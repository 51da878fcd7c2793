//! Extraction and assembly engine.
//!
//! Stages, in data-flow order:
//!
//! - `source`: source loading and declaration scanning
//! - `directive` / `extract`: comment directives to registry records
//! - `registry`: the record store shared by every stage
//! - `resolve`: enum binding and embed expansion
//! - `assemble`: OpenAPI documents per target document
//! - `pipeline`: one end-to-end run, with `cache` and `writer` at its edges

pub mod assemble;
pub mod cache;
pub mod diagnostics;
pub mod directive;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod resolve;
pub mod source;
pub mod writer;
