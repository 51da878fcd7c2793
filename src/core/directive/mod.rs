//! Directive extraction.
//!
//! A declaration's doc comment may carry one declaration directive:
//!
//! - `api:meta` on the package clause
//! - `api:route METHOD /path [tags...] operationId`
//! - `api:model [Name]`
//! - `api:enum [Name]`
//! - `api:parameters opId [opId...]`
//!
//! The remaining comment lines form the directive body (see [`body`]).
//!
//! ## Module Structure
//!
//! - `body`: keyword table, line classification, [`DirectiveValue`]
//! - `sections`: section sub-line micro-grammars (responses, security, servers)
//! - `field`: struct tag and field-level directive merging
//! - `route`, `meta`, `types`: per-directive record builders
//! - `extension`: vendor extension handler registry

pub mod body;
pub mod extension;
pub mod field;
mod meta;
mod route;
pub mod sections;
mod types;

pub use body::{DirectiveBody, DirectiveValue, Keyword};
pub use extension::{ExtensionHandler, ExtensionKind, ExtensionRegistry};
pub use field::{FieldOutcome, extract_field, extract_fields};
pub use meta::parse_meta;
pub use route::{derive_operation_id, parse_route};
pub use types::{parse_enum, parse_model, parse_parameters};

use crate::config::Config;

/// Options shared by every extraction step.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub list_separator: String,
    pub required_by_default: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            list_separator: ",".to_string(),
            required_by_default: false,
        }
    }
}

impl ExtractOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            list_separator: config.list_separator.clone(),
            required_by_default: config.required_by_default,
        }
    }
}

/// Declaration directive found in a comment block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveHeader {
    Meta,
    /// Everything after `api:route`.
    Route(String),
    Model(Option<String>),
    Enum(Option<String>),
    Parameters(Vec<String>),
}

impl DirectiveHeader {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Meta => "api:meta",
            Self::Route(_) => "api:route",
            Self::Model(_) => "api:model",
            Self::Enum(_) => "api:enum",
            Self::Parameters(_) => "api:parameters",
        }
    }
}

/// Case-insensitive prefix match followed by whitespace or end of line.
fn strip_directive_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &text[prefix.len()..])
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

fn optional_name(rest: &str) -> Option<String> {
    rest.split_whitespace().next().map(String::from)
}

/// Parse one normalized comment line as a declaration directive.
pub fn parse_header(line: &str) -> Option<DirectiveHeader> {
    let (_, line) = body::normalize_line(line);
    if strip_directive_prefix(line, "api:meta").is_some() {
        return Some(DirectiveHeader::Meta);
    }
    if let Some(rest) = strip_directive_prefix(line, "api:route") {
        return Some(DirectiveHeader::Route(rest.trim().to_string()));
    }
    if let Some(rest) = strip_directive_prefix(line, "api:model") {
        return Some(DirectiveHeader::Model(optional_name(rest)));
    }
    if let Some(rest) = strip_directive_prefix(line, "api:enum") {
        return Some(DirectiveHeader::Enum(optional_name(rest)));
    }
    if let Some(rest) = strip_directive_prefix(line, "api:parameters") {
        return Some(DirectiveHeader::Parameters(
            rest.split_whitespace().map(String::from).collect(),
        ));
    }
    None
}

/// Find the first declaration directive in `doc`.
///
/// Returns the header, the index of its line, and the body parsed from every
/// other line of the block.
pub fn find_directive(
    doc: &[String],
    separator: &str,
) -> Option<(DirectiveHeader, usize, DirectiveBody)> {
    let (index, header) = doc
        .iter()
        .enumerate()
        .find_map(|(idx, line)| parse_header(line).map(|header| (idx, header)))?;
    let lines = doc
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != index)
        .map(|(_, line)| line.as_str());
    Some((header, index, DirectiveBody::parse(lines, separator)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_header_variants() {
        assert_eq!(parse_header(" api:meta"), Some(DirectiveHeader::Meta));
        assert_eq!(
            parse_header(" API:Route GET /users users listUsers"),
            Some(DirectiveHeader::Route("GET /users users listUsers".to_string()))
        );
        assert_eq!(
            parse_header(" api:model"),
            Some(DirectiveHeader::Model(None))
        );
        assert_eq!(
            parse_header(" api:enum PetStatus"),
            Some(DirectiveHeader::Enum(Some("PetStatus".to_string())))
        );
        assert_eq!(
            parse_header(" api:parameters createUser updateUser"),
            Some(DirectiveHeader::Parameters(vec![
                "createUser".to_string(),
                "updateUser".to_string()
            ]))
        );
    }

    #[test]
    fn test_parse_header_requires_word_boundary() {
        assert_eq!(parse_header(" api:models"), None);
        assert_eq!(parse_header(" see api:model for details"), None);
    }

    #[test]
    fn test_find_directive_first_wins_and_body_excludes_header() {
        let lines = doc(&[
            " User is an account holder.",
            " api:model",
            " api:enum",
            " Example: {}",
        ]);
        let (header, index, body) = find_directive(&lines, ",").unwrap();
        assert_eq!(header, DirectiveHeader::Model(None));
        assert_eq!(index, 1);
        assert_eq!(
            body.free_text,
            vec!["User is an account holder.", "api:enum"]
        );
        assert_eq!(body.text(Keyword::Example), Some("{}"));
    }

    #[test]
    fn test_find_directive_none() {
        assert!(find_directive(&doc(&[" plain comment"]), ",").is_none());
    }
}
