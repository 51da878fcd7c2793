//! Extracted record types.
//!
//! Everything the directive extractor produces lives here. Records are created
//! once during extraction, mutated only by the type resolver's embed expansion,
//! and read-only during assembly.

use std::collections::BTreeMap;

use serde::Serialize;

/// Target documents of a record. `None` means general: visible to every document.
pub type DocumentSet = Option<Vec<String>>;

/// Whether a record with `documents` belongs to `target`.
///
/// General records belong to every target; the caller decides whether a
/// document-specific record overrides them.
pub fn applies_to(documents: &DocumentSet, target: &str) -> bool {
    match documents {
        None => true,
        Some(names) => names.is_empty() || names.iter().any(|name| name == target),
    }
}

/// Whether a record is general (no target documents).
pub fn is_general(documents: &DocumentSet) -> bool {
    documents.as_ref().is_none_or(|names| names.is_empty())
}

/// Registry partition key: empty for general records, otherwise the sorted,
/// space-joined document names.
pub fn partition_key(documents: &DocumentSet) -> String {
    match documents {
        Some(names) if !names.is_empty() => {
            let mut names = names.clone();
            names.sort();
            names.dedup();
            names.join(" ")
        }
        _ => String::new(),
    }
}

/// Source unit a record was extracted from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    pub package: String,
    pub path: String,
    pub line: usize,
    /// Package-qualified name of the declaration the record came from.
    pub declaration: String,
}

// ============================================================
// Metadata
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    pub scopes: BTreeMap<String, String>,
}

/// Named security scheme, serialized in OpenAPI form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "apiKey")]
    ApiKey {
        #[serde(rename = "in")]
        location: String,
        name: String,
    },
    #[serde(rename = "http")]
    Http {
        scheme: String,
        #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
    },
    #[serde(rename = "oauth2")]
    OAuth2 { flows: BTreeMap<String, OAuthFlow> },
}

/// `name: [scopes]` entry of a security requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityRequirement {
    pub name: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataBlock {
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub terms_of_service: Option<String>,
    pub contact: Option<Contact>,
    pub license: Option<License>,
    pub external_docs: Option<ExternalDocs>,
    pub tags: Vec<TagDefinition>,
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    /// Document-wide default security requirements.
    pub security: Vec<SecurityRequirement>,
    pub servers: Vec<Server>,
    pub documents: DocumentSet,
    pub origin: Origin,
}

// ============================================================
// Types
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeKind {
    #[default]
    Record,
    Array,
    Map,
    PrimitiveAlias,
    Union,
}

/// Embedded member reference, expanded at `position` in the owner's field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRef {
    /// Type name as written, qualified with the owner's package.
    pub name: String,
    /// Index into the owner's declared fields where the embedded fields splice in.
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeRecord {
    pub name: String,
    pub kind: TypeKind,
    pub fields: Vec<FieldRecord>,
    /// Element type for arrays and maps, underlying type for primitive aliases.
    pub element: Option<String>,
    pub branches: Vec<String>,
    pub discriminator: Option<String>,
    pub embeds: Vec<EmbedRef>,
    /// Set by the type resolver once the embeds have been spliced in.
    pub embeds_resolved: bool,
    pub description: String,
    pub example: Option<String>,
    pub deprecated: bool,
    pub origin: Origin,
    pub documents: DocumentSet,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumRecord {
    pub name: String,
    /// Primitive the values are written in (`string`, `int`, ...).
    pub base: String,
    /// Constant name -> literal value.
    pub values: BTreeMap<String, String>,
    pub description: String,
    pub example: Option<String>,
    pub origin: Origin,
    pub documents: DocumentSet,
}

// ============================================================
// Fields
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFlags {
    pub array: bool,
    pub map: bool,
    pub nullable: bool,
    pub required: bool,
    pub explicit_required: bool,
    pub explicit_optional: bool,
    pub request_body: bool,
    pub inline_nested: bool,
    pub deprecated: bool,
    pub read_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Constraint {
    Pattern,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MinLength,
    MaxLength,
    MinItems,
    MaxItems,
    MultipleOf,
    Format,
    /// Lower bound on a named type; a minimum or a minimum length once the
    /// type's values are known.
    LowerBound,
    /// Upper counterpart of `LowerBound`.
    UpperBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Query,
    Path,
    Header,
    Cookie,
    Body,
}

impl ParamLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "query" => Some(Self::Query),
            "path" => Some(Self::Path),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            "body" | "formdata" => Some(Self::Body),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRecord {
    /// Output name (serialization tag wins over the declared name).
    pub name: String,
    /// Declared type name, package-qualified unless builtin. For arrays and
    /// maps this is the element type.
    pub type_name: String,
    pub flags: FieldFlags,
    pub constraints: BTreeMap<Constraint, String>,
    pub example: Option<String>,
    pub default: Option<String>,
    pub location: Option<ParamLocation>,
    /// Inline nested type when the field's type is declared in place.
    pub inline: Option<Box<TypeRecord>>,
    pub description: String,
}

// ============================================================
// Operations
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Parse method name (case insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "PUT" => Some(Self::Put),
            "POST" => Some(Self::Post),
            "DELETE" => Some(Self::Delete),
            "OPTIONS" => Some(Self::Options),
            "HEAD" => Some(Self::Head),
            "PATCH" => Some(Self::Patch),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseRecord {
    /// `None` for responses without a body.
    pub type_name: Option<String>,
    pub array: bool,
    pub map: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub method: HttpMethod,
    pub path: String,
    pub id: String,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub deprecated: bool,
    /// Status code (or `default`) -> response.
    pub responses: BTreeMap<String, ResponseRecord>,
    pub security: Vec<SecurityRequirement>,
    pub ignored_params: Vec<String>,
    pub extensions: BTreeMap<String, serde_json::Value>,
    pub documents: DocumentSet,
    pub origin: Origin,
}

/// Struct whose fields are the parameters of one or more operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    pub operations: Vec<String>,
    pub record: TypeRecord,
}
