//! Field extraction: struct tags merged with field-level directives.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::ExtractOptions;
use super::body::{DirectiveBody, Keyword};
use crate::core::model::{
    Constraint, EmbedRef, FieldFlags, FieldRecord, ParamLocation, TypeKind, TypeRecord,
};
use crate::core::source::{FieldDecl, TypeExpr, is_builtin_type, qualify};

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+):"((?:[^"\\]|\\.)*)""#).expect("Invalid regex"));

/// Parse a raw struct tag into `key -> value`.
pub fn parse_tag(tag: &str) -> BTreeMap<String, String> {
    TAG_REGEX
        .captures_iter(tag)
        .map(|cap| (cap[1].to_string(), cap[2].to_string()))
        .collect()
}

/// Result of extracting one field declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Field(FieldRecord),
    /// Embedded member, qualified type name.
    Embed(String),
    Skip,
}

/// Extract every field of a struct, recording embeds at their positions.
pub fn extract_fields(
    decls: &[FieldDecl],
    package: &str,
    options: &ExtractOptions,
) -> (Vec<FieldRecord>, Vec<EmbedRef>) {
    let mut fields = Vec::new();
    let mut embeds = Vec::new();
    for decl in decls {
        match extract_field(decl, package, options) {
            FieldOutcome::Field(field) => fields.push(field),
            FieldOutcome::Embed(name) => embeds.push(EmbedRef {
                name,
                position: fields.len(),
            }),
            FieldOutcome::Skip => {}
        }
    }
    (fields, embeds)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Text,
    Numeric,
    List,
    /// Declared type whose values are only known after resolution.
    Named,
}

fn value_kind(type_name: &str, flags: &FieldFlags) -> ValueKind {
    if flags.array {
        return ValueKind::List;
    }
    if !is_builtin_type(type_name) {
        return ValueKind::Named;
    }
    let numeric = type_name.starts_with("int")
        || type_name.starts_with("uint")
        || type_name.starts_with("float")
        || matches!(
            type_name,
            "byte" | "rune" | "time.Duration" | "json.Number" | "decimal.Decimal"
        );
    if numeric {
        ValueKind::Numeric
    } else {
        ValueKind::Text
    }
}

/// Declared type analysis: sets container flags and returns the element type.
fn analyze_type(
    ty: &TypeExpr,
    package: &str,
    options: &ExtractOptions,
    flags: &mut FieldFlags,
    top_level: bool,
) -> (String, Option<Box<TypeRecord>>) {
    match ty {
        TypeExpr::Pointer(inner) => {
            if top_level {
                flags.nullable = true;
            }
            analyze_type(inner, package, options, flags, top_level)
        }
        TypeExpr::Slice(inner) if inner.is_byte() => ("[]byte".to_string(), None),
        TypeExpr::Slice(inner) => {
            flags.array = true;
            analyze_type(inner, package, options, flags, false)
        }
        TypeExpr::Map { value, .. } => {
            flags.map = true;
            analyze_type(value, package, options, flags, false)
        }
        TypeExpr::Struct(decls) => {
            flags.inline_nested = true;
            let (fields, embeds) = extract_fields(decls, package, options);
            let record = TypeRecord {
                kind: TypeKind::Record,
                fields,
                embeds,
                ..Default::default()
            };
            ("object".to_string(), Some(Box::new(record)))
        }
        TypeExpr::Interface => ("any".to_string(), None),
        TypeExpr::Named(name) => (qualify(package, name), None),
    }
}

const LOCATION_TAGS: &[(&str, ParamLocation)] = &[
    ("uri", ParamLocation::Path),
    ("path", ParamLocation::Path),
    ("header", ParamLocation::Header),
    ("query", ParamLocation::Query),
    ("form", ParamLocation::Query),
    ("cookie", ParamLocation::Cookie),
];

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Extract one field declaration.
pub fn extract_field(decl: &FieldDecl, package: &str, options: &ExtractOptions) -> FieldOutcome {
    let tags = decl.tag.as_deref().map(parse_tag).unwrap_or_default();

    let (json_name, json_options) = match tags.get("json") {
        Some(value) => {
            let mut parts = value.split(',');
            let name = parts.next().unwrap_or_default().to_string();
            (name, parts.map(String::from).collect::<Vec<_>>())
        }
        None => (String::new(), Vec::new()),
    };
    let has_location_tag = LOCATION_TAGS.iter().any(|(tag, _)| tags.contains_key(*tag));
    if json_name == "-" && json_options.is_empty() && !has_location_tag {
        return FieldOutcome::Skip;
    }

    let Some(declared_name) = decl.name.as_deref() else {
        // Embedded member; a json name turns it into a regular field.
        if json_name.is_empty() {
            return match decl.ty.base_name() {
                Some(base) => FieldOutcome::Embed(qualify(package, base)),
                None => FieldOutcome::Skip,
            };
        }
        let name = decl
            .ty
            .base_name()
            .map(|b| b.rsplit('.').next().unwrap_or(b).to_string())
            .unwrap_or_default();
        return build_field(
            decl,
            &name,
            &json_name,
            &json_options,
            &tags,
            package,
            options,
        );
    };

    if !is_exported(declared_name) {
        return FieldOutcome::Skip;
    }
    build_field(
        decl,
        declared_name,
        &json_name,
        &json_options,
        &tags,
        package,
        options,
    )
}

fn build_field(
    decl: &FieldDecl,
    declared_name: &str,
    json_name: &str,
    json_options: &[String],
    tags: &BTreeMap<String, String>,
    package: &str,
    options: &ExtractOptions,
) -> FieldOutcome {
    let mut flags = FieldFlags::default();
    let (type_name, inline) = analyze_type(&decl.ty, package, options, &mut flags, true);
    let omitempty = json_options.iter().any(|o| o == "omitempty");

    let mut field = FieldRecord {
        name: declared_name.to_string(),
        type_name,
        inline,
        ..Default::default()
    };

    // Parameter location tags name the field too.
    for (tag, location) in LOCATION_TAGS {
        if let Some(value) = tags.get(*tag) {
            let name = value.split(',').next().unwrap_or_default();
            if !name.is_empty() && name != "-" {
                field.name = name.to_string();
                field.location = Some(*location);
                break;
            }
        }
    }
    if !json_name.is_empty() && json_name != "-" {
        field.name = json_name.to_string();
    }

    let mut tag_required = false;
    for key in ["binding", "validate"] {
        let Some(rules) = tags.get(key) else {
            continue;
        };
        for rule in rules.split(',') {
            tag_required |= apply_validation_rule(&mut field, &flags, rule.trim());
        }
    }
    if let Some(example) = tags.get("example") {
        field.example = Some(example.clone());
    }
    if let Some(format) = tags.get("format") {
        field.constraints.insert(Constraint::Format, format.clone());
    }
    if let Some(default) = tags.get("default") {
        field.default = Some(default.clone());
    }

    let body = DirectiveBody::parse(decl.doc.iter().map(String::as_str), &options.list_separator);
    apply_directives(&mut field, &body, &mut flags);

    field.flags = flags;
    field.flags.required = if flags.explicit_optional {
        false
    } else if flags.explicit_required || tag_required || field.location == Some(ParamLocation::Path)
    {
        true
    } else {
        options.required_by_default && !flags.nullable && !omitempty
    };

    FieldOutcome::Field(field)
}

/// Apply one `binding`/`validate` rule. Returns whether it marks the field required.
fn apply_validation_rule(field: &mut FieldRecord, flags: &FieldFlags, rule: &str) -> bool {
    let (name, arg) = rule.split_once('=').unwrap_or((rule, ""));
    let kind = value_kind(&field.type_name, flags);
    match (name, kind) {
        ("required", _) => return true,
        ("min" | "gte", ValueKind::Text) => set(field, Constraint::MinLength, arg),
        ("max" | "lte", ValueKind::Text) => set(field, Constraint::MaxLength, arg),
        ("min" | "gte", ValueKind::List) => set(field, Constraint::MinItems, arg),
        ("max" | "lte", ValueKind::List) => set(field, Constraint::MaxItems, arg),
        ("min" | "gte", ValueKind::Numeric) => set(field, Constraint::Minimum, arg),
        ("max" | "lte", ValueKind::Numeric) => set(field, Constraint::Maximum, arg),
        ("min" | "gte", ValueKind::Named) => set(field, Constraint::LowerBound, arg),
        ("max" | "lte", ValueKind::Named) => set(field, Constraint::UpperBound, arg),
        ("gt", ValueKind::Numeric | ValueKind::Named) => {
            set(field, Constraint::ExclusiveMinimum, arg)
        }
        ("lt", ValueKind::Numeric | ValueKind::Named) => {
            set(field, Constraint::ExclusiveMaximum, arg)
        }
        ("len", ValueKind::Text) => {
            set(field, Constraint::MinLength, arg);
            set(field, Constraint::MaxLength, arg);
        }
        ("len", ValueKind::Named) => {
            set(field, Constraint::LowerBound, arg);
            set(field, Constraint::UpperBound, arg);
        }
        ("len", ValueKind::List) => {
            set(field, Constraint::MinItems, arg);
            set(field, Constraint::MaxItems, arg);
        }
        ("email", _) => set(field, Constraint::Format, "email"),
        ("uuid" | "uuid4", _) => set(field, Constraint::Format, "uuid"),
        ("url" | "uri", _) => set(field, Constraint::Format, "uri"),
        ("datetime", _) => set(field, Constraint::Format, "date-time"),
        ("ipv4", _) => set(field, Constraint::Format, "ipv4"),
        ("ipv6", _) => set(field, Constraint::Format, "ipv6"),
        _ => {}
    }
    false
}

fn set(field: &mut FieldRecord, constraint: Constraint, value: &str) {
    if !value.is_empty() {
        field.constraints.insert(constraint, value.to_string());
    }
}

const CONSTRAINT_KEYWORDS: &[(Keyword, Constraint)] = &[
    (Keyword::Pattern, Constraint::Pattern),
    (Keyword::Minimum, Constraint::Minimum),
    (Keyword::Maximum, Constraint::Maximum),
    (Keyword::ExclusiveMinimum, Constraint::ExclusiveMinimum),
    (Keyword::ExclusiveMaximum, Constraint::ExclusiveMaximum),
    (Keyword::MinLength, Constraint::MinLength),
    (Keyword::MaxLength, Constraint::MaxLength),
    (Keyword::MinItems, Constraint::MinItems),
    (Keyword::MaxItems, Constraint::MaxItems),
    (Keyword::MultipleOf, Constraint::MultipleOf),
    (Keyword::Format, Constraint::Format),
];

fn apply_directives(field: &mut FieldRecord, body: &DirectiveBody, flags: &mut FieldFlags) {
    for (keyword, constraint) in CONSTRAINT_KEYWORDS {
        if let Some(value) = body.non_empty(*keyword) {
            field.constraints.insert(*constraint, value);
        }
    }
    if let Some(example) = body.non_empty(Keyword::Example) {
        field.example = Some(example);
    }
    if let Some(default) = body.non_empty(Keyword::Default) {
        field.default = Some(default);
    }
    match body.flag(Keyword::Required) {
        Some(true) => flags.explicit_required = true,
        Some(false) => flags.explicit_optional = true,
        None => {}
    }
    if let Some(nullable) = body.flag(Keyword::Nullable) {
        flags.nullable = nullable;
    }
    if body.flag(Keyword::Deprecated) == Some(true) {
        flags.deprecated = true;
    }
    if body.flag(Keyword::ReadOnly) == Some(true) {
        flags.read_only = true;
    }
    if let Some(location) = body.text(Keyword::In).and_then(ParamLocation::parse) {
        field.location = Some(location);
    }
    if field.location == Some(ParamLocation::Body) {
        flags.request_body = true;
    }
    field.description = body.description();
}
