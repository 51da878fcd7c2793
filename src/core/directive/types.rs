use super::ExtractOptions;
use super::body::{DirectiveBody, Keyword};
use super::field::extract_fields;
use crate::core::model::{EnumRecord, FieldRecord, Origin, ParameterSet, TypeKind, TypeRecord};
use crate::core::source::{Declaration, DeclarationKind, TypeExpr, qualify};

/// Element type name of a container; inline structs yield their fields instead.
fn element_of(
    ty: &TypeExpr,
    package: &str,
    options: &ExtractOptions,
) -> (Option<String>, Vec<FieldRecord>) {
    match ty {
        TypeExpr::Pointer(inner) => element_of(inner, package, options),
        TypeExpr::Named(name) => (Some(qualify(package, name)), Vec::new()),
        TypeExpr::Interface => (Some("any".to_string()), Vec::new()),
        TypeExpr::Struct(decls) => (None, extract_fields(decls, package, options).0),
        TypeExpr::Slice(inner) if inner.is_byte() => (Some("[]byte".to_string()), Vec::new()),
        // Nested containers collapse to their innermost element.
        TypeExpr::Slice(inner) => element_of(inner, package, options),
        TypeExpr::Map { value, .. } => element_of(value, package, options),
    }
}

fn apply_underlying(
    record: &mut TypeRecord,
    underlying: &TypeExpr,
    package: &str,
    options: &ExtractOptions,
) {
    match underlying {
        TypeExpr::Slice(inner) if !inner.is_byte() => {
            let (element, fields) = element_of(inner, package, options);
            record.kind = TypeKind::Array;
            record.element = element;
            record.fields = fields;
        }
        TypeExpr::Map { value, .. } => {
            let (element, fields) = element_of(value, package, options);
            record.kind = TypeKind::Map;
            record.element = element;
            record.fields = fields;
        }
        TypeExpr::Struct(decls) => {
            let (fields, embeds) = extract_fields(decls, package, options);
            record.kind = TypeKind::Record;
            record.fields = fields;
            record.embeds = embeds;
        }
        other => {
            let (element, _) = element_of(other, package, options);
            record.kind = TypeKind::PrimitiveAlias;
            record.element = element;
        }
    }
}

/// Build a `TypeRecord` from `api:model`.
///
/// Returns an error for declarations that cannot carry a schema.
pub fn parse_model(
    name: Option<&str>,
    decl: &Declaration,
    body: &DirectiveBody,
    package: &str,
    origin: Origin,
    options: &ExtractOptions,
) -> Result<TypeRecord, String> {
    let mut record = TypeRecord {
        name: name.unwrap_or(&decl.name).to_string(),
        description: body.description(),
        example: body.non_empty(Keyword::Example),
        deprecated: body.flag(Keyword::Deprecated).unwrap_or(false),
        documents: body.documents(),
        origin,
        ..Default::default()
    };

    match &decl.kind {
        DeclarationKind::Struct { fields } => {
            let (fields, embeds) = extract_fields(fields, package, options);
            record.kind = TypeKind::Record;
            record.fields = fields;
            record.embeds = embeds;
        }
        DeclarationKind::Interface => match body.list(Keyword::OneOf) {
            Some(branches) if !branches.is_empty() => {
                record.kind = TypeKind::Union;
                record.branches = branches.iter().map(|b| qualify(package, b)).collect();
                record.discriminator = body.non_empty(Keyword::Discriminator);
            }
            _ => record.kind = TypeKind::Record,
        },
        DeclarationKind::Named { underlying } | DeclarationKind::Alias { target: underlying } => {
            apply_underlying(&mut record, underlying, package, options);
        }
        DeclarationKind::Package | DeclarationKind::Const { .. } | DeclarationKind::Func => {
            return Err(format!("api:model on '{}' which is not a type", decl.name));
        }
    }
    Ok(record)
}

/// Build an `EnumRecord` from `api:enum`. Values from typed constants are
/// bound later by the resolver.
pub fn parse_enum(
    name: Option<&str>,
    decl: &Declaration,
    body: &DirectiveBody,
    origin: Origin,
) -> Result<EnumRecord, String> {
    let Some(underlying) = decl.kind.underlying() else {
        return Err(format!("api:enum on '{}' which is not a named type", decl.name));
    };
    let TypeExpr::Named(base) = underlying else {
        return Err(format!("api:enum on '{}' needs a primitive base type", decl.name));
    };

    let values = body
        .list(Keyword::Values)
        .unwrap_or_default()
        .iter()
        .map(|value| {
            let literal = value.trim_matches('"').to_string();
            (literal.clone(), literal)
        })
        .collect();

    Ok(EnumRecord {
        name: name.unwrap_or(&decl.name).to_string(),
        base: base.clone(),
        values,
        description: body.description(),
        example: body.non_empty(Keyword::Example),
        documents: body.documents(),
        origin,
    })
}

/// Build a `ParameterSet` from `api:parameters`.
pub fn parse_parameters(
    operations: &[String],
    decl: &Declaration,
    body: &DirectiveBody,
    package: &str,
    origin: Origin,
    options: &ExtractOptions,
) -> Result<ParameterSet, String> {
    if operations.is_empty() {
        return Err(format!("api:parameters on '{}' names no operation", decl.name));
    }
    let DeclarationKind::Struct { fields } = &decl.kind else {
        return Err(format!("api:parameters on '{}' which is not a struct", decl.name));
    };
    let (fields, embeds) = extract_fields(fields, package, options);
    Ok(ParameterSet {
        operations: operations.to_vec(),
        record: TypeRecord {
            name: decl.name.clone(),
            kind: TypeKind::Record,
            fields,
            embeds,
            description: body.description(),
            origin,
            ..Default::default()
        },
    })
}
