use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::assemble::document::{
    MediaType, Operation, Parameter, RequestBody, Response, Schema, SecurityRequirementObject,
};
use crate::core::assemble::schema::SchemaBuilder;
use crate::core::directive::sections::status_text;
use crate::core::model::{
    FieldRecord, OperationRecord, ParamLocation, ResponseRecord, SecurityRequirement,
};
use crate::core::registry::Registry;

const DEFAULT_MEDIA_TYPE: &str = "application/json";

static PATH_PARAM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}/]+)\}").expect("Invalid regex"));

/// Parameter names in a path template, in order of appearance.
pub fn path_parameters(path: &str) -> Vec<String> {
    PATH_PARAM_REGEX
        .captures_iter(path)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Requirement objects for a list of `name: [scopes]` entries; each entry is
/// one alternative.
pub fn security_objects(requirements: &[SecurityRequirement]) -> Vec<SecurityRequirementObject> {
    requirements
        .iter()
        .map(|requirement| {
            BTreeMap::from([(requirement.name.clone(), requirement.scopes.clone())])
        })
        .collect()
}

fn media_types(declared: &[String]) -> Vec<String> {
    if declared.is_empty() {
        vec![DEFAULT_MEDIA_TYPE.to_string()]
    } else {
        declared.to_vec()
    }
}

fn content_for(media: &[String], schema: &Schema) -> BTreeMap<String, MediaType> {
    media
        .iter()
        .map(|name| {
            (
                name.clone(),
                MediaType {
                    schema: schema.clone(),
                },
            )
        })
        .collect()
}

/// Converts operation records for one document.
pub struct OperationConverter<'b, 'a> {
    registry: &'a Registry,
    schemas: &'b mut SchemaBuilder<'a>,
}

impl<'b, 'a> OperationConverter<'b, 'a> {
    pub fn new(registry: &'a Registry, schemas: &'b mut SchemaBuilder<'a>) -> Self {
        Self { registry, schemas }
    }

    pub fn convert(&mut self, record: &OperationRecord) -> Operation {
        let template_params = path_parameters(&record.path);
        let mut parameters: Vec<Parameter> = Vec::new();
        let mut seen: BTreeSet<(String, ParamLocation)> = BTreeSet::new();
        let mut body_fields: Vec<&FieldRecord> = Vec::new();

        let registry = self.registry;
        for set in registry.parameters_for(&record.id) {
            for field in &set.record.fields {
                if record
                    .ignored_params
                    .iter()
                    .any(|ignored| ignored.eq_ignore_ascii_case(&field.name))
                {
                    continue;
                }
                if field.flags.request_body || field.location == Some(ParamLocation::Body) {
                    body_fields.push(field);
                    continue;
                }
                let location = field.location.unwrap_or(if template_params.contains(&field.name) {
                    ParamLocation::Path
                } else {
                    ParamLocation::Query
                });
                if !seen.insert((field.name.clone(), location)) {
                    continue;
                }
                parameters.push(self.parameter(field, location));
            }
        }

        for name in &template_params {
            if seen.insert((name.clone(), ParamLocation::Path)) {
                parameters.push(Parameter {
                    name: name.clone(),
                    location: ParamLocation::Path,
                    description: None,
                    required: true,
                    deprecated: false,
                    schema: Schema::typed("string"),
                });
            }
        }

        let request_body = self.request_body(&body_fields, &media_types(&record.consumes));
        let produces = media_types(&record.produces);
        let mut responses: BTreeMap<String, Response> = record
            .responses
            .iter()
            .map(|(status, response)| (status.clone(), self.response(status, response, &produces)))
            .collect();
        if responses.is_empty() {
            responses.insert(
                "200".to_string(),
                Response {
                    description: status_text("200").to_string(),
                    content: BTreeMap::new(),
                },
            );
        }

        Operation {
            operation_id: record.id.clone(),
            tags: record.tags.clone(),
            summary: record.summary.clone(),
            description: record.description.clone(),
            parameters,
            request_body,
            responses,
            security: (!record.security.is_empty()).then(|| security_objects(&record.security)),
            deprecated: record.deprecated,
            extensions: record.extensions.clone(),
        }
    }

    fn parameter(&mut self, field: &FieldRecord, location: ParamLocation) -> Parameter {
        let description = field.description.trim();
        Parameter {
            name: field.name.clone(),
            location,
            description: (!description.is_empty()).then(|| description.to_string()),
            required: location == ParamLocation::Path || field.flags.required,
            deprecated: field.flags.deprecated,
            schema: self.schemas.bare_field_schema(field),
        }
    }

    fn request_body(&mut self, fields: &[&FieldRecord], media: &[String]) -> Option<RequestBody> {
        let (schema, required, description) = match fields {
            [] => return None,
            [field] => {
                let description = field.description.trim();
                (
                    self.schemas.bare_field_schema(field),
                    true,
                    (!description.is_empty()).then(|| description.to_string()),
                )
            }
            fields => {
                let mut object = Schema::typed("object");
                for field in fields {
                    if field.flags.required {
                        object.required.push(field.name.clone());
                    }
                    let property = self.schemas.field_schema(field);
                    object.properties.insert(field.name.clone(), property);
                }
                let required = !object.required.is_empty();
                (object, required, None)
            }
        };
        Some(RequestBody {
            description,
            required,
            content: content_for(media, &schema),
        })
    }

    fn response(&mut self, status: &str, record: &ResponseRecord, media: &[String]) -> Response {
        let description = record
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| status_text(status).to_string());
        let content = match record.type_name.as_deref() {
            Some(type_name) => {
                let mut schema = self.schemas.named_schema(type_name);
                if record.array {
                    schema = Schema::array_of(schema);
                }
                if record.map {
                    schema = Schema::map_of(schema);
                }
                content_for(media, &schema)
            }
            None => BTreeMap::new(),
        };
        Response {
            description,
            content,
        }
    }
}
