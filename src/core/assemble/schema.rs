//! Registry records to OpenAPI schemas, as seen from one target document.
//!
//! A named type settles to a primitive, an enum or a registry type visible to
//! the document, either as declared or through its alias chain. Names that
//! never settle become free-form objects and are remembered as unresolved.

use std::collections::{BTreeSet, HashSet};

use serde_json::{Number, Value};

use crate::core::assemble::document::{Discriminator, Schema};
use crate::core::model::{Constraint, EnumRecord, FieldRecord, TypeKind, TypeRecord};
use crate::core::registry::Registry;
use crate::core::resolve::resolve_alias;

/// Schema for a builtin or well-known library type.
pub fn primitive_schema(type_name: &str) -> Option<Schema> {
    let schema = match type_name {
        "string" | "error" | "decimal.Decimal" => Schema::typed("string"),
        "bool" => Schema::typed("boolean"),
        "int" | "uint" | "uintptr" => Schema::typed("integer"),
        "int8" | "int16" | "int32" | "uint8" | "uint16" | "uint32" | "byte" | "rune" => {
            Schema::typed_with_format("integer", "int32")
        }
        "int64" | "uint64" | "time.Duration" => Schema::typed_with_format("integer", "int64"),
        "float32" => Schema::typed_with_format("number", "float"),
        "float64" => Schema::typed_with_format("number", "double"),
        "json.Number" => Schema::typed("number"),
        "time.Time" => Schema::typed_with_format("string", "date-time"),
        "[]byte" => Schema::typed_with_format("string", "byte"),
        "uuid.UUID" => Schema::typed_with_format("string", "uuid"),
        "any" | "interface{}" | "json.RawMessage" => Schema::default(),
        _ => return None,
    };
    Some(schema)
}

/// What a type name settles to for one document.
enum Resolved<'r> {
    Primitive(Schema),
    Enum(&'r EnumRecord),
    Type(&'r TypeRecord),
    Unknown,
}

/// Convert a literal to a JSON value of the given OpenAPI type.
pub fn typed_value(raw: &str, schema_type: Option<&str>) -> Value {
    let raw = raw.trim();
    let parsed = match schema_type {
        Some("integer") => raw.parse::<i64>().ok().map(Value::from),
        Some("number") => number_value(raw),
        Some("boolean") => raw.parse::<bool>().ok().map(Value::Bool),
        Some("string") => None,
        _ => serde_json::from_str(raw).ok(),
    };
    parsed.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Integer if it fits, else a float.
pub fn number_value(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::from(int));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Apply decorations to `schema`, moving a `$ref` under `allOf` if anything
/// ends up next to it.
fn decorate(schema: Schema, apply: impl FnOnce(&mut Schema)) -> Schema {
    if !schema.is_reference() {
        let mut schema = schema;
        apply(&mut schema);
        return schema;
    }
    let mut wrapped = schema.wrap_reference();
    apply(&mut wrapped);
    let bare = Schema {
        all_of: wrapped.all_of.clone(),
        ..Default::default()
    };
    if wrapped == bare {
        wrapped.all_of.remove(0)
    } else {
        wrapped
    }
}

pub struct SchemaBuilder<'a> {
    registry: &'a Registry,
    document: &'a str,
    list_separator: &'a str,
    unresolved: BTreeSet<String>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(registry: &'a Registry, document: &'a str, list_separator: &'a str) -> Self {
        Self {
            registry,
            document,
            list_separator,
            unresolved: BTreeSet::new(),
        }
    }

    /// Type names that resolved to nothing and were emitted as free-form objects.
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    /// Settle `type_name` as declared, then as an enum reached through its
    /// aliases, then at the end of its alias chain.
    fn classify(&self, type_name: &str) -> Resolved<'a> {
        let registry = self.registry;
        if let Some(resolved) = self.settle(type_name) {
            return resolved;
        }
        if let Some(record) = registry
            .find_enum_for_type(type_name)
            .and_then(|found| registry.get_enum_for_document(&found.name, self.document))
        {
            return Resolved::Enum(record);
        }
        let target = resolve_alias(registry, type_name);
        self.settle(&target).unwrap_or(Resolved::Unknown)
    }

    fn settle(&self, name: &str) -> Option<Resolved<'a>> {
        let registry = self.registry;
        if let Some(schema) = primitive_schema(name) {
            return Some(Resolved::Primitive(schema));
        }
        if let Some(record) = registry.get_enum_for_document(name, self.document) {
            return Some(Resolved::Enum(record));
        }
        registry
            .get_type_for_document(name, self.document)
            .map(Resolved::Type)
    }

    /// Schema for a reference to `type_name`: a primitive inline, a `$ref` to a
    /// component, or a free-form object.
    pub fn named_schema(&mut self, type_name: &str) -> Schema {
        match self.classify(type_name) {
            Resolved::Primitive(schema) => schema,
            Resolved::Enum(record) => Schema::reference(&record.name),
            Resolved::Type(record) => Schema::reference(&record.name),
            Resolved::Unknown => {
                self.unresolved.insert(type_name.to_string());
                Schema::typed("object")
            }
        }
    }

    /// OpenAPI type of the values a named type carries, looking through enums.
    fn value_type(&self, type_name: &str) -> Option<String> {
        match self.classify(type_name) {
            Resolved::Primitive(schema) => schema.schema_type,
            Resolved::Enum(record) => primitive_schema(&record.base)
                .and_then(|schema| schema.schema_type)
                .or_else(|| Some("string".to_string())),
            Resolved::Type(record) if record.kind == TypeKind::PrimitiveAlias => record
                .element
                .as_deref()
                .and_then(primitive_schema)
                .and_then(|schema| schema.schema_type),
            _ => None,
        }
    }

    /// Example or default literal of a field, typed after the field's values.
    fn field_value(&self, field: &FieldRecord, raw: &str) -> Value {
        let value_type = self.value_type(&field.type_name);
        if !field.flags.array {
            return typed_value(raw, value_type.as_deref());
        }
        let trimmed = raw.trim();
        if trimmed.starts_with('[')
            && let Ok(value) = serde_json::from_str::<Value>(trimmed)
        {
            return value;
        }
        Value::Array(
            trimmed
                .split(self.list_separator)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| typed_value(item, value_type.as_deref()))
                .collect(),
        )
    }

    /// Full schema of a field: element, then array and map wrapping, then the
    /// field's own decorations.
    pub fn field_schema(&mut self, field: &FieldRecord) -> Schema {
        let mut schema = self.bare_field_schema(field);
        let description = field.description.trim();
        if !description.is_empty() {
            schema = decorate(schema, |s| s.description = Some(description.to_string()));
        }
        schema
    }

    /// Field schema without its description, for parameters that carry it themselves.
    pub fn bare_field_schema(&mut self, field: &FieldRecord) -> Schema {
        let element = match field.inline.as_deref() {
            Some(inline) => self.record_schema(inline),
            None => self.named_schema(&field.type_name),
        };
        let value_type = self.value_type(&field.type_name);
        let element = decorate(element, |s| {
            apply_value_constraints(s, field, value_type.as_deref())
        });

        let mut schema = if field.flags.array {
            let mut array = Schema::array_of(element);
            apply_item_constraints(&mut array, field);
            array
        } else {
            element
        };
        if field.flags.map {
            schema = Schema::map_of(schema);
        }

        let example = field.example.as_deref().map(|v| self.field_value(field, v));
        let default = field.default.as_deref().map(|v| self.field_value(field, v));
        let flags = field.flags;
        decorate(schema, |s| {
            s.nullable |= flags.nullable;
            s.read_only |= flags.read_only;
            s.deprecated |= flags.deprecated;
            if example.is_some() {
                s.example = example;
            }
            if default.is_some() {
                s.default = default;
            }
        })
    }

    /// Schema of a type record's body.
    pub fn record_schema(&mut self, record: &TypeRecord) -> Schema {
        let mut schema = match record.kind {
            TypeKind::Record => {
                let mut object = Schema::typed("object");
                for field in &record.fields {
                    let property = self.field_schema(field);
                    if field.flags.required && !object.required.contains(&field.name) {
                        object.required.push(field.name.clone());
                    }
                    object.properties.insert(field.name.clone(), property);
                }
                object
            }
            TypeKind::Array => {
                let items = self.element_schema(record);
                Schema::array_of(items)
            }
            TypeKind::Map => {
                let values = self.element_schema(record);
                Schema::map_of(values)
            }
            TypeKind::PrimitiveAlias => self.element_schema(record),
            TypeKind::Union => Schema {
                one_of: record
                    .branches
                    .iter()
                    .map(|branch| self.named_schema(branch))
                    .collect(),
                discriminator: record.discriminator.as_ref().map(|property| Discriminator {
                    property_name: property.clone(),
                }),
                ..Default::default()
            },
        };

        let description = record.description.trim();
        let example = record
            .example
            .as_deref()
            .map(|raw| typed_value(raw, schema.schema_type.as_deref()));
        schema = decorate(schema, |s| {
            if !description.is_empty() {
                s.description = Some(description.to_string());
            }
            s.deprecated |= record.deprecated;
            if example.is_some() {
                s.example = example;
            }
        });
        schema
    }

    fn element_schema(&mut self, record: &TypeRecord) -> Schema {
        match record.element.as_deref() {
            Some(element) => self.named_schema(element),
            None => Schema::default(),
        }
    }

    /// Enum component: base type plus its distinct values in constant-name order.
    pub fn enum_schema(&self, record: &EnumRecord) -> Schema {
        let mut schema = primitive_schema(&record.base).unwrap_or_else(|| Schema::typed("string"));
        let schema_type = schema.schema_type.clone();

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for (constant, literal) in &record.values {
            if !seen.insert(literal.as_str()) {
                continue;
            }
            schema
                .enum_values
                .push(typed_value(literal, schema_type.as_deref()));
            names.push((constant.clone(), literal.as_str()));
        }
        if names.iter().any(|(constant, literal)| constant != literal) {
            schema.enum_varnames = names.into_iter().map(|(constant, _)| constant).collect();
        }

        let description = record.description.trim();
        if !description.is_empty() {
            schema.description = Some(description.to_string());
        }
        schema.example = record
            .example
            .as_deref()
            .map(|raw| typed_value(raw, schema_type.as_deref()));
        schema
    }

    /// Component schema for a registry name, as visible to the document.
    pub fn component(&mut self, name: &str) -> Option<Schema> {
        let registry = self.registry;
        if let Some(record) = registry.get_enum_for_document(name, self.document) {
            return Some(self.enum_schema(record));
        }
        let record = registry.get_type_for_document(name, self.document)?;
        Some(self.record_schema(record))
    }
}

fn apply_value_constraints(schema: &mut Schema, field: &FieldRecord, value_type: Option<&str>) {
    for (constraint, raw) in &field.constraints {
        match constraint {
            Constraint::Pattern => schema.pattern = Some(raw.clone()),
            Constraint::Format => schema.format = Some(raw.clone()),
            Constraint::Minimum => schema.minimum = number_value(raw),
            Constraint::Maximum => schema.maximum = number_value(raw),
            Constraint::ExclusiveMinimum => {
                schema.minimum = number_value(raw);
                schema.exclusive_minimum = schema.minimum.is_some();
            }
            Constraint::ExclusiveMaximum => {
                schema.maximum = number_value(raw);
                schema.exclusive_maximum = schema.maximum.is_some();
            }
            Constraint::MinLength => schema.min_length = raw.trim().parse().ok(),
            Constraint::MaxLength => schema.max_length = raw.trim().parse().ok(),
            Constraint::MultipleOf => schema.multiple_of = number_value(raw),
            Constraint::LowerBound => match value_type {
                Some("integer" | "number") => schema.minimum = number_value(raw),
                Some("string") => schema.min_length = raw.trim().parse().ok(),
                _ => {}
            },
            Constraint::UpperBound => match value_type {
                Some("integer" | "number") => schema.maximum = number_value(raw),
                Some("string") => schema.max_length = raw.trim().parse().ok(),
                _ => {}
            },
            Constraint::MinItems | Constraint::MaxItems => {}
        }
    }
}

fn apply_item_constraints(schema: &mut Schema, field: &FieldRecord) {
    if let Some(raw) = field.constraints.get(&Constraint::MinItems) {
        schema.min_items = raw.trim().parse().ok();
    }
    if let Some(raw) = field.constraints.get(&Constraint::MaxItems) {
        schema.max_items = raw.trim().parse().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{FieldFlags, Origin};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn field(name: &str, type_name: &str) -> FieldRecord {
        FieldRecord {
            name: name.to_string(),
            type_name: type_name.to_string(),
            ..Default::default()
        }
    }

    fn object(name: &str, fields: Vec<FieldRecord>) -> TypeRecord {
        TypeRecord {
            name: name.to_string(),
            fields,
            origin: Origin {
                declaration: format!("model.{}", name),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn to_json(schema: &Schema) -> Value {
        serde_json::to_value(schema).unwrap()
    }

    #[test]
    fn test_primitive_mapping() {
        assert_eq!(
            primitive_schema("int64"),
            Some(Schema::typed_with_format("integer", "int64"))
        );
        assert_eq!(
            primitive_schema("time.Time"),
            Some(Schema::typed_with_format("string", "date-time"))
        );
        assert_eq!(
            primitive_schema("[]byte"),
            Some(Schema::typed_with_format("string", "byte"))
        );
        assert_eq!(primitive_schema("any"), Some(Schema::default()));
        assert_eq!(primitive_schema("model.User"), None);
    }

    #[test]
    fn test_typed_value() {
        assert_eq!(typed_value("42", Some("integer")), json!(42));
        assert_eq!(typed_value("1.5", Some("number")), json!(1.5));
        assert_eq!(typed_value("true", Some("boolean")), json!(true));
        assert_eq!(typed_value("42", Some("string")), json!("42"));
        assert_eq!(typed_value("abc", Some("integer")), json!("abc"));
        assert_eq!(typed_value(r#"{"a":1}"#, None), json!({"a": 1}));
    }

    #[test]
    fn test_record_schema_with_required_and_refs() {
        let mut registry = Registry::new();
        let mut id = field("id", "int64");
        id.flags.required = true;
        let mut address = field("address", "model.Address");
        address.flags.nullable = true;
        let mut tags = field("tags", "string");
        tags.flags.array = true;
        tags.example = Some("a,b".to_string());
        registry.put_type(object("User", vec![id, address, tags]));
        registry.put_type(object("Address", vec![field("city", "string")]));

        let mut builder = SchemaBuilder::new(&registry, "default", ",");
        let schema = builder.component("User").unwrap();

        assert_eq!(
            to_json(&schema),
            json!({
                "type": "object",
                "properties": {
                    "address": {
                        "allOf": [{"$ref": "#/components/schemas/Address"}],
                        "nullable": true
                    },
                    "id": {"type": "integer", "format": "int64"},
                    "tags": {"type": "array", "items": {"type": "string"}, "example": ["a", "b"]}
                },
                "required": ["id"]
            })
        );
        assert!(builder.unresolved().is_empty());
    }

    #[test]
    fn test_constraints_split_between_array_and_items() {
        let registry = Registry::new();
        let mut codes = field("codes", "string");
        codes.flags.array = true;
        codes.constraints = BTreeMap::from([
            (Constraint::MinItems, "1".to_string()),
            (Constraint::MaxLength, "8".to_string()),
            (Constraint::Pattern, "^[A-Z]+$".to_string()),
        ]);
        let mut builder = SchemaBuilder::new(&registry, "default", ",");
        assert_eq!(
            to_json(&builder.field_schema(&codes)),
            json!({
                "type": "array",
                "items": {"type": "string", "pattern": "^[A-Z]+$", "maxLength": 8},
                "minItems": 1
            })
        );
    }

    #[test]
    fn test_bounds_follow_resolved_value_type() {
        let mut registry = Registry::new();
        registry.put_enum(EnumRecord {
            name: "Priority".to_string(),
            base: "int".to_string(),
            values: BTreeMap::from([("Low".to_string(), "1".to_string())]),
            ..Default::default()
        });
        registry.put_alias("model.Code", "string", Origin::default());
        let bounded = |name: &str, type_name: &str| FieldRecord {
            constraints: BTreeMap::from([
                (Constraint::LowerBound, "1".to_string()),
                (Constraint::UpperBound, "5".to_string()),
            ]),
            ..field(name, type_name)
        };
        let mut builder = SchemaBuilder::new(&registry, "default", ",");

        assert_eq!(
            to_json(&builder.field_schema(&bounded("priority", "model.Priority"))),
            json!({
                "allOf": [{"$ref": "#/components/schemas/Priority"}],
                "minimum": 1,
                "maximum": 5
            })
        );
        assert_eq!(
            to_json(&builder.field_schema(&bounded("code", "model.Code"))),
            json!({"type": "string", "minLength": 1, "maxLength": 5})
        );
    }

    #[test]
    fn test_map_of_arrays() {
        let registry = Registry::new();
        let mut index = field("index", "int");
        index.flags.array = true;
        index.flags.map = true;
        let mut builder = SchemaBuilder::new(&registry, "default", ",");
        assert_eq!(
            to_json(&builder.field_schema(&index)),
            json!({
                "type": "object",
                "additionalProperties": {"type": "array", "items": {"type": "integer"}}
            })
        );
    }

    #[test]
    fn test_alias_chain_to_primitive_and_unknown() {
        let mut registry = Registry::new();
        registry.put_alias("model.Amount", "model.Cents", Origin::default());
        registry.put_alias("model.Cents", "int64", Origin::default());
        let mut builder = SchemaBuilder::new(&registry, "default", ",");

        assert_eq!(
            builder.named_schema("model.Amount"),
            Schema::typed_with_format("integer", "int64")
        );
        assert_eq!(builder.named_schema("other.Thing"), Schema::typed("object"));
        assert_eq!(
            builder.unresolved().iter().cloned().collect::<Vec<_>>(),
            vec!["other.Thing"]
        );
    }

    #[test]
    fn test_cyclic_alias_field_terminates() {
        let mut registry = Registry::new();
        registry.put_alias("m.A", "m.B", Origin::default());
        registry.put_alias("m.B", "m.A", Origin::default());
        registry.put_type(object("Holder", vec![field("loop", "m.A")]));
        let mut builder = SchemaBuilder::new(&registry, "default", ",");

        let schema = builder.component("Holder").unwrap();
        assert_eq!(
            to_json(&schema),
            json!({"type": "object", "properties": {"loop": {"type": "object"}}})
        );
        assert_eq!(
            builder.unresolved().iter().cloned().collect::<Vec<_>>(),
            vec!["m.A"]
        );
    }

    #[test]
    fn test_enum_reached_through_alias() {
        let mut registry = Registry::new();
        registry.put_enum(EnumRecord {
            name: "State".to_string(),
            base: "string".to_string(),
            values: BTreeMap::from([("On".to_string(), "on".to_string())]),
            origin: Origin {
                declaration: "workspace.State".to_string(),
                ..Default::default()
            },
            ..Default::default()
        });
        registry.put_alias("model.Status", "workspace.State", Origin::default());
        let mut builder = SchemaBuilder::new(&registry, "default", ",");

        assert_eq!(
            builder.named_schema("model.Status"),
            Schema::reference("State")
        );
        assert!(builder.unresolved().is_empty());
    }

    #[test]
    fn test_enum_schema_with_varnames() {
        let record = EnumRecord {
            name: "Priority".to_string(),
            base: "int".to_string(),
            values: BTreeMap::from([
                ("PriorityHigh".to_string(), "2".to_string()),
                ("PriorityLow".to_string(), "0".to_string()),
                ("PriorityDefault".to_string(), "0".to_string()),
            ]),
            description: "Task priority".to_string(),
            ..Default::default()
        };
        let registry = Registry::new();
        let builder = SchemaBuilder::new(&registry, "default", ",");
        assert_eq!(
            to_json(&builder.enum_schema(&record)),
            json!({
                "type": "integer",
                "description": "Task priority",
                "enum": [0, 2],
                "x-enum-varnames": ["PriorityDefault", "PriorityHigh"]
            })
        );
    }

    #[test]
    fn test_enum_field_typed_example() {
        let mut registry = Registry::new();
        registry.put_enum(EnumRecord {
            name: "Level".to_string(),
            base: "int".to_string(),
            values: BTreeMap::from([("One".to_string(), "1".to_string())]),
            ..Default::default()
        });
        let mut level = field("level", "model.Level");
        level.example = Some("1".to_string());
        level.flags = FieldFlags::default();
        let mut builder = SchemaBuilder::new(&registry, "default", ",");
        assert_eq!(
            to_json(&builder.field_schema(&level)),
            json!({"allOf": [{"$ref": "#/components/schemas/Level"}], "example": 1})
        );
    }

    #[test]
    fn test_union_schema() {
        let mut registry = Registry::new();
        registry.put_type(object("Cat", vec![]));
        registry.put_type(object("Dog", vec![]));
        registry.put_type(TypeRecord {
            kind: TypeKind::Union,
            branches: vec!["model.Cat".to_string(), "model.Dog".to_string()],
            discriminator: Some("kind".to_string()),
            ..object("Pet", vec![])
        });
        let mut builder = SchemaBuilder::new(&registry, "default", ",");
        assert_eq!(
            to_json(&builder.component("Pet").unwrap()),
            json!({
                "oneOf": [
                    {"$ref": "#/components/schemas/Cat"},
                    {"$ref": "#/components/schemas/Dog"}
                ],
                "discriminator": {"propertyName": "kind"}
            })
        );
    }

    #[test]
    fn test_document_specific_component() {
        let mut registry = Registry::new();
        registry.put_type(object("User", vec![field("name", "string")]));
        registry.put_type(TypeRecord {
            documents: Some(vec!["admin".to_string()]),
            ..object(
                "User",
                vec![field("name", "string"), field("role", "string")],
            )
        });

        let mut admin = SchemaBuilder::new(&registry, "admin", ",");
        let mut public = SchemaBuilder::new(&registry, "public", ",");
        assert_eq!(admin.component("User").unwrap().properties.len(), 2);
        assert_eq!(public.component("User").unwrap().properties.len(), 1);
    }
}
