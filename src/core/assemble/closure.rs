use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::core::assemble::document::Schema;
use crate::core::assemble::schema::SchemaBuilder;

/// Materialize every component reachable from `seeds`.
///
/// FIFO work queue; each name is built at most once and its own references
/// are queued. Names without a component (free-form or foreign) are skipped.
pub fn reference_closure(
    schemas: &mut SchemaBuilder<'_>,
    seeds: impl IntoIterator<Item = String>,
) -> BTreeMap<String, Schema> {
    let mut queued: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    for name in seeds {
        if queued.insert(name.clone()) {
            queue.push_back(name);
        }
    }

    let mut components = BTreeMap::new();
    while let Some(name) = queue.pop_front() {
        let Some(schema) = schemas.component(&name) else {
            continue;
        };
        for reference in schema.references() {
            if queued.insert(reference.clone()) {
                queue.push_back(reference);
            }
        }
        components.insert(name, schema);
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{FieldRecord, Origin, TypeKind, TypeRecord};
    use crate::core::registry::Registry;
    use pretty_assertions::assert_eq;

    fn object(name: &str, fields: &[(&str, &str)]) -> TypeRecord {
        TypeRecord {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(field, type_name)| FieldRecord {
                    name: field.to_string(),
                    type_name: type_name.to_string(),
                    ..Default::default()
                })
                .collect(),
            origin: Origin {
                declaration: format!("model.{}", name),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn names(components: &BTreeMap<String, Schema>) -> Vec<&str> {
        components.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_transitive_closure_only() {
        let mut registry = Registry::new();
        registry.put_type(object("User", &[("address", "model.Address")]));
        registry.put_type(object("Address", &[("geo", "model.Geo")]));
        registry.put_type(object("Geo", &[("lat", "float64")]));
        registry.put_type(object("Unused", &[]));

        let mut schemas = SchemaBuilder::new(&registry, "default", ",");
        let components = reference_closure(&mut schemas, ["User".to_string()]);
        assert_eq!(names(&components), vec!["Address", "Geo", "User"]);
    }

    #[test]
    fn test_cyclic_references_terminate() {
        let mut registry = Registry::new();
        registry.put_type(object("Node", &[("children", "model.Children")]));
        registry.put_type(TypeRecord {
            kind: TypeKind::Array,
            element: Some("model.Node".to_string()),
            ..object("Children", &[])
        });

        let mut schemas = SchemaBuilder::new(&registry, "default", ",");
        let components = reference_closure(&mut schemas, ["Node".to_string()]);
        assert_eq!(names(&components), vec!["Children", "Node"]);
    }

    #[test]
    fn test_missing_seed_skipped() {
        let registry = Registry::new();
        let mut schemas = SchemaBuilder::new(&registry, "default", ",");
        assert!(reference_closure(&mut schemas, ["Ghost".to_string()]).is_empty());
    }
}
