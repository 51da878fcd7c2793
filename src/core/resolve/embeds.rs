//! Embedded member expansion.
//!
//! Each embed is looked up by exact name, qualified declaration, then short
//! name in the registry; failing that, through the semantic facility. Found
//! types have their own embeds expanded first (post-order) and their fields
//! are spliced in at the embed position. Fields declared on the owner win
//! over embedded ones of the same name.
//!
//! One visited set is shared by the whole pass, so a type is expanded at most
//! once and cycles terminate.

use std::collections::{HashMap, HashSet};

use crate::core::diagnostics::DiagnosticKind;
use crate::core::directive::{ExtractOptions, extract_fields};
use crate::core::model::{EmbedRef, FieldRecord, Origin, TypeRecord};
use crate::core::registry::{Registry, TypeKey};
use crate::core::source::SemanticResolver;

pub struct EmbedExpander<'a> {
    semantic: &'a dyn SemanticResolver,
    options: &'a ExtractOptions,
    visited: HashSet<String>,
    /// Expanded fields of types found through the semantic facility.
    semantic_fields: HashMap<String, Vec<FieldRecord>>,
}

fn visit_id(key: &TypeKey) -> String {
    if key.partition.is_empty() {
        key.name.clone()
    } else {
        format!("{}@{}", key.name, key.partition)
    }
}

fn package_of(qualified: &str) -> &str {
    qualified.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
}

impl<'a> EmbedExpander<'a> {
    pub fn new(semantic: &'a dyn SemanticResolver, options: &'a ExtractOptions) -> Self {
        Self {
            semantic,
            options,
            visited: HashSet::new(),
            semantic_fields: HashMap::new(),
        }
    }

    /// Expand every registry type and parameter set.
    pub fn run(&mut self, registry: &mut Registry) {
        for key in registry.type_keys() {
            self.expand_type(registry, &key);
        }
        for key in registry.parameter_set_keys() {
            let Some(mut record) = registry.parameter_set(&key).map(|set| set.record.clone())
            else {
                continue;
            };
            self.splice(registry, &mut record, "");
            if let Some(set) = registry.parameter_set_mut(&key) {
                set.record = record;
            }
        }
    }

    fn expand_type(&mut self, registry: &mut Registry, key: &TypeKey) {
        if !self.visited.insert(visit_id(key)) {
            return;
        }
        let Some(record) = registry.type_by_key(key) else {
            return;
        };
        if record.embeds_resolved {
            return;
        }
        let mut record = record.clone();
        self.splice(registry, &mut record, &key.partition);
        if let Some(slot) = registry.type_by_key_mut(key) {
            *slot = record;
        }
    }

    /// Splice the embeds of `record` (and of its inline nested records) in place.
    fn splice(&mut self, registry: &mut Registry, record: &mut TypeRecord, partition: &str) {
        for field in record.fields.iter_mut() {
            if let Some(inline) = field.inline.as_mut() {
                self.splice(registry, inline, partition);
            }
        }
        if record.embeds.is_empty() {
            record.embeds_resolved = true;
            return;
        }

        let embeds = std::mem::take(&mut record.embeds);
        let own = std::mem::take(&mut record.fields);
        let mut seen: HashSet<String> = own.iter().map(|f| f.name.clone()).collect();
        let mut result = Vec::with_capacity(own.len());
        let mut pending = embeds.iter().peekable();

        for (index, field) in own.into_iter().enumerate() {
            while let Some(embed) = pending.next_if(|e| e.position <= index) {
                let fields = self.embedded_fields(registry, embed, partition, &record.origin);
                push_unseen(&mut result, &mut seen, fields);
            }
            result.push(field);
        }
        for embed in pending {
            let fields = self.embedded_fields(registry, embed, partition, &record.origin);
            push_unseen(&mut result, &mut seen, fields);
        }

        record.fields = result;
        record.embeds = embeds;
        record.embeds_resolved = true;
    }

    fn embedded_fields(
        &mut self,
        registry: &mut Registry,
        embed: &EmbedRef,
        partition: &str,
        owner: &Origin,
    ) -> Vec<FieldRecord> {
        if let Some(key) = registry.find_type_key(&embed.name, partition) {
            self.expand_type(registry, &key);
            return registry
                .type_by_key(&key)
                .map(|record| record.fields.clone())
                .unwrap_or_default();
        }
        if registry.lookup_type_name(&embed.name).is_some() {
            // Declared for other documents only.
            registry.diagnose(
                DiagnosticKind::ResolutionGap,
                owner,
                format!(
                    "embedded type '{}' is not visible to the documents of its owner",
                    embed.name
                ),
            );
            return Vec::new();
        }

        if let Some(fields) = self.semantic_fields.get(&embed.name) {
            return fields.clone();
        }
        let semantic_id = format!("semantic:{}", embed.name);
        if self.visited.contains(&semantic_id) {
            // In progress further up the stack.
            return Vec::new();
        }
        let Some(decls) = self.semantic.resolve_named_type(&embed.name) else {
            registry.diagnose(
                DiagnosticKind::ResolutionGap,
                owner,
                format!("embedded type '{}' not found", embed.name),
            );
            return Vec::new();
        };
        self.visited.insert(semantic_id);

        let package = package_of(&embed.name);
        let (fields, embeds) = extract_fields(&decls, package, self.options);
        let mut record = TypeRecord {
            name: embed.name.clone(),
            fields,
            embeds,
            origin: Origin {
                package: package.to_string(),
                ..owner.clone()
            },
            ..Default::default()
        };
        self.splice(registry, &mut record, partition);
        self.semantic_fields
            .insert(embed.name.clone(), record.fields.clone());
        record.fields
    }
}

fn push_unseen(
    result: &mut Vec<FieldRecord>,
    seen: &mut HashSet<String>,
    fields: Vec<FieldRecord>,
) {
    for field in fields {
        if seen.insert(field.name.clone()) {
            result.push(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::{FieldDecl, SourceUnit, TypeExpr, UnitIndex, scan_source};
    use pretty_assertions::assert_eq;

    fn field(name: &str) -> FieldRecord {
        FieldRecord {
            name: name.to_string(),
            type_name: "string".to_string(),
            ..Default::default()
        }
    }

    fn record(name: &str, fields: &[&str], embeds: &[(&str, usize)]) -> TypeRecord {
        TypeRecord {
            name: name.to_string(),
            fields: fields.iter().map(|f| field(f)).collect(),
            embeds: embeds
                .iter()
                .map(|(name, position)| EmbedRef {
                    name: name.to_string(),
                    position: *position,
                })
                .collect(),
            origin: Origin {
                package: "m".to_string(),
                declaration: format!("m.{}", name),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn names(registry: &Registry, name: &str) -> Vec<String> {
        registry
            .get_type(name)
            .unwrap()
            .fields
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    fn expand(registry: &mut Registry, semantic: &dyn SemanticResolver) {
        let options = ExtractOptions::default();
        EmbedExpander::new(semantic, &options).run(registry);
    }

    #[test]
    fn test_transitive_embeds() {
        let mut registry = Registry::new();
        registry.put_type(record("A", &["a"], &[("m.B", 0)]));
        registry.put_type(record("B", &["b"], &[("m.C", 1)]));
        registry.put_type(record("C", &["x"], &[]));

        expand(&mut registry, &());

        assert_eq!(names(&registry, "A"), vec!["b", "x", "a"]);
        assert_eq!(names(&registry, "B"), vec!["b", "x"]);
        assert!(registry.get_type("A").unwrap().embeds_resolved);
    }

    #[test]
    fn test_owner_fields_win_over_embedded() {
        let mut registry = Registry::new();
        registry.put_type(record("User", &["id", "name"], &[("m.Base", 1)]));
        registry.put_type(record("Base", &["id", "created"], &[]));

        expand(&mut registry, &());

        assert_eq!(names(&registry, "User"), vec!["id", "created", "name"]);
    }

    #[test]
    fn test_embed_cycle_terminates() {
        let mut registry = Registry::new();
        registry.put_type(record("A", &["a"], &[("m.B", 1)]));
        registry.put_type(record("B", &["b"], &[("m.A", 1)]));
        registry.put_type(record("Self", &["s"], &[("m.Self", 0)]));

        expand(&mut registry, &());

        let a = names(&registry, "A");
        assert!(a.contains(&"a".to_string()) && a.contains(&"b".to_string()));
        assert_eq!(names(&registry, "Self"), vec!["s"]);
    }

    #[test]
    fn test_semantic_fallback_and_gap() {
        let base: SourceUnit = scan_source(
            "base/audit.go",
            "package base\n\ntype Audit struct {\n\tCreatedBy string `json:\"created_by\"`\n}\n",
        );
        let index = UnitIndex::new(&[base]);

        let mut registry = Registry::new();
        registry.put_type(record("Order", &["total"], &[("base.Audit", 1), ("m.Missing", 1)]));

        expand(&mut registry, &index);

        assert_eq!(names(&registry, "Order"), vec!["total", "created_by"]);
        let gap = &registry.diagnostics()[0];
        assert_eq!(gap.kind, DiagnosticKind::ResolutionGap);
        assert!(gap.message.contains("m.Missing"));
    }

    #[test]
    fn test_general_owner_skips_document_specific_embed() {
        let mut registry = Registry::new();
        registry.put_type(record("Public", &["name"], &[("m.Secret", 1)]));
        registry.put_type(TypeRecord {
            documents: Some(vec!["admin".to_string()]),
            ..record("Secret", &["token"], &[])
        });
        registry.put_type(TypeRecord {
            documents: Some(vec!["admin".to_string()]),
            ..record("Console", &["level"], &[("m.Secret", 1)])
        });

        expand(&mut registry, &());

        assert_eq!(names(&registry, "Public"), vec!["name"]);
        let console = registry
            .get_type_for_document("Console", "admin")
            .unwrap()
            .fields
            .iter()
            .map(|f| f.name.clone())
            .collect::<Vec<_>>();
        assert_eq!(console, vec!["level", "token"]);
        assert_eq!(registry.diagnostics().len(), 1);
        assert!(registry.diagnostics()[0].message.contains("m.Secret"));
    }

    #[test]
    fn test_inline_records_expand() {
        let mut registry = Registry::new();
        let mut owner = record("Envelope", &["meta"], &[]);
        owner.fields[0].inline = Some(Box::new(record("", &["page"], &[("m.Paging", 1)])));
        registry.put_type(owner);
        registry.put_type(record("Paging", &["limit"], &[]));

        expand(&mut registry, &());

        let envelope = registry.get_type("Envelope").unwrap();
        let inline = envelope.fields[0].inline.as_ref().unwrap();
        let inline_names: Vec<&str> = inline.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(inline_names, vec!["page", "limit"]);
    }

    #[test]
    fn test_semantic_declarations_use_field_extractor() {
        struct Fixed;
        impl SemanticResolver for Fixed {
            fn resolve_named_type(&self, _: &str) -> Option<Vec<FieldDecl>> {
                Some(vec![FieldDecl {
                    name: Some("Zone".to_string()),
                    ty: TypeExpr::Named("string".to_string()),
                    tag: None,
                    doc: vec![],
                    line: 1,
                }])
            }
        }
        let mut registry = Registry::new();
        registry.put_type(record("Place", &[], &[("geo.Location", 0)]));

        expand(&mut registry, &Fixed);

        assert_eq!(names(&registry, "Place"), vec!["Zone"]);
    }
}
