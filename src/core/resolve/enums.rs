use std::collections::BTreeMap;

use crate::core::diagnostics::DiagnosticKind;
use crate::core::registry::Registry;

/// Attach typed constants to their enums and drop enums left without values.
pub fn bind_enum_values(registry: &mut Registry) {
    let declarations: Vec<String> = registry
        .enums_mut()
        .map(|record| record.origin.declaration.clone())
        .collect();
    let pools: BTreeMap<String, BTreeMap<String, String>> = declarations
        .into_iter()
        .filter_map(|declaration| {
            let values = registry.enum_values_of(&declaration)?.clone();
            Some((declaration, values))
        })
        .collect();

    for record in registry.enums_mut() {
        let Some(values) = pools.get(&record.origin.declaration) else {
            continue;
        };
        for (constant, literal) in values {
            record
                .values
                .entry(constant.clone())
                .or_insert_with(|| literal.clone());
        }
    }

    for record in registry.remove_empty_enums() {
        registry.diagnose(
            DiagnosticKind::StructuralParseError,
            &record.origin,
            format!("api:enum dropped: '{}' has no values", record.name),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{EnumRecord, Origin};
    use pretty_assertions::assert_eq;

    fn enum_record(name: &str, declaration: &str) -> EnumRecord {
        EnumRecord {
            name: name.to_string(),
            base: "string".to_string(),
            origin: Origin {
                declaration: declaration.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_binds_constants_by_declared_type() {
        let mut registry = Registry::new();
        registry.put_enum(enum_record("PetStatus", "pets.Status"));
        registry.put_enum_value("pets.Status", "StatusSold", "sold");
        registry.put_enum_value("pets.Status", "StatusAvailable", "available");
        registry.put_enum_value("other.Status", "Ignored", "x");

        bind_enum_values(&mut registry);

        let record = registry.get_enum("PetStatus").unwrap();
        assert_eq!(
            record.values.values().cloned().collect::<Vec<_>>(),
            vec!["available", "sold"]
        );
    }

    #[test]
    fn test_enum_without_values_dropped() {
        let mut registry = Registry::new();
        registry.put_enum(enum_record("Empty", "pets.Empty"));

        bind_enum_values(&mut registry);

        assert!(registry.get_enum("Empty").is_none());
        assert_eq!(registry.diagnostics().len(), 1);
        assert!(registry.diagnostics()[0].message.contains("Empty"));
    }
}
