//! Type Resolver.
//!
//! One in-place pass over the registry after extraction:
//!
//! 1. bind typed constants to their enums (`enums`)
//! 2. splice embedded members into their owners (`embeds`)
//!
//! Alias resolution (`alias`) is a pure lookup used on demand by the assembler.

mod alias;
mod embeds;
mod enums;

pub use alias::resolve_alias;
pub use embeds::EmbedExpander;
pub use enums::bind_enum_values;

use crate::core::directive::ExtractOptions;
use crate::core::registry::Registry;
use crate::core::source::SemanticResolver;

pub struct TypeResolver<'a> {
    semantic: &'a dyn SemanticResolver,
    options: &'a ExtractOptions,
}

impl<'a> TypeResolver<'a> {
    pub fn new(semantic: &'a dyn SemanticResolver, options: &'a ExtractOptions) -> Self {
        Self { semantic, options }
    }

    pub fn run(&self, registry: &mut Registry) {
        bind_enum_values(registry);
        EmbedExpander::new(self.semantic, self.options).run(registry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::directive::ExtensionRegistry;
    use crate::core::extract::Extractor;
    use crate::core::source::{UnitIndex, scan_source};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolver_over_extracted_units() {
        let units = vec![
            scan_source(
                "model/user.go",
                "package model\n\n// api:model\ntype User struct {\n\tbase.Audit\n\tName string `json:\"name\"`\n}\n\n// api:enum\ntype Role int\n\nconst (\n\tRoleUser Role = iota\n\tRoleAdmin\n)\n",
            ),
            scan_source(
                "base/audit.go",
                "package base\n\ntype Audit struct {\n\tCreatedAt time.Time `json:\"created_at\"`\n}\n",
            ),
        ];
        let options = ExtractOptions::default();
        let extensions = ExtensionRegistry::new();
        let mut registry = Registry::new();
        let extractor = Extractor::new(&options, &extensions);
        for unit in &units {
            extractor.extract_unit(unit, &mut registry);
        }

        let index = UnitIndex::new(&units);
        TypeResolver::new(&index, &options).run(&mut registry);

        let user = registry.get_type("User").unwrap();
        let names: Vec<&str> = user.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["created_at", "name"]);
        assert_eq!(user.fields[0].type_name, "time.Time");

        let role = registry.get_enum("Role").unwrap();
        assert_eq!(
            role.values.values().cloned().collect::<Vec<_>>(),
            vec!["1", "0"]
        );
    }
}
