use std::collections::HashSet;

use crate::core::registry::Registry;

/// Follow the alias chain starting at `name`.
///
/// Each step tries the qualified name, then the short name. Stops at the first
/// name without an alias; on a cycle the repeated name is returned.
pub fn resolve_alias(registry: &Registry, name: &str) -> String {
    let mut visited = HashSet::new();
    let mut current = name.to_string();
    while visited.insert(current.clone()) {
        match registry.alias_target(&current) {
            Some(target) => current = target.to_string(),
            None => break,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Origin;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolves_chain() {
        let mut registry = Registry::new();
        registry.put_alias("model.Fee", "workspace.Fee", Origin::default());
        assert_eq!(resolve_alias(&registry, "model.Fee"), "workspace.Fee");

        registry.put_alias("workspace.Fee", "billing.Fee", Origin::default());
        assert_eq!(resolve_alias(&registry, "model.Fee"), "billing.Fee");
    }

    #[test]
    fn test_unknown_name_resolves_to_itself() {
        let registry = Registry::new();
        assert_eq!(resolve_alias(&registry, "model.User"), "model.User");
    }

    #[test]
    fn test_cycle_terminates() {
        let mut registry = Registry::new();
        registry.put_alias("m.A", "m.B", Origin::default());
        registry.put_alias("m.B", "m.A", Origin::default());

        let resolved = resolve_alias(&registry, "m.A");
        assert!(resolved == "m.A" || resolved == "m.B");
        assert_eq!(resolve_alias(&registry, "m.A"), resolved);
    }

    #[test]
    fn test_self_alias_terminates() {
        let mut registry = Registry::new();
        registry.put_alias("m.Loop", "m.Loop", Origin::default());
        assert_eq!(resolve_alias(&registry, "m.Loop"), "m.Loop");
    }
}
