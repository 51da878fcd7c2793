//! Model Registry: the passive store between extraction and assembly.
//!
//! Types and enums are partitioned by target documents: the general entry
//! (no `spec:`) and any number of document-specific entries share one name.
//! For a given document the specific entry wins over the general one.
//!
//! All maps are `BTreeMap`s so every iteration is sorted.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;

use parking_lot::Mutex;

use crate::core::diagnostics::{Diagnostic, DiagnosticKind};
use crate::core::model::{
    EnumRecord, MetadataBlock, OperationRecord, Origin, ParameterSet, TypeRecord, applies_to,
    is_general, partition_key,
};

/// Name without its package qualifier: `workspace.Fee` -> `Fee`.
pub fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Identifies one stored type: name plus partition key (empty = general).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeKey {
    pub name: String,
    pub partition: String,
}

impl TypeKey {
    pub fn general(name: &str) -> Self {
        Self {
            name: name.to_string(),
            partition: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub target: String,
    pub origin: Origin,
}

/// Records sharing one name, keyed by partition.
type Partitioned<T> = BTreeMap<String, T>;

/// Pick the entry visible to `document`: a specific partition naming it, else general.
fn pick_for_document<'a, T>(
    entries: &'a Partitioned<T>,
    document: &str,
    documents_of: impl Fn(&T) -> &crate::core::model::DocumentSet,
) -> Option<&'a T> {
    entries
        .iter()
        .filter(|(partition, _)| !partition.is_empty())
        .map(|(_, record)| record)
        .find(|record| applies_to(documents_of(record), document))
        .or_else(|| entries.get(""))
}

#[derive(Debug, Default)]
pub struct Registry {
    types: BTreeMap<String, Partitioned<TypeRecord>>,
    enums: BTreeMap<String, Partitioned<EnumRecord>>,
    operations: BTreeMap<String, OperationRecord>,
    metadata: BTreeMap<String, MetadataBlock>,
    parameter_sets: BTreeMap<String, ParameterSet>,
    aliases: BTreeMap<String, AliasEntry>,
    /// Qualified declaration name -> registry name, for types and enums.
    qualified_types: BTreeMap<String, String>,
    qualified_enums: BTreeMap<String, String>,
    /// Qualified type name -> constant name -> literal.
    enum_values: BTreeMap<String, BTreeMap<String, String>>,
    diagnostics: Vec<Diagnostic>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnose(&mut self, kind: DiagnosticKind, origin: &Origin, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::new(kind, origin.path.clone(), origin.line, message));
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    // ============================================================
    // Types
    // ============================================================

    /// Store a type. Returns the record it replaced, if any.
    pub fn put_type(&mut self, record: TypeRecord) -> Option<TypeRecord> {
        if !record.origin.declaration.is_empty() {
            self.qualified_types
                .insert(record.origin.declaration.clone(), record.name.clone());
        }
        let partition = partition_key(&record.documents);
        let origin = record.origin.clone();
        let previous = self
            .types
            .entry(record.name.clone())
            .or_default()
            .insert(partition, record);
        if let Some(previous) = &previous {
            let message = format!(
                "type '{}' redefined; the later definition wins",
                previous.name
            );
            self.diagnose(DiagnosticKind::RegistryConflict, &origin, message);
        }
        previous
    }

    /// Registry name for `name`: exact, then qualified declaration, then short name.
    pub fn lookup_type_name(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.types.get_key_value(name) {
            return Some(key);
        }
        if let Some(registered) = self.qualified_types.get(name) {
            return Some(registered);
        }
        self.types
            .get_key_value(short_name(name))
            .map(|(key, _)| key.as_str())
    }

    /// General record for `name`, or the first specific one if there is no general.
    pub fn get_type(&self, name: &str) -> Option<&TypeRecord> {
        let entries = self.types.get(self.lookup_type_name(name)?)?;
        entries.get("").or_else(|| entries.values().next())
    }

    /// Record visible to `document` (specific preferred over general).
    pub fn get_type_for_document(&self, name: &str, document: &str) -> Option<&TypeRecord> {
        let entries = self.types.get(self.lookup_type_name(name)?)?;
        pick_for_document(entries, document, |record| &record.documents)
    }

    /// Key of the type `name` visible from `partition`: same partition first, then general.
    ///
    /// Records stored only under other partitions are not visible.
    pub fn find_type_key(&self, name: &str, partition: &str) -> Option<TypeKey> {
        let registered = self.lookup_type_name(name)?;
        let entries = self.types.get(registered)?;
        [partition, ""]
            .into_iter()
            .find(|p| entries.contains_key(*p))
            .map(|p| TypeKey {
                name: registered.to_string(),
                partition: p.to_string(),
            })
    }

    pub fn type_keys(&self) -> Vec<TypeKey> {
        self.types
            .iter()
            .flat_map(|(name, entries)| {
                entries.keys().map(move |partition| TypeKey {
                    name: name.clone(),
                    partition: partition.clone(),
                })
            })
            .collect()
    }

    pub fn type_by_key(&self, key: &TypeKey) -> Option<&TypeRecord> {
        self.types.get(&key.name)?.get(&key.partition)
    }

    pub fn type_by_key_mut(&mut self, key: &TypeKey) -> Option<&mut TypeRecord> {
        self.types.get_mut(&key.name)?.get_mut(&key.partition)
    }

    /// Every type visible to `document`, one per name.
    pub fn all_types_with_document(&self, document: &str) -> Vec<&TypeRecord> {
        self.types
            .values()
            .filter_map(|entries| pick_for_document(entries, document, |r| &r.documents))
            .collect()
    }

    // ============================================================
    // Enums
    // ============================================================

    pub fn put_enum(&mut self, record: EnumRecord) -> Option<EnumRecord> {
        if !record.origin.declaration.is_empty() {
            self.qualified_enums
                .insert(record.origin.declaration.clone(), record.name.clone());
        }
        let partition = partition_key(&record.documents);
        let origin = record.origin.clone();
        let previous = self
            .enums
            .entry(record.name.clone())
            .or_default()
            .insert(partition, record);
        if let Some(previous) = &previous {
            let message = format!(
                "enum '{}' redefined; the later definition wins",
                previous.name
            );
            self.diagnose(DiagnosticKind::RegistryConflict, &origin, message);
        }
        previous
    }

    pub fn lookup_enum_name(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.enums.get_key_value(name) {
            return Some(key);
        }
        if let Some(registered) = self.qualified_enums.get(name) {
            return Some(registered);
        }
        self.enums
            .get_key_value(short_name(name))
            .map(|(key, _)| key.as_str())
    }

    pub fn get_enum(&self, name: &str) -> Option<&EnumRecord> {
        let entries = self.enums.get(self.lookup_enum_name(name)?)?;
        entries.get("").or_else(|| entries.values().next())
    }

    pub fn get_enum_for_document(&self, name: &str, document: &str) -> Option<&EnumRecord> {
        let entries = self.enums.get(self.lookup_enum_name(name)?)?;
        pick_for_document(entries, document, |record| &record.documents)
    }

    pub fn all_enums_with_document(&self, document: &str) -> Vec<&EnumRecord> {
        self.enums
            .values()
            .filter_map(|entries| pick_for_document(entries, document, |r| &r.documents))
            .collect()
    }

    /// Every stored enum, all partitions.
    pub fn enums_mut(&mut self) -> impl Iterator<Item = &mut EnumRecord> {
        self.enums.values_mut().flat_map(BTreeMap::values_mut)
    }

    /// Drop enums that ended up without values. Returns the dropped records.
    pub fn remove_empty_enums(&mut self) -> Vec<EnumRecord> {
        let mut removed = Vec::new();
        for entries in self.enums.values_mut() {
            let empty: Vec<String> = entries
                .iter()
                .filter(|(_, record)| record.values.is_empty())
                .map(|(partition, _)| partition.clone())
                .collect();
            for partition in empty {
                if let Some(record) = entries.remove(&partition) {
                    removed.push(record);
                }
            }
        }
        self.enums.retain(|_, entries| !entries.is_empty());
        removed
    }

    /// Enum for a type name: exact, short name, then one alias step at a time.
    pub fn find_enum_for_type(&self, name: &str) -> Option<&EnumRecord> {
        let mut visited = HashSet::new();
        let mut current = name.to_string();
        loop {
            if let Some(record) = self.get_enum(&current) {
                return Some(record);
            }
            if !visited.insert(current.clone()) {
                return None;
            }
            current = self.alias_target(&current)?.to_string();
        }
    }

    /// Record a typed constant: `value` of type `type_name` named `constant`.
    pub fn put_enum_value(&mut self, type_name: &str, constant: &str, value: &str) {
        self.enum_values
            .entry(type_name.to_string())
            .or_default()
            .insert(constant.to_string(), value.to_string());
    }

    pub fn enum_values_of(&self, type_name: &str) -> Option<&BTreeMap<String, String>> {
        self.enum_values.get(type_name)
    }

    // ============================================================
    // Operations
    // ============================================================

    pub fn put_operation(&mut self, operation: OperationRecord) -> Option<OperationRecord> {
        let origin = operation.origin.clone();
        let previous = self.operations.insert(operation.id.clone(), operation);
        if let Some(previous) = &previous {
            let message = format!(
                "operation '{}' redefined; the later definition wins",
                previous.id
            );
            self.diagnose(DiagnosticKind::RegistryConflict, &origin, message);
        }
        previous
    }

    pub fn get_operation(&self, id: &str) -> Option<&OperationRecord> {
        self.operations.get(id)
    }

    pub fn operations(&self) -> impl Iterator<Item = &OperationRecord> {
        self.operations.values()
    }

    /// Operations for `document`: those naming it, plus untargeted ones when it
    /// is the default document.
    pub fn all_operations_with_document(
        &self,
        document: &str,
        default_document: &str,
    ) -> Vec<&OperationRecord> {
        self.operations
            .values()
            .filter(|op| {
                if is_general(&op.documents) {
                    document == default_document
                } else {
                    applies_to(&op.documents, document)
                }
            })
            .collect()
    }

    /// Union of every operation's target documents; untargeted operations
    /// contribute `default_document`.
    pub fn document_names(&self, default_document: &str) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for op in self.operations.values() {
            match &op.documents {
                Some(documents) if !documents.is_empty() => {
                    names.extend(documents.iter().cloned());
                }
                _ => {
                    names.insert(default_document.to_string());
                }
            }
        }
        names
    }

    // ============================================================
    // Metadata
    // ============================================================

    pub fn put_metadata(&mut self, block: MetadataBlock) -> Option<MetadataBlock> {
        let partition = partition_key(&block.documents);
        let origin = block.origin.clone();
        let previous = self.metadata.insert(partition, block);
        if previous.is_some() {
            self.diagnose(
                DiagnosticKind::RegistryConflict,
                &origin,
                "metadata block redefined; the later definition wins",
            );
        }
        previous
    }

    pub fn general_metadata(&self) -> Option<&MetadataBlock> {
        self.metadata.get("")
    }

    /// Block whose target documents include `document`.
    pub fn specific_metadata(&self, document: &str) -> Option<&MetadataBlock> {
        self.metadata
            .iter()
            .filter(|(partition, _)| !partition.is_empty())
            .map(|(_, block)| block)
            .find(|block| applies_to(&block.documents, document))
    }

    // ============================================================
    // Parameter sets
    // ============================================================

    pub fn put_parameter_set(&mut self, set: ParameterSet) -> Option<ParameterSet> {
        let key = if set.record.origin.declaration.is_empty() {
            set.record.name.clone()
        } else {
            set.record.origin.declaration.clone()
        };
        self.parameter_sets.insert(key, set)
    }

    /// Parameter sets attached to operation `id`, in sorted declaration order.
    pub fn parameters_for(&self, id: &str) -> Vec<&ParameterSet> {
        self.parameter_sets
            .values()
            .filter(|set| set.operations.iter().any(|op| op == id))
            .collect()
    }

    pub fn parameter_set_keys(&self) -> Vec<String> {
        self.parameter_sets.keys().cloned().collect()
    }

    pub fn parameter_set(&self, key: &str) -> Option<&ParameterSet> {
        self.parameter_sets.get(key)
    }

    pub fn parameter_set_mut(&mut self, key: &str) -> Option<&mut ParameterSet> {
        self.parameter_sets.get_mut(key)
    }

    // ============================================================
    // Aliases
    // ============================================================

    /// Record `name` as an alias of `target` (both qualified).
    pub fn put_alias(&mut self, name: &str, target: &str, origin: Origin) {
        self.aliases.insert(
            name.to_string(),
            AliasEntry {
                target: target.to_string(),
                origin,
            },
        );
    }

    /// Direct alias target: qualified name, then short name.
    pub fn alias_target(&self, name: &str) -> Option<&str> {
        if let Some(entry) = self.aliases.get(name) {
            return Some(&entry.target);
        }
        self.aliases
            .get(short_name(name))
            .map(|entry| entry.target.as_str())
    }

    pub fn aliases(&self) -> &BTreeMap<String, AliasEntry> {
        &self.aliases
    }
}

static DEFAULT_REGISTRY: LazyLock<Mutex<Registry>> = LazyLock::new(|| Mutex::new(Registry::new()));

/// Run `f` against the process-wide default registry.
///
/// The pipeline itself always works on an owned [`Registry`]; this exists for
/// hosts that extract in several steps.
pub fn with_default_registry<R>(f: impl FnOnce(&mut Registry) -> R) -> R {
    f(&mut DEFAULT_REGISTRY.lock())
}

/// Reset the default registry.
pub fn reset_default_registry() {
    *DEFAULT_REGISTRY.lock() = Registry::new();
}
