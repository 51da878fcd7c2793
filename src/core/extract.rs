//! Directive Extractor: walks the declarations of one source unit and fills
//! the registry.

use crate::core::diagnostics::DiagnosticKind;
use crate::core::directive::{
    DirectiveHeader, ExtensionRegistry, ExtractOptions, find_directive, parse_enum, parse_meta,
    parse_model, parse_parameters, parse_route,
};
use crate::core::model::Origin;
use crate::core::registry::Registry;
use crate::core::source::{Declaration, DeclarationKind, SourceUnit, TypeExpr};

/// Names of the entities one unit contributed (recorded in the cache).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitEntities {
    /// Models, enums, parameter sets, aliases, typed constants and metadata.
    pub type_names: Vec<String>,
    pub operation_names: Vec<String>,
}

impl UnitEntities {
    pub fn is_empty(&self) -> bool {
        self.type_names.is_empty() && self.operation_names.is_empty()
    }
}

pub struct Extractor<'a> {
    options: &'a ExtractOptions,
    extensions: &'a ExtensionRegistry,
}

impl<'a> Extractor<'a> {
    pub fn new(options: &'a ExtractOptions, extensions: &'a ExtensionRegistry) -> Self {
        Self {
            options,
            extensions,
        }
    }

    /// Extract every directive and alias of `unit` into `registry`.
    pub fn extract_unit(&self, unit: &SourceUnit, registry: &mut Registry) -> UnitEntities {
        let mut entities = UnitEntities::default();
        for decl in unit.declarations() {
            let origin = Origin {
                package: unit.package.clone(),
                path: unit.path.clone(),
                line: decl.line,
                declaration: unit.qualify(&decl.name),
            };
            self.record_untagged(unit, decl, &origin, registry, &mut entities);

            if let Some((header, _, body)) = find_directive(&decl.doc, &self.options.list_separator)
            {
                self.extract_directive(unit, decl, header, &body, origin, registry, &mut entities);
            }
        }
        entities
    }

    /// Aliases and typed constants are recorded whether or not they carry a directive.
    fn record_untagged(
        &self,
        unit: &SourceUnit,
        decl: &Declaration,
        origin: &Origin,
        registry: &mut Registry,
        entities: &mut UnitEntities,
    ) {
        match &decl.kind {
            DeclarationKind::Alias {
                target: TypeExpr::Named(target),
            }
            | DeclarationKind::Named {
                underlying: TypeExpr::Named(target),
            } => {
                registry.put_alias(&origin.declaration, &unit.qualify(target), origin.clone());
                entities.type_names.push(origin.declaration.clone());
            }
            DeclarationKind::Const {
                type_name: Some(type_name),
                value,
            } => {
                registry.put_enum_value(&unit.qualify(type_name), &decl.name, value);
                entities.type_names.push(origin.declaration.clone());
            }
            _ => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn extract_directive(
        &self,
        unit: &SourceUnit,
        decl: &Declaration,
        header: DirectiveHeader,
        body: &crate::core::directive::DirectiveBody,
        origin: Origin,
        registry: &mut Registry,
        entities: &mut UnitEntities,
    ) {
        let keyword = header.keyword();
        let mut warnings = Vec::new();
        let result = match header {
            DirectiveHeader::Meta => {
                let block = parse_meta(body, origin.clone(), &mut warnings);
                entities.type_names.push(format!("meta:{}", unit.path));
                registry.put_metadata(block);
                Ok(())
            }
            DirectiveHeader::Route(rest) => parse_route(
                &rest,
                body,
                &unit.package,
                origin.clone(),
                self.extensions,
                &mut warnings,
            )
            .map(|operation| {
                entities.operation_names.push(operation.id.clone());
                registry.put_operation(operation);
            }),
            DirectiveHeader::Model(name) => parse_model(
                name.as_deref(),
                decl,
                body,
                &unit.package,
                origin.clone(),
                self.options,
            )
            .map(|record| {
                entities.type_names.push(record.name.clone());
                registry.put_type(record);
            }),
            DirectiveHeader::Enum(name) => {
                parse_enum(name.as_deref(), decl, body, origin.clone()).map(|record| {
                    entities.type_names.push(record.name.clone());
                    registry.put_enum(record);
                })
            }
            DirectiveHeader::Parameters(operations) => parse_parameters(
                &operations,
                decl,
                body,
                &unit.package,
                origin.clone(),
                self.options,
            )
            .map(|set| {
                entities.type_names.push(set.record.name.clone());
                registry.put_parameter_set(set);
            }),
        };

        if let Err(message) = result {
            registry.diagnose(
                DiagnosticKind::StructuralParseError,
                &origin,
                format!("{} dropped: {}", keyword, message),
            );
        }
        for warning in warnings {
            registry.diagnose(DiagnosticKind::StructuralParseError, &origin, warning);
        }
    }
}
