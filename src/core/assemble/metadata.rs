use crate::core::assemble::document::Info;
use crate::core::model::MetadataBlock;

pub const DEFAULT_TITLE: &str = "API";
pub const DEFAULT_VERSION: &str = "1.0.0";

fn pick_list<T: Clone>(specific: &[T], general: &[T]) -> Vec<T> {
    if specific.is_empty() {
        general.to_vec()
    } else {
        specific.to_vec()
    }
}

/// Merge the document-specific block over the general one, field by field.
///
/// Scalar fields fall back to the general value when the specific block leaves
/// them unset; collections fall back when the specific one is empty.
pub fn merge_metadata(
    general: Option<&MetadataBlock>,
    specific: Option<&MetadataBlock>,
) -> MetadataBlock {
    let (general, specific) = match (general, specific) {
        (None, None) => return MetadataBlock::default(),
        (Some(only), None) | (None, Some(only)) => return only.clone(),
        (Some(general), Some(specific)) => (general, specific),
    };

    MetadataBlock {
        title: specific.title.clone().or_else(|| general.title.clone()),
        version: specific.version.clone().or_else(|| general.version.clone()),
        description: specific
            .description
            .clone()
            .or_else(|| general.description.clone()),
        terms_of_service: specific
            .terms_of_service
            .clone()
            .or_else(|| general.terms_of_service.clone()),
        contact: specific.contact.clone().or_else(|| general.contact.clone()),
        license: specific.license.clone().or_else(|| general.license.clone()),
        external_docs: specific
            .external_docs
            .clone()
            .or_else(|| general.external_docs.clone()),
        tags: pick_list(&specific.tags, &general.tags),
        security_schemes: if specific.security_schemes.is_empty() {
            general.security_schemes.clone()
        } else {
            specific.security_schemes.clone()
        },
        security: pick_list(&specific.security, &general.security),
        servers: pick_list(&specific.servers, &general.servers),
        documents: specific.documents.clone(),
        origin: specific.origin.clone(),
    }
}

pub fn info_from(block: &MetadataBlock) -> Info {
    Info {
        title: block
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        version: block
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        description: block.description.clone(),
        terms_of_service: block.terms_of_service.clone(),
        contact: block.contact.clone(),
        license: block.license.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{SecurityScheme, Server, TagDefinition};
    use pretty_assertions::assert_eq;

    fn general() -> MetadataBlock {
        let mut block = MetadataBlock {
            title: Some("Pet Store".to_string()),
            version: Some("2.1.0".to_string()),
            description: Some("All pets".to_string()),
            tags: vec![TagDefinition {
                name: "pets".to_string(),
                description: None,
            }],
            servers: vec![Server {
                url: "https://api.example.com".to_string(),
                description: None,
            }],
            ..Default::default()
        };
        block.security_schemes.insert(
            "apiKey".to_string(),
            SecurityScheme::ApiKey {
                location: "header".to_string(),
                name: "X-API-Key".to_string(),
            },
        );
        block
    }

    #[test]
    fn test_specific_wins_per_field() {
        let admin = MetadataBlock {
            title: Some("Admin API".to_string()),
            documents: Some(vec!["admin".to_string()]),
            ..Default::default()
        };
        let merged = merge_metadata(Some(&general()), Some(&admin));

        assert_eq!(merged.title.as_deref(), Some("Admin API"));
        assert_eq!(merged.version.as_deref(), Some("2.1.0"));
        assert_eq!(merged.description.as_deref(), Some("All pets"));
        assert!(merged.security_schemes.contains_key("apiKey"));
        assert_eq!(merged.tags.len(), 1);
        assert_eq!(merged.servers.len(), 1);
    }

    #[test]
    fn test_specific_collections_replace_general() {
        let admin = MetadataBlock {
            tags: vec![TagDefinition {
                name: "admin".to_string(),
                description: None,
            }],
            ..Default::default()
        };
        let merged = merge_metadata(Some(&general()), Some(&admin));
        assert_eq!(merged.tags[0].name, "admin");
        assert_eq!(merged.tags.len(), 1);
    }

    #[test]
    fn test_info_defaults() {
        let info = info_from(&merge_metadata(None, None));
        assert_eq!(info.title, "API");
        assert_eq!(info.version, "1.0.0");

        let info = info_from(&general());
        assert_eq!(info.title, "Pet Store");
        assert_eq!(info.description.as_deref(), Some("All pets"));
    }
}
