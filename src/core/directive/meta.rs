use super::body::{DirectiveBody, Keyword};
use super::sections::{
    contact_from, external_docs_from, license_from, parse_security_definition,
    parse_security_requirement, server_from, tag_definition_from,
};
use crate::core::model::{MetadataBlock, Origin};

/// Build a metadata block from an `api:meta` body.
pub fn parse_meta(
    body: &DirectiveBody,
    origin: Origin,
    warnings: &mut Vec<String>,
) -> MetadataBlock {
    let (summary, free_description) = body.summary_and_description();
    // Free text under `api:meta` is all description.
    let description = match (body.non_empty(Keyword::Description), summary) {
        (Some(description), _) => Some(description),
        (None, Some(summary)) => Some(match free_description {
            Some(rest) => format!("{}\n\n{}", summary, rest),
            None => summary,
        }),
        (None, None) => None,
    };

    let mut block = MetadataBlock {
        title: body.non_empty(Keyword::Title),
        version: body.non_empty(Keyword::Version),
        description,
        terms_of_service: body.non_empty(Keyword::TermsOfService),
        contact: body.record(Keyword::Contact).and_then(contact_from),
        license: body.record(Keyword::License).and_then(license_from),
        external_docs: body
            .record(Keyword::ExternalDocs)
            .and_then(external_docs_from),
        documents: body.documents(),
        origin,
        ..Default::default()
    };

    for (name, value) in body.map(Keyword::SecurityDefinitions).unwrap_or_default() {
        match parse_security_definition(value) {
            Ok(scheme) => {
                block.security_schemes.insert(name.clone(), scheme);
            }
            Err(message) => warnings.push(format!("security scheme '{}': {}", name, message)),
        }
    }

    block.security = body
        .map(Keyword::Security)
        .unwrap_or_default()
        .iter()
        .map(|(name, scopes)| parse_security_requirement(name, scopes))
        .filter(|requirement| !requirement.name.is_empty())
        .collect();

    block.servers = body
        .map(Keyword::Servers)
        .unwrap_or_default()
        .iter()
        .map(|(url, description)| server_from(url, description))
        .collect();

    block.tags = body
        .map(Keyword::TagDefinitions)
        .unwrap_or_default()
        .iter()
        .map(|(name, description)| tag_definition_from(name, description))
        .collect();

    block
}
