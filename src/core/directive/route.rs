use std::collections::BTreeMap;

use super::body::{DirectiveBody, Keyword};
use super::extension::ExtensionRegistry;
use super::sections::{parse_response, parse_security_requirement};
use crate::core::model::{HttpMethod, OperationRecord, Origin};

/// Convert router-style `:param` segments to `{param}`.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{}}}", name),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Operation id for a route that names none: `GET /users/{id}` -> `getUsersId`.
pub fn derive_operation_id(method: HttpMethod, path: &str) -> String {
    let mut id = method.as_str().to_string();
    for word in path
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            id.push(first.to_ascii_uppercase());
            id.push_str(chars.as_str());
        }
    }
    id
}

fn push_unique(target: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// Build an operation from `api:route` and its body.
///
/// Fails when the method or path is invalid; recoverable problems in the body
/// are pushed to `warnings`.
pub fn parse_route(
    header: &str,
    body: &DirectiveBody,
    package: &str,
    origin: Origin,
    extensions: &ExtensionRegistry,
    warnings: &mut Vec<String>,
) -> Result<OperationRecord, String> {
    let mut tokens = header.split_whitespace();
    let method_token = tokens.next().ok_or("route is missing an HTTP method")?;
    let method = HttpMethod::parse(method_token)
        .ok_or_else(|| format!("invalid HTTP method '{}'", method_token))?;
    let path = tokens.next().ok_or("route is missing a path")?;
    if !path.starts_with('/') {
        return Err(format!("route path '{}' is not absolute", path));
    }
    let path = normalize_path(path);

    let mut rest: Vec<String> = tokens.map(String::from).collect();
    let id = rest
        .pop()
        .unwrap_or_else(|| derive_operation_id(method, &path));
    let mut tags = Vec::new();
    push_unique(&mut tags, rest);
    if let Some(body_tags) = body.list(Keyword::Tags) {
        push_unique(&mut tags, body_tags.iter().cloned());
    }

    let (summary, description) = body.summary_and_description();

    let mut responses = BTreeMap::new();
    for (status, value) in body.map(Keyword::Responses).unwrap_or_default() {
        match parse_response(status, value, package) {
            Ok((status, response)) => {
                responses.insert(status, response);
            }
            Err(message) => warnings.push(format!("operation '{}': {}", id, message)),
        }
    }

    let security = body
        .map(Keyword::Security)
        .unwrap_or_default()
        .iter()
        .map(|(name, scopes)| parse_security_requirement(name, scopes))
        .filter(|requirement| !requirement.name.is_empty())
        .collect();

    let mut extension_values = BTreeMap::new();
    for (name, raw) in &body.extensions {
        match extensions.convert(name, raw) {
            Ok(value) => {
                extension_values.insert(name.clone(), value);
            }
            Err(message) => {
                warnings.push(format!("operation '{}': extension {}: {}", id, name, message))
            }
        }
    }

    Ok(OperationRecord {
        method,
        path,
        tags,
        summary,
        description,
        consumes: body.list(Keyword::Consumes).unwrap_or_default().to_vec(),
        produces: body.list(Keyword::Produces).unwrap_or_default().to_vec(),
        deprecated: body.flag(Keyword::Deprecated).unwrap_or(false),
        responses,
        security,
        ignored_params: body
            .list(Keyword::IgnoreParams)
            .map(<[String]>::to_vec)
            .unwrap_or_default(),
        extensions: extension_values,
        documents: body.documents(),
        origin,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ResponseRecord;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn body(lines: &[&str]) -> DirectiveBody {
        DirectiveBody::parse(lines.iter().copied(), ",")
    }

    fn route(header: &str, lines: &[&str]) -> Result<OperationRecord, String> {
        let mut warnings = Vec::new();
        parse_route(
            header,
            &body(lines),
            "api",
            Origin::default(),
            &ExtensionRegistry::new(),
            &mut warnings,
        )
    }

    #[test]
    fn test_route_header_tags_and_id() {
        let op = route("GET /pets pets store listPets", &[" Tags: store, admin"]).unwrap();
        assert_eq!(op.method, HttpMethod::Get);
        assert_eq!(op.path, "/pets");
        assert_eq!(op.id, "listPets");
        assert_eq!(op.tags, vec!["pets", "store", "admin"]);
        assert_eq!(op.documents, None);
    }

    #[test]
    fn test_route_derives_missing_id_and_normalizes_path() {
        let op = route("delete /users/:id", &[]).unwrap();
        assert_eq!(op.path, "/users/{id}");
        assert_eq!(op.id, "deleteUsersId");
        assert!(op.tags.is_empty());
    }

    #[test]
    fn test_route_invalid_header_is_rejected() {
        assert!(route("FETCH /pets listPets", &[]).is_err());
        assert!(route("GET pets listPets", &[]).is_err());
        assert!(route("", &[]).is_err());
    }

    #[test]
    fn test_route_full_body() {
        let op = route(
            "POST /pets createPet",
            &[
                " Creates a pet.",
                "",
                " The pet is stored immediately.",
                " spec: admin",
                " Consumes:",
                " - application/json",
                " Responses:",
                "   201: Pet",
                "   400: description: invalid input",
                "   2xx: Pet",
                " Security:",
                "   - apiKey",
                " IgnoreParams: trace",
                " Deprecated: true",
                " x-rate-limit: 10",
            ],
        )
        .unwrap();

        assert_eq!(op.summary.as_deref(), Some("Creates a pet."));
        assert_eq!(
            op.description.as_deref(),
            Some("The pet is stored immediately.")
        );
        assert_eq!(op.documents, Some(vec!["admin".to_string()]));
        assert_eq!(op.consumes, vec!["application/json"]);
        assert_eq!(op.responses.len(), 2);
        assert_eq!(
            op.responses["201"],
            ResponseRecord {
                type_name: Some("api.Pet".to_string()),
                ..Default::default()
            }
        );
        assert_eq!(
            op.responses["400"].description.as_deref(),
            Some("invalid input")
        );
        assert_eq!(op.security[0].name, "apiKey");
        assert_eq!(op.ignored_params, vec!["trace"]);
        assert!(op.deprecated);
        assert_eq!(op.extensions["x-rate-limit"], json!("10"));
    }

    #[test]
    fn test_route_bad_response_status_warns() {
        let mut warnings = Vec::new();
        let op = parse_route(
            "GET /pets listPets",
            &body(&[" Responses:", "   2xx: Pet"]),
            "api",
            Origin::default(),
            &ExtensionRegistry::new(),
            &mut warnings,
        )
        .unwrap();
        assert!(op.responses.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("2xx"));
    }

    #[test]
    fn test_derive_operation_id() {
        assert_eq!(
            derive_operation_id(HttpMethod::Get, "/users/{id}"),
            "getUsersId"
        );
        assert_eq!(
            derive_operation_id(HttpMethod::Post, "/v1/order-items"),
            "postV1OrderItems"
        );
    }
}
