//! Micro-grammars for section sub-lines and record-valued keywords.

use std::collections::BTreeMap;

use crate::core::model::{
    Contact, ExternalDocs, License, OAuthFlow, ResponseRecord, SecurityRequirement, SecurityScheme,
    Server, TagDefinition,
};
use crate::core::source::qualify;

fn is_url(token: &str) -> bool {
    token.starts_with("http://") || token.starts_with("https://")
}

/// `Contact: Jane Doe <jane@example.com> https://example.com`
pub fn contact_fields(value: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut name_words = Vec::new();
    for token in value.split_whitespace() {
        let bare = token.trim_start_matches('<').trim_end_matches('>');
        if is_url(bare) {
            fields.insert("url".to_string(), bare.to_string());
        } else if bare.contains('@') {
            fields.insert("email".to_string(), bare.to_string());
        } else {
            name_words.push(token);
        }
    }
    if !name_words.is_empty() {
        fields.insert("name".to_string(), name_words.join(" "));
    }
    fields
}

/// `License: MIT https://opensource.org/licenses/MIT`
pub fn license_fields(value: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut name_words = Vec::new();
    for token in value.split_whitespace() {
        if is_url(token) {
            fields.insert("url".to_string(), token.to_string());
        } else {
            name_words.push(token);
        }
    }
    if !name_words.is_empty() {
        fields.insert("name".to_string(), name_words.join(" "));
    }
    fields
}

/// `ExternalDocs: https://docs.example.com More documentation`
pub fn external_docs_fields(value: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let value = value.trim();
    let (url, description) = value
        .split_once(char::is_whitespace)
        .unwrap_or((value, ""));
    if !url.is_empty() {
        fields.insert("url".to_string(), url.to_string());
    }
    if !description.trim().is_empty() {
        fields.insert("description".to_string(), description.trim().to_string());
    }
    fields
}

pub fn contact_from(fields: &BTreeMap<String, String>) -> Option<Contact> {
    let contact = Contact {
        name: fields.get("name").cloned(),
        email: fields.get("email").cloned(),
        url: fields.get("url").cloned(),
    };
    (contact != Contact::default()).then_some(contact)
}

pub fn license_from(fields: &BTreeMap<String, String>) -> Option<License> {
    fields.get("name").map(|name| License {
        name: name.clone(),
        url: fields.get("url").cloned(),
    })
}

pub fn external_docs_from(fields: &BTreeMap<String, String>) -> Option<ExternalDocs> {
    fields.get("url").map(|url| ExternalDocs {
        url: url.clone(),
        description: fields.get("description").cloned(),
    })
}

/// Whether `status` is a response key: three digits or `default`.
pub fn is_status(status: &str) -> bool {
    status.eq_ignore_ascii_case("default")
        || (status.len() == 3 && status.chars().all(|c| c.is_ascii_digit()))
}

/// Parse `STATUS: [[]|map[K]]TypeName [description: text]`.
///
/// Type names are qualified with `package`. A type part of more than one word
/// is read as a plain description.
pub fn parse_response(
    status: &str,
    value: &str,
    package: &str,
) -> Result<(String, ResponseRecord), String> {
    let status = status.trim();
    if !is_status(status) {
        return Err(format!("invalid response status '{}'", status));
    }
    let status = status.to_ascii_lowercase();

    let lower = value.to_ascii_lowercase();
    let (type_part, description) = match lower.find("description:") {
        Some(idx) => (
            value[..idx].trim(),
            Some(value[idx + "description:".len()..].trim().to_string()),
        ),
        None => (value.trim(), None),
    };

    let mut record = ResponseRecord {
        description: description.filter(|d| !d.is_empty()),
        ..Default::default()
    };

    if type_part.contains(char::is_whitespace) {
        if record.description.is_none() {
            record.description = Some(type_part.to_string());
        }
        return Ok((status, record));
    }

    let mut name = type_part;
    if let Some(rest) = name.strip_prefix("[]") {
        record.array = true;
        name = rest;
    } else if let Some(rest) = name.strip_prefix("map[")
        && let Some(close) = rest.find(']')
    {
        record.map = true;
        name = &rest[close + 1..];
    }
    let name = name.trim_start_matches('*');
    if !name.is_empty() {
        record.type_name = Some(qualify(package, name));
    }
    Ok((status, record))
}

/// Reason phrase used when a response carries no description.
pub fn status_text(status: &str) -> &'static str {
    match status {
        "200" => "OK",
        "201" => "Created",
        "202" => "Accepted",
        "204" => "No Content",
        "301" => "Moved Permanently",
        "302" => "Found",
        "304" => "Not Modified",
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "403" => "Forbidden",
        "404" => "Not Found",
        "405" => "Method Not Allowed",
        "409" => "Conflict",
        "410" => "Gone",
        "412" => "Precondition Failed",
        "415" => "Unsupported Media Type",
        "422" => "Unprocessable Entity",
        "429" => "Too Many Requests",
        "500" => "Internal Server Error",
        "501" => "Not Implemented",
        "502" => "Bad Gateway",
        "503" => "Service Unavailable",
        "504" => "Gateway Timeout",
        "default" => "Default response",
        _ => "Response",
    }
}

/// `name: scope1, scope2` sub-line of a `Security:` section.
pub fn parse_security_requirement(name: &str, scopes: &str) -> SecurityRequirement {
    SecurityRequirement {
        name: name.trim().to_string(),
        scopes: scopes
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    }
}

/// `name: type args...` sub-line of a `SecurityDefinitions:` section.
///
/// Supported forms:
/// - `apiKey header|query|cookie NAME`
/// - `http SCHEME [BEARER_FORMAT]`, `basic`, `bearer [BEARER_FORMAT]`
/// - `oauth2 [AUTHORIZATION_URL] TOKEN_URL [scope...]`
pub fn parse_security_definition(value: &str) -> Result<SecurityScheme, String> {
    let mut words = value.split_whitespace();
    let Some(kind) = words.next() else {
        return Err("missing security scheme type".to_string());
    };
    let args: Vec<&str> = words.collect();

    match kind.to_ascii_lowercase().as_str() {
        "apikey" | "api_key" => match args.as_slice() {
            [location, name, ..] => {
                let location = location.to_ascii_lowercase();
                if !matches!(location.as_str(), "header" | "query" | "cookie") {
                    return Err(format!("invalid apiKey location '{}'", location));
                }
                Ok(SecurityScheme::ApiKey {
                    location,
                    name: name.to_string(),
                })
            }
            _ => Err("apiKey scheme needs a location and a name".to_string()),
        },
        "http" => match args.as_slice() {
            [scheme, rest @ ..] => Ok(SecurityScheme::Http {
                scheme: scheme.to_ascii_lowercase(),
                bearer_format: rest.first().map(|f| f.to_string()),
            }),
            [] => Err("http scheme needs a scheme name".to_string()),
        },
        "basic" => Ok(SecurityScheme::Http {
            scheme: "basic".to_string(),
            bearer_format: None,
        }),
        "bearer" => Ok(SecurityScheme::Http {
            scheme: "bearer".to_string(),
            bearer_format: args.first().map(|f| f.to_string()),
        }),
        "oauth2" => {
            let urls: Vec<&str> = args.iter().copied().filter(|a| is_url(a)).collect();
            let scopes: BTreeMap<String, String> = args
                .iter()
                .filter(|a| !is_url(a))
                .map(|scope| (scope.to_string(), String::new()))
                .collect();
            let (flow_name, flow) = match urls.as_slice() {
                [authorization, token, ..] => (
                    "authorizationCode",
                    OAuthFlow {
                        authorization_url: Some(authorization.to_string()),
                        token_url: Some(token.to_string()),
                        scopes,
                    },
                ),
                [token] => (
                    "clientCredentials",
                    OAuthFlow {
                        authorization_url: None,
                        token_url: Some(token.to_string()),
                        scopes,
                    },
                ),
                [] => return Err("oauth2 scheme needs a token URL".to_string()),
            };
            Ok(SecurityScheme::OAuth2 {
                flows: BTreeMap::from([(flow_name.to_string(), flow)]),
            })
        }
        other => Err(format!("unknown security scheme type '{}'", other)),
    }
}

pub fn server_from(url: &str, description: &str) -> Server {
    Server {
        url: url.trim().to_string(),
        description: Some(description.trim())
            .filter(|d| !d.is_empty())
            .map(String::from),
    }
}

pub fn tag_definition_from(name: &str, description: &str) -> TagDefinition {
    TagDefinition {
        name: name.trim().to_string(),
        description: Some(description.trim())
            .filter(|d| !d.is_empty())
            .map(String::from),
    }
}
