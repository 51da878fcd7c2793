//! Directive body parsing.
//!
//! A body is the comment block around a declaration directive. Lines are
//! classified against the keyword table:
//!
//! - `Keyword: value` single-line keywords keep the trimmed remainder
//! - `Description:` accumulates until the next recognized keyword
//! - list keywords (`Tags: a, b`) split on the configured separator
//! - section keywords (`Responses:`) collect dashed or indented sub-lines
//! - `x-name: value` lines are vendor extensions
//!
//! Lines before the first keyword are free text (summary/description).
//! Every value lands in a [`DirectiveValue`], so each consumer checks the
//! expected shape exactly once.

use std::collections::BTreeMap;

use super::sections;
use crate::core::model::DocumentSet;

/// Tagged value of one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveValue {
    Text(String),
    List(Vec<String>),
    /// Ordered `key: value` sub-lines of a section.
    Map(Vec<(String, String)>),
    /// Fixed-field structure (contact, license, external docs).
    Record(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Single,
    /// Multi-line, joined with line breaks.
    Multi,
    /// Multi-line, joined with spaces.
    Paragraph,
    List,
    /// Space separated, lower-cased.
    Words,
    Record,
    /// Sub-lines parsed as `key: value`.
    MapSection,
    /// Sub-lines kept as plain items.
    ListSection,
    /// Sub-lines parsed as `url description`.
    ServerSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keyword {
    Summary,
    Description,
    Title,
    Version,
    TermsOfService,
    Contact,
    License,
    ExternalDocs,
    Tags,
    Spec,
    Deprecated,
    Example,
    Default,
    Required,
    Nullable,
    ReadOnly,
    Format,
    Pattern,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MinLength,
    MaxLength,
    MinItems,
    MaxItems,
    MultipleOf,
    In,
    Discriminator,
    OneOf,
    IgnoreParams,
    Values,
    Responses,
    Security,
    Consumes,
    Produces,
    SecurityDefinitions,
    Servers,
    TagDefinitions,
}

/// Keyword labels (matched case-insensitively, followed by `:`).
const KEYWORDS: &[(&str, Keyword, Shape)] = &[
    ("summary", Keyword::Summary, Shape::Paragraph),
    ("description", Keyword::Description, Shape::Multi),
    ("title", Keyword::Title, Shape::Single),
    ("version", Keyword::Version, Shape::Single),
    ("termsofservice", Keyword::TermsOfService, Shape::Single),
    ("contact", Keyword::Contact, Shape::Record),
    ("license", Keyword::License, Shape::Record),
    ("externaldocs", Keyword::ExternalDocs, Shape::Record),
    ("tags", Keyword::Tags, Shape::List),
    ("spec", Keyword::Spec, Shape::Words),
    ("deprecated", Keyword::Deprecated, Shape::Single),
    ("example", Keyword::Example, Shape::Single),
    ("default", Keyword::Default, Shape::Single),
    ("required", Keyword::Required, Shape::Single),
    ("nullable", Keyword::Nullable, Shape::Single),
    ("readonly", Keyword::ReadOnly, Shape::Single),
    ("format", Keyword::Format, Shape::Single),
    ("pattern", Keyword::Pattern, Shape::Single),
    ("minimum", Keyword::Minimum, Shape::Single),
    ("maximum", Keyword::Maximum, Shape::Single),
    ("exclusiveminimum", Keyword::ExclusiveMinimum, Shape::Single),
    ("exclusivemaximum", Keyword::ExclusiveMaximum, Shape::Single),
    ("minlength", Keyword::MinLength, Shape::Single),
    ("maxlength", Keyword::MaxLength, Shape::Single),
    ("minitems", Keyword::MinItems, Shape::Single),
    ("maxitems", Keyword::MaxItems, Shape::Single),
    ("multipleof", Keyword::MultipleOf, Shape::Single),
    ("in", Keyword::In, Shape::Single),
    ("discriminator", Keyword::Discriminator, Shape::Single),
    ("oneof", Keyword::OneOf, Shape::List),
    ("ignoreparams", Keyword::IgnoreParams, Shape::List),
    ("ignoreparameters", Keyword::IgnoreParams, Shape::List),
    ("values", Keyword::Values, Shape::List),
    ("responses", Keyword::Responses, Shape::MapSection),
    ("security", Keyword::Security, Shape::MapSection),
    ("consumes", Keyword::Consumes, Shape::ListSection),
    ("produces", Keyword::Produces, Shape::ListSection),
    ("securitydefinitions", Keyword::SecurityDefinitions, Shape::MapSection),
    ("securityschemes", Keyword::SecurityDefinitions, Shape::MapSection),
    ("servers", Keyword::Servers, Shape::ServerSection),
    ("tagdefinitions", Keyword::TagDefinitions, Shape::MapSection),
];

fn lookup_keyword(label: &str) -> Option<(Keyword, Shape)> {
    let label = label.to_ascii_lowercase();
    KEYWORDS
        .iter()
        .find(|(name, _, _)| *name == label)
        .map(|(_, keyword, shape)| (*keyword, *shape))
}

/// Strip comment markers and measure indentation.
///
/// Returns the indentation (in characters, after the marker) and the trimmed text.
pub fn normalize_line(raw: &str) -> (usize, &str) {
    let mut text = raw.trim_start();
    while let Some(rest) = text.strip_prefix("//") {
        text = rest;
    }
    let indent = text.len() - text.trim_start().len();
    (indent, text.trim())
}

/// Match `Keyword: rest` at the start of a normalized line.
fn match_keyword(line: &str) -> Option<(Keyword, Shape, &str)> {
    let (label, rest) = line.split_once(':')?;
    let label = label.trim();
    if label.is_empty() || label.contains(char::is_whitespace) {
        return None;
    }
    lookup_keyword(label).map(|(keyword, shape)| (keyword, shape, rest.trim()))
}

/// Match a vendor extension line `x-name: value`.
fn match_extension(line: &str) -> Option<(&str, &str)> {
    let (label, rest) = line.split_once(':')?;
    let label = label.trim();
    let is_extension = label.len() > 2
        && label[..2].eq_ignore_ascii_case("x-")
        && !label.contains(char::is_whitespace);
    is_extension.then(|| (label, rest.trim()))
}

/// Split a list value on `separator`, trimming and dropping empty items.
pub fn split_list(value: &str, separator: &str) -> Vec<String> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a boolean directive value. A bare keyword counts as `true`.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

struct OpenBlock {
    keyword: Keyword,
    shape: Shape,
    indent: usize,
    lines: Vec<String>,
}

/// Parsed directive body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveBody {
    /// Lines before the first keyword, blank lines kept as paragraph breaks.
    pub free_text: Vec<String>,
    entries: Vec<(Keyword, DirectiveValue)>,
    /// Vendor extension lines in source order.
    pub extensions: Vec<(String, String)>,
}

impl DirectiveBody {
    /// Parse comment lines (with or without `//` markers).
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>, separator: &str) -> Self {
        let mut body = Self::default();
        let mut open: Option<OpenBlock> = None;
        let mut seen_keyword = false;

        for raw in lines {
            let (indent, line) = normalize_line(raw);

            if let Some(block) = open.as_mut()
                && is_section(block.shape)
            {
                let is_sub_line = line.starts_with('-')
                    || (indent > block.indent && !line.is_empty())
                    || (match_keyword(line).is_none() && match_extension(line).is_none());
                if is_sub_line {
                    let item = line.trim_start_matches('-').trim();
                    if !item.is_empty() {
                        block.lines.push(item.to_string());
                    }
                    continue;
                }
            }

            if let Some((keyword, shape, rest)) = match_keyword(line) {
                seen_keyword = true;
                body.flush(open.take(), separator);
                match shape {
                    Shape::Single => body.push(keyword, DirectiveValue::Text(rest.to_string())),
                    Shape::List => {
                        body.push(keyword, DirectiveValue::List(split_list(rest, separator)))
                    }
                    Shape::Words => body.push(
                        keyword,
                        DirectiveValue::List(
                            rest.split_whitespace().map(|w| w.to_lowercase()).collect(),
                        ),
                    ),
                    Shape::Record => body.push(keyword, record_value(keyword, rest)),
                    Shape::Multi
                    | Shape::Paragraph
                    | Shape::MapSection
                    | Shape::ListSection
                    | Shape::ServerSection => {
                        let mut lines = Vec::new();
                        if !rest.is_empty() {
                            lines.push(rest.to_string());
                        }
                        open = Some(OpenBlock {
                            keyword,
                            shape,
                            indent,
                            lines,
                        });
                    }
                }
                continue;
            }

            if let Some((name, value)) = match_extension(line) {
                seen_keyword = true;
                body.flush(open.take(), separator);
                body.extensions.push((name.to_string(), value.to_string()));
                continue;
            }

            if let Some(block) = open.as_mut() {
                block.lines.push(line.to_string());
            } else if !seen_keyword {
                body.free_text.push(line.to_string());
            }
        }

        body.flush(open, separator);
        body
    }

    fn push(&mut self, keyword: Keyword, value: DirectiveValue) {
        self.entries.push((keyword, value));
    }

    fn flush(&mut self, block: Option<OpenBlock>, separator: &str) {
        let Some(block) = block else {
            return;
        };
        let value = match block.shape {
            Shape::Multi => DirectiveValue::Text(join_lines(&block.lines)),
            Shape::Paragraph => DirectiveValue::Text(
                block
                    .lines
                    .iter()
                    .map(|l| l.trim())
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Shape::ListSection => DirectiveValue::List(
                block
                    .lines
                    .iter()
                    .flat_map(|line| split_list(line, separator))
                    .collect(),
            ),
            Shape::MapSection => DirectiveValue::Map(
                block
                    .lines
                    .iter()
                    .map(|line| match line.split_once(':') {
                        Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                        None => (line.trim().to_string(), String::new()),
                    })
                    .collect(),
            ),
            Shape::ServerSection => DirectiveValue::Map(
                block
                    .lines
                    .iter()
                    .map(|line| match line.split_once(char::is_whitespace) {
                        Some((url, description)) => {
                            (url.to_string(), description.trim().to_string())
                        }
                        None => (line.clone(), String::new()),
                    })
                    .collect(),
            ),
            Shape::Single | Shape::List | Shape::Words | Shape::Record => return,
        };
        self.push(block.keyword, value);
    }

    /// Last value recorded for `keyword`.
    pub fn get(&self, keyword: Keyword) -> Option<&DirectiveValue> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| *k == keyword)
            .map(|(_, value)| value)
    }

    pub fn text(&self, keyword: Keyword) -> Option<&str> {
        match self.get(keyword)? {
            DirectiveValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Non-empty text value.
    pub fn non_empty(&self, keyword: Keyword) -> Option<String> {
        self.text(keyword)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
    }

    pub fn list(&self, keyword: Keyword) -> Option<&[String]> {
        match self.get(keyword)? {
            DirectiveValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn map(&self, keyword: Keyword) -> Option<&[(String, String)]> {
        match self.get(keyword)? {
            DirectiveValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn record(&self, keyword: Keyword) -> Option<&BTreeMap<String, String>> {
        match self.get(keyword)? {
            DirectiveValue::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Boolean value; unparseable values count as absent.
    pub fn flag(&self, keyword: Keyword) -> Option<bool> {
        self.text(keyword).and_then(parse_flag)
    }

    /// Target documents from `spec:`. Omitted directive yields `None`.
    pub fn documents(&self) -> DocumentSet {
        self.list(Keyword::Spec).map(<[String]>::to_vec)
    }

    /// Summary and description.
    ///
    /// Explicit `Summary:`/`Description:` win; otherwise the first free-text
    /// paragraph is the summary and the rest the description.
    pub fn summary_and_description(&self) -> (Option<String>, Option<String>) {
        let paragraphs = paragraphs(&self.free_text);
        let mut iter = paragraphs.into_iter();
        let free_summary = iter.next().map(|p| p.join(" "));
        let rest: Vec<String> = iter.map(|p| p.join("\n")).collect();
        let free_description = (!rest.is_empty()).then(|| rest.join("\n\n"));

        let summary = self.non_empty(Keyword::Summary).or(free_summary);
        let description = self.non_empty(Keyword::Description).or(free_description);
        (summary, description)
    }

    /// Description for types and fields: `Description:` or all free text.
    pub fn description(&self) -> String {
        self.non_empty(Keyword::Description)
            .unwrap_or_else(|| join_lines(&self.free_text))
    }
}

fn is_section(shape: Shape) -> bool {
    matches!(
        shape,
        Shape::MapSection | Shape::ListSection | Shape::ServerSection
    )
}

fn record_value(keyword: Keyword, rest: &str) -> DirectiveValue {
    let fields = match keyword {
        Keyword::Contact => sections::contact_fields(rest),
        Keyword::License => sections::license_fields(rest),
        Keyword::ExternalDocs => sections::external_docs_fields(rest),
        _ => BTreeMap::new(),
    };
    DirectiveValue::Record(fields)
}

/// Join lines with `\n`, dropping leading and trailing blank lines.
fn join_lines(lines: &[String]) -> String {
    lines.join("\n").trim().to_string()
}

fn paragraphs(lines: &[String]) -> Vec<Vec<String>> {
    let mut result = Vec::new();
    let mut current = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim().to_string());
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}
