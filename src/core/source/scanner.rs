//! Line-oriented declaration scanner for Go-style sources.
//!
//! The scanner does not build an expression AST. It recognizes the top-level
//! shapes the extractor cares about:
//!
//! - `package` clause (package-level doc comment)
//! - `type` specs: structs (with inline nested structs), interfaces, aliases,
//!   named types; both single and grouped `type ( ... )` forms
//! - `const` specs including `iota` sequences in grouped form
//! - `func` declarations (receiver methods included), bodies skipped
//!
//! Doc comments are the `//` lines (or `/* */` block) immediately above a
//! declaration. **A blank line breaks the chain**, exactly like Go doc comments.

use super::{Declaration, DeclarationKind, FieldDecl, SourceUnit, TypeExpr};

/// Scan `text` into a [`SourceUnit`].
///
/// Never fails: unrecognized lines are skipped.
pub fn scan_source(path: &str, text: &str) -> SourceUnit {
    let mut scanner = Scanner::new(text);
    scanner.run();
    SourceUnit {
        path: path.to_string(),
        package: scanner.package,
        checksum: String::new(),
        declarations: scanner.declarations,
    }
}

struct Scanner<'a> {
    lines: Vec<&'a str>,
    /// Index of the next line to read.
    pos: usize,
    doc: Vec<String>,
    package: String,
    declarations: Vec<Declaration>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
            doc: Vec::new(),
            package: String::new(),
            declarations: Vec::new(),
        }
    }

    /// Next line with its 1-based line number.
    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = self.lines.get(self.pos).copied()?;
        self.pos += 1;
        Some((self.pos, line))
    }

    fn run(&mut self) {
        while let Some((line_no, raw)) = self.next_line() {
            let line = raw.trim();
            if line.is_empty() {
                self.doc.clear();
                continue;
            }
            if let Some(comment) = line.strip_prefix("//") {
                self.doc.push(comment.to_string());
                continue;
            }
            if let Some(rest) = line.strip_prefix("/*") {
                self.block_comment(rest);
                continue;
            }

            let doc = std::mem::take(&mut self.doc);

            if let Some(rest) = strip_keyword(line, "package") {
                let package = rest.split_whitespace().next().unwrap_or_default();
                self.package = package.to_string();
                self.push(self.package.clone(), DeclarationKind::Package, doc, line_no);
            } else if let Some(rest) = strip_keyword(line, "import") {
                if rest.starts_with('(') && !rest.contains(')') {
                    self.skip_group();
                }
            } else if let Some(rest) = strip_keyword(line, "type") {
                if rest.starts_with('(') {
                    self.type_group();
                } else {
                    self.type_spec(rest, doc, line_no);
                }
            } else if let Some(rest) = strip_keyword(line, "const") {
                if rest.starts_with('(') {
                    self.const_group();
                } else {
                    let mut state = ConstState::default();
                    self.const_spec(rest, doc, line_no, &mut state);
                }
            } else if let Some(rest) = strip_keyword(line, "var") {
                if rest.starts_with('(') && !rest.contains(')') {
                    self.skip_group();
                } else {
                    self.skip_block(brace_delta(line));
                }
            } else if let Some(rest) = strip_keyword(line, "func") {
                if let Some(name) = func_name(rest) {
                    self.push(name, DeclarationKind::Func, doc, line_no);
                }
                self.skip_block(brace_delta(line));
            } else {
                self.skip_block(brace_delta(line));
            }
        }
    }

    fn push(&mut self, name: String, kind: DeclarationKind, doc: Vec<String>, line: usize) {
        self.declarations.push(Declaration {
            name,
            kind,
            doc,
            line,
        });
    }

    fn block_comment(&mut self, first: &str) {
        let mut current = first;
        loop {
            if let Some(end) = current.find("*/") {
                let text = current[..end].trim();
                if !text.is_empty() {
                    self.doc.push(text.to_string());
                }
                return;
            }
            let text = current.trim();
            let text = text.strip_prefix('*').unwrap_or(text);
            self.doc.push(text.to_string());
            match self.next_line() {
                Some((_, line)) => current = line,
                None => return,
            }
        }
    }

    /// Skip lines until the `)` closing a grouped declaration.
    fn skip_group(&mut self) {
        while let Some((_, line)) = self.next_line() {
            if line.trim().starts_with(')') {
                return;
            }
        }
    }

    /// Skip lines until `depth` open braces are closed.
    fn skip_block(&mut self, mut depth: i64) {
        while depth > 0 {
            let Some((_, line)) = self.next_line() else {
                return;
            };
            depth += brace_delta(line);
        }
    }

    fn type_group(&mut self) {
        let mut doc = Vec::new();
        while let Some((line_no, raw)) = self.next_line() {
            let line = raw.trim();
            if line.starts_with(')') {
                return;
            }
            if line.is_empty() {
                doc.clear();
                continue;
            }
            if let Some(comment) = line.strip_prefix("//") {
                doc.push(comment.to_string());
                continue;
            }
            self.type_spec(line, std::mem::take(&mut doc), line_no);
        }
    }

    fn type_spec(&mut self, spec: &str, doc: Vec<String>, line_no: usize) {
        let (code, _) = split_trailing_comment(spec);
        let name = take_ident(code);
        if name.is_empty() {
            return;
        }
        let mut rest = code[name.len()..].trim_start();
        // Generic parameter list `Page[T any]`
        if rest.starts_with('[')
            && !rest.starts_with("[]")
            && let Some(close) = rest.find(']')
        {
            rest = rest[close + 1..].trim_start();
        }

        let kind = if let Some(target) = rest.strip_prefix('=') {
            match TypeExpr::parse(target) {
                Some(target) => DeclarationKind::Alias { target },
                None => return,
            }
        } else if rest.starts_with("interface") {
            self.skip_block(brace_delta(rest));
            DeclarationKind::Interface
        } else if let Some(body) = rest.strip_prefix("struct") {
            DeclarationKind::Struct {
                fields: self.struct_from(body.trim()),
            }
        } else if let Some(idx) = rest.find("struct")
            && rest.trim_end().ends_with('{')
        {
            // `type Rows []struct { ... }`
            let (fields, _) = self.struct_body();
            DeclarationKind::Named {
                underlying: wrap_inline(&rest[..idx], TypeExpr::Struct(fields)),
            }
        } else {
            match TypeExpr::parse(rest) {
                Some(underlying) => DeclarationKind::Named { underlying },
                None => return,
            }
        };

        self.push(name.to_string(), kind, doc, line_no);
    }

    /// Parse the remainder after `struct`: either `{}`, a one-line body, or
    /// a multi-line body read from the following lines.
    fn struct_from(&mut self, body: &str) -> Vec<FieldDecl> {
        let Some(inner) = body.strip_prefix('{') else {
            return Vec::new();
        };
        match inner.rfind('}') {
            Some(close) => inner[..close]
                .split(';')
                .filter_map(|part| parse_field_line(part.trim(), Vec::new(), self.pos))
                .flatten()
                .collect(),
            None => self.struct_body().0,
        }
    }

    /// Read struct fields up to the closing `}`.
    ///
    /// Returns the fields and whatever follows the closing brace on its line
    /// (the struct tag of an inline nested field).
    fn struct_body(&mut self) -> (Vec<FieldDecl>, String) {
        let mut fields = Vec::new();
        let mut doc: Vec<String> = Vec::new();

        while let Some((line_no, raw)) = self.next_line() {
            let line = raw.trim();
            if line.is_empty() {
                doc.clear();
                continue;
            }
            if let Some(comment) = line.strip_prefix("//") {
                doc.push(comment.to_string());
                continue;
            }
            if let Some(rest) = line.strip_prefix('}') {
                return (fields, rest.trim().to_string());
            }

            let (code, trailing) = split_trailing_comment(line);
            let mut field_doc = std::mem::take(&mut doc);
            if let Some(trailing) = trailing {
                field_doc.push(trailing.to_string());
            }

            let code = code.trim();
            if code.ends_with('{')
                && let Some(idx) = code.find("struct")
            {
                let before = code[..idx].trim();
                let name = take_ident(before);
                let prefix = before[name.len()..].trim();
                let (inner, closing) = self.struct_body();
                let (_, tag) = split_tag(&closing);
                if !name.is_empty() {
                    fields.push(FieldDecl {
                        name: Some(name.to_string()),
                        ty: wrap_inline(prefix, TypeExpr::Struct(inner)),
                        tag,
                        doc: field_doc,
                        line: line_no,
                    });
                }
                continue;
            }

            if let Some(parsed) = parse_field_line(code, field_doc, line_no) {
                fields.extend(parsed);
            }
        }

        (fields, String::new())
    }

    fn const_group(&mut self) {
        let mut state = ConstState::default();
        let mut doc = Vec::new();
        while let Some((line_no, raw)) = self.next_line() {
            let line = raw.trim();
            if line.starts_with(')') {
                return;
            }
            if line.is_empty() {
                doc.clear();
                continue;
            }
            if let Some(comment) = line.strip_prefix("//") {
                doc.push(comment.to_string());
                continue;
            }
            self.const_spec(line, std::mem::take(&mut doc), line_no, &mut state);
        }
    }

    fn const_spec(&mut self, spec: &str, doc: Vec<String>, line_no: usize, state: &mut ConstState) {
        let (code, _) = split_trailing_comment(spec);
        let code = code.trim();
        let name = take_ident(code);
        let rest = code[name.len()..].trim();

        let (type_name, expr) = if rest.is_empty() {
            (state.last_type.clone(), state.last_expr.clone())
        } else if let Some(expr) = rest.strip_prefix('=') {
            (None, Some(expr.trim().to_string()))
        } else if let Some((ty, expr)) = rest.split_once('=') {
            (Some(ty.trim().to_string()), Some(expr.trim().to_string()))
        } else {
            (Some(rest.to_string()), None)
        };

        let iota = state.iota;
        state.iota += 1;
        state.last_type = type_name.clone();
        state.last_expr = expr.clone();

        if name.is_empty() || name == "_" {
            return;
        }
        let Some(value) = expr.and_then(|expr| eval_const(&expr, iota)) else {
            return;
        };

        self.push(
            name.to_string(),
            DeclarationKind::Const { type_name, value },
            doc,
            line_no,
        );
    }
}

#[derive(Default)]
struct ConstState {
    iota: i64,
    last_type: Option<String>,
    last_expr: Option<String>,
}

/// Strip a leading keyword that must be followed by whitespace or `(`.
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    line.strip_prefix(keyword)
        .filter(|rest| rest.starts_with(char::is_whitespace) || rest.starts_with('('))
        .map(str::trim)
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn take_ident(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, ch)| !is_ident_char(*ch))
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    &text[..end]
}

/// `(r *Repo) Get(ctx context.Context)` -> `Get`
fn func_name(rest: &str) -> Option<String> {
    let rest = rest.trim();
    let rest = if rest.starts_with('(') {
        let close = rest.find(')')?;
        rest[close + 1..].trim_start()
    } else {
        rest
    };
    let name = take_ident(rest);
    (!name.is_empty()).then(|| name.to_string())
}

/// Net `{` minus `}` on a line, ignoring string literals and `//` comments.
fn brace_delta(line: &str) -> i64 {
    let mut delta = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = '\0';

    for ch in line.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' && q != '`' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '`' | '\'' => quote = Some(ch),
            '/' if prev == '/' => break,
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
        prev = ch;
    }
    delta
}

/// Split `code // comment` outside of string and tag literals.
fn split_trailing_comment(line: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    let bytes = line.as_bytes();

    for (idx, ch) in line.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '`' => quote = Some(ch),
            '/' if bytes.get(idx + 1) == Some(&b'/') => {
                return (line[..idx].trim_end(), Some(&line[idx + 2..]));
            }
            _ => {}
        }
    }
    (line, None)
}

/// Split a field's code into declaration text and raw struct tag.
fn split_tag(code: &str) -> (&str, Option<String>) {
    if let Some(start) = code.find('`')
        && let Some(end) = code.rfind('`')
        && end > start
    {
        return (code[..start].trim(), Some(code[start + 1..end].to_string()));
    }
    (code.trim(), None)
}

/// Parse `Name Type `tag``, `A, B int`, or an embedded `*pkg.Base`.
fn parse_field_line(code: &str, doc: Vec<String>, line: usize) -> Option<Vec<FieldDecl>> {
    let (decl, tag) = split_tag(code);
    if decl.is_empty() {
        return None;
    }

    if !decl.contains(char::is_whitespace) {
        return Some(vec![FieldDecl {
            name: None,
            ty: TypeExpr::parse(decl)?,
            tag,
            doc,
            line,
        }]);
    }

    let mut names = Vec::new();
    let mut rest = decl;
    loop {
        rest = rest.trim_start();
        let ident = take_ident(rest);
        if ident.is_empty() {
            break;
        }
        names.push(ident);
        rest = rest[ident.len()..].trim_start();
        match rest.strip_prefix(',') {
            Some(next) => rest = next,
            None => break,
        }
    }

    let ty = TypeExpr::parse(rest)?;
    if names.is_empty() {
        return None;
    }

    Some(
        names
            .into_iter()
            .map(|name| FieldDecl {
                name: Some(name.to_string()),
                ty: ty.clone(),
                tag: tag.clone(),
                doc: doc.clone(),
                line,
            })
            .collect(),
    )
}

/// Wrap an inline struct in the type constructors written before `struct`
/// (`[]`, `*`, `map[K]`).
fn wrap_inline(prefix: &str, inner: TypeExpr) -> TypeExpr {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return inner;
    }
    if let Some(rest) = prefix.strip_prefix("[]") {
        return TypeExpr::Slice(Box::new(wrap_inline(rest, inner)));
    }
    if let Some(rest) = prefix.strip_prefix('*') {
        return TypeExpr::Pointer(Box::new(wrap_inline(rest, inner)));
    }
    if let Some(rest) = prefix.strip_prefix("map[")
        && let Some(close) = rest.find(']')
    {
        let key = TypeExpr::parse(&rest[..close]).unwrap_or(TypeExpr::Named("string".to_string()));
        return TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(wrap_inline(&rest[close + 1..], inner)),
        };
    }
    inner
}

/// Evaluate a constant expression: literals plus `iota` arithmetic with a
/// single binary operator.
fn eval_const(expr: &str, iota: i64) -> Option<String> {
    let expr = expr.trim();
    if expr.is_empty() {
        return None;
    }
    if let Some(inner) = unquote(expr) {
        return Some(inner.to_string());
    }
    if !expr.contains("iota") {
        return Some(expr.to_string());
    }

    let substituted = expr.replace("iota", &iota.to_string());
    for op in ["<<", "+", "-", "*"] {
        if let Some((lhs, rhs)) = substituted.split_once(op) {
            let lhs: i64 = lhs.trim().parse().ok()?;
            let rhs: i64 = rhs.trim().parse().ok()?;
            let value = match op {
                "<<" => lhs.checked_shl(u32::try_from(rhs).ok()?)?,
                "+" => lhs + rhs,
                "-" => lhs - rhs,
                _ => lhs * rhs,
            };
            return Some(value.to_string());
        }
    }
    let value: i64 = substituted.trim().parse().ok()?;
    Some(value.to_string())
}

fn unquote(expr: &str) -> Option<&str> {
    for quote in ['"', '`'] {
        let inner = expr.strip_prefix(quote).and_then(|r| r.strip_suffix(quote));
        if inner.is_some() {
            return inner;
        }
    }
    None
}
