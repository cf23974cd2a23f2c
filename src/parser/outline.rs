// Python outline scan used when no tree-sitter grammar is available
//
// Splits source into logical lines (string, bracket and backslash aware) and
// reads top-level definitions off their indentation. Produces no spans and
// no calls.

use super::ast::{Class, Function};
use super::naive_docstring;

/// One logical line: a statement header or simple statement
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogicalLine<'a> {
    pub indent: usize,
    pub text: &'a str,
    pub row: usize,
}

/// Top-level structure recovered from a Python file
#[derive(Debug, Default)]
pub(crate) struct Outline {
    pub imports: Vec<String>,
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
}

pub(crate) fn outline(source: &str) -> Result<Outline, String> {
    let lines = logical_lines(source)?;
    let mut result = Outline::default();

    for line in &lines {
        if line.text.starts_with("import ") || line.text.starts_with("from ") {
            result.imports.push(line.text.to_string());
        }
    }

    for (idx, line) in lines.iter().enumerate() {
        if line.indent != 0 {
            continue;
        }
        if let Some(func) = parse_def(&lines, idx) {
            result.functions.push(func);
        } else if let Some(class) = parse_class(&lines, idx) {
            result.classes.push(class);
        }
    }

    Ok(result)
}

/// Split source into logical lines, skipping blank and comment-only lines
pub(crate) fn logical_lines(source: &str) -> Result<Vec<LogicalLine<'_>>, String> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut lines = Vec::new();
    let mut i = 0;
    let mut row = 0;

    while i < len {
        let start_row = row;
        let mut indent = 0;
        while i < len && matches!(bytes[i], b' ' | b'\t' | b'\x0c' | b'\r') {
            match bytes[i] {
                b' ' => indent += 1,
                b'\t' => indent += 8 - indent % 8,
                _ => {}
            }
            i += 1;
        }
        if i >= len {
            break;
        }
        if bytes[i] == b'\n' {
            i += 1;
            row += 1;
            continue;
        }
        if bytes[i] == b'#' {
            i = skip_comment(bytes, i);
            continue;
        }

        let start = i;
        let mut depth = 0usize;
        let end = loop {
            if i >= len {
                if depth > 0 {
                    return Err(format!("unexpected end of file: unclosed bracket opened on line {}", start_row + 1));
                }
                break len;
            }
            match bytes[i] {
                b'#' => {
                    i = skip_comment(bytes, i);
                    continue;
                }
                b'"' | b'\'' => {
                    i = skip_string(bytes, i, &mut row)?;
                    continue;
                }
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    if depth == 0 {
                        return Err(format!("unmatched '{}' on line {}", bytes[i] as char, row + 1));
                    }
                    depth -= 1;
                }
                b'\\' if bytes.get(i + 1) == Some(&b'\n') => {
                    i += 2;
                    row += 1;
                    continue;
                }
                b'\n' => {
                    row += 1;
                    if depth == 0 {
                        i += 1;
                        break i - 1;
                    }
                }
                _ => {}
            }
            i += 1;
        };

        let text = source[start..end].trim_end();
        if !text.is_empty() {
            lines.push(LogicalLine { indent, text, row: start_row });
        }
    }

    Ok(lines)
}

/// Advance to the newline ending a comment (the newline itself is not consumed)
fn skip_comment(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

/// Advance past a string literal starting at `i`, returning the index after it
fn skip_string(bytes: &[u8], mut i: usize, row: &mut usize) -> Result<usize, String> {
    let quote = bytes[i];
    let triple = bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote);
    let open_row = *row;

    if triple {
        i += 3;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        *row += 1;
                    }
                    i += 2;
                    continue;
                }
                b'\n' => *row += 1,
                b if b == quote && bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote) => {
                    return Ok(i + 3);
                }
                _ => {}
            }
            i += 1;
        }
        return Err(format!("unterminated triple-quoted string starting on line {}", open_row + 1));
    }

    i += 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    *row += 1;
                }
                i += 2;
                continue;
            }
            b'\n' => break,
            b if b == quote => return Ok(i + 1),
            _ => {}
        }
        i += 1;
    }
    Err(format!("unterminated string literal on line {}", open_row + 1))
}

/// Split a header at the first `:` outside brackets and strings.
/// Returns the header and any statement following the colon on the same line.
fn split_header(text: &str) -> (&str, Option<&str>) {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                let mut row = 0;
                match skip_string(bytes, i, &mut row) {
                    Ok(next) => {
                        i = next;
                        continue;
                    }
                    Err(_) => break,
                }
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => {
                let rest = text[i + 1..].trim();
                return (&text[..i], if rest.is_empty() { None } else { Some(rest) });
            }
            _ => {}
        }
        i += 1;
    }
    (text, None)
}

/// Name and raw parameter text of a `def` header
fn def_signature(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("async ").map(str::trim_start).unwrap_or(text);
    let rest = rest.strip_prefix("def ")?;
    let open = rest.find('(')?;
    let name = rest[..open].trim();
    if name.is_empty() {
        return None;
    }

    let params = &rest[open + 1..];
    let bytes = params.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                let mut row = 0;
                i = skip_string(bytes, i, &mut row).ok()?;
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' if depth == 0 => return Some((name, &params[..i])),
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split on commas that are not nested in brackets
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Names of the regular positional parameters
fn positional_args(params: &str) -> Vec<String> {
    let mut args = Vec::new();
    for part in split_top_level(params) {
        let part = part.trim();
        if part.is_empty() || part == "/" || part.starts_with("**") {
            continue;
        }
        if part.starts_with('*') {
            // Everything after a bare `*` or `*args` is keyword-only
            break;
        }
        let name = part.split([':', '=']).next().unwrap_or(part).trim();
        if !name.is_empty() {
            args.push(name.to_string());
        }
    }
    args
}

/// Lines belonging to the block opened at `idx`
fn block_body<'l, 'a>(lines: &'l [LogicalLine<'a>], idx: usize) -> &'l [LogicalLine<'a>] {
    let indent = lines[idx].indent;
    let end = lines[idx + 1..]
        .iter()
        .position(|l| l.indent <= indent)
        .map(|p| idx + 1 + p)
        .unwrap_or(lines.len());
    &lines[idx + 1..end]
}

/// Docstring from the first statement of a block
fn block_docstring(inline: Option<&str>, body: &[LogicalLine]) -> Option<String> {
    let first = inline.or_else(|| body.first().map(|l| l.text))?;
    naive_docstring(first)
}

fn parse_def(lines: &[LogicalLine], idx: usize) -> Option<Function> {
    let line = &lines[idx];
    let (header, inline) = split_header(line.text);
    let (name, params) = def_signature(header)?;
    let body = block_body(lines, idx);

    let mut func = Function::new(name).with_args(positional_args(params));
    func.docstring = block_docstring(inline, body);
    Some(func)
}

fn parse_class(lines: &[LogicalLine], idx: usize) -> Option<Class> {
    let line = &lines[idx];
    let (header, inline) = split_header(line.text);
    let rest = header.strip_prefix("class ")?;
    let name = rest
        .split(|c: char| c == '(' || c == ':' || c.is_whitespace())
        .next()
        .unwrap_or("")
        .trim();
    if name.is_empty() {
        return None;
    }

    let mut class = Class::new(name);
    let body = block_body(lines, idx);
    class.docstring = block_docstring(inline, body);

    let body_start = idx + 1;
    if let Some(first) = body.first() {
        let member_indent = first.indent;
        for (offset, member) in body.iter().enumerate() {
            if member.indent == member_indent {
                if let Some(method) = parse_def(lines, body_start + offset) {
                    class.methods.push(method);
                }
            }
        }
    }

    Some(class)
}
