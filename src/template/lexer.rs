use super::TemplateError;
use regex::Regex;
use std::sync::LazyLock;

/// Raw pieces of a template source: literal text and action bodies.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Segment {
    Text(String),
    Action(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    /// `.` (empty path) or `.A.B`
    Field(Vec<String>),
    /// `$` or `$.A.B`
    Root(Vec<String>),
    Ident(String),
    Str(String),
    Number(serde_json::Number),
    Bool(bool),
    Nil,
    Pipe,
}

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{(-\s)?(.*?)(\s-)?\}\}").expect("Valid regex pattern")
});

/// Split `source` into text and tokenized actions, applying `{{-`/`-}}`
/// whitespace trimming and dropping comments.
pub(super) fn segments(source: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut out: Vec<Segment> = Vec::new();
    let mut last = 0;
    let mut trim_next = false;

    for caps in ACTION_RE.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };

        let mut text = &source[last..whole.start()];
        if trim_next {
            text = text.trim_start();
        }
        if caps.get(1).is_some() {
            text = text.trim_end();
        }
        push_text(&mut out, text)?;

        trim_next = caps.get(3).is_some();
        last = whole.end();

        let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default().trim();
        if body.starts_with("/*") {
            if !body.ends_with("*/") {
                return Err(TemplateError::Parse("unclosed comment".to_string()));
            }
            continue;
        }
        let tokens = tokenize(body)?;
        if tokens.is_empty() {
            return Err(TemplateError::Parse("missing value for command".to_string()));
        }
        out.push(Segment::Action(tokens));
    }

    let mut rest = &source[last..];
    if trim_next {
        rest = rest.trim_start();
    }
    push_text(&mut out, rest)?;

    Ok(out)
}

fn push_text(out: &mut Vec<Segment>, text: &str) -> Result<(), TemplateError> {
    if text.contains("{{") {
        return Err(TemplateError::Parse("unclosed action".to_string()));
    }
    if !text.is_empty() {
        out.push(Segment::Text(text.to_string()));
    }
    Ok(())
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub(super) fn tokenize(body: &str) -> Result<Vec<Token>, TemplateError> {
    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '.' => {
                let (path, next) = field_path(&chars, i)?;
                tokens.push(Token::Field(path));
                i = next;
            }
            '$' => {
                i += 1;
                if i < chars.len() && is_ident_char(chars[i]) {
                    return Err(TemplateError::Parse(
                        "only the root variable $ is supported".to_string(),
                    ));
                }
                let (path, next) = if i < chars.len() && chars[i] == '.' {
                    field_path(&chars, i)?
                } else {
                    (Vec::new(), i)
                };
                tokens.push(Token::Root(path));
                i = next;
            }
            '"' => {
                let (s, next) = quoted(&chars, i)?;
                tokens.push(Token::Str(s));
                i = next;
            }
            '`' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|c| *c == '`')
                    .map(|p| start + p)
                    .ok_or_else(|| TemplateError::Parse("unterminated raw string".to_string()))?;
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            c if c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(parse_number(&text)?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    "nil" => Token::Nil,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(TemplateError::Parse(format!(
                    "unexpected {:?} in command",
                    other
                )));
            }
        }
    }

    Ok(tokens)
}

/// Read `.A.B` starting at the `.` at `start`. A lone `.` is the empty path.
fn field_path(chars: &[char], start: usize) -> Result<(Vec<String>, usize), TemplateError> {
    let mut path = Vec::new();
    let mut i = start;

    while i < chars.len() && chars[i] == '.' {
        let name_start = i + 1;
        let mut j = name_start;
        while j < chars.len() && is_ident_char(chars[j]) {
            j += 1;
        }
        if j == name_start {
            if path.is_empty() && i == start {
                return Ok((path, name_start));
            }
            return Err(TemplateError::Parse("bad field name".to_string()));
        }
        path.push(chars[name_start..j].iter().collect());
        i = j;
    }

    Ok((path, i))
}

fn quoted(chars: &[char], start: usize) -> Result<(String, usize), TemplateError> {
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '"' => return Ok((out, i + 1)),
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| TemplateError::Parse("unterminated quoted string".to_string()))?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '"' => '"',
                    '\\' => '\\',
                    other => {
                        return Err(TemplateError::Parse(format!(
                            "unknown escape sequence \\{}",
                            other
                        )));
                    }
                });
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Err(TemplateError::Parse("unterminated quoted string".to_string()))
}

fn parse_number(text: &str) -> Result<serde_json::Number, TemplateError> {
    if let Ok(n) = text.parse::<i64>() {
        return Ok(n.into());
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| TemplateError::Parse(format!("bad number syntax: {}", text)))
}
