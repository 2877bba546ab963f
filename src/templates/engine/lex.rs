use super::ParseError;

/// Raw text or the inside of a `{{ ... }}` action, with trim markers applied.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Piece {
    Text(String),
    Action { body: String, line: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    /// `.a.b`; an empty chain is the dot itself.
    Field(Vec<String>),
    /// `$name.a.b`; the bare root variable is `$`.
    Var(String, Vec<String>),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    Pipe,
    LParen,
    RParen,
    Declare,
    Assign,
    Comma,
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn line_of(src: &str, offset: usize) -> usize {
    src[..offset].matches('\n').count() + 1
}

pub(crate) fn split(name: &str, src: &str) -> Result<Vec<Piece>, ParseError> {
    let mut pieces = Vec::new();
    let mut pos = 0;
    let mut trim_next_text = false;

    while pos <= src.len() {
        let Some(found) = src[pos..].find(OPEN) else {
            push_text(&mut pieces, &src[pos..], trim_next_text, false);
            break;
        };
        let start = pos + found;
        let line = line_of(src, start);

        let mut body_start = start + OPEN.len();
        let after_open = &src[body_start..];
        let trim_left = after_open.starts_with('-') && after_open[1..].starts_with(is_space);
        if trim_left {
            body_start += 1;
        }
        push_text(&mut pieces, &src[pos..start], trim_next_text, trim_left);

        let close = find_close(&src[body_start..]).ok_or_else(|| ParseError::new(name, line, "unclosed action"))?;
        let close_at = body_start + close;

        let mut body = &src[body_start..close_at];
        let trim_right = body.ends_with('-') && body[..body.len() - 1].ends_with(is_space);
        if trim_right {
            body = &body[..body.len() - 1];
        }
        trim_next_text = trim_right;

        let trimmed = body.trim();
        if trimmed.starts_with("/*") {
            if !trimmed.ends_with("*/") {
                return Err(ParseError::new(name, line, "unclosed comment"));
            }
        } else {
            pieces.push(Piece::Action {
                body: trimmed.to_string(),
                line,
            });
        }

        pos = close_at + CLOSE.len();
    }

    Ok(pieces)
}

fn push_text(pieces: &mut Vec<Piece>, text: &str, trim_start: bool, trim_end: bool) {
    let mut text = text;
    if trim_start {
        text = text.trim_start_matches(is_space);
    }
    if trim_end {
        text = text.trim_end_matches(is_space);
    }
    if !text.is_empty() {
        pieces.push(Piece::Text(text.to_string()));
    }
}

/// Offset of the closing delimiter, skipping over quoted strings.
fn find_close(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'`' => quote = Some(b),
            None if s[i..].starts_with(CLOSE) => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

pub(crate) fn tokenize(name: &str, line: usize, body: &str) -> Result<Vec<Token>, ParseError> {
    let err = |msg: String| ParseError::new(name, line, msg);
    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if is_space(c) => i += 1,
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Declare);
                i += 2;
            }
            '=' => {
                tokens.push(Token::Assign);
                i += 1;
            }
            '"' => {
                let (s, next) = read_quoted(&chars, i).map_err(err)?;
                tokens.push(Token::Str(s));
                i = next;
            }
            '`' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == '`')
                    .ok_or_else(|| err("unterminated raw string".to_string()))?;
                tokens.push(Token::Str(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            '.' => {
                let (chain, next) = read_chain(&chars, i);
                tokens.push(Token::Field(chain));
                i = next;
            }
            '$' => {
                let mut j = i + 1;
                while j < chars.len() && is_ident_char(chars[j]) {
                    j += 1;
                }
                let var: String = chars[i..j].iter().collect();
                let (chain, next) = read_chain(&chars, j);
                tokens.push(Token::Var(var, chain));
                i = next;
            }
            c if c.is_ascii_digit() || ((c == '-' || c == '+') && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '.') {
                    j += 1;
                }
                let raw: String = chars[i..j].iter().collect();
                let token = if raw.contains(['.', 'e', 'E']) {
                    raw.parse::<f64>().map(Token::Float).map_err(|_| err(format!("bad number {:?}", raw)))?
                } else {
                    raw.parse::<i64>().map(Token::Int).map_err(|_| err(format!("bad number {:?}", raw)))?
                };
                tokens.push(token);
                i = j;
            }
            c if is_ident_start(c) => {
                let mut j = i + 1;
                while j < chars.len() && is_ident_char(chars[j]) {
                    j += 1;
                }
                let word: String = chars[i..j].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    "nil" => Token::Nil,
                    _ => Token::Ident(word),
                });
                i = j;
            }
            other => return Err(err(format!("unexpected character {:?} in action", other))),
        }
    }

    Ok(tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Reads `.a.b.c` starting at a dot (or nothing when `i` is not a dot).
fn read_chain(chars: &[char], mut i: usize) -> (Vec<String>, usize) {
    let mut chain = Vec::new();
    while i < chars.len() && chars[i] == '.' {
        let mut j = i + 1;
        while j < chars.len() && is_ident_char(chars[j]) {
            j += 1;
        }
        if j == i + 1 {
            // lone dot
            i = j;
            break;
        }
        chain.push(chars[i + 1..j].iter().collect());
        i = j;
    }
    (chain, i)
}

fn read_quoted(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '"' => return Ok((out, i + 1)),
            '\\' => {
                let escaped = chars.get(i + 1).ok_or("unterminated string")?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err("unterminated string".to_string())
}
