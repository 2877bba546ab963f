use super::lex::{self, Piece, Token};
use super::ParseError;

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Text(String),
    Action {
        pipe: Pipeline,
    },
    If {
        branches: Vec<(Pipeline, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
    Range {
        pipe: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
    With {
        pipe: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Template {
        name: String,
        pipe: Option<Pipeline>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Pipeline {
    /// Variables declared (or assigned) by the pipeline.
    pub decl: Vec<String>,
    pub is_assign: bool,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone)]
pub(crate) struct Command {
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone)]
pub(crate) enum Arg {
    Field(Vec<String>),
    Var(String, Vec<String>),
    Func(String),
    Literal(serde_json::Value),
    Pipe(Box<Pipeline>),
}

pub(crate) struct Parsed {
    pub root: Vec<Node>,
    pub root_is_blank: bool,
    pub defines: Vec<(String, Vec<Node>)>,
}

enum Stop {
    Eof,
    End,
    Else(Vec<Token>, usize),
}

struct Parser<'a> {
    name: &'a str,
    pieces: Vec<Piece>,
    pos: usize,
    defines: Vec<(String, Vec<Node>)>,
}

pub(crate) fn parse(name: &str, src: &str) -> Result<Parsed, ParseError> {
    let mut parser = Parser {
        name,
        pieces: lex::split(name, src)?,
        pos: 0,
        defines: Vec::new(),
    };

    let (root, stop) = parser.list()?;
    match stop {
        Stop::Eof => {}
        Stop::End => return Err(parser.error(0, "unexpected {{end}}")),
        Stop::Else(_, line) => return Err(parser.error(line, "unexpected {{else}}")),
    }

    let root_is_blank = root.iter().all(|n| matches!(n, Node::Text(t) if t.trim().is_empty()));
    Ok(Parsed {
        root,
        root_is_blank,
        defines: parser.defines,
    })
}

impl<'a> Parser<'a> {
    fn error(&self, line: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(self.name, line, message)
    }

    fn list(&mut self) -> Result<(Vec<Node>, Stop), ParseError> {
        let mut nodes = Vec::new();

        while let Some(piece) = self.pieces.get(self.pos).cloned() {
            self.pos += 1;
            let (body, line) = match piece {
                Piece::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Piece::Action { body, line } => (body, line),
            };

            let tokens = lex::tokenize(self.name, line, &body)?;
            let keyword = match tokens.first() {
                Some(Token::Ident(word)) => word.as_str(),
                _ => "",
            };

            match keyword {
                "end" => {
                    if tokens.len() > 1 {
                        return Err(self.error(line, "unexpected tokens after end"));
                    }
                    return Ok((nodes, Stop::End));
                }
                "else" => return Ok((nodes, Stop::Else(tokens[1..].to_vec(), line))),
                "if" => nodes.push(self.parse_if(&tokens[1..], line)?),
                "range" => {
                    let pipe = self.pipeline(&tokens[1..], line, true)?;
                    let (body, otherwise) = self.body_with_else(line, "range")?;
                    nodes.push(Node::Range { pipe, body, otherwise });
                }
                "with" => {
                    let pipe = self.pipeline(&tokens[1..], line, false)?;
                    let (body, otherwise) = self.body_with_else(line, "with")?;
                    nodes.push(Node::With { pipe, body, otherwise });
                }
                "define" => {
                    let name = self.template_name(&tokens, line)?;
                    if tokens.len() != 2 {
                        return Err(self.error(line, "unexpected tokens in define"));
                    }
                    let body = self.until_end(line, "define")?;
                    self.defines.push((name, body));
                }
                "template" => {
                    let name = self.template_name(&tokens, line)?;
                    let pipe = match tokens.len() {
                        2 => None,
                        _ => Some(self.pipeline(&tokens[2..], line, false)?),
                    };
                    nodes.push(Node::Template { name, pipe });
                }
                "block" => {
                    let name = self.template_name(&tokens, line)?;
                    let pipe = self.pipeline(&tokens[2..], line, false)?;
                    let body = self.until_end(line, "block")?;
                    self.defines.push((name.clone(), body));
                    nodes.push(Node::Template { name, pipe: Some(pipe) });
                }
                _ => nodes.push(Node::Action {
                    pipe: self.pipeline(&tokens, line, false)?,
                }),
            }
        }

        Ok((nodes, Stop::Eof))
    }

    fn until_end(&mut self, line: usize, keyword: &str) -> Result<Vec<Node>, ParseError> {
        match self.list()? {
            (body, Stop::End) => Ok(body),
            (_, Stop::Else(_, else_line)) => Err(self.error(else_line, format!("unexpected {{{{else}}}} in {}", keyword))),
            (_, Stop::Eof) => Err(self.error(line, format!("unexpected EOF in {}", keyword))),
        }
    }

    fn body_with_else(&mut self, line: usize, keyword: &str) -> Result<(Vec<Node>, Vec<Node>), ParseError> {
        match self.list()? {
            (body, Stop::End) => Ok((body, Vec::new())),
            (body, Stop::Else(rest, else_line)) => {
                if !rest.is_empty() {
                    return Err(self.error(else_line, format!("unexpected tokens after else in {}", keyword)));
                }
                let otherwise = self.until_end(line, keyword)?;
                Ok((body, otherwise))
            }
            (_, Stop::Eof) => Err(self.error(line, format!("unexpected EOF in {}", keyword))),
        }
    }

    fn parse_if(&mut self, tokens: &[Token], line: usize) -> Result<Node, ParseError> {
        let mut branches = Vec::new();
        let mut cond = self.pipeline(tokens, line, false)?;

        loop {
            let (body, stop) = self.list()?;
            branches.push((cond, body));
            match stop {
                Stop::End => {
                    return Ok(Node::If {
                        branches,
                        otherwise: Vec::new(),
                    })
                }
                Stop::Else(rest, _) if rest.is_empty() => {
                    let otherwise = self.until_end(line, "if")?;
                    return Ok(Node::If { branches, otherwise });
                }
                Stop::Else(rest, else_line) => match rest.first() {
                    Some(Token::Ident(word)) if word == "if" => {
                        cond = self.pipeline(&rest[1..], else_line, false)?;
                    }
                    _ => return Err(self.error(else_line, "expected if after else")),
                },
                Stop::Eof => return Err(self.error(line, "unexpected EOF in if")),
            }
        }
    }

    fn template_name(&self, tokens: &[Token], line: usize) -> Result<String, ParseError> {
        match tokens.get(1) {
            Some(Token::Str(name)) => Ok(name.clone()),
            _ => Err(self.error(line, "expected quoted template name")),
        }
    }

    fn pipeline(&self, tokens: &[Token], line: usize, allow_pair: bool) -> Result<Pipeline, ParseError> {
        let mut rest = tokens;
        let mut decl = Vec::new();
        let mut is_assign = false;

        match rest {
            [Token::Var(a, ca), Token::Comma, Token::Var(b, cb), Token::Declare, ..] if ca.is_empty() && cb.is_empty() => {
                if !allow_pair {
                    return Err(self.error(line, "too many declarations"));
                }
                decl = vec![a.clone(), b.clone()];
                rest = &rest[4..];
            }
            [Token::Var(a, chain), op @ (Token::Declare | Token::Assign), ..] if chain.is_empty() => {
                is_assign = *op == Token::Assign;
                decl = vec![a.clone()];
                rest = &rest[2..];
            }
            _ => {}
        }

        let mut commands = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;
        for (i, token) in rest.iter().enumerate() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth = depth.checked_sub(1).ok_or_else(|| self.error(line, "unexpected )"))?;
                }
                Token::Pipe if depth == 0 => {
                    commands.push(self.command(&rest[start..i], line)?);
                    start = i + 1;
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(self.error(line, "unclosed ("));
        }
        if start < rest.len() || !commands.is_empty() {
            commands.push(self.command(&rest[start..], line)?);
        }
        if commands.is_empty() {
            return Err(self.error(line, "missing value"));
        }

        Ok(Pipeline {
            decl,
            is_assign,
            commands,
        })
    }

    fn command(&self, tokens: &[Token], line: usize) -> Result<Command, ParseError> {
        if tokens.is_empty() {
            return Err(self.error(line, "missing command in pipeline"));
        }

        let mut args = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let arg = match &tokens[i] {
                Token::Field(chain) => Arg::Field(chain.clone()),
                Token::Var(name, chain) => Arg::Var(name.clone(), chain.clone()),
                Token::Ident(name) => Arg::Func(name.clone()),
                Token::Str(s) => Arg::Literal(serde_json::Value::String(s.clone())),
                Token::Int(n) => Arg::Literal(serde_json::Value::from(*n)),
                Token::Float(f) => Arg::Literal(
                    serde_json::Number::from_f64(*f)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| self.error(line, "number out of range"))?,
                ),
                Token::Bool(b) => Arg::Literal(serde_json::Value::Bool(*b)),
                Token::Nil => Arg::Literal(serde_json::Value::Null),
                Token::LParen => {
                    let close = matching_paren(&tokens[i..]).ok_or_else(|| self.error(line, "unclosed ("))?;
                    let inner = self.pipeline(&tokens[i + 1..i + close], line, false)?;
                    i += close;
                    Arg::Pipe(Box::new(inner))
                }
                other => return Err(self.error(line, format!("unexpected {:?} in command", other))),
            };
            args.push(arg);
            i += 1;
        }

        Ok(Command { args })
    }
}

/// Offset of the `)` matching the `(` at the start of `tokens`.
fn matching_paren(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defines_are_collected_separately() {
        let parsed = parse("page", "{{ define \"content\" }}\n\t<p>hi</p>\n{{ end }}\n").unwrap();
        assert!(parsed.root_is_blank);
        assert_eq!(parsed.defines.len(), 1);
        assert_eq!(parsed.defines[0].0, "content");
    }

    #[test]
    fn else_if_chains_become_branches() {
        let parsed = parse("t", "{{ if .a }}a{{ else if .b }}b{{ else if .c }}c{{ else }}d{{ end }}").unwrap();
        match &parsed.root[0] {
            Node::If { branches, otherwise } => {
                assert_eq!(branches.len(), 3);
                assert_eq!(otherwise.len(), 1);
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn declarations_outside_range_take_one_variable() {
        assert!(parse("t", "{{ $a, $b := .x }}").is_err());
        assert!(parse("t", "{{ range $a, $b := .x }}{{ end }}").is_ok());
    }

    #[test]
    fn parenthesized_arguments() {
        let parsed = parse("t", "{{ printf \"%d\" (len .x) }}").unwrap();
        match &parsed.root[0] {
            Node::Action { pipe } => {
                assert_eq!(pipe.commands.len(), 1);
                assert!(matches!(pipe.commands[0].args[2], Arg::Pipe(_)));
            }
            other => panic!("expected action, got {:?}", other),
        }
    }

    #[test]
    fn stray_parens_are_rejected() {
        assert!(parse("t", "{{ len .x) }}").is_err());
        assert!(parse("t", "{{ (len .x }}").is_err());
    }
}
