use std::cmp::Ordering;

use serde_json::Value as Json;

use super::parse::{Arg, Command, Node, Pipeline};
use super::{ExecError, FunctionSet, TemplateSet, Value};

const MAX_TEMPLATE_DEPTH: usize = 64;

pub(crate) struct Executor<'a> {
    set: &'a TemplateSet,
    funcs: &'a dyn FunctionSet,
    name: String,
    vars: Vec<(String, Value)>,
    depth: usize,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(set: &'a TemplateSet, funcs: &'a dyn FunctionSet, root: &Value) -> Self {
        Self {
            set,
            funcs,
            name: String::new(),
            vars: vec![("$".to_string(), root.clone())],
            depth: 0,
        }
    }

    pub(crate) fn run(&mut self, name: &str, dot: &Value, out: &mut String) -> Result<(), ExecError> {
        let nodes = self
            .set
            .lookup(name)
            .ok_or_else(|| self.error(format!("no such template {:?}", name)))?;
        if self.depth >= MAX_TEMPLATE_DEPTH {
            return Err(self.error(format!("exceeded maximum template depth ({})", MAX_TEMPLATE_DEPTH)));
        }

        let saved_name = std::mem::replace(&mut self.name, name.to_string());
        let saved_vars = std::mem::replace(&mut self.vars, vec![("$".to_string(), dot.clone())]);
        self.depth += 1;

        let result = self.walk(&nodes, dot, out);

        self.depth -= 1;
        self.vars = saved_vars;
        self.name = saved_name;
        result
    }

    fn error(&self, message: impl Into<String>) -> ExecError {
        ExecError {
            template: self.name.clone(),
            message: message.into(),
        }
    }

    fn walk(&mut self, nodes: &[Node], dot: &Value, out: &mut String) -> Result<(), ExecError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action { pipe } => {
                    let value = self.pipeline(pipe, dot)?;
                    if pipe.decl.is_empty() {
                        write_escaped(&value, out);
                    }
                }
                Node::If { branches, otherwise } => {
                    let mark = self.vars.len();
                    let mut taken = false;
                    for (cond, body) in branches {
                        if self.pipeline(cond, dot)?.is_truthy() {
                            self.walk(body, dot, out)?;
                            taken = true;
                            break;
                        }
                    }
                    if !taken {
                        self.walk(otherwise, dot, out)?;
                    }
                    self.vars.truncate(mark);
                }
                Node::Range { pipe, body, otherwise } => {
                    let mark = self.vars.len();
                    self.range(pipe, body, otherwise, dot, out)?;
                    self.vars.truncate(mark);
                }
                Node::With { pipe, body, otherwise } => {
                    let mark = self.vars.len();
                    let value = self.pipeline(pipe, dot)?;
                    if value.is_truthy() {
                        self.walk(body, &value, out)?;
                    } else {
                        self.walk(otherwise, dot, out)?;
                    }
                    self.vars.truncate(mark);
                }
                Node::Template { name, pipe } => {
                    let data = match pipe {
                        Some(pipe) => self.pipeline(pipe, dot)?,
                        None => Value::null(),
                    };
                    self.run(name, &data, out)?;
                }
            }
        }
        Ok(())
    }

    fn range(
        &mut self,
        pipe: &Pipeline,
        body: &[Node],
        otherwise: &[Node],
        dot: &Value,
        out: &mut String,
    ) -> Result<(), ExecError> {
        let items: Vec<(Json, Json)> = match self.pipeline_value(pipe, dot)? {
            Value::Data(Json::Array(items)) => items.into_iter().enumerate().map(|(i, v)| (Json::from(i), v)).collect(),
            Value::Data(Json::Object(map)) => map.into_iter().map(|(k, v)| (Json::String(k), v)).collect(),
            Value::Data(Json::Null) => Vec::new(),
            other => return Err(self.error(format!("range can't iterate over {}", other.kind()))),
        };

        if items.is_empty() {
            return self.walk(otherwise, dot, out);
        }

        for (key, item) in items {
            let mark = self.vars.len();
            let item = Value::Data(item);
            match pipe.decl.as_slice() {
                [] => {}
                [elem] => self.vars.push((elem.clone(), item.clone())),
                [index, elem, ..] => {
                    self.vars.push((index.clone(), Value::Data(key)));
                    self.vars.push((elem.clone(), item.clone()));
                }
            }
            self.walk(body, &item, out)?;
            self.vars.truncate(mark);
        }
        Ok(())
    }

    fn pipeline(&mut self, pipe: &Pipeline, dot: &Value) -> Result<Value, ExecError> {
        let value = self.pipeline_value(pipe, dot)?;
        match pipe.decl.as_slice() {
            [] => {}
            [name] if pipe.is_assign => {
                let slot = self
                    .vars
                    .iter_mut()
                    .rev()
                    .find(|(n, _)| n == name)
                    .ok_or_else(|| ExecError {
                        template: self.name.clone(),
                        message: format!("undefined variable: {}", name),
                    })?;
                slot.1 = value.clone();
            }
            [name] => self.vars.push((name.clone(), value.clone())),
            _ => return Err(self.error("too many declarations")),
        }
        Ok(value)
    }

    fn pipeline_value(&mut self, pipe: &Pipeline, dot: &Value) -> Result<Value, ExecError> {
        let mut piped = None;
        for command in &pipe.commands {
            piped = Some(self.command(command, dot, piped.take())?);
        }
        piped.ok_or_else(|| self.error("empty pipeline"))
    }

    fn command(&mut self, command: &Command, dot: &Value, piped: Option<Value>) -> Result<Value, ExecError> {
        match command.args.first() {
            Some(Arg::Func(name)) => {
                let mut args = command.args[1..]
                    .iter()
                    .map(|arg| self.arg(arg, dot))
                    .collect::<Result<Vec<_>, _>>()?;
                args.extend(piped);
                self.call(name, &args)
            }
            Some(first) => {
                if command.args.len() > 1 || piped.is_some() {
                    return Err(self.error("can't give argument to non-function"));
                }
                self.arg(first, dot)
            }
            None => Err(self.error("empty command")),
        }
    }

    fn arg(&mut self, arg: &Arg, dot: &Value) -> Result<Value, ExecError> {
        match arg {
            Arg::Field(chain) => self.chain(dot.clone(), chain),
            Arg::Var(name, chain) => {
                let value = self
                    .vars
                    .iter()
                    .rev()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| self.error(format!("undefined variable: {}", name)))?;
                self.chain(value, chain)
            }
            Arg::Func(name) => self.call(name, &[]),
            Arg::Literal(json) => Ok(Value::Data(json.clone())),
            Arg::Pipe(pipe) => self.pipeline(pipe, dot),
        }
    }

    fn chain(&self, mut value: Value, chain: &[String]) -> Result<Value, ExecError> {
        for field in chain {
            value = value.field(field).map_err(|m| self.error(m))?;
        }
        Ok(value)
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, ExecError> {
        let result = match self.funcs.call(name, args) {
            Some(result) => result,
            None => builtin(name, args).ok_or_else(|| self.error(format!("function {:?} not defined", name)))?,
        };
        result.map_err(|m| self.error(format!("error calling {}: {}", name, m)))
    }
}

fn builtin(name: &str, args: &[Value]) -> Option<Result<Value, String>> {
    let result = match name {
        "and" => first_where(args, |v| !v.is_truthy()),
        "or" => first_where(args, Value::is_truthy),
        "not" => match args {
            [v] => Ok(Value::bool(!v.is_truthy())),
            _ => Err(arity("not", 1, args.len())),
        },
        "eq" => match args {
            [first, rest @ ..] if !rest.is_empty() => Ok(Value::bool(rest.iter().any(|v| equal(first, v)))),
            _ => Err("eq needs at least two arguments".to_string()),
        },
        "ne" => two(args, "ne").map(|(a, b)| Value::bool(!equal(a, b))),
        "lt" => ordered(args, "lt", |o| o == Ordering::Less),
        "le" => ordered(args, "le", |o| o != Ordering::Greater),
        "gt" => ordered(args, "gt", |o| o == Ordering::Greater),
        "ge" => ordered(args, "ge", |o| o != Ordering::Less),
        "len" => match args {
            [v] => length(v).map(|n| Value::Data(Json::from(n))),
            _ => Err(arity("len", 1, args.len())),
        },
        "index" => match args {
            [collection, keys @ ..] => keys.iter().try_fold(collection.clone(), index),
            [] => Err("index needs a collection".to_string()),
        },
        "print" => Ok(Value::string(sprint(args))),
        "println" => Ok(Value::string(format!(
            "{}\n",
            args.iter().map(Value::to_text).collect::<Vec<_>>().join(" ")
        ))),
        "printf" => match args {
            [format, rest @ ..] => Ok(Value::string(sprintf(&format.to_text(), rest))),
            [] => Err("printf needs a format".to_string()),
        },
        "html" => Ok(Value::Html(escape_html(&sprint(args)))),
        "urlfilter" => Ok(Value::Url(filter_url(&sprint(args)))),
        "urlquery" => Ok(Value::string(
            url::form_urlencoded::byte_serialize(sprint(args).as_bytes()).collect::<String>(),
        )),
        _ => return None,
    };
    Some(result)
}

fn arity(name: &str, want: usize, got: usize) -> String {
    format!("wrong number of args for {}: want {} got {}", name, want, got)
}

fn first_where(args: &[Value], pred: impl Fn(&Value) -> bool) -> Result<Value, String> {
    let last = args.last().ok_or("missing arguments")?;
    Ok(args.iter().find(|&v| pred(v)).unwrap_or(last).clone())
}

fn two<'v>(args: &'v [Value], name: &str) -> Result<(&'v Value, &'v Value), String> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(arity(name, 2, args.len())),
    }
}

fn equal(a: &Value, b: &Value) -> bool {
    match (a.as_json(), b.as_json()) {
        (Some(Json::Number(x)), Some(Json::Number(y))) => x.as_f64() == y.as_f64(),
        (Some(x), Some(y)) => x == y,
        _ => a.to_text() == b.to_text(),
    }
}

fn ordered(args: &[Value], name: &str, test: impl Fn(Ordering) -> bool) -> Result<Value, String> {
    let (a, b) = two(args, name)?;
    let ordering = match (a.as_json(), b.as_json()) {
        (Some(Json::Number(x)), Some(Json::Number(y))) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y))
            .ok_or("incomparable numbers")?,
        (Some(Json::String(x)), Some(Json::String(y))) => x.cmp(y),
        _ => return Err(format!("incompatible types for comparison: {} and {}", a.kind(), b.kind())),
    };
    Ok(Value::bool(test(ordering)))
}

fn length(v: &Value) -> Result<usize, String> {
    match v {
        Value::Data(Json::String(s)) | Value::Url(s) | Value::Html(s) => Ok(s.len()),
        Value::Data(Json::Array(a)) => Ok(a.len()),
        Value::Data(Json::Object(o)) => Ok(o.len()),
        other => Err(format!("len of {}", other.kind())),
    }
}

fn index(collection: Value, key: &Value) -> Result<Value, String> {
    match (collection, key.as_json()) {
        (Value::Data(Json::Array(items)), Some(Json::Number(n))) => {
            let i = n.as_u64().ok_or_else(|| format!("cannot index slice with {}", n))?;
            items
                .into_iter()
                .nth(i as usize)
                .map(Value::Data)
                .ok_or_else(|| format!("index out of range: {}", i))
        }
        (Value::Data(Json::Object(map)), Some(Json::String(k))) => {
            Ok(Value::Data(map.get(k).cloned().unwrap_or(Json::Null)))
        }
        (Value::Data(Json::Null), _) => Err("index of untyped nil".to_string()),
        (other, _) => Err(format!("can't index item of type {}", other.kind())),
    }
}

fn is_stringish(v: &Value) -> bool {
    matches!(v, Value::Data(Json::String(_)) | Value::Url(_) | Value::Html(_))
}

/// Operands are joined with a space when neither side is a string.
fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !is_stringish(arg) && !is_stringish(&args[i - 1]) {
            out.push(' ');
        }
        out.push_str(&arg.to_text());
    }
    out
}

fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::new();
    let mut args = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut left = false;
        let mut zero = false;
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => left = true,
                '0' => zero = true,
                '+' | ' ' | '#' => {}
                _ => break,
            }
            chars.next();
        }
        let width = take_number(&mut chars);
        let precision = if chars.peek() == Some(&'.') {
            chars.next();
            Some(take_number(&mut chars).unwrap_or(0))
        } else {
            None
        };

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(arg) = args.next() else {
            out.push_str(&format!("%!{}(MISSING)", verb));
            continue;
        };

        let numeric = matches!(arg.as_json(), Some(Json::Number(_)));
        let text = format_verb(verb, arg, precision);
        out.push_str(&pad(text, width, left, zero && numeric));
    }

    out
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(&d) = chars.peek() {
        if !d.is_ascii_digit() {
            break;
        }
        digits.push(d);
        chars.next();
    }
    digits.parse().ok()
}

fn format_verb(verb: char, arg: &Value, precision: Option<usize>) -> String {
    let number = arg.as_json().and_then(Json::as_f64);
    match verb {
        'd' => match arg.as_json() {
            Some(Json::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
            _ => format!("%!d({})", arg.to_text()),
        },
        'f' | 'F' => match number {
            Some(f) => format!("{:.*}", precision.unwrap_or(6), f),
            None => format!("%!f({})", arg.to_text()),
        },
        'x' => match arg.as_json().and_then(Json::as_i64) {
            Some(n) => format!("{:x}", n),
            None => arg.to_text().bytes().map(|b| format!("{:02x}", b)).collect(),
        },
        'q' => format!("{:?}", arg.to_text()),
        't' => match arg.as_json() {
            Some(Json::Bool(b)) => b.to_string(),
            _ => format!("%!t({})", arg.to_text()),
        },
        's' | 'v' => {
            let text = arg.to_text();
            match precision {
                Some(p) if verb == 's' => text.chars().take(p).collect(),
                _ => text,
            }
        }
        other => format!("%!{}({})", other, arg.to_text()),
    }
}

fn pad(text: String, width: Option<usize>, left: bool, zero: bool) -> String {
    let len = text.chars().count();
    match width {
        Some(w) if w > len => {
            let fill = w - len;
            if left {
                format!("{}{}", text, " ".repeat(fill))
            } else if zero {
                match text.strip_prefix('-') {
                    Some(digits) => format!("-{}{}", "0".repeat(fill), digits),
                    None => format!("{}{}", "0".repeat(fill), text),
                }
            } else {
                format!("{}{}", " ".repeat(fill), text)
            }
        }
        _ => text,
    }
}

/// Escapes text for HTML element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Stands in for a URL whose scheme could run script.
pub const UNSAFE_URL: &str = "#ZgotmplZ";

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Passes relative URLs and web schemes through; anything else becomes
/// [`UNSAFE_URL`].
fn filter_url(raw: &str) -> String {
    let trimmed = raw.trim_start();
    let scheme_end = trimmed.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if trimmed[i..].starts_with(':') => {
            let scheme = trimmed[..i].to_ascii_lowercase();
            if SAFE_SCHEMES.contains(&scheme.as_str()) {
                raw.to_string()
            } else {
                UNSAFE_URL.to_string()
            }
        }
        _ => raw.to_string(),
    }
}

/// Trusted URLs keep their query separators; only characters that could
/// break out of an attribute are replaced.
fn escape_url(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("%3c"),
            '>' => out.push_str("%3e"),
            '"' => out.push_str("%22"),
            '\'' => out.push_str("%27"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}

fn write_escaped(value: &Value, out: &mut String) {
    match value {
        Value::Data(_) => out.push_str(&escape_html(&value.to_text())),
        Value::Url(url) => out.push_str(&escape_url(url)),
        Value::Html(html) => out.push_str(html),
    }
}
