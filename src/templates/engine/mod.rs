//! A text/template dialect for HTML fragments.
//!
//! Supports the subset the frontend's partials use: field and variable
//! references, pipelines, `if`/`else if`/`else`, `range` (with index and
//! element variables), `with`, `define`, `template`, `block`, comments and
//! `{{-`/`-}}` trim markers. Function names are resolved when the template
//! executes, so a template can be parsed once and run with whichever
//! helpers a particular page supplies.

mod exec;
mod lex;
mod parse;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use parse::Node;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template {template}:{line}: {message}")]
pub struct ParseError {
    pub template: String,
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(template: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            template: template.to_string(),
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("executing {template:?}: {message}")]
pub struct ExecError {
    pub template: String,
    pub message: String,
}

/// Data flowing through a template.
///
/// Plain data is HTML-escaped when printed. `Url` values are trusted links
/// and only have attribute-breaking characters escaped; `Html` is emitted
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Data(serde_json::Value),
    Url(String),
    Html(String),
}

impl Value {
    pub fn null() -> Self {
        Value::Data(serde_json::Value::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Data(serde_json::Value::String(s.into()))
    }

    pub fn bool(b: bool) -> Self {
        Value::Data(serde_json::Value::Bool(b))
    }

    pub fn from_serialize<T: serde::Serialize + ?Sized>(data: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(data).map(Value::Data)
    }

    /// Go's notion of truth: false, zero, nil and empty collections are false.
    pub fn is_truthy(&self) -> bool {
        use serde_json::Value as J;
        match self {
            Value::Data(J::Null) => false,
            Value::Data(J::Bool(b)) => *b,
            Value::Data(J::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::Data(J::String(s)) => !s.is_empty(),
            Value::Data(J::Array(a)) => !a.is_empty(),
            Value::Data(J::Object(o)) => !o.is_empty(),
            Value::Url(s) | Value::Html(s) => !s.is_empty(),
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(v) => Some(v),
            _ => None,
        }
    }

    /// Unescaped text form, as `print` would produce it.
    pub fn to_text(&self) -> String {
        use serde_json::Value as J;
        match self {
            Value::Data(J::Null) => String::new(),
            Value::Data(J::String(s)) => s.clone(),
            Value::Data(other) => other.to_string(),
            Value::Url(s) | Value::Html(s) => s.clone(),
        }
    }

    pub(crate) fn field(&self, name: &str) -> Result<Value, String> {
        match self {
            Value::Data(serde_json::Value::Object(map)) => map
                .get(name)
                .cloned()
                .map(Value::Data)
                .ok_or_else(|| format!("can't evaluate field {}", name)),
            Value::Data(serde_json::Value::Null) => Err(format!("nil pointer evaluating field {}", name)),
            other => Err(format!("can't evaluate field {} in {}", name, other.kind())),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        use serde_json::Value as J;
        match self {
            Value::Data(J::Null) => "nil",
            Value::Data(J::Bool(_)) => "bool",
            Value::Data(J::Number(_)) => "number",
            Value::Data(J::String(_)) => "string",
            Value::Data(J::Array(_)) => "slice",
            Value::Data(J::Object(_)) => "map",
            Value::Url(_) => "url",
            Value::Html(_) => "html",
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Data(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Named functions callable from template pipelines.
pub trait FunctionSet: Send + Sync {
    /// `None` when no function by that name exists.
    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, String>>;
}

impl FunctionSet for () {
    fn call(&self, _name: &str, _args: &[Value]) -> Option<Result<Value, String>> {
        None
    }
}

/// A set of named templates that can refer to each other.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: HashMap<String, Arc<Vec<Node>>>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `src` into a fresh set under `name`.
    pub fn parse(name: &str, src: &str) -> Result<Self, ParseError> {
        let mut set = Self::new();
        set.add(name, src)?;
        Ok(set)
    }

    /// Parses another source into this set. Its `define` blocks replace any
    /// existing templates of the same name.
    pub fn add(&mut self, name: &str, src: &str) -> Result<(), ParseError> {
        let parsed = parse::parse(name, src)?;
        for (define, body) in parsed.defines {
            self.templates.insert(define, Arc::new(body));
        }
        // A source made only of definitions does not clobber a template
        // that was defined under its name.
        if !(parsed.root_is_blank && self.templates.contains_key(name)) {
            self.templates.insert(name.to_string(), Arc::new(parsed.root));
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn execute(&self, name: &str, data: &Value, funcs: &dyn FunctionSet) -> Result<String, ExecError> {
        let mut out = String::new();
        exec::Executor::new(self, funcs, data).run(name, data, &mut out)?;
        Ok(out)
    }

    fn lookup(&self, name: &str) -> Option<Arc<Vec<Node>>> {
        self.templates.get(name).cloned()
    }
}
