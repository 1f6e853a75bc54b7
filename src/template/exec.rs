use super::TemplateError;
use super::lexer::Token;
use super::parser::{Branch, Node, Pipeline};
use serde_json::Value;

const NO_VALUE: &str = "<no value>";

pub(super) struct Executor<'a> {
    root: &'a Value,
}

impl<'a> Executor<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    pub fn render(&self, nodes: &[Node], dot: &Value, out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipeline) => {
                    let value = self.pipeline(pipeline, dot)?;
                    out.push_str(&print(&value));
                }
                Node::If(branch) => {
                    let cond = self.pipeline(&branch.pipeline, dot)?;
                    if truthy(&cond) {
                        self.render(&branch.body, dot, out)?;
                    } else {
                        self.render(&branch.otherwise, dot, out)?;
                    }
                }
                Node::With(branch) => {
                    let value = self.pipeline(&branch.pipeline, dot)?;
                    if truthy(&value) {
                        self.render(&branch.body, &value, out)?;
                    } else {
                        self.render(&branch.otherwise, dot, out)?;
                    }
                }
                Node::Range(branch) => self.range(branch, dot, out)?,
            }
        }
        Ok(())
    }

    fn range(&self, branch: &Branch, dot: &Value, out: &mut String) -> Result<(), TemplateError> {
        let value = self.pipeline(&branch.pipeline, dot)?;
        let items: Vec<&Value> = match &value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(TemplateError::Execute(format!(
                    "range can't iterate over {}",
                    print(other)
                )));
            }
        };

        if items.is_empty() {
            return self.render(&branch.otherwise, dot, out);
        }
        for item in items {
            self.render(&branch.body, item, out)?;
        }
        Ok(())
    }

    fn pipeline(&self, pipeline: &Pipeline, dot: &Value) -> Result<Value, TemplateError> {
        let mut piped: Option<Value> = None;
        for command in &pipeline.commands {
            piped = Some(self.command(command, dot, piped)?);
        }
        Ok(piped.unwrap_or(Value::Null))
    }

    fn command(&self, tokens: &[Token], dot: &Value, piped: Option<Value>) -> Result<Value, TemplateError> {
        match tokens.split_first() {
            Some((Token::Ident(name), rest)) => {
                let mut args = rest
                    .iter()
                    .map(|t| self.operand(t, dot))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(value) = piped {
                    args.push(value);
                }
                call(name, args)
            }
            Some((first, [])) if piped.is_none() => self.operand(first, dot),
            Some(_) => Err(TemplateError::Execute(
                "can't give argument to non-function".to_string(),
            )),
            None => Err(TemplateError::Execute("empty command".to_string())),
        }
    }

    fn operand(&self, token: &Token, dot: &Value) -> Result<Value, TemplateError> {
        match token {
            Token::Field(path) => walk(dot, path),
            Token::Root(path) => walk(self.root, path),
            Token::Str(s) => Ok(Value::String(s.clone())),
            Token::Number(n) => Ok(Value::Number(n.clone())),
            Token::Bool(b) => Ok(Value::Bool(*b)),
            Token::Nil => Ok(Value::Null),
            Token::Ident(name) => call(name, Vec::new()),
            Token::Pipe => Err(TemplateError::Execute("unexpected pipe".to_string())),
        }
    }
}

fn walk(start: &Value, path: &[String]) -> Result<Value, TemplateError> {
    let mut current = start;
    for field in path {
        current = match current {
            Value::Object(map) => map.get(field).ok_or_else(|| {
                TemplateError::Execute(format!("can't evaluate field {}", field))
            })?,
            Value::Null => {
                return Err(TemplateError::Execute(format!(
                    "nil pointer evaluating .{}",
                    field
                )));
            }
            other => {
                return Err(TemplateError::Execute(format!(
                    "can't evaluate field {} in type {}",
                    field,
                    kind(other)
                )));
            }
        };
    }
    Ok(current.clone())
}

fn call(name: &str, args: Vec<Value>) -> Result<Value, TemplateError> {
    match name {
        "len" => {
            let [value] = exact::<1>(name, args)?;
            let len = match &value {
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                Value::String(s) => s.chars().count(),
                other => {
                    return Err(TemplateError::Execute(format!(
                        "len of type {}",
                        kind(other)
                    )));
                }
            };
            Ok(Value::from(len))
        }
        "index" => {
            let mut args = args.into_iter();
            let mut current = args.next().ok_or_else(|| arity(name, 1, 0))?;
            for key in args {
                current = index(&current, &key)?;
            }
            Ok(current)
        }
        "json" => {
            let [value] = exact::<1>(name, args)?;
            serde_json::to_string(&value)
                .map(Value::String)
                .map_err(|e| TemplateError::Execute(e.to_string()))
        }
        "not" => {
            let [value] = exact::<1>(name, args)?;
            Ok(Value::Bool(!truthy(&value)))
        }
        "and" => {
            let mut last = Value::Null;
            for value in args {
                if !truthy(&value) {
                    return Ok(value);
                }
                last = value;
            }
            Ok(last)
        }
        "or" => {
            let mut last = Value::Null;
            for value in args {
                if truthy(&value) {
                    return Ok(value);
                }
                last = value;
            }
            Ok(last)
        }
        "eq" => {
            let mut args = args.into_iter();
            let first = args.next().ok_or_else(|| arity(name, 2, 0))?;
            let rest: Vec<Value> = args.collect();
            if rest.is_empty() {
                return Err(arity(name, 2, 1));
            }
            Ok(Value::Bool(rest.iter().any(|v| *v == first)))
        }
        "ne" => {
            let [a, b] = exact::<2>(name, args)?;
            Ok(Value::Bool(a != b))
        }
        other => Err(TemplateError::Execute(format!(
            "function {:?} not defined",
            other
        ))),
    }
}

fn index(value: &Value, key: &Value) -> Result<Value, TemplateError> {
    match (value, key) {
        (Value::Object(map), Value::String(k)) => Ok(map.get(k).cloned().unwrap_or(Value::Null)),
        (Value::Array(items), Value::Number(n)) => n
            .as_u64()
            .and_then(|i| items.get(i as usize))
            .cloned()
            .ok_or_else(|| TemplateError::Execute(format!("index out of range: {}", n))),
        (container, key) => Err(TemplateError::Execute(format!(
            "can't index item of type {} with {}",
            kind(container),
            print(key)
        ))),
    }
}

fn exact<const N: usize>(name: &str, args: Vec<Value>) -> Result<[Value; N], TemplateError> {
    let got = args.len();
    args.try_into().map_err(|_| arity(name, N, got))
}

fn arity(name: &str, want: usize, got: usize) -> TemplateError {
    TemplateError::Execute(format!(
        "wrong number of args for {}: want {} got {}",
        name, want, got
    ))
}

pub(super) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Text form of a value: scalars as-is, null as `<no value>`, composites as JSON.
pub(super) fn print(value: &Value) -> String {
    match value {
        Value::Null => NO_VALUE.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        composite => composite.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
