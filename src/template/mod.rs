//! Text templates for `--output template=...`.
//!
//! The syntax follows Go's `text/template`, which is what users of feature
//! flag tooling already write in their scripts:
//!
//! ```text
//! {{range .}}{{.key}}: {{if .enabled}}on{{else}}off{{end}}
//! {{end}}
//! ```
//!
//! Supported: `.`, `.a.b`, `$`, literals, `if`/`else if`/`else`, `range`,
//! `with`, pipelines with `|`, `{{-`/`-}}` trimming, `{{/* comments */}}`,
//! and the functions `len`, `index`, `json`, `not`, `and`, `or`, `eq`, `ne`.

mod exec;
mod lexer;
mod parser;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("template: parse error: {0}")]
    Parse(String),

    #[error("template: execute error: {0}")]
    Execute(String),
}

/// A compiled template.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<parser::Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let segments = lexer::segments(source)?;
        let nodes = parser::parse(segments)?;
        Ok(Self { nodes })
    }

    /// Execute against `data`. The output is returned only if execution
    /// finished without error.
    pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        exec::Executor::new(data).render(&self.nodes, data, &mut out)?;
        Ok(out)
    }
}
