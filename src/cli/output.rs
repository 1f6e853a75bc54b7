use crate::error::Result;
use crate::template::Template;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const STRUCTURED_KEYWORD: &str = "json";
pub const TEMPLATE_PREFIX: &str = "template=";

/// How command results are written.
///
/// Spelled on the command line as `--output json` or
/// `--output 'template=<body>'`; decided once when flags are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Structured,
    Template(String),
}

impl OutputMode {
    /// Value parser for `--output`.
    pub fn parse_flag(value: &str) -> std::result::Result<Self, String> {
        if value == STRUCTURED_KEYWORD {
            return Ok(OutputMode::Structured);
        }
        if let Some(body) = value.strip_prefix(TEMPLATE_PREFIX) {
            return Ok(OutputMode::Template(body.to_string()));
        }
        Err(format!(
            "expected '{}' or '{}<text>', got '{}'",
            STRUCTURED_KEYWORD, TEMPLATE_PREFIX, value
        ))
    }

    /// Render `value` as text according to this mode.
    ///
    /// Templates are compiled per call. Nothing is returned unless the whole
    /// render succeeded.
    pub fn render<T>(&self, value: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        match self {
            OutputMode::Structured => Ok(serde_json::to_string(value)?),
            OutputMode::Template(body) => {
                let template = Template::parse(body)?;
                let data = serde_json::to_value(value)?;
                Ok(template.render(&data)?)
            }
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        OutputMode::parse_flag(s)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Structured => f.write_str(STRUCTURED_KEYWORD),
            OutputMode::Template(body) => write!(f, "{}{}", TEMPLATE_PREFIX, body),
        }
    }
}

#[cfg(test)]
mod tests;
