use super::TemplateError;
use super::lexer::{Segment, Token};

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Node {
    Text(String),
    Action(Pipeline),
    If(Branch),
    Range(Branch),
    With(Branch),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Branch {
    pub pipeline: Pipeline,
    pub body: Vec<Node>,
    pub otherwise: Vec<Node>,
}

/// Commands joined by `|`; each command's result is passed as the final
/// argument of the next.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Pipeline {
    pub commands: Vec<Vec<Token>>,
}

enum Terminator {
    End,
    Else(Vec<Token>),
    Eof,
}

pub(super) fn parse(segments: Vec<Segment>) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser {
        segments: segments.into_iter(),
    };
    let (nodes, term) = parser.list()?;
    match term {
        Terminator::Eof => Ok(nodes),
        Terminator::End => Err(TemplateError::Parse("unexpected {{end}}".to_string())),
        Terminator::Else(_) => Err(TemplateError::Parse("unexpected {{else}}".to_string())),
    }
}

struct Parser {
    segments: std::vec::IntoIter<Segment>,
}

impl Parser {
    fn list(&mut self) -> Result<(Vec<Node>, Terminator), TemplateError> {
        let mut nodes = Vec::new();

        while let Some(segment) = self.segments.next() {
            let tokens = match segment {
                Segment::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Segment::Action(tokens) => tokens,
            };

            let (head, rest) = match tokens.split_first() {
                Some((Token::Ident(word), rest)) => (word.as_str(), rest.to_vec()),
                _ => {
                    nodes.push(Node::Action(pipeline(tokens)?));
                    continue;
                }
            };

            match head {
                "end" => {
                    if !rest.is_empty() {
                        return Err(TemplateError::Parse(
                            "unexpected arguments after end".to_string(),
                        ));
                    }
                    return Ok((nodes, Terminator::End));
                }
                "else" => return Ok((nodes, Terminator::Else(rest))),
                "if" => nodes.push(Node::If(self.branch("if", rest)?)),
                "range" => nodes.push(Node::Range(self.branch("range", rest)?)),
                "with" => nodes.push(Node::With(self.branch("with", rest)?)),
                _ => nodes.push(Node::Action(pipeline(tokens)?)),
            }
        }

        Ok((nodes, Terminator::Eof))
    }

    /// Parse the body of an `if`/`range`/`with` whose pipeline is `tokens`,
    /// through its matching `{{end}}`.
    fn branch(&mut self, keyword: &str, tokens: Vec<Token>) -> Result<Branch, TemplateError> {
        if tokens.is_empty() {
            return Err(TemplateError::Parse(format!(
                "missing value for {}",
                keyword
            )));
        }
        let pipeline = pipeline(tokens)?;
        let (body, term) = self.list()?;

        let otherwise = match term {
            Terminator::End => Vec::new(),
            Terminator::Eof => {
                return Err(TemplateError::Parse(format!(
                    "unexpected EOF in {{{{{}}}}}",
                    keyword
                )));
            }
            Terminator::Else(rest) if rest.is_empty() => {
                let (otherwise, term) = self.list()?;
                match term {
                    Terminator::End => otherwise,
                    Terminator::Else(_) => {
                        return Err(TemplateError::Parse(
                            "expected end; found {{else}}".to_string(),
                        ));
                    }
                    Terminator::Eof => {
                        return Err(TemplateError::Parse(format!(
                            "unexpected EOF in {{{{{}}}}}",
                            keyword
                        )));
                    }
                }
            }
            // `{{else if ...}}` chains share the outer `{{end}}`.
            Terminator::Else(rest) => match rest.split_first() {
                Some((Token::Ident(word), cond)) if word == "if" && keyword == "if" => {
                    vec![Node::If(self.branch("if", cond.to_vec())?)]
                }
                _ => {
                    return Err(TemplateError::Parse(
                        "unexpected arguments after else".to_string(),
                    ));
                }
            },
        };

        Ok(Branch {
            pipeline,
            body,
            otherwise,
        })
    }
}

fn pipeline(tokens: Vec<Token>) -> Result<Pipeline, TemplateError> {
    let mut commands = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        if token == Token::Pipe {
            if current.is_empty() {
                return Err(TemplateError::Parse("missing command in pipeline".to_string()));
            }
            commands.push(std::mem::take(&mut current));
        } else {
            current.push(token);
        }
    }
    if current.is_empty() {
        return Err(TemplateError::Parse("missing command in pipeline".to_string()));
    }
    commands.push(current);

    Ok(Pipeline { commands })
}
