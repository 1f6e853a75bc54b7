use super::*;
use crate::error::FlagonError;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Row {
    key: String,
    enabled: bool,
    tags: Vec<String>,
}

fn row() -> Row {
    Row {
        key: "new-checkout".to_string(),
        enabled: true,
        tags: vec!["web".to_string(), "beta".to_string()],
    }
}

#[test]
fn parses_structured_keyword() {
    assert_eq!(OutputMode::parse_flag("json"), Ok(OutputMode::Structured));
}

#[test]
fn parses_template_body_after_prefix() {
    assert_eq!(
        OutputMode::parse_flag("template={{.key}}"),
        Ok(OutputMode::Template("{{.key}}".to_string()))
    );
    assert_eq!(
        OutputMode::parse_flag("template="),
        Ok(OutputMode::Template(String::new()))
    );
}

#[test]
fn rejects_unrecognized_modes() {
    for value in ["yaml", "JSON", "template", "tmpl={{.key}}", ""] {
        assert!(OutputMode::parse_flag(value).is_err(), "accepted {value:?}");
    }
}

#[test]
fn display_restores_flag_syntax() {
    assert_eq!(OutputMode::Structured.to_string(), "json");
    assert_eq!(
        OutputMode::Template("{{.key}}".to_string()).to_string(),
        "template={{.key}}"
    );
}

#[test]
fn structured_output_round_trips() {
    let text = OutputMode::Structured.render(&row()).expect("render");
    let back: Row = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back, row());
    assert!(!text.contains('\n'));
}

#[test]
fn template_renders_named_field() {
    let mode = OutputMode::Template("{{.key}}".to_string());
    assert_eq!(mode.render(&row()).expect("render"), "new-checkout");
}

#[test]
fn template_can_iterate_collections() {
    let mode = OutputMode::Template("{{range .tags}}[{{.}}]{{end}}".to_string());
    assert_eq!(mode.render(&row()).expect("render"), "[web][beta]");
}

#[test]
fn invalid_template_is_an_error() {
    let mode = OutputMode::Template("{{.key".to_string());
    assert!(matches!(mode.render(&row()), Err(FlagonError::Template(_))));
}

#[test]
fn template_execution_failure_is_an_error() {
    let mode = OutputMode::Template("{{.missing}}".to_string());
    assert!(matches!(mode.render(&row()), Err(FlagonError::Template(_))));
}
