//! # Op Lowering
//!
//! Turns decoded bytecode ops into Rhai source calling the clip API on `this`.

use flashback_data::model::ActionOp;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LowerError {
    #[error("Invalid target path: {0:?}")]
    InvalidTarget(String),
    #[error("Invalid method name: {0:?}")]
    InvalidMethod(String),
}

/// Lowers `ops` into a Rhai statement list.
pub fn lower(ops: &[ActionOp]) -> Result<String, LowerError> {
    let mut source = String::new();
    for op in ops {
        let statement = match op {
            ActionOp::Play => "this.play();".to_string(),
            ActionOp::Stop => "this.stop();".to_string(),
            ActionOp::GotoFrame { frame } => format!("this.gotoAndPlay({});", frame),
            ActionOp::GotoLabel { label } => format!("this.gotoFrame({});", string_literal(label)),
            ActionOp::GetUrl { url, target } => format!(
                "this.getURL({}, {});",
                string_literal(url),
                string_literal(target)
            ),
            ActionOp::CallMethod { target, method } => {
                if !is_identifier(method) {
                    return Err(LowerError::InvalidMethod(method.clone()));
                }
                format!("{}.{}();", target_expression(target)?, method)
            }
        };
        source.push_str(&statement);
        source.push('\n');
    }
    Ok(source)
}

/// `a.b.c` becomes `a.b.c`, with a leading `this` when the path starts at a child.
fn target_expression(path: &str) -> Result<String, LowerError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| !is_identifier(segment)) {
        return Err(LowerError::InvalidTarget(path.to_string()));
    }
    let first = segments[0];
    if first == "this" || first.starts_with('_') {
        Ok(segments.join("."))
    } else {
        Ok(format!("this.{}", segments.join(".")))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
