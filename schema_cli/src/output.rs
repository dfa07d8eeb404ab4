//! Output formatting utilities for the schema-form CLI

use colored::*;
use schema_form::{Control, RenderNode};
use serde_json::Value;

/// Format and print output based on the JSON flag
pub fn print_output(data: Value, json_format: bool) {
    if json_format {
        println!(
            "{}",
            serde_json::to_string_pretty(&data).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        print_human_readable(&data);
    }
}

/// Print data in human-readable format
fn print_human_readable(data: &Value) {
    match data {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{}:", key.cyan());
                        print_nested(value, 1);
                    }
                    _ => println!("{}: {}", key.cyan(), format_value(value)),
                }
            }
        }
        _ => println!("{}", format_value(data)),
    }
}

fn print_nested(value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{}{}:", indent, key.cyan());
                        print_nested(value, depth + 1);
                    }
                    _ => println!("{}{}: {}", indent, key.cyan(), format_value(value)),
                }
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                println!("{}{}", indent, "(empty)".dimmed());
            }
            for item in items {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{}-", indent);
                        print_nested(item, depth + 1);
                    }
                    _ => println!("{}- {}", indent, format_value(item)),
                }
            }
        }
        _ => println!("{}{}", indent, format_value(value)),
    }
}

/// Format a JSON value for human-readable output
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".dimmed().to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Print a render tree as an indented outline
pub fn print_render_tree(node: &RenderNode) {
    let mut lines = Vec::new();
    outline(node, 0, &mut lines);
    for line in lines {
        println!("{}", line);
    }
}

fn outline(node: &RenderNode, depth: usize, lines: &mut Vec<String>) {
    if node.hidden {
        return;
    }
    let indent = "  ".repeat(depth);
    let mut head = if node.label.is_empty() {
        format!("{}{}", indent, "(root)".dimmed())
    } else {
        format!("{}{}", indent, node.label.bold())
    };
    if node.disabled {
        head.push_str(&format!(" {}", "[disabled]".dimmed()));
    }

    match &node.control {
        Control::Leaf(leaf) => {
            let text = if leaf.text.is_empty() {
                leaf.placeholder
                    .as_deref()
                    .map(|p| p.dimmed().to_string())
                    .unwrap_or_default()
            } else {
                leaf.text.clone()
            };
            lines.push(format!("{}: {} {}", head, text, format!("({})", leaf.kind).dimmed()));
        }
        Control::Record { fields } => {
            lines.push(head);
            for field in fields {
                outline(field, depth + 1, lines);
            }
        }
        Control::Variant { selected, body, .. } => {
            let tag = selected.as_deref().unwrap_or("-");
            lines.push(format!("{} {}", head, format!("<{}>", tag).yellow()));
            if let Some(body) = body {
                outline(body, depth + 1, lines);
            }
        }
        Control::Optional { present, body } => {
            if *present {
                lines.push(head);
                if let Some(body) = body {
                    outline(body, depth + 1, lines);
                }
            } else {
                lines.push(format!("{}: {}", head, "none".dimmed()));
            }
        }
        Control::Vector { items, .. } => {
            lines.push(format!("{} {}", head, format!("[{}]", items.len()).dimmed()));
            for item in items {
                outline(item, depth + 1, lines);
            }
        }
        Control::LoadMore { type_id } => {
            lines.push(format!(
                "{} {}",
                head,
                format!("... more {} (expand {})", type_id, node.path).blue()
            ));
        }
        Control::Custom { content } => {
            lines.push(format!("{}: {}", head, format_value(content)));
        }
        Control::Payload(payload) => {
            let method = payload.method.as_deref().unwrap_or("-");
            lines.push(format!(
                "{}: {} {} {}",
                head,
                payload.bytes,
                format!("[{} {}]", payload.status, method).magenta(),
                payload.error.as_deref().unwrap_or("").red()
            ));
            if let Some(body) = &payload.body {
                outline(body, depth + 1, lines);
            }
        }
        Control::Unknown { reason } => {
            lines.push(format!("{}: {}", head, format!("? {}", reason).yellow()));
        }
        Control::Unavailable { reason } => {
            lines.push(format!("{}: {}", head, format!("unavailable: {}", reason).red()));
        }
    }

    for error in &node.errors {
        lines.push(format!("{}  {} {}", indent, "!".red().bold(), error.red()));
    }
    if let Some(end) = &node.end {
        lines.push(format!("{}  {}", indent, format_value(end).dimmed()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_form::{FieldPath, FormViewer, SettingsTable, TypeNode};
    use schema_form::PrimitiveKind;
    use serde_json::json;

    #[test]
    fn outline_skips_hidden_fields() {
        colored::control::set_override(false);
        let node = TypeNode::record([
            ("name", TypeNode::primitive(PrimitiveKind::Text)),
            ("secret", TypeNode::primitive(PrimitiveKind::Text)),
        ]);
        let table = SettingsTable::new().with(
            FieldPath::parse("secret"),
            schema_form::SettingsPatch::hidden(),
        );
        let rendered = FormViewer::from_json(node, &json!({"name": "ada", "secret": "x"}), table)
            .expect("mount")
            .render();

        let mut lines = Vec::new();
        outline(&rendered, 0, &mut lines);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "  Name: ada (text)");
    }
}
