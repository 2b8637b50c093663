use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// One line of a project listing
pub fn project_row(id: i64, name: Option<&str>, updated: &str) {
    let name = match name.filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => muted("(unnamed)"),
    };
    println!(
        "  {} {}  {}",
        format!("#{}", id).style(theme().key.clone()),
        name,
        dim(updated)
    );
}

/// Pretty-printed JSON, keys highlighted
pub fn json_block(value: &serde_json::Value) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    for line in rendered.lines() {
        match line.split_once("\": ") {
            Some((key, rest)) => println!("{}\": {}", key.style(theme().key.clone()), rest),
            None => println!("{}", line),
        }
    }
}
