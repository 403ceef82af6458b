use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

/// Section banner, e.g. `📊 Statistics`
pub fn header(icon: &str, text: &str) {
    println!("{} {}", icon, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

/// Warnings go to stderr so `--format json` output stays parseable
pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

/// Indented `label value` line under a header
pub fn summary_row(label: &str, value: &str) {
    println!("  {:<18} {}", label.style(theme().dim.clone()), value);
}
