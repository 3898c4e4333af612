//! `{key}` templates and name case styles.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Replace every `{key}` in `template` with its value from `insertions`.
///
/// Substitution is a single pass, so values containing `{...}` are inserted
/// verbatim. Placeholders with no matching key are left untouched.
pub fn insert_into_template(template: &str, insertions: &BTreeMap<String, String>) -> String {
    RE_PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match insertions.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// How a multi-word name is written in a given language's ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStyle {
    /// `MyProject`
    PascalCase,
    /// `myProject`
    CamelCase,
    /// `my_project`
    SnakeCase,
    /// `my-project`
    KebabCase,
}

impl CaseStyle {
    /// Render the words of `name` in this style.
    pub fn convert(self, name: &str) -> String {
        let words = split_name(name);
        match self {
            CaseStyle::PascalCase => words.iter().map(|w| capitalize(w)).collect(),
            CaseStyle::CamelCase => words
                .iter()
                .enumerate()
                .map(|(i, w)| if i == 0 { w.clone() } else { capitalize(w) })
                .collect(),
            CaseStyle::SnakeCase => words.join("_"),
            CaseStyle::KebabCase => words.join("-"),
        }
    }
}

/// Split a name into lowercase words.
///
/// Words are separated by any non-alphanumeric character and by a
/// lowercase-to-uppercase transition (`myProject` -> `my`, `project`).
pub fn split_name(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if c.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = c.is_lowercase() || c.is_numeric();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Escaping applied to a value before it lands inside a project file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// XML text and attribute content.
    Xml,
    /// A double-quoted JSON or Python string literal.
    DoubleQuoted,
    /// A double-quoted Ruby string literal; `#` would start interpolation.
    Ruby,
}

impl Escape {
    pub fn apply(self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            match (self, c) {
                (Escape::Xml, '&') => out.push_str("&amp;"),
                (Escape::Xml, '<') => out.push_str("&lt;"),
                (Escape::Xml, '>') => out.push_str("&gt;"),
                (Escape::Xml, '"') => out.push_str("&quot;"),
                (Escape::Xml, '\'') => out.push_str("&apos;"),
                (Escape::Xml, c) => out.push(c),
                (_, '\\') => out.push_str("\\\\"),
                (_, '"') => out.push_str("\\\""),
                (_, '\n') => out.push_str("\\n"),
                (_, '\r') => out.push_str("\\r"),
                (_, '\t') => out.push_str("\\t"),
                (Escape::Ruby, '#') => out.push_str("\\#"),
                (_, c) if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
                (_, c) => out.push(c),
            }
        }
        out
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn inserts_known_keys_everywhere() {
        let out = insert_into_template("{name}/{name}.{ext}", &values(&[("name", "a"), ("ext", "py")]));
        assert_eq!(out, "a/a.py");
    }

    #[test]
    fn leaves_unknown_placeholders() {
        let out = insert_into_template("{name} {version}", &values(&[("name", "a")]));
        assert_eq!(out, "a {version}");
    }

    #[test]
    fn does_not_resubstitute_values() {
        let out = insert_into_template("{a}", &values(&[("a", "{b}"), ("b", "x")]));
        assert_eq!(out, "{b}");
    }

    #[test]
    fn splits_mixed_names() {
        assert_eq!(split_name("My Project"), vec!["my", "project"]);
        assert_eq!(split_name("myProject"), vec!["my", "project"]);
        assert_eq!(split_name("my-project_v2"), vec!["my", "project", "v2"]);
        assert_eq!(split_name("HTTP server"), vec!["http", "server"]);
    }

    #[test]
    fn escapes_per_target() {
        assert_eq!(Escape::Xml.apply("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(Escape::DoubleQuoted.apply("say \"hi\"\\n"), "say \\\"hi\\\"\\\\n");
        assert_eq!(Escape::DoubleQuoted.apply("line\nnext"), "line\\nnext");
        assert_eq!(Escape::Ruby.apply("#{x}"), "\\#{x}");
        assert_eq!(Escape::DoubleQuoted.apply("#{x}"), "#{x}");
        assert_eq!(Escape::DoubleQuoted.apply("\u{1}"), "\\u0001");
    }

    #[test]
    fn converts_case_styles() {
        assert_eq!(CaseStyle::PascalCase.convert("my project"), "MyProject");
        assert_eq!(CaseStyle::CamelCase.convert("my project"), "myProject");
        assert_eq!(CaseStyle::SnakeCase.convert("My Project"), "my_project");
        assert_eq!(CaseStyle::KebabCase.convert("MyProject"), "my-project");
    }
}
