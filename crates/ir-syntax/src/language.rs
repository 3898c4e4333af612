//! Target languages and their printers.

use crate::parse::{parse, Instruction, Line, SyntaxError};
use crate::template::{insert_into_template, CaseStyle, Escape};
use std::collections::BTreeMap;
use std::fmt;

/// The project file a language's ecosystem expects next to its sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectFormat {
    /// File name template, e.g. `{name}.csproj`.
    pub file_name: &'static str,
    /// Case style the project name is converted to before insertion.
    pub name_style: CaseStyle,
    /// File contents template, one entry per line.
    pub file_format: &'static [&'static str],
    /// How values are escaped before insertion into `file_format`.
    pub escape: Escape,
}

/// A target language the IR can be printed as.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    /// Output file extension, including the leading dot.
    pub extension: &'static str,
    /// `{text}`
    pub comment: &'static str,
    /// `{value}`
    pub print: &'static str,
    /// `{name}`, `{value}`
    pub variable: &'static str,
    pub project: ProjectFormat,
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .finish()
    }
}

impl Language {
    /// Parse IR source and print it in this language.
    pub fn convert(&self, source: &str) -> Result<String, SyntaxError> {
        let lines = parse(source)?;
        Ok(self.render(&lines))
    }

    /// Print already-parsed lines. Every line, including the last, ends in `\n`.
    pub fn render(&self, lines: &[Line]) -> String {
        let mut out = String::new();
        for line in lines {
            let text = match &line.instruction {
                Instruction::Blank => String::new(),
                Instruction::CommentLine(text) => fill(self.comment, &[("text", text)]),
                Instruction::Print(value) => fill(self.print, &[("value", value)]),
                Instruction::Variable { name, value } => {
                    fill(self.variable, &[("name", name), ("value", value)])
                }
            };
            if !text.is_empty() {
                out.push_str(&line.indent);
                out.push_str(text.trim_end());
            }
            out.push('\n');
        }
        out
    }
}

fn fill(template: &str, pairs: &[(&str, &str)]) -> String {
    let values: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    insert_into_template(template, &values)
}

// ── Built-in languages ───────────────────────────────────────────────────────

pub static LANGUAGES: &[Language] = &[
    Language {
        name: "C#",
        extension: ".cs",
        comment: "// {text}",
        print: "System.Console.WriteLine({value});",
        variable: "var {name} = {value};",
        project: ProjectFormat {
            file_name: "{name}.csproj",
            name_style: CaseStyle::PascalCase,
            file_format: &[
                "<Project Sdk=\"Microsoft.NET.Sdk\">",
                "  <PropertyGroup>",
                "    <AssemblyName>{name}</AssemblyName>",
                "    <Description>{description}</Description>",
                "    <Version>{version}</Version>",
                "  </PropertyGroup>",
                "</Project>",
            ],
            escape: Escape::Xml,
        },
    },
    Language {
        name: "Java",
        extension: ".java",
        comment: "// {text}",
        print: "System.out.println({value});",
        variable: "var {name} = {value};",
        project: ProjectFormat {
            file_name: "pom.xml",
            name_style: CaseStyle::KebabCase,
            file_format: &[
                "<project>",
                "  <modelVersion>4.0.0</modelVersion>",
                "  <artifactId>{name}</artifactId>",
                "  <description>{description}</description>",
                "  <version>{version}</version>",
                "</project>",
            ],
            escape: Escape::Xml,
        },
    },
    Language {
        name: "JavaScript",
        extension: ".js",
        comment: "// {text}",
        print: "console.log({value});",
        variable: "let {name} = {value};",
        project: ProjectFormat {
            file_name: "package.json",
            name_style: CaseStyle::KebabCase,
            file_format: &[
                "{",
                "    \"name\": \"{name}\",",
                "    \"description\": \"{description}\",",
                "    \"version\": \"{version}\"",
                "}",
            ],
            escape: Escape::DoubleQuoted,
        },
    },
    Language {
        name: "Python",
        extension: ".py",
        comment: "# {text}",
        print: "print({value})",
        variable: "{name} = {value}",
        project: ProjectFormat {
            file_name: "setup.py",
            name_style: CaseStyle::SnakeCase,
            file_format: &[
                "from setuptools import setup",
                "",
                "setup(",
                "    name=\"{name}\",",
                "    description=\"{description}\",",
                "    version=\"{version}\",",
                ")",
            ],
            escape: Escape::DoubleQuoted,
        },
    },
    Language {
        name: "Ruby",
        extension: ".rb",
        comment: "# {text}",
        print: "puts {value}",
        variable: "{name} = {value}",
        project: ProjectFormat {
            file_name: "{name}.gemspec",
            name_style: CaseStyle::SnakeCase,
            file_format: &[
                "Gem::Specification.new do |s|",
                "  s.name = \"{name}\"",
                "  s.summary = \"{description}\"",
                "  s.version = \"{version}\"",
                "end",
            ],
            escape: Escape::Ruby,
        },
    },
];

/// Look up a built-in language by its exact name.
pub fn by_name(name: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.name == name)
}

/// Names of every built-in language, in registration order.
pub fn names() -> Vec<&'static str> {
    LANGUAGES.iter().map(|l| l.name).collect()
}
