//! Line parser for the IR.
//!
//! Every non-blank line has the shape `<command> : <arguments>`. Leading
//! whitespace is kept so printers can reproduce the nesting.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// `indent`, `command`, `arguments`.
static RE_INSTRUCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)([a-z][a-z ]*?)\s*:\s*(.*?)\s*$").unwrap());

/// A problem found while parsing IR source. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("line {line}: expected '<command> : <arguments>', found {text:?}")]
    Malformed { line: usize, text: String },

    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand { line: usize, command: String },

    #[error("line {line}: '{command}' requires {expected}")]
    MissingArgument {
        line: usize,
        command: &'static str,
        expected: &'static str,
    },
}

/// One parsed instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Blank,
    CommentLine(String),
    Print(String),
    Variable { name: String, value: String },
}

/// An instruction together with the indentation it appeared at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub indent: String,
    pub instruction: Instruction,
}

/// Parse IR source into lines.
pub fn parse(source: &str) -> Result<Vec<Line>, SyntaxError> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| parse_line(i + 1, raw))
        .collect()
}

fn parse_line(line: usize, raw: &str) -> Result<Line, SyntaxError> {
    if raw.trim().is_empty() {
        return Ok(Line {
            indent: String::new(),
            instruction: Instruction::Blank,
        });
    }

    let caps = RE_INSTRUCTION
        .captures(raw)
        .ok_or_else(|| SyntaxError::Malformed {
            line,
            text: raw.to_string(),
        })?;
    let indent = caps[1].to_string();
    let command = caps[2].trim_end();
    let args = caps[3].to_string();

    let instruction = match command {
        "comment line" => Instruction::CommentLine(args),
        "print" => {
            if args.is_empty() {
                return Err(SyntaxError::MissingArgument {
                    line,
                    command: "print",
                    expected: "a value",
                });
            }
            Instruction::Print(args)
        }
        "variable" => {
            let (name, value) = args
                .split_once(char::is_whitespace)
                .map(|(n, v)| (n.to_string(), v.trim_start().to_string()))
                .filter(|(n, v)| !n.is_empty() && !v.is_empty())
                .ok_or(SyntaxError::MissingArgument {
                    line,
                    command: "variable",
                    expected: "a name and a value",
                })?;
            Instruction::Variable { name, value }
        }
        other => {
            return Err(SyntaxError::UnknownCommand {
                line,
                command: other.to_string(),
            })
        }
    };

    Ok(Line {
        indent,
        instruction,
    })
}
