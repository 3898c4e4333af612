//! # ir-syntax
//!
//! A small line-oriented intermediate representation ("IR") and the printers
//! that turn it into source code for a handful of target languages.
//!
//! ```text
//! comment line : Says hello
//! variable : greeting "Hello world!"
//! print : greeting
//! ```
//!
//! becomes, for Python:
//!
//! ```text
//! # Says hello
//! greeting = "Hello world!"
//! print(greeting)
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! let python = ir_syntax::by_name("Python").unwrap();
//! let output = python.convert("print : \"hi\"\n").unwrap();
//! assert_eq!(output, "print(\"hi\")\n");
//! ```
//!
//! Each [`Language`] also carries a [`ProjectFormat`] describing the project
//! file (`package.json`, `setup.py`, ...) a caller may want to emit alongside
//! converted sources; see [`insert_into_template`] and [`CaseStyle`].

// ── Modules ──────────────────────────────────────────────────────────────────

pub mod language;
pub mod parse;
pub mod template;

// ── Re-exports ───────────────────────────────────────────────────────────────

pub use language::{by_name, names, Language, ProjectFormat, LANGUAGES};
pub use parse::{parse, Instruction, Line, SyntaxError};
pub use template::{insert_into_template, split_name, CaseStyle, Escape};
