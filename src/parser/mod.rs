//! Schema front end
//!
//! This module transforms schema definition text into the schema model a code
//! emitter consumes:
//! - [`lexer`]: Tokenization (schema text → tokens)
//! - [`parser`]: Parsing (tokens → schema model)
//! - [`schema`]: Schema model definitions
//!
//! # Schema language
//!
//! ```text
//! schema      := struct_decl*
//! struct_decl := "struct" identifier "{" field_decl* "}" ";"
//! field_decl  := type_name identifier ( "[" integer "]" )? ";"
//! type_name   := "bool" | "int" | "long" | "float" | "double" | "sstring"
//!              | "struct" identifier | identifier
//! ```
//!
//! A `type_name` that is not a built-in names a struct declared earlier in the
//! same parse. `//` and `/* */` comments are skipped. `#include "file"` pulls
//! another schema file into the same parse when an
//! [`IncludeResolver`](parser::IncludeResolver) is configured.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser over a hand-written lexer.
//! No external parser generator dependencies.

pub mod lexer;
pub mod parser;
pub mod schema;
