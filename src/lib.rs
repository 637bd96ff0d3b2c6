//! # Introduction
//!
//! jsongen is the front end of a struct→JSON code generator: it parses a
//! small struct definition language (scalar fields, fixed-size arrays, nested
//! structs) and produces the schema model that a source code emitter walks to
//! generate serialization and deserialization routines. Reading schema files,
//! driving the command line and emitting generated source are the host
//! program's business; this crate only turns text into a checked schema.
//!
//! ## Pipeline
//!
//! ```text
//! Schema text → Lexer → Parser → Schema (containers + symbol table) → emitter
//! ```
//!
//! 1. [`parser::lexer`] — tokenises schema text, attaching a line/column
//!    position to every token.
//! 2. [`parser::parser`] — recursive descent over the token stream; registers
//!    every finished struct in the symbol table and resolves nested struct
//!    references against it immediately.
//! 3. [`symbol_table`] — name → definition lookup used during resolution and
//!    later by the emitter for cross references.
//!
//! ## Example
//!
//! ```
//! use jsongen::parser::parser::Parser;
//!
//! let schema = Parser::new("struct Point { int x; int y; };")
//!     .parse_schema()
//!     .unwrap();
//!
//! assert_eq!(schema.containers()[0].name, "Point");
//! assert_eq!(schema.get("Point").unwrap().fields.len(), 2);
//! ```

pub mod parser;
pub mod symbol_table;
