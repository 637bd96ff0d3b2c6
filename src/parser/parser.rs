//! Recursive descent parser for schema definition text
//!
//! Consumes the token stream produced by the [`Lexer`] and builds a
//! [`Schema`]: every `struct Name { ... };` declaration becomes a
//! [`StructContainer`], registered in the schema's symbol table as soon as its
//! closing `;` is consumed. Nested struct references are resolved against that
//! table immediately, so a struct can only refer to structs declared before it
//! in the same input (or in an included file that has already been parsed);
//! forward references and self references fail with
//! [`ParseError::UnknownType`].
//!
//! The parser does not recover: the first error aborts the parse and no
//! partial schema is returned.

use crate::parser::lexer::{Lexer, Token};
use crate::parser::schema::{Field, FieldType, Schema, SourceLocation, StructContainer};
use thiserror::Error;

/// Maximum nesting depth for `#include` directives. Bounds resolver cycles.
const MAX_INCLUDE_DEPTH: usize = 16;

/// Parser error type. Every variant carries the source position the
/// diagnostic points at; the core never prints, it only returns these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{location}: unrecognized character '{ch}'")]
    Lexical { ch: char, location: SourceLocation },

    #[error("{location}: expected {expected}, found {found}")]
    Syntax {
        expected: String,
        found: String,
        location: SourceLocation,
    },

    #[error("{location}: duplicate definition of struct '{name}'")]
    DuplicateDefinition { name: String, location: SourceLocation },

    #[error("{location}: unknown type '{name}'")]
    UnknownType { name: String, location: SourceLocation },

    #[error("{location}: invalid array width, found {found}")]
    InvalidArrayWidth { found: String, location: SourceLocation },

    #[error("{location}: cannot include '{path}': {reason}")]
    Include {
        path: String,
        reason: String,
        location: SourceLocation,
    },
}

impl ParseError {
    /// Source position the diagnostic points at.
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Lexical { location, .. }
            | ParseError::Syntax { location, .. }
            | ParseError::DuplicateDefinition { location, .. }
            | ParseError::UnknownType { location, .. }
            | ParseError::InvalidArrayWidth { location, .. }
            | ParseError::Include { location, .. } => *location,
        }
    }
}

/// Supplies the text of `#include`d schema files.
///
/// The parser core never touches the filesystem; a resolver maps an include
/// path to schema text however the host wants (disk, archive, test fixture).
/// `Err` carries a human-readable reason and surfaces as
/// [`ParseError::Include`].
pub trait IncludeResolver {
    fn resolve(&mut self, path: &str) -> Result<String, String>;
}

/// Recursive descent parser for the schema grammar.
///
/// Each parser owns its schema and symbol table for the duration of one
/// parse, so independent inputs can be parsed in isolation.
pub struct Parser<'r> {
    tokens: Vec<Token>,
    position: usize,
    resolver: Option<&'r mut dyn IncludeResolver>,
    include_depth: usize,
}

impl<'r> Parser<'r> {
    pub fn new(source: &str) -> Self {
        Self {
            tokens: Lexer::new(source).tokenize(),
            position: 0,
            resolver: None,
            include_depth: 0,
        }
    }

    /// Parse with `#include` support; `resolver` supplies included file text.
    pub fn with_resolver(source: &str, resolver: &'r mut dyn IncludeResolver) -> Self {
        Self {
            tokens: Lexer::new(source).tokenize(),
            position: 0,
            resolver: Some(resolver),
            include_depth: 0,
        }
    }

    /// Parse the entire input into a schema.
    pub fn parse_schema(&mut self) -> Result<Schema, ParseError> {
        let mut schema = Schema::new();
        self.parse_into(&mut schema)?;
        Ok(schema)
    }

    fn parse_into(&mut self, schema: &mut Schema) -> Result<(), ParseError> {
        loop {
            // stray semicolons between declarations are harmless
            while self.match_token(&Token::Semicolon(self.current_location())) {}
            self.lexical_guard()?;
            if self.is_at_end() {
                return Ok(());
            }
            if self.match_token(&Token::Hash(self.current_location())) {
                self.parse_include(schema)?;
            } else {
                self.parse_struct_decl(schema)?;
            }
        }
    }

    /// Parse one `struct Name { field* };` declaration and register it.
    fn parse_struct_decl(&mut self, schema: &mut Schema) -> Result<(), ParseError> {
        self.expect_token(&Token::Struct(self.current_location()), "'struct'")?;

        let name_loc = self.current_location();
        let name = self.expect_identifier("struct name")?;

        self.expect_token(
            &Token::LBrace(self.current_location()),
            "'{' after struct name",
        )?;

        let mut fields = Vec::new();
        loop {
            while self.match_token(&Token::Semicolon(self.current_location())) {}
            if self.match_token(&Token::RBrace(self.current_location())) {
                break;
            }
            fields.push(self.parse_field(schema)?);
        }

        self.expect_token(
            &Token::Semicolon(self.current_location()),
            "';' after struct definition",
        )?;

        let container = StructContainer {
            name: name.clone(),
            fields,
        };
        if schema.insert(container).is_err() {
            return Err(ParseError::DuplicateDefinition {
                name,
                location: name_loc,
            });
        }
        Ok(())
    }

    /// Parse one `type name;` / `type name[width];` field declaration.
    fn parse_field(&mut self, schema: &Schema) -> Result<Field, ParseError> {
        self.lexical_guard()?;

        let type_loc = self.current_location();
        let ty = match self.peek_token() {
            Token::Bool(_) => {
                self.advance();
                FieldType::Bool
            }
            Token::Int(_) => {
                self.advance();
                FieldType::Int
            }
            Token::Long(_) => {
                self.advance();
                FieldType::Long
            }
            Token::Float(_) => {
                self.advance();
                FieldType::Float
            }
            Token::Double(_) => {
                self.advance();
                FieldType::Double
            }
            Token::Sstring(_) => {
                self.advance();
                FieldType::ShortString
            }
            Token::Struct(_) => {
                // `struct Name field;` — explicit nested struct reference
                self.advance();
                let loc = self.current_location();
                let name = self.expect_identifier("struct name")?;
                self.resolve_struct(schema, name, loc)?
            }
            Token::Ident(name, loc) => {
                // bare identifier: a reference to an already-defined struct
                self.advance();
                self.resolve_struct(schema, name, loc)?
            }
            other => {
                return Err(ParseError::Syntax {
                    expected: "field type".to_string(),
                    found: other.to_string(),
                    location: type_loc,
                })
            }
        };

        let name = self.expect_identifier("field name")?;

        let array_len = if self.match_token(&Token::LBracket(self.current_location())) {
            let width = self.parse_array_width()?;
            self.expect_token(
                &Token::RBracket(self.current_location()),
                "']' after array width",
            )?;
            Some(width)
        } else {
            None
        };

        self.expect_token(
            &Token::Semicolon(self.current_location()),
            "';' after field declaration",
        )?;

        Ok(Field {
            name,
            ty,
            array_len,
        })
    }

    /// Resolution is immediate: the referenced struct must already be
    /// registered in the schema's symbol table.
    fn resolve_struct(
        &self,
        schema: &Schema,
        name: String,
        location: SourceLocation,
    ) -> Result<FieldType, ParseError> {
        if schema.contains(&name) {
            Ok(FieldType::Struct(name))
        } else {
            Err(ParseError::UnknownType { name, location })
        }
    }

    /// Array widths must be integer literals greater than zero.
    fn parse_array_width(&mut self) -> Result<usize, ParseError> {
        self.lexical_guard()?;
        let loc = self.current_location();
        match self.peek_token() {
            Token::IntLiteral(n, _) if n > 0 => {
                self.advance();
                Ok(n as usize)
            }
            other => Err(ParseError::InvalidArrayWidth {
                found: other.to_string(),
                location: loc,
            }),
        }
    }

    /// Parse `include "path"` after a consumed `#` and splice the resolved
    /// file into the same schema.
    fn parse_include(&mut self, schema: &mut Schema) -> Result<(), ParseError> {
        let hash_loc = self.previous_location();

        let keyword_loc = self.current_location();
        let keyword = self.expect_identifier("'include' after '#'")?;
        if keyword != "include" {
            return Err(ParseError::Syntax {
                expected: "'include' after '#'".to_string(),
                found: format!("identifier '{}'", keyword),
                location: keyword_loc,
            });
        }

        self.lexical_guard()?;
        let path_loc = self.current_location();
        let path = match self.peek_token() {
            Token::StringLiteral(path, _) => {
                self.advance();
                path
            }
            other => {
                return Err(ParseError::Syntax {
                    expected: "include path".to_string(),
                    found: other.to_string(),
                    location: path_loc,
                })
            }
        };

        if self.include_depth >= MAX_INCLUDE_DEPTH {
            return Err(ParseError::Include {
                path,
                reason: "include depth limit exceeded".to_string(),
                location: hash_loc,
            });
        }
        let Some(resolver) = self.resolver.take() else {
            return Err(ParseError::Include {
                path,
                reason: "no include resolver configured".to_string(),
                location: hash_loc,
            });
        };
        let source = match resolver.resolve(&path) {
            Ok(source) => source,
            Err(reason) => {
                self.resolver = Some(resolver);
                return Err(ParseError::Include {
                    path,
                    reason,
                    location: hash_loc,
                });
            }
        };

        // the included file shares this parse's schema and symbol table
        let mut sub = Parser {
            tokens: Lexer::new(&source).tokenize(),
            position: 0,
            resolver: Some(resolver),
            include_depth: self.include_depth + 1,
        };
        let result = sub.parse_into(schema);
        self.resolver = sub.resolver;
        result.map_err(|e| ParseError::Include {
            path,
            reason: e.to_string(),
            location: hash_loc,
        })
    }

    // ===== Helper methods =====

    /// Fail with [`ParseError::Lexical`] when the lexer flagged the current
    /// token as unrecognizable input.
    fn lexical_guard(&self) -> Result<(), ParseError> {
        if let Token::Error(ch, location) = self.peek() {
            Err(ParseError::Lexical {
                ch: *ch,
                location: *location,
            })
        } else {
            Ok(())
        }
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if std::mem::discriminant(self.peek()) == std::mem::discriminant(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_token(&self) -> Token {
        self.tokens[self.position].clone()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.position - 1]
    }

    fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    fn expect_token(&mut self, token: &Token, expected: &str) -> Result<(), ParseError> {
        self.lexical_guard()?;
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::Syntax {
                expected: expected.to_string(),
                found: self.peek().to_string(),
                location: self.current_location(),
            })
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        self.lexical_guard()?;
        if let Token::Ident(name, _) = self.peek_token() {
            self.advance();
            Ok(name)
        } else {
            Err(ParseError::Syntax {
                expected: expected.to_string(),
                found: self.peek().to_string(),
                location: self.current_location(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Schema, ParseError> {
        Parser::new(source).parse_schema()
    }

    #[test]
    fn test_parse_single_struct() {
        let schema = parse("struct Point { int x; int y; };").unwrap();

        assert_eq!(schema.len(), 1);
        let point = schema.get("Point").unwrap();
        assert_eq!(point.name, "Point");
        assert_eq!(
            point.fields,
            vec![
                Field {
                    name: "x".to_string(),
                    ty: FieldType::Int,
                    array_len: None,
                },
                Field {
                    name: "y".to_string(),
                    ty: FieldType::Int,
                    array_len: None,
                },
            ]
        );
    }

    #[test]
    fn test_parse_all_scalar_types() {
        let schema = parse(
            "struct Mixed { bool a; int b; long c; float d; double e; sstring f; };",
        )
        .unwrap();

        let types: Vec<&FieldType> = schema.get("Mixed").unwrap().fields.iter().map(|f| &f.ty).collect();
        assert_eq!(
            types,
            vec![
                &FieldType::Bool,
                &FieldType::Int,
                &FieldType::Long,
                &FieldType::Float,
                &FieldType::Double,
                &FieldType::ShortString,
            ]
        );
    }

    #[test]
    fn test_nested_struct_reference() {
        let schema = parse("struct A { int x; }; struct B { struct A inner; };").unwrap();

        let b = schema.get("B").unwrap();
        assert_eq!(b.fields[0].ty, FieldType::Struct("A".to_string()));
        assert_eq!(b.fields[0].ty.nested_struct_name(), Some("A"));
    }

    #[test]
    fn test_nested_struct_reference_bare_identifier() {
        let schema = parse("struct A { int x; }; struct B { A inner; };").unwrap();

        let b = schema.get("B").unwrap();
        assert_eq!(b.fields[0].ty, FieldType::Struct("A".to_string()));
    }

    #[test]
    fn test_duplicate_definition() {
        let err = parse("struct A { int x; }; struct A { float y; };").unwrap_err();

        assert_eq!(
            err,
            ParseError::DuplicateDefinition {
                name: "A".to_string(),
                location: SourceLocation::new(1, 29),
            }
        );
    }

    #[test]
    fn test_array_field() {
        let schema = parse("struct C { int arr[5]; };").unwrap();

        let field = &schema.get("C").unwrap().fields[0];
        assert_eq!(field.name, "arr");
        assert_eq!(field.ty, FieldType::Int);
        assert_eq!(field.array_len, Some(5));
    }

    #[test]
    fn test_array_width_zero_rejected() {
        let err = parse("struct C { int arr[0]; };").unwrap_err();
        assert!(matches!(err, ParseError::InvalidArrayWidth { .. }));
    }

    #[test]
    fn test_array_width_missing_rejected() {
        let err = parse("struct C { int arr[]; };").unwrap_err();
        assert!(matches!(err, ParseError::InvalidArrayWidth { .. }));
    }

    #[test]
    fn test_array_width_must_be_integer() {
        let err = parse("struct C { int arr[n]; };").unwrap_err();
        assert!(matches!(err, ParseError::InvalidArrayWidth { .. }));

        let err = parse("struct C { int arr[2.5]; };").unwrap_err();
        assert!(matches!(err, ParseError::InvalidArrayWidth { .. }));
    }

    #[test]
    fn test_unterminated_struct() {
        let err = parse("struct D { int x;").unwrap_err();

        // the syntax error points at the position where input ran out
        match err {
            ParseError::Syntax { location, .. } => {
                assert_eq!(location, SourceLocation::new(1, 18));
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type() {
        let err = parse("struct B { struct A inner; };").unwrap_err();

        assert_eq!(
            err,
            ParseError::UnknownType {
                name: "A".to_string(),
                location: SourceLocation::new(1, 19),
            }
        );
    }

    #[test]
    fn test_forward_reference_fails() {
        // resolution is immediate, so B cannot see the later A
        let err = parse("struct B { A inner; }; struct A { int x; };").unwrap_err();
        assert!(matches!(err, ParseError::UnknownType { ref name, .. } if name == "A"));
    }

    #[test]
    fn test_self_reference_fails() {
        // a struct is registered only once its declaration completes
        let err = parse("struct A { A again; };").unwrap_err();
        assert!(matches!(err, ParseError::UnknownType { ref name, .. } if name == "A"));
    }

    #[test]
    fn test_lexical_error() {
        let err = parse("struct P { int $x; };").unwrap_err();

        assert_eq!(
            err,
            ParseError::Lexical {
                ch: '$',
                location: SourceLocation::new(1, 16),
            }
        );
    }

    #[test]
    fn test_missing_field_name() {
        let err = parse("struct A { int ; };").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { ref expected, .. } if expected == "field name"));
    }

    #[test]
    fn test_missing_semicolon_after_struct() {
        let err = parse("struct A { int x; }").unwrap_err();
        assert!(
            matches!(err, ParseError::Syntax { ref expected, .. } if expected == "';' after struct definition")
        );
    }

    #[test]
    fn test_struct_keyword_missing() {
        let err = parse("Point { int x; };").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { ref expected, .. } if expected == "'struct'"));
    }

    #[test]
    fn test_empty_struct() {
        let schema = parse("struct Empty { };").unwrap();
        assert!(schema.get("Empty").unwrap().fields.is_empty());
    }

    #[test]
    fn test_stray_semicolons() {
        let schema = parse(";; struct A { int x;; }; ;").unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("A").unwrap().fields.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let schema = parse("").unwrap();
        assert!(schema.is_empty());

        let schema = parse("// nothing but a comment\n").unwrap();
        assert!(schema.is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "struct A { int x; }; struct B { struct A inner; long zs[3]; };";
        let first = parse(source).unwrap();
        let second = parse(source).unwrap();

        assert_eq!(first.containers(), second.containers());
    }

    #[test]
    fn test_include_without_resolver() {
        let err = parse("#include \"common.schema\"").unwrap_err();
        assert!(matches!(err, ParseError::Include { ref path, .. } if path == "common.schema"));
    }
}
