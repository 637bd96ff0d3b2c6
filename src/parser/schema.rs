// Schema model definitions: the output of a parse, consumed by code emitters

use crate::symbol_table::{DuplicateKey, SymbolTable};
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Field types supported by the schema language.
///
/// A nested struct reference carries the referenced struct's name in its
/// payload, so a field is a struct reference exactly when it has a referenced
/// name to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Int,
    Long,
    Float,
    Double,
    ShortString,
    Struct(String), // name of the referenced struct
}

impl FieldType {
    /// Name of the referenced struct, for nested struct fields.
    pub fn nested_struct_name(&self) -> Option<&str> {
        match self {
            FieldType::Struct(name) => Some(name),
            _ => None,
        }
    }
}

/// One named, typed member of a struct container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    /// Fixed-size array width; always greater than zero when present.
    pub array_len: Option<usize>,
}

/// One named record definition with an ordered field list.
///
/// Built up field by field while its declaration parses, then frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructContainer {
    pub name: String,
    pub fields: Vec<Field>,
}

/// The complete set of struct containers parsed from one input.
///
/// Containers are kept in declaration order — later structs may reference
/// earlier ones, and emitters walk them in this order. The symbol table maps
/// each struct name to its declaration index for cross-reference lookups.
#[derive(Debug, Clone)]
pub struct Schema {
    containers: Vec<StructContainer>,
    symbols: SymbolTable<usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self {
            containers: Vec::new(),
            symbols: SymbolTable::new(),
        }
    }

    /// Register a finished container under its name.
    ///
    /// Fails without modifying the schema when the name is already taken.
    pub(crate) fn insert(&mut self, container: StructContainer) -> Result<(), DuplicateKey> {
        let index = self.containers.len();
        self.symbols.insert(container.name.clone(), index)?;
        self.containers.push(container);
        Ok(())
    }

    /// Look up a struct definition by name.
    pub fn get(&self, name: &str) -> Option<&StructContainer> {
        self.symbols.get(name).map(|&index| &self.containers[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// All containers, in declaration order.
    pub fn containers(&self) -> &[StructContainer] {
        &self.containers
    }

    /// The name → declaration-index symbol table.
    pub fn symbols(&self) -> &SymbolTable<usize> {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
