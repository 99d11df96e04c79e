//! Symbol tables of the compiler: one for the class scope, one for the subroutine scope.

use std::collections::HashMap;
use std::fmt;

use crate::suggest;
use crate::vm::Segment;

use super::ast::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Static,
    Field,
    Argument,
    Local,
}

impl SymbolKind {
    fn slot(self) -> usize {
        match self {
            SymbolKind::Static => 0,
            SymbolKind::Field => 1,
            SymbolKind::Argument => 2,
            SymbolKind::Local => 3,
        }
    }

    /// The memory segment through which variables of this kind are accessed.
    pub fn segment(self) -> Segment {
        match self {
            SymbolKind::Static => Segment::Static,
            SymbolKind::Field => Segment::This,
            SymbolKind::Argument => Segment::Argument,
            SymbolKind::Local => Segment::Local,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SymbolKind::Static => "static",
            SymbolKind::Field => "field",
            SymbolKind::Argument => "argument",
            SymbolKind::Local => "local",
        };

        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub ty: Type,
    pub kind: SymbolKind,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndefinedSymbol {
    pub name: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for UndefinedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "undefined variable '{}'{}", self.name, suggest::hint(&self.suggestion))
    }
}

impl std::error::Error for UndefinedSymbol {}

/// Maps names to typed, indexed variables. Indices are handed out per kind, starting
/// from zero.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    counts: [u16; 4],
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Defines `name` at the next free index of `kind`. A previous definition with the same
    /// name is replaced and returned.
    pub fn define(&mut self, name: &str, ty: Type, kind: SymbolKind) -> Option<Symbol> {
        let index = self.counts[kind.slot()];
        self.counts[kind.slot()] += 1;

        self.symbols.insert(name.to_string(), Symbol { ty, kind, index })
    }

    /// Number of variables of `kind` defined since the last reset.
    pub fn var_count(&self, kind: SymbolKind) -> u16 {
        self.counts[kind.slot()]
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Result<SymbolKind, UndefinedSymbol> {
        self.lookup(name).map(|symbol| symbol.kind)
    }

    pub fn type_of(&self, name: &str) -> Result<&Type, UndefinedSymbol> {
        self.lookup(name).map(|symbol| &symbol.ty)
    }

    pub fn index_of(&self, name: &str) -> Result<u16, UndefinedSymbol> {
        self.lookup(name).map(|symbol| symbol.index)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    pub fn reset(&mut self) {
        self.symbols.clear();
        self.counts = [0; 4];
    }

    fn lookup(&self, name: &str) -> Result<&Symbol, UndefinedSymbol> {
        self.get(name).ok_or_else(|| UndefinedSymbol {
            name: name.to_string(),
            suggestion: suggest::closest(name, self.names()).map(str::to_string),
        })
    }
}

/// Resolves names in the subroutine scope first and in the class scope second.
#[derive(Debug, Clone, Default)]
pub struct Scopes {
    pub class: SymbolTable,
    pub subroutine: SymbolTable,
}

impl Scopes {
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.subroutine.get(name)
            .or_else(|| self.class.get(name))
    }

    /// Like [Scopes::resolve], but an unknown name is an error which suggests the closest
    /// visible name.
    pub fn lookup(&self, name: &str) -> Result<&Symbol, UndefinedSymbol> {
        self.resolve(name).ok_or_else(|| {
            let visible = self.subroutine.names().chain(self.class.names());

            UndefinedSymbol {
                name: name.to_string(),
                suggestion: suggest::closest(name, visible).map(str::to_string),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_per_kind() {
        let mut table = SymbolTable::new();
        table.define("a", Type::Int, SymbolKind::Argument);
        table.define("x", Type::Int, SymbolKind::Local);
        table.define("b", Type::Boolean, SymbolKind::Argument);

        assert_eq!(table.index_of("a"), Ok(0));
        assert_eq!(table.index_of("b"), Ok(1));
        assert_eq!(table.index_of("x"), Ok(0));
        assert_eq!(table.var_count(SymbolKind::Argument), 2);
        assert_eq!(table.var_count(SymbolKind::Static), 0);
        assert_eq!(table.type_of("b"), Ok(&Type::Boolean));
        assert_eq!(table.kind_of("x"), Ok(SymbolKind::Local));
    }

    #[test]
    fn test_redefinition_returns_previous() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("x", Type::Int, SymbolKind::Local), None);

        let previous = table.define("x", Type::Char, SymbolKind::Local);
        assert_eq!(previous, Some(Symbol { ty: Type::Int, kind: SymbolKind::Local, index: 0 }));
        assert_eq!(table.index_of("x"), Ok(1));
    }

    #[test]
    fn test_reset() {
        let mut table = SymbolTable::new();
        table.define("x", Type::Int, SymbolKind::Field);
        table.reset();

        assert!(!table.has_name("x"));
        assert_eq!(table.var_count(SymbolKind::Field), 0);
    }

    #[test]
    fn test_undefined_suggests() {
        let mut table = SymbolTable::new();
        table.define("count", Type::Int, SymbolKind::Local);

        let err = table.kind_of("conut").unwrap_err();
        assert_eq!(err.suggestion, Some("count".into()));
        assert_eq!(err.to_string(), "undefined variable 'conut' (did you mean 'count'?)");
    }

    #[test]
    fn test_subroutine_scope_shadows_class_scope() {
        let mut scopes = Scopes::default();
        scopes.class.define("x", Type::Int, SymbolKind::Field);
        scopes.class.define("y", Type::Int, SymbolKind::Static);
        scopes.subroutine.define("x", Type::Char, SymbolKind::Local);

        assert_eq!(scopes.lookup("x").map(|s| s.kind), Ok(SymbolKind::Local));
        assert_eq!(scopes.lookup("y").map(|s| s.kind), Ok(SymbolKind::Static));
        assert!(scopes.lookup("z").is_err());
    }

    #[test]
    fn test_fields_live_in_this() {
        assert_eq!(SymbolKind::Field.segment(), Segment::This);
    }
}
