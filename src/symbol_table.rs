//! Symbol table of the assembler.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// First address handed out to variables.
pub const VARIABLE_BASE: u16 = 16;

lazy_static! {
    /// Symbols every program can use without defining them.
    pub static ref PREDEFINED: HashMap<&'static str, u16> = {
        let mut symbols = HashMap::new();

        for (index, name) in ["R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9",
            "R10", "R11", "R12", "R13", "R14", "R15"].iter().enumerate()
        {
            symbols.insert(*name, index as u16);
        }

        symbols.insert("SP", 0);
        symbols.insert("LCL", 1);
        symbols.insert("ARG", 2);
        symbols.insert("THIS", 3);
        symbols.insert("THAT", 4);
        symbols.insert("SCREEN", 16384);
        symbols.insert("KBD", 24576);

        symbols
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Predefined,
    /// Bound to an instruction address by a `(label)` line.
    Label,
    /// Allocated a data address on first use.
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub address: u16,
    pub kind: SymbolKind,
    /// Line of the label definition or of the first use of a variable.
    pub defined: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    inner: HashMap<String, SymbolInfo>,
    next_variable: u16,
}

impl Default for SymbolTable {
    fn default() -> SymbolTable {
        SymbolTable::new()
    }
}

impl SymbolTable {
    /// Creates a table holding only the predefined symbols.
    pub fn new() -> SymbolTable {
        let inner = PREDEFINED.iter()
            .map(|(name, address)| (name.to_string(), SymbolInfo {
                address: *address,
                kind: SymbolKind::Predefined,
                defined: None,
            }))
            .collect();

        SymbolTable {
            inner,
            next_variable: VARIABLE_BASE,
        }
    }

    pub fn get(&self, name: &str) -> Option<&SymbolInfo> {
        self.inner.get(name)
    }

    pub fn address(&self, name: &str) -> Option<u16> {
        self.get(name).map(|info| info.address)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Binds a label. If the name is already taken, the table is left unchanged and the
    /// existing symbol is returned.
    pub fn define_label(&mut self, name: &str, address: u16, line: usize) -> Result<(), SymbolInfo> {
        if let Some(existing) = self.inner.get(name) {
            return Err(existing.clone());
        }

        self.inner.insert(name.to_string(), SymbolInfo {
            address,
            kind: SymbolKind::Label,
            defined: Some(line),
        });

        Ok(())
    }

    /// Returns the address of `name`, allocating the next free variable address if the
    /// name is not known yet.
    pub fn get_or_allocate(&mut self, name: &str, line: usize) -> u16 {
        if let Some(info) = self.inner.get(name) {
            return info.address;
        }

        let address = self.next_variable;
        self.next_variable += 1;

        self.inner.insert(name.to_string(), SymbolInfo {
            address,
            kind: SymbolKind::Variable,
            defined: Some(line),
        });

        address
    }

    /// Symbols of `kind`, ordered by address.
    pub fn symbols_of(&self, kind: SymbolKind) -> Vec<(&str, &SymbolInfo)> {
        let mut symbols = self.inner.iter()
            .filter(|(_, info)| info.kind == kind)
            .map(|(name, info)| (name.as_str(), info))
            .collect::<Vec<_>>();

        symbols.sort_by_key(|(name, info)| (info.address, *name));
        symbols
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined() {
        let table = SymbolTable::new();
        assert_eq!(table.address("R13"), Some(13));
        assert_eq!(table.address("THAT"), Some(4));
        assert_eq!(table.address("SCREEN"), Some(16384));
        assert_eq!(table.address("KBD"), Some(24576));
        assert_eq!(table.address("R16"), None);
    }

    #[test]
    fn test_variables_are_dense() {
        let mut table = SymbolTable::new();
        assert_eq!(table.get_or_allocate("i", 1), 16);
        assert_eq!(table.get_or_allocate("sum", 2), 17);
        assert_eq!(table.get_or_allocate("i", 3), 16);
        assert_eq!(table.get_or_allocate("R2", 4), 2);

        let variables = table.symbols_of(SymbolKind::Variable)
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        assert_eq!(variables, vec!["i", "sum"]);
    }

    #[test]
    fn test_labels_cannot_be_redefined() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define_label("LOOP", 4, 7), Ok(()));

        let existing = table.define_label("LOOP", 9, 12).unwrap_err();
        assert_eq!(existing.defined, Some(7));
        assert_eq!(table.address("LOOP"), Some(4));

        assert_eq!(table.define_label("SP", 1, 13).unwrap_err().kind, SymbolKind::Predefined);
    }
}
