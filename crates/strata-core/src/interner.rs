//! Name table for rule and field names.
//!
//! Grammars refer to field names through `Symbol` handles so that rules stay
//! small and comparable; the text is looked up only when a name is printed
//! or matched against a caller's string.

use std::collections::HashMap;
use std::fmt;

/// Handle to a name in an `Interner`. Handles count up from zero in the
/// order names were first seen.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Symbol(u32);

impl Symbol {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Deduplicating name table.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    names: Vec<Box<str>>,
    lookup: HashMap<Box<str>, Symbol>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `name`, adding it on first sight.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&symbol) = self.lookup.get(name) {
            return symbol;
        }
        let symbol = Symbol(self.names.len() as u32);
        self.names.push(name.into());
        self.lookup.insert(name.into(), symbol);
        symbol
    }

    /// Handle for `name` if it was interned before.
    pub fn find(&self, name: &str) -> Option<Symbol> {
        self.lookup.get(name).copied()
    }

    /// Text behind `symbol`; `None` for a handle from another table.
    pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
        self.names.get(symbol.index()).map(|name| &**name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
