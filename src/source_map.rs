//! Mapping between instruction addresses and source code locations.

use std::collections::HashMap;
use std::iter::FromIterator;

/// Mapping from instruction addresses into source locations. The assembler produces a
/// `SourceMap<usize>` whose values are line numbers of the assembly text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMap<V> {
    inner: HashMap<u16, V>,
}

impl<V> Default for SourceMap<V> {
    fn default() -> Self {
        SourceMap {
            inner: HashMap::new(),
        }
    }
}

impl<V> FromIterator<(u16, V)> for SourceMap<V> {
    fn from_iter<I>(iter: I) -> Self
        where I: IntoIterator<Item = (u16, V)>
    {
        SourceMap {
            inner: HashMap::from_iter(iter),
        }
    }
}

impl<V> SourceMap<V> {
    pub fn insert(&mut self, addr: u16, location: V) {
        self.inner.insert(addr, location);
    }

    /// Returns the location in the source code which produced the instruction at `addr`.
    pub fn get(&self, addr: u16) -> Option<&V> {
        self.inner.get(&addr)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
