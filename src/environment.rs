use super::ast::{Kind, Value};
use std::collections::BTreeMap;

/// One binding. Array elements are ordinary entries named `base@index`;
/// the entry for the array's own name only carries `array_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub kind: Kind,
    pub line: usize,
    pub level: usize,
    pub value: Option<Value>,
    pub array_size: Option<usize>,
}

impl Entry {
    pub fn new(name: &str, kind: Kind, line: usize, level: usize) -> Entry {
        Entry {
            name: name.to_string(),
            kind,
            line,
            level,
            value: None,
            array_size: None,
        }
    }
    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }
}

pub fn element_name(base: &str, index: usize) -> String {
    format!("{}@{}", base, index)
}

/// Block-scoped symbol table. Each name maps to its bindings ordered by
/// scope level, innermost last.
#[derive(Debug, Default)]
pub struct SymbolTable {
    values: BTreeMap<String, Vec<Entry>>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            values: BTreeMap::new(),
        }
    }
    pub fn reset(&mut self) {
        self.values.clear();
    }
    /// Exact-level lookup.
    pub fn declared_at_level(&self, name: &str, level: usize) -> Option<&Entry> {
        self.values
            .get(name)
            .and_then(|entries| entries.iter().find(|e| e.level == level))
    }
    /// The visible binding: greatest scope level not above `level`.
    pub fn resolve(&self, name: &str, level: usize) -> Option<&Entry> {
        self.values
            .get(name)
            .and_then(|entries| entries.iter().rev().find(|e| e.level <= level))
    }
    pub fn resolve_mut(&mut self, name: &str, level: usize) -> Option<&mut Entry> {
        self.values
            .get_mut(name)
            .and_then(|entries| entries.iter_mut().rev().find(|e| e.level <= level))
    }
    /// Callers check `declared_at_level` first.
    pub fn insert(&mut self, entry: Entry) {
        let entries = self.values.entry(entry.name.clone()).or_insert_with(Vec::new);
        let at = entries
            .iter()
            .position(|e| e.level > entry.level)
            .unwrap_or_else(|| entries.len());
        entries.insert(at, entry);
    }
    pub fn discard_above(&mut self, level: usize) {
        for entries in self.values.values_mut() {
            entries.retain(|e| e.level <= level);
        }
        self.values.retain(|_, entries| !entries.is_empty());
    }
    #[cfg(test)]
    fn len(&self) -> usize {
        self.values.values().map(Vec::len).sum()
    }
    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
