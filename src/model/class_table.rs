//! Ordered class-name table (`classes.txt`).
//!
//! The position of a name in the table is the class index written to label
//! files, so the order is significant and never rearranged here.

use serde::{Deserialize, Serialize};

/// Ordered list of class names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTable {
    names: Vec<String>,
}

impl ClassTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from names in order. Blank and repeated names are skipped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for name in names {
            table.push(name.as_ref());
        }
        table
    }

    /// Parse the contents of a `classes.txt` file: one name per line,
    /// surrounding whitespace trimmed, blank lines and duplicates ignored.
    pub fn parse(text: &str) -> Self {
        Self::from_names(text.lines())
    }

    /// Append a class name, returning its index.
    ///
    /// An existing name keeps its original index.
    pub fn push(&mut self, name: &str) -> Option<usize> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(idx) = self.index_of(name) {
            return Some(idx);
        }
        self.names.push(name.to_string());
        Some(self.names.len() - 1)
    }

    /// Index of a class name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Name at the given index.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
