// src/extractors/mod.rs
pub mod identifier;
pub mod keyword;
pub mod numbers;

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::config::CellRef;

pub use identifier::find_tax_id;
pub use keyword::KeywordExtractor;

/// Raw values extracted for each target cell. `None` marks a cell whose value was not found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    values: BTreeMap<CellRef, Option<String>>,
}

impl ExtractionResult {
    /// Records a value for a cell, replacing any earlier one.
    pub fn insert(&mut self, cell: CellRef, value: Option<String>) {
        self.values.insert(cell, value);
    }

    /// The extracted value, or `None` if the cell is a miss or not part of the result.
    #[cfg(test)]
    pub fn get(&self, cell: &CellRef) -> Option<&str> {
        self.values.get(cell).and_then(|v| v.as_deref())
    }

    pub fn is_miss(&self, cell: &CellRef) -> bool {
        matches!(self.values.get(cell), Some(None))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn miss_count(&self) -> usize {
        self.values.values().filter(|v| v.is_none()).count()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, CellRef, Option<String>> {
        self.values.iter()
    }
}
