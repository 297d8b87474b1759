//! Reference (code table) data fetched during the initial bootstrap sync

use serde::{Deserialize, Serialize};

/// A named lookup table (stations, watercraft types, provinces, ...).
///
/// Code tables are fetched once during bootstrap and persisted locally;
/// user-initiated record creation is blocked until they exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeTable {
    pub name: String,
    pub items: Vec<String>,
}

impl CodeTable {
    pub fn new(name: impl Into<String>, items: Vec<String>) -> Self {
        Self { name: name.into(), items }
    }
}
