use serde::Serialize;

/// An in-memory copy of one delimited file: a header row plus data rows.
///
/// Every cell is kept as text. Nothing is parsed as a number or date, so
/// leading zeros and mixed formats survive a read/rewrite cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// A header-only table
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Table {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the first column, in file order. Registries keep their
    /// labels there.
    pub fn keys(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|r| r.first().cloned())
            .collect()
    }

    /// First cell of the last row: the most recently registered label.
    pub fn last_key(&self) -> Option<&str> {
        self.rows
            .last()
            .and_then(|r| r.first())
            .map(|s| s.as_str())
    }

    /// True if any cell in any column equals `value`.
    pub fn contains_cell(&self, value: &str) -> bool {
        self.rows.iter().flatten().any(|cell| cell == value)
    }

    /// 1-based row lookup
    pub fn row(&self, number: usize) -> Option<&[String]> {
        number
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .map(|r| r.as_slice())
    }

    /// A copy of this table without the rows whose first cell equals `key`.
    pub fn without_key(&self, key: &str) -> Table {
        Table {
            header: self.header.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r.first().map(|s| s.as_str()) != Some(key))
                .cloned()
                .collect(),
        }
    }
}
