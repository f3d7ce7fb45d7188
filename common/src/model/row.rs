use crate::model::cell::CellValue;
use std::collections::BTreeMap;

/// Ordered column names taken from the first row of a data source.
///
/// Duplicate names are kept positionally; when used as mapping keys the last
/// occurrence wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderRow(pub Vec<String>);

impl HeaderRow {
    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    /// 1-based position of the last column named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().rposition(|c| c == name).map(|i| i + 1)
    }
}

/// One data row's values keyed by column name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowRecord {
    /// 0-based index of the row in the source grid, header included (the
    /// header is index 0). Blank rows skipped during extraction do not shift it.
    pub index: usize,
    pub values: BTreeMap<String, CellValue>,
}

impl RowRecord {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            values: BTreeMap::new(),
        }
    }

    /// 1-based row position in the source table.
    pub fn sheet_row(&self) -> usize {
        self.index + 1
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    /// Stringified value for `column`, empty when the column is absent.
    pub fn text(&self, column: &str) -> String {
        self.values
            .get(column)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.values.insert(column.into(), value.into());
    }
}
