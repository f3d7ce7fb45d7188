//! Turning a grid of cells into header-keyed row records.

use crate::error::{Error, Result};
use common::model::cell::CellValue;
use common::model::row::{HeaderRow, RowRecord};

/// Read the header and every non-blank data row of `grid`.
///
/// The whole grid is consumed up front. Blank rows are dropped but keep their
/// slot: each record's `index` is its position in `grid`.
pub fn extract_rows(grid: &[Vec<CellValue>]) -> Result<(HeaderRow, Vec<RowRecord>)> {
    let width = grid.first().map(Vec::len).unwrap_or(0);
    extract_rows_within(grid, width)
}

/// Like [`extract_rows`], but only the first `width` columns form the schema.
/// Cells beyond it are ignored, including for the blank-row test.
pub fn extract_rows_within(
    grid: &[Vec<CellValue>],
    width: usize,
) -> Result<(HeaderRow, Vec<RowRecord>)> {
    let (header_cells, data) = grid
        .split_first()
        .ok_or_else(|| Error::EmptyDataSource("<grid>".to_string()))?;

    let header = HeaderRow(
        header_cells
            .iter()
            .take(width)
            .map(|c| c.to_string())
            .collect(),
    );

    let mut records = Vec::with_capacity(data.len());
    for (offset, cells) in data.iter().enumerate() {
        let cells = &cells[..cells.len().min(header.width())];
        if cells.iter().all(CellValue::is_blank) {
            continue;
        }

        let mut record = RowRecord::new(offset + 1);
        for (i, column) in header.columns().iter().enumerate() {
            let value = cells.get(i).cloned().unwrap_or_default();
            record.values.insert(column.clone(), value);
        }
        records.push(record);
    }

    Ok((header, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
        rows.iter()
            .map(|r| r.iter().map(|c| CellValue::from(*c)).collect())
            .collect()
    }

    #[test]
    fn blank_rows_are_skipped_without_shifting_indices() {
        let g = grid(&[
            &["Name", "Email"],
            &["Ann", "a@x.com"],
            &["", "  "],
            &["Bo", "b@x.com"],
        ]);
        let (header, rows) = extract_rows(&g).unwrap();

        assert_eq!(header.columns(), ["Name", "Email"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("Name"), "Ann");
        assert_eq!(rows[0].text("Email"), "a@x.com");
        assert_eq!(rows[0].sheet_row(), 2);
        assert_eq!(rows[1].text("Name"), "Bo");
        assert_eq!(rows[1].text("Email"), "b@x.com");
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[1].sheet_row(), 3);
    }

    #[test]
    fn numbers_count_as_content() {
        let g = vec![
            vec![CellValue::from("Qty")],
            vec![CellValue::Number(0.0)],
            vec![CellValue::Empty],
        ];
        let (_, rows) = extract_rows(&g).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("Qty"), "0");
    }

    #[test]
    fn duplicate_headers_keep_last_value() {
        let g = grid(&[&["Id", "Id"], &["first", "second"]]);
        let (header, rows) = extract_rows(&g).unwrap();
        assert_eq!(header.width(), 2);
        assert_eq!(rows[0].text("Id"), "second");
    }

    #[test]
    fn short_rows_fill_missing_cells_with_empty() {
        let g = grid(&[&["A", "B"], &["only-a"]]);
        let (_, rows) = extract_rows(&g).unwrap();
        assert_eq!(rows[0].get("B"), Some(&CellValue::Empty));
    }

    #[test]
    fn narrowed_schema_ignores_trailing_columns() {
        let g = grid(&[
            &["Name", "Doc/PDF URL"],
            &["Ann", "http://old"],
            &["", "http://stale"],
        ]);
        let (header, rows) = extract_rows_within(&g, 1).unwrap();
        assert_eq!(header.columns(), ["Name"]);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].get("Doc/PDF URL").is_none());
    }

    #[test]
    fn empty_grid_is_an_error() {
        assert!(matches!(
            extract_rows(&[]),
            Err(Error::EmptyDataSource(_))
        ));
    }
}
