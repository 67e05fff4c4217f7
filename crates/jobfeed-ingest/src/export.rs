//! CSV export of a normalized table

use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::normalize::NormalizedTable;

/// Default export file name
pub const DEFAULT_CSV_PATH: &str = "flattened_job_postings.csv";

/// Result type for exports
pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `table` to a CSV file, returning the number of data rows
pub fn write_csv(table: &NormalizedTable, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let rows = write_csv_to(table, std::fs::File::create(path)?)?;
    info!(rows, "Data saved to \"{}\"", path.display());
    Ok(rows)
}

/// Write `table` as CSV to any writer.
///
/// Null cells are empty fields; timestamps use `YYYY-MM-DD HH:MM:SS`.
pub fn write_csv_to<W: Write>(table: &NormalizedTable, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(table.columns())?;
    for row in table.rows() {
        csv_writer.write_record(row.iter().map(|cell| cell.to_text().unwrap_or_default()))?;
    }
    csv_writer.flush()?;

    Ok(table.row_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Cell;
    use chrono::NaiveDate;

    #[test]
    fn test_csv_rendering() {
        let posted = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap();
        let table = NormalizedTable::from_rows(
            vec!["JobTitle".into(), "CompanyId".into(), "PostedDate".into()],
            vec![
                vec![Cell::Text("Data Engineer, Platform".into()), Cell::Integer(42), Cell::Timestamp(posted)],
                vec![Cell::Text("Analyst".into()), Cell::Null, Cell::Null],
            ],
        );

        let mut out = Vec::new();
        let rows = write_csv_to(&table, &mut out).unwrap();

        assert_eq!(rows, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "JobTitle,CompanyId,PostedDate\n\"Data Engineer, Platform\",42,2024-05-01 10:00:00\nAnalyst,,\n"
        );
    }

    #[test]
    fn test_write_csv_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/jobs.csv");
        let table = NormalizedTable::from_rows(vec!["a".into()], vec![vec![Cell::Integer(1)]]);

        assert_eq!(write_csv(&table, &path).unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\n1\n");
    }
}
