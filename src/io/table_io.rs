use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;
use crate::model::table::Table;

/// Error type for record file I/O
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("not found: {path}")]
    NotFound { path: PathBuf },
    #[error("could not parse {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> TableError + '_ {
    move |source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn write_error(path: &Path) -> impl FnOnce(io::Error) -> TableError + '_ {
    move |source| TableError::WriteError {
        path: path.to_path_buf(),
        source,
    }
}

fn open_for_read(path: &Path) -> Result<File, TableError> {
    File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            TableError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            TableError::IoError(e)
        }
    })
}

fn writer_for<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

/// Load a whole table. All cells are returned as text exactly as stored.
///
/// A header-only file yields a zero-row table; a zero-byte file yields an
/// empty header as well. A row whose length differs from the header is a
/// parse error.
pub fn read_table(path: &Path) -> Result<Table, TableError> {
    let file = open_for_read(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file);

    let header = reader
        .headers()
        .map_err(csv_error(path))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error(path))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "read table");
    Ok(Table { header, rows })
}

/// Read only the header row of a table.
pub fn read_header(path: &Path) -> Result<Vec<String>, TableError> {
    let file = open_for_read(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file);
    Ok(reader
        .headers()
        .map_err(csv_error(path))?
        .iter()
        .map(str::to_string)
        .collect())
}

/// Append one row at the end of an existing table file.
///
/// Existing rows are never rewritten. If the file was hand-edited and lacks
/// a trailing newline, one is written first so the new row starts on its
/// own line.
pub fn append_row<S: AsRef<str>>(path: &Path, row: &[S]) -> Result<(), TableError> {
    let mut file = match OpenOptions::new().read(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(TableError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(TableError::IoError(e)),
    };

    let len = file.seek(SeekFrom::End(0))?;
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.write_all(b"\n").map_err(write_error(path))?;
        }
    }

    let mut writer = writer_for(file);
    writer
        .write_record(row.iter().map(|c| c.as_ref()))
        .map_err(csv_error(path))?;
    writer.flush().map_err(write_error(path))?;

    tracing::debug!(path = %path.display(), "appended row");
    Ok(())
}

/// Serialize a table (header first) to bytes.
pub fn serialize_table(table: &Table) -> Result<Vec<u8>, csv::Error> {
    let mut writer = writer_for(Vec::new());
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Replace the file's contents with `table`, atomically.
pub fn rewrite_table(path: &Path, table: &Table) -> Result<(), TableError> {
    let bytes = serialize_table(table).map_err(csv_error(path))?;
    atomic_write(path, &bytes).map_err(write_error(path))?;
    tracing::debug!(path = %path.display(), rows = table.len(), "rewrote table");
    Ok(())
}

/// Write a header-only table, unless the path already exists.
/// Returns true if the file was created.
pub fn create_if_absent<S: AsRef<str>>(path: &Path, header: &[S]) -> Result<bool, TableError> {
    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(write_error(path)(e)),
    };

    let mut writer = writer_for(file);
    writer
        .write_record(header.iter().map(|c| c.as_ref()))
        .map_err(csv_error(path))?;
    writer.flush().map_err(write_error(path))?;
    Ok(true)
}

/// Create a directory (and missing parents) unless it already exists.
/// Returns true if it was created.
pub fn create_dir_if_absent(path: &Path) -> Result<bool, TableError> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path).map_err(write_error(path))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = read_table(&tmp.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, TableError::NotFound { .. }));
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("years.csv");
        assert!(create_if_absent(&path, &["years"]).unwrap());

        let table = read_table(&path).unwrap();
        assert_eq!(table.header, vec!["years"]);
        assert!(table.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "years\n");
    }

    #[test]
    fn test_create_if_absent_does_not_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.csv");
        create_if_absent(&path, &["tasks"]).unwrap();
        append_row(&path, &["writing"]).unwrap();

        assert!(!create_if_absent(&path, &["other"]).unwrap());
        let table = read_table(&path).unwrap();
        assert_eq!(table.header, vec!["tasks"]);
        assert_eq!(table.keys(), vec!["writing"]);
    }

    #[test]
    fn test_cells_stay_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Jan.csv");
        create_if_absent(&path, &["pages", "hours"]).unwrap();
        append_row(&path, &["007", "2:30"]).unwrap();
        append_row(&path, &["1.50", "0:05"]).unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.rows[0], vec!["007", "2:30"]);
        assert_eq!(table.rows[1], vec!["1.50", "0:05"]);
    }

    #[test]
    fn test_append_quotes_delimiters() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Jan.csv");
        create_if_absent(&path, &["note"]).unwrap();
        append_row(&path, &["read, then write"]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "note\n\"read, then write\"\n");
        let table = read_table(&path).unwrap();
        assert_eq!(table.rows[0], vec!["read, then write"]);
    }

    #[test]
    fn test_append_repairs_missing_trailing_newline() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("years.csv");
        fs::write(&path, "years\n2026").unwrap();
        append_row(&path, &["2027"]).unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.keys(), vec!["2026", "2027"]);
    }

    #[test]
    fn test_append_to_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = append_row(&tmp.path().join("gone.csv"), &["x"]).unwrap_err();
        assert!(matches!(err, TableError::NotFound { .. }));
    }

    #[test]
    fn test_rewrite_replaces_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("months.csv");
        create_if_absent(&path, &["months"]).unwrap();
        for m in ["Jan", "Feb", "Mar"] {
            append_row(&path, &[m]).unwrap();
        }

        let table = read_table(&path).unwrap().without_key("Feb");
        rewrite_table(&path, &table).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "months\nJan\nMar\n");
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Jan.csv");
        fs::write(&path, "pages,hours\n10\n").unwrap();
        let err = read_table(&path).unwrap_err();
        assert!(matches!(err, TableError::Csv { .. }));
    }
}
