use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::BreakdownError;

/// Reads every row of a csv file, header included as row 0.
///
/// All rows must have the same number of fields, as the first row does.
pub fn read_rows(path: &Path) -> Result<Vec<StringRecord>, BreakdownError> {
    let file = File::open(path).map_err(|source| BreakdownError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_rows_from(file).map_err(|source| {
        if source.is_io_error() {
            BreakdownError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other(source),
            }
        } else {
            BreakdownError::Csv {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    debug!("Read {} rows from {path:?}", rows.len());
    Ok(rows)
}

pub fn read_rows_from<R: Read>(reader: R) -> Result<Vec<StringRecord>, csv::Error> {
    ReaderBuilder::new()
        .has_headers(false)
        .from_reader(reader)
        .records()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn keeps_header_and_order() {
        let rows = read_rows_from("a,b\n1,2\n3,4\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][0], "a");
        assert_eq!(&rows[2][1], "4");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_rows(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, BreakdownError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn read_failure_after_open_is_io_error() {
        // opening a directory succeeds on unix, reading from it does not
        let dir = tempfile::tempdir().unwrap();
        let err = read_rows(dir.path()).unwrap_err();
        assert!(matches!(err, BreakdownError::Io { .. }));
    }

    #[test]
    fn ragged_rows_are_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a,b,c\n1,2,3\n4,5\n").unwrap();
        let err = read_rows(file.path()).unwrap_err();
        assert!(matches!(err, BreakdownError::Csv { .. }));
    }
}
