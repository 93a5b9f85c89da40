use encoding_rs::WINDOWS_1252;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ImportError, ImportResult};

pub const FIELD_DELIMITER: u8 = b';';

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One undecoded data row with its position in the file
#[derive(Debug, Clone)]
pub struct RawRow {
    pub line: u64,
    pub fields: Vec<String>,
}

/// Reads `;`-separated Latin-1 rows
pub struct RowSource<R: Read> {
    reader: csv::Reader<R>,
    record: csv::ByteRecord,
    started: bool,
}

impl RowSource<File> {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> RowSource<R> {
    pub fn new(input: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        Self {
            reader,
            record: csv::ByteRecord::new(),
            started: false,
        }
    }

    /// Read the next row, `None` at end of input
    pub fn next_row(&mut self) -> ImportResult<Option<RawRow>> {
        let more = self
            .reader
            .read_byte_record(&mut self.record)
            .map_err(|source| ImportError::Read {
                line: source
                    .position()
                    .map(|p| p.line())
                    .unwrap_or_else(|| self.reader.position().line()),
                source,
            })?;

        if !more {
            return Ok(None);
        }

        let line = self
            .record
            .position()
            .map(|p| p.line())
            .unwrap_or_else(|| self.reader.position().line());
        let mut fields: Vec<String> = self.record.iter().map(decode_latin1).collect();
        if !self.started {
            self.started = true;
            if let (Some(first), Some(raw)) = (fields.first_mut(), self.record.get(0)) {
                if let Some(rest) = raw.strip_prefix(UTF8_BOM) {
                    *first = decode_latin1(rest);
                }
            }
        }

        Ok(Some(RawRow { line, fields }))
    }
}

impl<R: Read> Iterator for RowSource<R> {
    type Item = ImportResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Exports are written in Windows-1252, a superset of printable Latin-1
fn decode_latin1(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_semicolon_rows_with_line_numbers() {
        let input = "platform;mapname\nPC;Bank\nPS4;Club House\n";
        let rows: Vec<RawRow> = RowSource::new(input.as_bytes())
            .collect::<ImportResult<_>>()
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].fields, vec!["platform", "mapname"]);
        assert_eq!(rows[2].fields, vec!["PS4", "Club House"]);
        assert_eq!(rows[2].line, 3);
    }

    #[test]
    fn test_decodes_latin1_bytes() {
        let input: &[u8] = b"mapname\nCaf\xe9 Dostoyevsky\n";
        let rows: Vec<RawRow> = RowSource::new(input).collect::<ImportResult<_>>().unwrap();
        assert_eq!(rows[1].fields[0], "Café Dostoyevsky");
    }

    #[test]
    fn test_leading_utf8_bom_is_dropped() {
        let input: &[u8] = b"\xEF\xBB\xBFplatform;mapname\nPC;Bank\n";
        let rows: Vec<RawRow> = RowSource::new(input).collect::<ImportResult<_>>().unwrap();
        assert_eq!(rows[0].fields, vec!["platform", "mapname"]);
        assert_eq!(rows[1].fields, vec!["PC", "Bank"]);
    }

    #[test]
    fn test_ragged_rows_are_passed_through() {
        let input = "a;b;c\n1;2\n";
        let rows: Vec<RawRow> = RowSource::new(input.as_bytes())
            .collect::<ImportResult<_>>()
            .unwrap();
        assert_eq!(rows[1].fields.len(), 2);
    }
}
